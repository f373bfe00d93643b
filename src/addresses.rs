//! Address derivation abstraction (chain + index → address).
use std::fmt;

/// The two BIP-44 derivation branches scanned during bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivationChain {
    /// Receiving addresses, handed out to counterparties.
    External,
    /// Change addresses, only ever used by the wallet itself.
    Internal,
}

impl fmt::Display for DerivationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivationChain::External => f.write_str("external"),
            DerivationChain::Internal => f.write_str("internal"),
        }
    }
}

/// Source of derived wallet addresses.
///
/// Implementations wrap the HD key tree; derivation must be deterministic
/// and side-effect-free, so the syncer may call it in any order.
pub trait AddressSource: Send + Sync {
    /// Address for `chain` at `index`.
    fn derive_address(&self, chain: DerivationChain, index: u32) -> anyhow::Result<String>;
}
