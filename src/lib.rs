#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! faro-44: a gap-limit bootstrap sync engine for SPV wallets.
//!
//! Before a light wallet can follow the chain over P2P it has to learn which
//! of its HD addresses were ever used and which blocks touch them. This crate
//! implements that one-time bootstrap: scan the external and internal BIP-44
//! chains against an address-index service until the gap limit is exhausted,
//! keep the hits at or below a trusted checkpoint, persist them, and hand
//! off to the peer group.
//!
//! ## What you implement
//! - [`AddressSource`]: derive an address for a (chain, index) pair.
//! - [`HitSource`]: ask an address-index service which blocks touch an address.
//! - [`BlockBuilder`]: turn a (header hash, height) pair into a [`Block`]
//!   (or use [`StrictBlockBuilder`]).
//! - [`StateStore`] + [`BlockStore`]: persistence (or use [`SqliteStore`]).
//! - [`PeerGroup`]: the P2P subsystem started once bootstrap completes.
//!
//! ## What the engine does
//! - Scans both derivation chains **concurrently**, keeping a whole
//!   gap-limit window of probes in flight per chain.
//! - Reorders out-of-order probe results so the stopping rule is evaluated
//!   in index order.
//! - Drops hits above the checkpoint, persists the rest idempotently, flips
//!   the api-synced flag, and starts the peer group.
//! - Aborts the whole pass on any failure: nothing persisted, flag
//!   untouched, peer group not started. Retry is the caller's call.
//!
//! ## Minimal usage
//! ```rust,ignore
//! use faro_44::prelude::*;
//! use async_trait::async_trait;
//! use bitcoin::BlockHash;
//!
//! // --- Your implementations ---
//! struct MyKeys;
//! impl AddressSource for MyKeys {
//!     fn derive_address(&self, chain: DerivationChain, index: u32) -> anyhow::Result<String> {
//!         Ok(format!("{chain}-{index}")) // real impl: HD derivation
//!     }
//! }
//!
//! struct MyIndex;
//! #[async_trait]
//! impl HitSource for MyIndex {
//!     async fn block_hashes(&self, _address: &str) -> anyhow::Result<Vec<BlockHit>> {
//!         Ok(vec![]) // real impl: HTTP query against an index service
//!     }
//! }
//!
//! struct MyPeers;
//! #[async_trait]
//! impl PeerGroup for MyPeers {
//!     async fn start(&self) { /* spin up P2P sync */ }
//! }
//!
//! // --- Wire it up ---
//! async fn bootstrap(checkpoint: Block) -> anyhow::Result<()> {
//!     let store = SqliteStore::new("wallet.sqlite")?;
//!     let blocks = SqliteStore::new("wallet.sqlite")?;
//!     let syncer = InitialSyncer::new(
//!         WalletConfig::default(),
//!         NetworkParams { checkpoint },
//!         MyKeys,
//!         MyIndex,
//!         StrictBlockBuilder,
//!         store,
//!         blocks,
//!         MyPeers,
//!     );
//!     syncer.sync().await
//! }
//! ```
/// Orchestrator driving discovery, persistence, and the P2P hand-off.
pub mod syncer;

/// Address derivation seam (chain + index → address).
pub mod addresses;

/// Address-index backend seam and its hit type.
pub mod hit_source;

/// Block entity and construction seam.
pub mod block;

/// Peer-group control seam.
pub mod peers;

// Internal helpers:
mod discovery;

/// Persistence layer (traits and SQLite implementation).
pub mod store;

// Public re-exports
pub use addresses::{AddressSource, DerivationChain};
pub use block::{Block, BlockBuilder, StrictBlockBuilder};
pub use hit_source::{BlockHit, HitSource};
pub use peers::PeerGroup;
#[cfg(feature = "store-sqlite")]
pub use store::sqlite_store::SqliteStore;
pub use store::{BlockStore, StateStore};
pub use syncer::{InitialSyncer, NetworkParams, WalletConfig};

/// Convenience prelude for end users.
pub mod prelude {
    pub use crate::{
        AddressSource, Block, BlockBuilder, BlockHit, BlockStore, DerivationChain, HitSource,
        InitialSyncer, NetworkParams, PeerGroup, StateStore, StrictBlockBuilder, WalletConfig,
    };
    #[cfg(feature = "store-sqlite")]
    pub use crate::SqliteStore;
}
