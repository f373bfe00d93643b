//! Block entity persisted by bootstrap discovery, plus its construction seam.
use anyhow::{bail, Result};
use bitcoin::hashes::Hash;
use bitcoin::BlockHash;

/// A block known to the wallet. Keyed by header hash; append-only once
/// persisted. Bootstrap never stores heights above the network checkpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Header hash, the unique key of a persisted block.
    pub header_hash: BlockHash,
    /// Height in the chain.
    pub height: u32,
    /// Link to the preceding block, absent for a synthetic first block.
    pub previous: Option<BlockHash>,
}

impl Block {
    /// New unlinked block record.
    pub fn new(header_hash: BlockHash, height: u32) -> Self {
        Self {
            header_hash,
            height,
            previous: None,
        }
    }

    /// Attach the preceding block's hash once the header chain is known.
    pub fn with_previous(mut self, previous: BlockHash) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Reversed-hex form of the header hash, the conventional display and
    /// lookup key.
    pub fn reversed_hex(&self) -> String {
        self.header_hash.to_string()
    }
}

/// Constructs [`Block`] records from raw index-service data.
pub trait BlockBuilder: Send + Sync {
    /// Build a block for `header_hash` at `height`, or fail on inconsistent
    /// input.
    fn block(&self, header_hash: BlockHash, height: u32) -> Result<Block>;
}

/// Default builder: rejects the all-zero hash and otherwise produces
/// unlinked records. Callers wire up `previous` links themselves once the
/// header chain is available.
pub struct StrictBlockBuilder;

impl BlockBuilder for StrictBlockBuilder {
    fn block(&self, header_hash: BlockHash, height: u32) -> Result<Block> {
        if header_hash == BlockHash::all_zeros() {
            bail!("all-zero header hash at height {height}");
        }
        Ok(Block::new(header_hash, height))
    }
}
