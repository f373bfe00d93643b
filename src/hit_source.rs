//! Abstraction over the address-index backend queried during bootstrap.
use async_trait::async_trait;
use bitcoin::BlockHash;

/// One block the index service reports as touching a probed address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHit {
    /// Header hash of the block containing activity for the address.
    pub hash: BlockHash,
    /// Height the service reports for that block.
    pub height: u32,
}

/// Network provider mapping an address to the blocks that touch it.
#[async_trait]
pub trait HitSource: Send + Sync {
    /// All block references known for `address`. An empty list is a valid
    /// answer (unused address); an `Err` aborts the whole bootstrap pass.
    async fn block_hashes(&self, address: &str) -> anyhow::Result<Vec<BlockHit>>;
}
