//! Persistence interfaces and implementations used by the syncer
//! (block repository and the api-synced bootstrap flag).
use async_trait::async_trait;

use crate::block::Block;

/// Durable bootstrap progress flag. No secrets, just a single boolean.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether a bootstrap pass has ever fully completed.
    async fn api_synced(&self) -> anyhow::Result<bool>;

    /// Persist the bootstrap flag.
    async fn set_api_synced(&self, synced: bool) -> anyhow::Result<()>;
}

/// Durable, queryable set of blocks keyed by header hash.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Insert `block`. A duplicate header hash is a no-op, not an error.
    async fn insert(&self, block: &Block) -> anyhow::Result<()>;

    /// Number of stored blocks.
    async fn count(&self) -> anyhow::Result<u64>;

    /// Look up a block by its reversed-hex display key.
    async fn block_by_reversed_hex(&self, hex: &str) -> anyhow::Result<Option<Block>>;
}

// submodules / concrete stores live here
#[cfg(feature = "store-sqlite")]
pub mod sqlite_store;
#[cfg(feature = "store-sqlite")]
pub use sqlite_store::SqliteStore;
