//! Peer-group control surface: bootstrap hands off to ongoing P2P sync here.
use async_trait::async_trait;

/// Handle to the peer-to-peer sync subsystem.
#[async_trait]
pub trait PeerGroup: Send + Sync {
    /// Begin ongoing P2P synchronization. Fire-and-forget; the bootstrap
    /// engine does not consume a result.
    async fn start(&self);
}
