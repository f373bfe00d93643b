//! Orchestrator for the wallet bootstrap flow:
//! 1) skip discovery when a previous pass already completed,
//! 2) scan both derivation chains under the wallet's gap limit,
//! 3) filter hits against the network checkpoint and persist blocks,
//! 4) hand off to the peer group.
use crate::{
    addresses::{AddressSource, DerivationChain},
    block::{Block, BlockBuilder},
    discovery::discover_chain,
    hit_source::HitSource,
    peers::PeerGroup,
    store::{BlockStore, StateStore},
};
use anyhow::Context;
use tracing::{debug, info};

/// Wallet-level configuration consumed by the syncer.
#[derive(Clone, Copy, Debug)]
pub struct WalletConfig {
    /// Consecutive unused addresses tolerated before a chain stops scanning.
    pub gap_limit: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        // BIP-44 recommended gap limit.
        Self { gap_limit: 20 }
    }
}

/// Network parameters for one bootstrap pass.
#[derive(Clone, Debug)]
pub struct NetworkParams {
    /// Trusted checkpoint; hits above its height are left to the P2P phase.
    pub checkpoint: Block,
}

/// Core syncer. `A` = address source, `H` = hit source, `B` = block builder,
/// `S` = state store, `R` = block repository, `P` = peer group.
pub struct InitialSyncer<A, H, B, S, R, P> {
    wallet: WalletConfig,
    network: NetworkParams,
    addresses: A,
    source: H,
    builder: B,
    state: S,
    blocks: R,
    peers: P,
}

impl<A, H, B, S, R, P> InitialSyncer<A, H, B, S, R, P>
where
    A: AddressSource,
    H: HitSource,
    B: BlockBuilder,
    S: StateStore,
    R: BlockStore,
    P: PeerGroup,
{
    /// Create a new syncer over the given configuration and collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet: WalletConfig,
        network: NetworkParams,
        addresses: A,
        source: H,
        builder: B,
        state: S,
        blocks: R,
        peers: P,
    ) -> Self {
        Self {
            wallet,
            network,
            addresses,
            source,
            builder,
            state,
            blocks,
            peers,
        }
    }

    /// Run one bootstrap pass.
    ///
    /// Discovery runs once per wallet lifetime: if a previous pass completed,
    /// the peer group is started straight away. Otherwise both derivation
    /// chains are scanned concurrently, hits at or below the checkpoint
    /// height are persisted, the api-synced flag is set, and the peer group
    /// is started.
    ///
    /// # Errors
    /// Any failing probe, block construction, or store write aborts the
    /// whole pass: no blocks are persisted, the flag stays unset, and the
    /// peer group is not started. The caller may retry later; no partial
    /// state carries over.
    pub async fn sync(&self) -> anyhow::Result<()> {
        if self.state.api_synced().await.context("read api-synced flag")? {
            info!("bootstrap already complete, starting peer group");
            self.peers.start().await;
            return Ok(());
        }

        let gap_limit = self.wallet.gap_limit;
        let (external, internal) = futures::try_join!(
            discover_chain(
                &self.addresses,
                &self.source,
                DerivationChain::External,
                gap_limit
            ),
            discover_chain(
                &self.addresses,
                &self.source,
                DerivationChain::Internal,
                gap_limit
            ),
        )?;

        let checkpoint_height = self.network.checkpoint.height;
        info!(
            external = external.len(),
            internal = internal.len(),
            checkpoint_height,
            "address discovery finished"
        );

        // Build the whole batch before touching the store, so a bad hit
        // cannot leave a partial block set behind.
        let mut batch: Vec<Block> = Vec::new();
        for hit in external.into_iter().chain(internal) {
            if hit.height > checkpoint_height {
                debug!(hash = %hit.hash, height = hit.height, "dropping hit above checkpoint");
                continue;
            }
            let block = self
                .builder
                .block(hit.hash, hit.height)
                .with_context(|| format!("build block {} at height {}", hit.hash, hit.height))?;
            batch.push(block);
        }

        for block in &batch {
            self.blocks
                .insert(block)
                .await
                .with_context(|| format!("persist block {}", block.reversed_hex()))?;
        }

        self.state
            .set_api_synced(true)
            .await
            .context("mark api-synced")?;

        info!(blocks = batch.len(), "bootstrap complete, starting peer group");
        self.peers.start().await;
        Ok(())
    }
}
