//! Gap-limit address scan for a single derivation chain.
//!
//! Probes are issued for every index inside the active window and may
//! resolve in any order; results are keyed by index so the stopping rule is
//! evaluated as if they had arrived sequentially. The scan for a chain ends
//! once every index up to (last hit + gap limit) has resolved.
use std::collections::BTreeMap;

use anyhow::Context;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::addresses::{AddressSource, DerivationChain};
use crate::hit_source::{BlockHit, HitSource};

/// Index-ordered view of the probe results collected so far.
struct ChainScan {
    gap_limit: u32,
    results: BTreeMap<u32, Vec<BlockHit>>,
}

impl ChainScan {
    fn new(gap_limit: u32) -> Self {
        Self {
            gap_limit,
            results: BTreeMap::new(),
        }
    }

    fn record(&mut self, index: u32, hits: Vec<BlockHit>) {
        self.results.insert(index, hits);
    }

    /// Highest index that must still be probed: gap-limit indices past the
    /// last known hit, or the first gap-limit indices when nothing hit yet.
    fn bound(&self) -> u32 {
        self.results
            .iter()
            .rev()
            .find(|(_, hits)| !hits.is_empty())
            .map(|(index, _)| index + self.gap_limit)
            .unwrap_or_else(|| self.gap_limit.saturating_sub(1))
    }

    /// True once every index up to the current bound has a result, i.e. the
    /// trailing run of empty indices has reached the gap limit.
    fn exhausted(&self) -> bool {
        (0..=self.bound()).all(|index| self.results.contains_key(&index))
    }

    fn into_hits(self) -> Vec<BlockHit> {
        self.results.into_values().flatten().collect()
    }
}

/// Scan one chain until its gap limit is exhausted, returning every hit
/// found on the way. The first failing probe aborts the scan; dropping the
/// in-flight window cancels the remaining probes.
pub(crate) async fn discover_chain<A, H>(
    addresses: &A,
    source: &H,
    chain: DerivationChain,
    gap_limit: u32,
) -> anyhow::Result<Vec<BlockHit>>
where
    A: AddressSource,
    H: HitSource,
{
    let mut scan = ChainScan::new(gap_limit);
    let mut pending = FuturesUnordered::new();
    let mut next = 0u32;

    loop {
        // Keep the whole active window in flight.
        while next <= scan.bound() {
            let index = next;
            let address = addresses
                .derive_address(chain, index)
                .with_context(|| format!("derive {chain} address at index {index}"))?;
            pending.push(async move {
                let found = source.block_hashes(&address).await;
                (index, address, found)
            });
            next = next.saturating_add(1);
        }

        match pending.next().await {
            Some((index, address, found)) => {
                let found = found
                    .with_context(|| format!("index lookup for {address} ({chain} #{index})"))?;
                debug!(%chain, index, hits = found.len(), "probe resolved");
                scan.record(index, found);
                if scan.exhausted() {
                    break;
                }
            }
            None => break,
        }
    }

    Ok(scan.into_hits())
}
