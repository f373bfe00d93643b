use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bitcoin::hashes::{sha256d, Hash as _};
use bitcoin::BlockHash;
use faro_44::prelude::*;

struct FakeAddresses {
    derived: Arc<Mutex<Vec<(DerivationChain, u32)>>>,
}

impl AddressSource for FakeAddresses {
    fn derive_address(&self, chain: DerivationChain, index: u32) -> anyhow::Result<String> {
        self.derived.lock().unwrap().push((chain, index));
        Ok(format!("{chain}{index}"))
    }
}

enum Probe {
    Hits(Vec<BlockHit>),
    /// Yields the scheduler a few times before answering, so this probe
    /// resolves after any immediate one issued alongside it.
    Slow(Vec<BlockHit>),
}

struct FakeIndex {
    responses: HashMap<String, Probe>,
}

#[async_trait]
impl HitSource for FakeIndex {
    async fn block_hashes(&self, address: &str) -> anyhow::Result<Vec<BlockHit>> {
        match self.responses.get(address) {
            Some(Probe::Hits(hits)) => Ok(hits.clone()),
            Some(Probe::Slow(hits)) => {
                for _ in 0..16 {
                    tokio::task::yield_now().await;
                }
                Ok(hits.clone())
            }
            None => anyhow::bail!("unexpected probe for {address}"),
        }
    }
}

struct FakeState {
    sets: Arc<Mutex<Vec<bool>>>,
}

#[async_trait]
impl StateStore for FakeState {
    async fn api_synced(&self) -> anyhow::Result<bool> {
        Ok(false)
    }
    async fn set_api_synced(&self, synced: bool) -> anyhow::Result<()> {
        self.sets.lock().unwrap().push(synced);
        Ok(())
    }
}

struct MemBlocks {
    blocks: Arc<Mutex<Vec<Block>>>,
}

#[async_trait]
impl BlockStore for MemBlocks {
    async fn insert(&self, block: &Block) -> anyhow::Result<()> {
        let mut blocks = self.blocks.lock().unwrap();
        if !blocks.iter().any(|b| b.header_hash == block.header_hash) {
            blocks.push(block.clone());
        }
        Ok(())
    }
    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.blocks.lock().unwrap().len() as u64)
    }
    async fn block_by_reversed_hex(&self, hex: &str) -> anyhow::Result<Option<Block>> {
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.reversed_hex() == hex)
            .cloned())
    }
}

struct FakePeers {
    starts: Arc<AtomicUsize>,
}

#[async_trait]
impl PeerGroup for FakePeers {
    async fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
}

fn hash(byte: u8) -> BlockHash {
    BlockHash::from_raw_hash(sha256d::Hash::from_byte_array([byte; 32]))
}

fn hit(byte: u8, height: u32) -> BlockHit {
    BlockHit {
        hash: hash(byte),
        height,
    }
}

struct Harness {
    derived: Arc<Mutex<Vec<(DerivationChain, u32)>>>,
    sets: Arc<Mutex<Vec<bool>>>,
    blocks: Arc<Mutex<Vec<Block>>>,
    starts: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        Self {
            derived: Arc::new(Mutex::new(Vec::new())),
            sets: Arc::new(Mutex::new(Vec::new())),
            blocks: Arc::new(Mutex::new(Vec::new())),
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn syncer_with<B: BlockBuilder>(
        &self,
        builder: B,
        gap_limit: u32,
        responses: HashMap<String, Probe>,
    ) -> InitialSyncer<FakeAddresses, FakeIndex, B, FakeState, MemBlocks, FakePeers> {
        InitialSyncer::new(
            WalletConfig { gap_limit },
            NetworkParams {
                checkpoint: Block::new(hash(99), 100),
            },
            FakeAddresses {
                derived: self.derived.clone(),
            },
            FakeIndex { responses },
            builder,
            FakeState {
                sets: self.sets.clone(),
            },
            MemBlocks {
                blocks: self.blocks.clone(),
            },
            FakePeers {
                starts: self.starts.clone(),
            },
        )
    }

    fn syncer(
        &self,
        gap_limit: u32,
        responses: HashMap<String, Probe>,
    ) -> InitialSyncer<FakeAddresses, FakeIndex, StrictBlockBuilder, FakeState, MemBlocks, FakePeers>
    {
        self.syncer_with(StrictBlockBuilder, gap_limit, responses)
    }
}

#[tokio::test]
async fn fresh_wallet_with_no_hits_is_a_successful_sync() -> anyhow::Result<()> {
    let h = Harness::new();
    let responses = HashMap::from([
        ("external0".into(), Probe::Hits(vec![])),
        ("external1".into(), Probe::Hits(vec![])),
        ("internal0".into(), Probe::Hits(vec![])),
        ("internal1".into(), Probe::Hits(vec![])),
    ]);
    let syncer = h.syncer(2, responses);

    syncer.sync().await?;

    assert_eq!(h.blocks.lock().unwrap().len(), 0);
    assert_eq!(*h.sets.lock().unwrap(), vec![true]);
    assert_eq!(h.starts.load(Ordering::SeqCst), 1);

    let mut derived = h.derived.lock().unwrap().clone();
    derived.sort();
    assert_eq!(
        derived,
        vec![
            (DerivationChain::External, 0),
            (DerivationChain::External, 1),
            (DerivationChain::Internal, 0),
            (DerivationChain::Internal, 1),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn gap_limit_is_read_from_wallet_config() -> anyhow::Result<()> {
    let h = Harness::new();
    let responses = HashMap::from([
        ("external0".into(), Probe::Hits(vec![hit(1, 10)])),
        ("external1".into(), Probe::Hits(vec![])),
        ("external2".into(), Probe::Hits(vec![])),
        ("external3".into(), Probe::Hits(vec![])),
        ("internal0".into(), Probe::Hits(vec![])),
        ("internal1".into(), Probe::Hits(vec![])),
        ("internal2".into(), Probe::Hits(vec![])),
    ]);
    let syncer = h.syncer(3, responses);

    syncer.sync().await?;

    assert_eq!(h.blocks.lock().unwrap().len(), 1);

    let derived = h.derived.lock().unwrap();
    for index in 0..=3 {
        assert!(derived.contains(&(DerivationChain::External, index)));
    }
    for index in 0..=2 {
        assert!(derived.contains(&(DerivationChain::Internal, index)));
    }
    assert!(!derived.contains(&(DerivationChain::External, 4)));
    assert!(!derived.contains(&(DerivationChain::Internal, 3)));
    Ok(())
}

#[tokio::test]
async fn out_of_order_results_are_evaluated_in_index_order() -> anyhow::Result<()> {
    let h = Harness::new();
    // Index 0 answers last even though it was asked first. The empty answers
    // arriving ahead of it must not terminate the scan early; once the slow
    // hit lands, the window extends to index 2.
    let responses = HashMap::from([
        ("external0".into(), Probe::Slow(vec![hit(1, 10)])),
        ("external1".into(), Probe::Hits(vec![])),
        ("external2".into(), Probe::Hits(vec![])),
        ("internal0".into(), Probe::Hits(vec![])),
        ("internal1".into(), Probe::Hits(vec![])),
    ]);
    let syncer = h.syncer(2, responses);

    syncer.sync().await?;

    assert_eq!(h.blocks.lock().unwrap().len(), 1);

    let derived = h.derived.lock().unwrap();
    for index in 0..=2 {
        assert!(derived.contains(&(DerivationChain::External, index)));
    }
    assert!(!derived.contains(&(DerivationChain::External, 3)));
    Ok(())
}

#[tokio::test]
async fn address_reuse_across_chains_stores_one_block() -> anyhow::Result<()> {
    let h = Harness::new();
    let responses = HashMap::from([
        ("external0".into(), Probe::Hits(vec![hit(7, 10)])),
        ("external1".into(), Probe::Hits(vec![])),
        ("external2".into(), Probe::Hits(vec![])),
        ("internal0".into(), Probe::Hits(vec![hit(7, 10)])),
        ("internal1".into(), Probe::Hits(vec![])),
        ("internal2".into(), Probe::Hits(vec![])),
    ]);
    let syncer = h.syncer(2, responses);

    syncer.sync().await?;

    assert_eq!(h.blocks.lock().unwrap().len(), 1);
    assert_eq!(*h.sets.lock().unwrap(), vec![true]);
    Ok(())
}

/// Builder that refuses everything, standing in for malformed index data.
struct FailBuilder;

impl BlockBuilder for FailBuilder {
    fn block(&self, _header_hash: BlockHash, height: u32) -> anyhow::Result<Block> {
        anyhow::bail!("bad block data at height {height}")
    }
}

#[tokio::test]
async fn failed_block_construction_aborts_the_pass() -> anyhow::Result<()> {
    let h = Harness::new();
    let responses = HashMap::from([
        ("external0".into(), Probe::Hits(vec![hit(1, 10)])),
        ("external1".into(), Probe::Hits(vec![])),
        ("external2".into(), Probe::Hits(vec![])),
        ("internal0".into(), Probe::Hits(vec![])),
        ("internal1".into(), Probe::Hits(vec![])),
    ]);
    let syncer = h.syncer_with(FailBuilder, 2, responses);

    assert!(syncer.sync().await.is_err());

    assert_eq!(h.blocks.lock().unwrap().len(), 0, "nothing persisted");
    assert!(h.sets.lock().unwrap().is_empty(), "flag untouched");
    assert_eq!(h.starts.load(Ordering::SeqCst), 0, "peer group not started");
    Ok(())
}
