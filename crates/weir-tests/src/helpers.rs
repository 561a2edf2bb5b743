//! Shared test helpers: a simulated base chain and event-stream assertions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use weir_bridge::publisher::{BlockEventKind, GameBlockEvent};
use weir_core::basechain::BaseChain;
use weir_core::chainstate::{ChainStore, MemoryChainStore};
use weir_core::error::BaseChainError;
use weir_core::types::BlockData;

/// How long event assertions wait before declaring a message missing.
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sleep briefly, giving background tasks a chance to run.
pub async fn sleep_some() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

struct ChainInner {
    /// Canonical view of the simulated chain.
    chain: MemoryChainStore,
    /// Every block ever created, canonical or not.
    blocks: HashMap<String, BlockData>,
    /// Counter for generated block hashes.
    hash_counter: u64,
    /// Fake mempool content served via `get_mempool`.
    mempool: Vec<String>,
}

/// An in-process base chain for tests.
///
/// Blocks are created explicitly by the test, the canonical chain is
/// tracked with a [`MemoryChainStore`], and every mutation emits a tip
/// notification, like a real connector listening on its node's
/// notification socket would.
pub struct SimulatedChain {
    inner: Mutex<ChainInner>,
    tips: broadcast::Sender<String>,
}

impl SimulatedChain {
    pub fn new() -> Arc<Self> {
        let (tips, _) = broadcast::channel(64);
        Arc::new(Self {
            inner: Mutex::new(ChainInner {
                chain: MemoryChainStore::new(),
                blocks: HashMap::new(),
                hash_counter: 0,
                mempool: Vec::new(),
            }),
            tips,
        })
    }

    fn next_hash(inner: &mut ChainInner) -> String {
        inner.hash_counter += 1;
        format!("block {}", inner.hash_counter)
    }

    /// Create (but do not attach) a genesis block at the given height.
    pub fn new_genesis(&self, height: u64) -> BlockData {
        let mut inner = self.inner.lock();
        let hash = Self::next_hash(&mut inner);
        BlockData {
            hash: hash.clone(),
            parent: "pregenesis".to_string(),
            height,
            rngseed: hash,
            metadata: serde_json::Value::Null,
            moves: vec![],
        }
    }

    /// Create a block on top of the given parent.
    pub fn new_block_on(&self, parent: &str) -> BlockData {
        let mut inner = self.inner.lock();
        let hash = Self::next_hash(&mut inner);
        let height = inner.blocks[parent].height + 1;
        BlockData {
            hash: hash.clone(),
            parent: parent.to_string(),
            height,
            rngseed: hash,
            metadata: serde_json::Value::Null,
            moves: vec![],
        }
    }

    /// Create a block on top of the current simulated tip.
    pub fn new_block(&self) -> BlockData {
        let parent = {
            let inner = self.inner.lock();
            let tip = inner.chain.tip_height().unwrap().expect("no genesis yet");
            inner.chain.get_hash_for_height(tip).unwrap().unwrap()
        };
        self.new_block_on(&parent)
    }

    /// Install the genesis block and notify.
    pub fn set_genesis(&self, block: BlockData) -> BlockData {
        {
            let mut inner = self.inner.lock();
            inner.blocks.insert(block.hash.clone(), block.clone());
            inner.chain.initialise(&block).unwrap();
        }
        let _ = self.tips.send(block.hash.clone());
        block
    }

    /// Make a block the simulated tip and notify.
    pub fn set_tip(&self, block: BlockData) -> BlockData {
        {
            let mut inner = self.inner.lock();
            inner.blocks.insert(block.hash.clone(), block.clone());
            inner.chain.set_tip(&block).unwrap();
        }
        let _ = self.tips.send(block.hash.clone());
        block
    }

    /// Attach `count` fresh blocks on top of `parent`, making each the tip.
    pub fn attach_branch(&self, parent: &str, count: usize) -> Vec<BlockData> {
        let mut res = Vec::with_capacity(count);
        let mut parent = parent.to_string();
        for _ in 0..count {
            let block = self.set_tip(self.new_block_on(&parent));
            parent = block.hash.clone();
            res.push(block);
        }
        res
    }

    /// Set the fake mempool content.
    pub fn set_mempool(&self, txids: Vec<String>) {
        self.inner.lock().mempool = txids;
    }
}

#[async_trait]
impl BaseChain for SimulatedChain {
    fn start(&self) -> Result<(), BaseChainError> {
        Ok(())
    }

    fn subscribe_tips(&self) -> broadcast::Receiver<String> {
        self.tips.subscribe()
    }

    async fn get_block_range(
        &self,
        start: u64,
        count: u64,
    ) -> Result<Vec<BlockData>, BaseChainError> {
        let inner = self.inner.lock();
        let mut res = Vec::new();
        for h in start..start.saturating_add(count) {
            match inner.chain.get_hash_for_height(h).unwrap() {
                Some(hash) => res.push(inner.blocks[&hash].clone()),
                None => break,
            }
        }
        Ok(res)
    }

    async fn get_mempool(&self) -> Result<Vec<String>, BaseChainError> {
        Ok(self.inner.lock().mempool.clone())
    }

    async fn get_chain(&self) -> Result<String, BaseChainError> {
        Ok("sim".to_string())
    }

    async fn get_version(&self) -> Result<u64, BaseChainError> {
        Ok(1_00_00_00)
    }
}

/// Await the next published event addressed to `game_id`.
pub async fn next_event_for(
    rx: &mut broadcast::Receiver<GameBlockEvent>,
    game_id: &str,
) -> GameBlockEvent {
    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for a published event")
            .expect("event stream closed");
        if event.game_id == game_id {
            return event;
        }
    }
}

/// Expect the given detach events (newest first) followed by the given
/// attach events (oldest first) for one game, all carrying `reqtoken`.
///
/// Only block hashes are verified.
pub async fn expect_events(
    rx: &mut broadcast::Receiver<GameBlockEvent>,
    game_id: &str,
    detach: &[BlockData],
    attach: &[BlockData],
    reqtoken: &str,
) {
    for expected in detach {
        let event = next_event_for(rx, game_id).await;
        assert_eq!(event.kind, BlockEventKind::Detach, "expected a detach event");
        assert_eq!(event.block.hash, expected.hash);
        assert_eq!(event.reqtoken, reqtoken);
    }
    for expected in attach {
        let event = next_event_for(rx, game_id).await;
        assert_eq!(event.kind, BlockEventKind::Attach, "expected an attach event");
        assert_eq!(event.block.hash, expected.hash);
        assert_eq!(event.reqtoken, reqtoken);
    }
}
