//! Bridge composition and lifecycle.
//!
//! The [`Controller`] owns the chain state, the base-chain connector, the
//! publisher, and the tracked-game set. It receives tip updates from the
//! sync worker, turns them into detach/attach event sequences for every
//! tracked game, and answers catch-up requests from the RPC surface.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use weir_core::basechain::BaseChain;
use weir_core::chainstate::ChainStore;
use weir_core::error::{BaseChainError, StoreError, UpdateError, WeirError};
use weir_core::types::BlockData;
use weir_core::updates::{compute_updates, ChainUpdates};

use crate::config::BridgeConfig;
use crate::publisher::{BlockEventKind, GameBlockEvent, Publisher};
use crate::rpc;
use crate::storage::RocksStore;
use crate::sync::{Sync, SyncCallbacks};

/// Summary of a catch-up request, returned to the RPC caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Hash of the tip the published plan ends at.
    pub to_block: String,
    /// Token tagging the published replay.
    pub reqtoken: String,
    /// Number of attach events published.
    pub attach: usize,
    /// Number of detach events published.
    pub detach: usize,
}

/// The bridge composition root.
pub struct Controller {
    store: Arc<Mutex<RocksStore>>,
    base: Arc<dyn BaseChain>,
    publisher: Publisher,
    tracked: Mutex<BTreeSet<String>>,
    config: BridgeConfig,
}

/// Handles to the running background pieces of a started controller.
///
/// Stopping joins the sync worker before the RPC server goes away, so no
/// transition is left half-published.
pub struct ControllerHandle {
    shutdown: watch::Sender<bool>,
    sync_task: JoinHandle<()>,
    rpc: jsonrpsee::server::ServerHandle,
    rpc_addr: SocketAddr,
}

impl ControllerHandle {
    /// Address the RPC server is bound to.
    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// Stop the sync worker and the RPC server.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.sync_task.await {
            error!(error = %e, "sync worker panicked");
        }
        let _ = self.rpc.stop();
        self.rpc.stopped().await;
    }
}

impl Controller {
    /// Create a controller, opening (or creating) the durable chain state.
    pub fn new(base: Arc<dyn BaseChain>, config: BridgeConfig) -> Result<Arc<Self>, WeirError> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| StoreError::Backend(format!("creating data dir: {e}")))?;
        let store = RocksStore::open(config.db_path())?;

        Ok(Arc::new(Self {
            store: Arc::new(Mutex::new(store)),
            base,
            publisher: Publisher::new(config.zmq_address.clone()),
            tracked: Mutex::new(BTreeSet::new()),
            config,
        }))
    }

    /// Start the sync worker and the RPC server.
    ///
    /// The base-chain connector must already have been started (exactly
    /// once) by the embedder; the controller only subscribes to its
    /// notifications.
    pub async fn start(self: &Arc<Self>) -> Result<ControllerHandle, WeirError> {
        let tips = self.base.subscribe_tips();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sync = Sync::new(
            Arc::clone(&self.base),
            Arc::clone(&self.store),
            self.config.genesis_height,
            Arc::clone(self) as Arc<dyn SyncCallbacks>,
        );
        if self.config.sanity_checks {
            sync.enable_sanity_checks();
        }
        let sync_task = tokio::spawn(sync.run(tips, shutdown_rx));

        let (rpc, rpc_addr) =
            rpc::start_rpc_server(&self.config.rpc_addr(), Arc::clone(self)).await?;
        info!(%rpc_addr, zmq = %self.publisher.address(), "bridge started");

        Ok(ControllerHandle {
            shutdown: shutdown_tx,
            sync_task,
            rpc,
            rpc_addr,
        })
    }

    /// The bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Subscribe to the published attach/detach event stream.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<GameBlockEvent> {
        self.publisher.subscribe()
    }

    /// The advertised pub/sub endpoint.
    pub fn zmq_address(&self) -> &str {
        self.publisher.address()
    }

    // --- Tracked games ---

    /// Start publishing updates for a game.
    pub fn track_game(&self, game_id: &str) {
        self.tracked.lock().insert(game_id.to_string());
        debug!(game_id, "tracking game");
    }

    /// Stop publishing updates for a game.
    pub fn untrack_game(&self, game_id: &str) {
        self.tracked.lock().remove(game_id);
        debug!(game_id, "untracked game");
    }

    /// Currently tracked games, sorted.
    pub fn tracked_games(&self) -> Vec<String> {
        self.tracked.lock().iter().cloned().collect()
    }

    // --- Chain-state queries (RPC backend) ---

    /// Current tip as `(height, hash)`.
    pub fn chain_tip(&self) -> Result<(u64, String), StoreError> {
        let store = self.store.lock();
        let tip = store.tip_height()?.ok_or(StoreError::Uninitialised)?;
        let hash = store
            .get_hash_for_height(tip)?
            .ok_or_else(|| StoreError::Corrupt(format!("no canonical block at tip {tip}")))?;
        Ok((tip, hash))
    }

    /// Canonical hash at a height, `None` outside the retained range.
    pub fn block_hash_at(&self, height: u64) -> Result<Option<String>, StoreError> {
        self.store.lock().get_hash_for_height(height)
    }

    /// Full data of a retained block.
    pub fn block_data(&self, hash: &str) -> Result<Option<BlockData>, StoreError> {
        self.store.lock().get_block(hash)
    }

    // --- Base-chain passthroughs ---

    /// Network identifier of the base chain.
    pub async fn base_chain_name(&self) -> Result<String, BaseChainError> {
        self.base.get_chain().await
    }

    /// Interface version reported for this bridge.
    pub async fn base_version(&self) -> Result<u64, BaseChainError> {
        self.base.get_version().await
    }

    /// Mempool of the base chain, if the connector supports it.
    pub async fn base_mempool(&self) -> Result<Vec<String>, BaseChainError> {
        self.base.get_mempool().await
    }

    // --- Update publishing ---

    /// Publish one plan for the given games, all detaches before all
    /// attaches, in plan order.
    fn publish_plan(&self, games: &[String], updates: &ChainUpdates, reqtoken: &str) {
        for block in &updates.detach {
            for game_id in games {
                self.publisher.publish(GameBlockEvent {
                    kind: BlockEventKind::Detach,
                    game_id: game_id.clone(),
                    block: block.clone(),
                    reqtoken: reqtoken.to_string(),
                });
            }
        }
        for block in &updates.attach {
            for game_id in games {
                self.publisher.publish(GameBlockEvent {
                    kind: BlockEventKind::Attach,
                    game_id: game_id.clone(),
                    block: block.clone(),
                    reqtoken: reqtoken.to_string(),
                });
            }
        }
    }

    /// Handle an explicit catch-up request: publish the plan from `from`
    /// tagged with a fresh token and return its summary.
    ///
    /// An empty / absent `from` replays from genesis. Unknown or pruned
    /// starting points are client errors here, in contrast to the live
    /// path where pruned history is fatal.
    pub fn send_updates(
        &self,
        from: Option<&str>,
        game_id: &str,
    ) -> Result<UpdateSummary, UpdateError> {
        let from = from.filter(|s| !s.is_empty());
        let updates = {
            let store = self.store.lock();
            compute_updates(&*store, from)?
        };

        let reqtoken = new_reqtoken();
        info!(
            game_id,
            from = from.unwrap_or("<genesis>"),
            to = %updates.tip_hash,
            attach = updates.attach.len(),
            detach = updates.detach.len(),
            reqtoken = %reqtoken,
            "sending requested updates"
        );
        self.publish_plan(&[game_id.to_string()], &updates, &reqtoken);

        Ok(UpdateSummary {
            to_block: updates.tip_hash.clone(),
            reqtoken,
            attach: updates.attach.len(),
            detach: updates.detach.len(),
        })
    }
}

impl SyncCallbacks for Controller {
    fn tip_updated_from(&self, old_tip: Option<&str>) {
        let updates = {
            let store = self.store.lock();
            compute_updates(&*store, old_tip)
        };
        let updates = match updates {
            Ok(u) => u,
            Err(e) => {
                // The live path must never skip part of a transition; any
                // failure to relate the previous tip to the current chain
                // means the retention policy and the base chain's reorg
                // depth are incompatible.
                error!(error = %e, "cannot compute live update plan, terminating");
                std::process::exit(1);
            }
        };

        let games = self.tracked_games();
        debug!(
            to = %updates.tip_hash,
            attach = updates.attach.len(),
            detach = updates.detach.len(),
            games = games.len(),
            "publishing tip transition"
        );
        self.publish_plan(&games, &updates, "");

        if let Some(depth) = self.config.pruning_depth {
            let mut store = self.store.lock();
            match store.prune(depth + 1) {
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "pruning failed, terminating");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Generate a fresh correlation token for a catch-up request.
fn new_reqtoken() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
