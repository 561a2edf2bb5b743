//! Background synchronisation of the chain state to the base chain.
//!
//! The [`Sync`] worker parks on the base chain's tip notifications and runs
//! reconciliation steps until the local chain state matches the base chain.
//! Each step fetches a window of blocks, decides whether they extend the
//! local chain, and either applies them or walks backward to find the fork
//! point of a reorg.
//!
//! The fetch window starts small: during normal operation one new block at a
//! time arrives, so requesting two blocks detects both the new tip and
//! whether more are pending. When the local chain turns out to be behind or
//! diverged, the window doubles with every step, so a deep reorg costs a
//! number of fetches logarithmic in its depth rather than linear.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use weir_core::basechain::BaseChain;
use weir_core::chainstate::ChainStore;
use weir_core::error::{FatalError, StoreError, SyncError};
use weir_core::types::BlockData;

/// Upper bound on the adaptive fetch window.
pub const MAX_BLOCKS_PER_FETCH: u64 = 4096;

/// Initial (and steady-state) fetch window.
const INITIAL_BLOCKS_PER_FETCH: u64 = 2;

/// Callbacks invoked by the sync worker.
pub trait SyncCallbacks: Send + Sync {
    /// The chain-state tip changed. `old_tip` is the canonical tip hash
    /// before the transition, or `None` when the genesis block was just
    /// stored. Invoked synchronously: the next transition does not start
    /// until this returns, which is what keeps published event sequences of
    /// consecutive transitions from interleaving.
    fn tip_updated_from(&self, old_tip: Option<&str>);
}

/// Background reconciliation worker.
///
/// Owns the sync cursor (fetch window and backward-probe position); the
/// chain state itself is shared with the controller through the exclusive
/// lock. The lock is only held around state mutation and reads, never
/// across a base-chain fetch.
pub struct Sync<S: ChainStore> {
    base: Arc<dyn BaseChain>,
    store: Arc<Mutex<S>>,
    /// Height the local chain starts at; resolved to a block once the base
    /// chain has it.
    genesis_height: u64,
    callbacks: Arc<dyn SyncCallbacks>,
    /// Run full invariant checks after every applied transition.
    sanity_checks: bool,
    /// Current fetch window.
    num_blocks: u64,
    /// Where to fetch from while probing backward for a fork point;
    /// `None` means "just past the local tip".
    next_start_height: Option<u64>,
}

impl<S: ChainStore> Sync<S> {
    pub fn new(
        base: Arc<dyn BaseChain>,
        store: Arc<Mutex<S>>,
        genesis_height: u64,
        callbacks: Arc<dyn SyncCallbacks>,
    ) -> Self {
        Self {
            base,
            store,
            genesis_height,
            callbacks,
            sanity_checks: false,
            num_blocks: INITIAL_BLOCKS_PER_FETCH,
            next_start_height: None,
        }
    }

    /// Enable slow invariant checks after every transition.
    pub fn enable_sanity_checks(&mut self) {
        self.sanity_checks = true;
    }

    fn bump_window(&mut self) {
        self.num_blocks = (self.num_blocks * 2).min(MAX_BLOCKS_PER_FETCH);
    }

    fn reset_cursor(&mut self) {
        self.num_blocks = INITIAL_BLOCKS_PER_FETCH;
        self.next_start_height = None;
    }

    /// Fetch the configured genesis block and initialise the chain state.
    ///
    /// Returns `false` (without error) while the base chain has not reached
    /// the genesis height yet; the worker retries on the next wakeup.
    async fn retrieve_genesis(&mut self) -> Result<bool, SyncError> {
        let blocks = self.base.get_block_range(self.genesis_height, 1).await?;
        let Some(genesis) = blocks.into_iter().next() else {
            debug!(
                height = self.genesis_height,
                "genesis height not yet on the base chain"
            );
            return Ok(false);
        };
        if genesis.height != self.genesis_height {
            return Err(FatalError::InconsistentBaseChain(format!(
                "requested genesis at height {}, got {}",
                self.genesis_height, genesis.height
            ))
            .into());
        }

        self.store.lock().initialise(&genesis)?;
        info!(hash = %genesis.hash, height = genesis.height, "chain state initialised");
        self.callbacks.tip_updated_from(None);
        Ok(true)
    }

    /// Verify that a fetched range is internally consistent.
    fn validate_range(start: u64, blocks: &[BlockData]) -> Result<(), SyncError> {
        for (i, block) in blocks.iter().enumerate() {
            let expected = start + i as u64;
            if block.height != expected {
                return Err(FatalError::InconsistentBaseChain(format!(
                    "block {} returned at position for height {expected} claims height {}",
                    block.hash, block.height
                ))
                .into());
            }
            if i > 0 && block.parent != blocks[i - 1].hash {
                return Err(FatalError::InconsistentBaseChain(format!(
                    "block {} does not link to predecessor {}",
                    block.hash,
                    blocks[i - 1].hash
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Run a single reconciliation step.
    ///
    /// Returns `true` if another step should run immediately (the local
    /// state may still be behind) and `false` once caught up or when the
    /// next attempt should wait for a notification.
    pub async fn update_step(&mut self) -> Result<bool, SyncError> {
        let range = {
            let store = self.store.lock();
            match (store.tip_height()?, store.low_height()?) {
                (Some(tip), Some(low)) => Some((tip, low)),
                _ => None,
            }
        };
        let Some((tip, low)) = range else {
            return self.retrieve_genesis().await;
        };

        let start = self.next_start_height.unwrap_or(tip + 1);
        let requested = self.num_blocks;
        let blocks = self.base.get_block_range(start, requested).await?;

        if blocks.is_empty() {
            if start > low {
                // Nothing at this height although the local chain extends to
                // it (or we expected new blocks): the base tip may have moved
                // backward. Probe for the fork point like any divergence.
                debug!(start, "no blocks at fetch height, probing backward");
                self.next_start_height = Some(start.saturating_sub(requested).max(low));
                self.bump_window();
                return Ok(true);
            }
            debug!(start, "base chain is behind the retained range, waiting");
            self.reset_cursor();
            return Ok(false);
        }

        Self::validate_range(start, &blocks)?;

        let first = &blocks[0];
        let mut store = self.store.lock();

        let matched = if start <= low {
            // At the retained boundary there is no parent to compare; the
            // fetched block must be the boundary block itself.
            store.get_hash_for_height(start)?.as_deref() == Some(first.hash.as_str())
        } else {
            store.get_hash_for_height(start - 1)?.as_deref() == Some(first.parent.as_str())
        };

        if !matched {
            if start <= low {
                return Err(FatalError::Pruned {
                    height: start.saturating_sub(1),
                    low,
                }
                .into());
            }
            let candidate = start.saturating_sub(requested).max(low);
            debug!(start, next = candidate, "divergence detected, searching fork point");
            self.next_start_height = Some(candidate);
            self.bump_window();
            return Ok(true);
        }

        let old_tip = store
            .get_hash_for_height(tip)?
            .ok_or_else(|| StoreError::Corrupt(format!("no canonical block at tip {tip}")))?;

        for block in &blocks {
            store.set_tip(block)?;
        }
        if self.sanity_checks {
            store.sanity_check()?;
        }
        drop(store);

        let new_tip = &blocks[blocks.len() - 1].hash;
        if old_tip != *new_tip {
            info!(old = %old_tip, new = %new_tip, height = blocks[blocks.len() - 1].height, "tip updated");
            self.callbacks.tip_updated_from(Some(old_tip.as_str()));
        }

        // A full window may be truncated; run another step right away.
        let more = blocks.len() as u64 == requested;
        self.reset_cursor();
        Ok(more)
    }

    /// Run the worker until shutdown.
    ///
    /// Parks on the tip-notification channel when there is no pending work.
    /// Notifications are at-least-once and possibly spurious; a wakeup
    /// without actual new data ends in a no-op step.
    pub async fn run(
        mut self,
        mut tips: broadcast::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("sync worker started");
        let mut more_work = true;
        loop {
            if *shutdown.borrow() {
                break;
            }
            if !more_work {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                    notification = tips.recv() => {
                        match notification {
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => {
                                info!("tip notification channel closed, stopping");
                                break;
                            }
                        }
                    }
                }
            }

            more_work = match self.update_step().await {
                Ok(more) => more,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "fatal sync error, terminating");
                    std::process::exit(1);
                }
                Err(e) => {
                    warn!(error = %e, "sync step failed, waiting before retry");
                    false
                }
            };
        }
        info!("sync worker stopped");
    }
}
