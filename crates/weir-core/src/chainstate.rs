//! Chain-state storage interface and in-memory implementation.
//!
//! Provides the [`ChainStore`] trait for tracking the canonical chain of the
//! base chain through forks and pruning. The [`MemoryChainStore`] is suitable
//! for testing; the production bridge uses RocksDB (weir-bridge).
//!
//! The store keeps one canonical block per height over a contiguous retained
//! range `[low, tip]`, plus every block that was canonical at some point and
//! has not been pruned yet. Stale blocks from reorged-away branches stay
//! retrievable by hash so that catch-up requests starting on such a branch
//! can be resolved.

use std::collections::{BTreeMap, HashMap};

use crate::error::StoreError;
use crate::types::BlockData;

/// Mutable chain-state storage interface.
///
/// Blocks passed to [`set_tip`](ChainStore::set_tip) must already link to the
/// canonical chain; the sync engine is responsible for fetching the full path
/// from the fork point. The store only checks linkage, it never validates
/// base-chain consensus rules.
///
/// Not thread-safe — the bridge serializes all access through a single
/// exclusive lock.
pub trait ChainStore: Send + Sync {
    /// Set the genesis block on fresh storage.
    ///
    /// On storage that already holds a chain this is a no-op if the stored
    /// genesis matches and a [`StoreError::GenesisMismatch`] otherwise (a
    /// configuration error, fatal at startup).
    fn initialise(&mut self, genesis: &BlockData) -> Result<(), StoreError>;

    /// Make `block` the new canonical tip, returning the previous tip hash.
    ///
    /// Walks the block's ancestry backward through retained blocks until it
    /// reaches the canonical chain, then replaces the canonical entries along
    /// that path and discards any entries above the new tip; the discarding
    /// is what detaches a reorged-away branch. The walk only follows blocks
    /// already retained, so the caller must have stored the path from the
    /// fork point (the sync engine does this by applying fetched blocks in
    /// order). Once this returns `Ok` the new state is durable.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Uninitialised`] before [`initialise`](Self::initialise)
    /// - [`StoreError::OutOfRange`] if `height` is below the retained range
    /// - [`StoreError::InvalidParent`] if the ancestry does not link back to
    ///   a still-retained canonical block
    fn set_tip(&mut self, block: &BlockData) -> Result<String, StoreError>;

    /// Canonical block hash at `height`, or `None` outside `[low, tip]`.
    fn get_hash_for_height(&self, height: u64) -> Result<Option<String>, StoreError>;

    /// Height of a retained block (canonical or stale), `None` if unknown.
    fn get_height_for_hash(&self, hash: &str) -> Result<Option<u64>, StoreError>;

    /// Full data of a retained block, `None` if unknown or pruned.
    fn get_block(&self, hash: &str) -> Result<Option<BlockData>, StoreError>;

    /// Height of the current tip, `None` on an empty store.
    fn tip_height(&self) -> Result<Option<u64>, StoreError>;

    /// Lowest retained height, `None` on an empty store.
    fn low_height(&self) -> Result<Option<u64>, StoreError>;

    /// Genesis `(hash, height)` as configured at initialisation. Survives
    /// pruning of the genesis block itself.
    fn genesis(&self) -> Result<Option<(String, u64)>, StoreError>;

    /// Whether no blocks have been stored yet.
    fn is_empty(&self) -> bool;

    /// Discard history so that only the last `keep` canonical heights remain.
    ///
    /// Advances the retained lower boundary to `max(low, tip - keep + 1)` and
    /// deletes every block (canonical or stale) below it. Irreversible.
    /// Returns the number of blocks discarded. `keep` is clamped to at
    /// least 1.
    fn prune(&mut self, keep: u64) -> Result<u64, StoreError>;

    /// Walk the full retained range and verify the store invariants:
    /// contiguity, height consistency, and parent linkage. Used by the
    /// sanity-check toggle in tests and debugging deployments.
    fn sanity_check(&self) -> Result<(), StoreError>;
}

/// In-memory chain-state store for testing.
///
/// Stores everything in maps with no persistence. Not suitable for
/// production use (no crash recovery).
pub struct MemoryChainStore {
    /// All retained blocks by hash, including stale branches.
    blocks: HashMap<String, BlockData>,
    /// Canonical chain: height → block hash, covering `[low, tip]`.
    canonical: BTreeMap<u64, String>,
    /// Genesis hash and height, fixed at initialisation.
    genesis: Option<(String, u64)>,
    /// Lowest retained height.
    low: u64,
    /// Current tip height.
    tip: u64,
}

impl MemoryChainStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            canonical: BTreeMap::new(),
            genesis: None,
            low: 0,
            tip: 0,
        }
    }

    /// Number of retained blocks, including stale branches.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for MemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainStore for MemoryChainStore {
    fn initialise(&mut self, genesis: &BlockData) -> Result<(), StoreError> {
        if let Some((stored_hash, _)) = &self.genesis {
            if *stored_hash != genesis.hash {
                return Err(StoreError::GenesisMismatch {
                    stored: stored_hash.clone(),
                    supplied: genesis.hash.clone(),
                });
            }
            return Ok(());
        }

        self.blocks.insert(genesis.hash.clone(), genesis.clone());
        self.canonical.insert(genesis.height, genesis.hash.clone());
        self.genesis = Some((genesis.hash.clone(), genesis.height));
        self.low = genesis.height;
        self.tip = genesis.height;
        Ok(())
    }

    fn set_tip(&mut self, block: &BlockData) -> Result<String, StoreError> {
        if self.genesis.is_none() {
            return Err(StoreError::Uninitialised);
        }

        let old_tip = self
            .canonical
            .get(&self.tip)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("no canonical block at tip {}", self.tip)))?;

        if block.height < self.low {
            return Err(StoreError::OutOfRange {
                height: block.height,
                low: self.low,
                tip: self.tip,
            });
        }

        // Walk the ancestry down to the fork point. The path collects every
        // block that has to become canonical, newest first.
        let mut path = vec![block.clone()];
        loop {
            let cur = path.last().unwrap();
            if cur.height == self.low {
                // At the retained boundary there is no parent left to check;
                // only the boundary block itself may sit here.
                if self.canonical.get(&self.low) != Some(&cur.hash) {
                    return Err(StoreError::InvalidParent {
                        hash: cur.hash.clone(),
                        height: cur.height,
                    });
                }
                break;
            }
            if self.canonical.get(&(cur.height - 1)) == Some(&cur.parent) {
                break;
            }
            let parent = match self.blocks.get(&cur.parent) {
                Some(p) if p.height == cur.height - 1 => p.clone(),
                _ => {
                    return Err(StoreError::InvalidParent {
                        hash: cur.hash.clone(),
                        height: cur.height,
                    });
                }
            };
            path.push(parent);
        }

        self.blocks.insert(block.hash.clone(), block.clone());
        self.canonical.split_off(&(block.height + 1));
        for p in &path {
            self.canonical.insert(p.height, p.hash.clone());
        }
        self.tip = block.height;

        Ok(old_tip)
    }

    fn get_hash_for_height(&self, height: u64) -> Result<Option<String>, StoreError> {
        Ok(self.canonical.get(&height).cloned())
    }

    fn get_height_for_hash(&self, hash: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.blocks.get(hash).map(|b| b.height))
    }

    fn get_block(&self, hash: &str) -> Result<Option<BlockData>, StoreError> {
        Ok(self.blocks.get(hash).cloned())
    }

    fn tip_height(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.genesis.as_ref().map(|_| self.tip))
    }

    fn low_height(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.genesis.as_ref().map(|_| self.low))
    }

    fn genesis(&self) -> Result<Option<(String, u64)>, StoreError> {
        Ok(self.genesis.clone())
    }

    fn is_empty(&self) -> bool {
        self.genesis.is_none()
    }

    fn prune(&mut self, keep: u64) -> Result<u64, StoreError> {
        if self.genesis.is_none() {
            return Ok(0);
        }

        let keep = keep.max(1);
        let cutoff = (self.tip + 1).saturating_sub(keep);
        if cutoff <= self.low {
            return Ok(0);
        }

        let mut discarded = 0;
        self.blocks.retain(|_, b| {
            if b.height < cutoff {
                discarded += 1;
                false
            } else {
                true
            }
        });
        self.canonical = self.canonical.split_off(&cutoff);
        self.low = cutoff;

        Ok(discarded)
    }

    fn sanity_check(&self) -> Result<(), StoreError> {
        if self.genesis.is_none() {
            return Ok(());
        }

        let mut prev_hash: Option<&String> = None;
        for h in self.low..=self.tip {
            let hash = self.canonical.get(&h).ok_or_else(|| {
                StoreError::Corrupt(format!("missing canonical entry at height {h}"))
            })?;
            let block = self
                .blocks
                .get(hash)
                .ok_or_else(|| StoreError::Corrupt(format!("missing block data for {hash}")))?;
            if block.height != h {
                return Err(StoreError::Corrupt(format!(
                    "block {hash} stored at height {h} claims height {}",
                    block.height
                )));
            }
            if let Some(prev) = prev_hash {
                if block.parent != *prev {
                    return Err(StoreError::Corrupt(format!(
                        "block {hash} at height {h} does not link to its predecessor"
                    )));
                }
            }
            prev_hash = Some(hash);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Build a block with the given identity and linkage.
    fn blk(hash: &str, parent: &str, height: u64) -> BlockData {
        BlockData {
            hash: hash.to_string(),
            parent: parent.to_string(),
            height,
            rngseed: hash.to_string(),
            metadata: serde_json::Value::Null,
            moves: vec![],
        }
    }

    /// A store initialised with a genesis at height 10 and the chain
    /// g - a - b on top of it.
    fn store_with_chain() -> MemoryChainStore {
        let mut store = MemoryChainStore::new();
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        store.set_tip(&blk("a", "g", 11)).unwrap();
        store.set_tip(&blk("b", "a", 12)).unwrap();
        store
    }

    // ------------------------------------------------------------------
    // Empty store
    // ------------------------------------------------------------------

    #[test]
    fn new_store_is_empty() {
        let store = MemoryChainStore::new();
        assert!(store.is_empty());
        assert_eq!(store.tip_height().unwrap(), None);
        assert_eq!(store.low_height().unwrap(), None);
        assert_eq!(store.genesis().unwrap(), None);
        assert_eq!(store.block_count(), 0);
    }

    #[test]
    fn set_tip_on_empty_store_fails() {
        let mut store = MemoryChainStore::new();
        let err = store.set_tip(&blk("a", "g", 11)).unwrap_err();
        assert_eq!(err, StoreError::Uninitialised);
    }

    // ------------------------------------------------------------------
    // Initialise
    // ------------------------------------------------------------------

    #[test]
    fn initialise_sets_genesis_range() {
        let mut store = MemoryChainStore::new();
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();

        assert!(!store.is_empty());
        assert_eq!(store.tip_height().unwrap(), Some(10));
        assert_eq!(store.low_height().unwrap(), Some(10));
        assert_eq!(store.genesis().unwrap(), Some(("g".to_string(), 10)));
        assert_eq!(store.get_hash_for_height(10).unwrap(), Some("g".to_string()));
    }

    #[test]
    fn initialise_again_with_same_genesis_is_noop() {
        let mut store = store_with_chain();
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        // The existing chain is untouched.
        assert_eq!(store.tip_height().unwrap(), Some(12));
    }

    #[test]
    fn initialise_with_different_genesis_fails() {
        let mut store = store_with_chain();
        let err = store.initialise(&blk("other", "pregenesis", 10)).unwrap_err();
        assert_eq!(
            err,
            StoreError::GenesisMismatch {
                stored: "g".to_string(),
                supplied: "other".to_string(),
            }
        );
    }

    // ------------------------------------------------------------------
    // set_tip: linear growth
    // ------------------------------------------------------------------

    #[test]
    fn set_tip_extends_chain() {
        let mut store = MemoryChainStore::new();
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();

        let old = store.set_tip(&blk("a", "g", 11)).unwrap();
        assert_eq!(old, "g");
        let old = store.set_tip(&blk("b", "a", 12)).unwrap();
        assert_eq!(old, "a");

        assert_eq!(store.tip_height().unwrap(), Some(12));
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a".to_string()));
        assert_eq!(store.get_hash_for_height(12).unwrap(), Some("b".to_string()));
        assert_eq!(store.get_hash_for_height(13).unwrap(), None);
    }

    #[test]
    fn set_tip_rejects_broken_linkage() {
        let mut store = store_with_chain();
        let err = store.set_tip(&blk("c", "not-b", 13)).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidParent { hash: "c".to_string(), height: 13 }
        );
    }

    #[test]
    fn set_tip_rejects_gap() {
        let mut store = store_with_chain();
        // Nothing retained at height 14, so the ancestry walk cannot link.
        let err = store.set_tip(&blk("far", "b", 15)).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidParent { hash: "far".to_string(), height: 15 }
        );
    }

    // ------------------------------------------------------------------
    // set_tip: reorgs
    // ------------------------------------------------------------------

    #[test]
    fn set_tip_replaces_branch() {
        let mut store = store_with_chain();

        // Reorg to a', b' forking off genesis.
        let old = store.set_tip(&blk("a2", "g", 11)).unwrap();
        assert_eq!(old, "b");
        store.set_tip(&blk("b2", "a2", 12)).unwrap();

        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a2".to_string()));
        assert_eq!(store.get_hash_for_height(12).unwrap(), Some("b2".to_string()));
        assert_eq!(store.tip_height().unwrap(), Some(12));
    }

    #[test]
    fn set_tip_to_lower_height_truncates() {
        let mut store = store_with_chain();

        // Reorg back to a one-block chain on top of genesis.
        let old = store.set_tip(&blk("a2", "g", 11)).unwrap();
        assert_eq!(old, "b");

        assert_eq!(store.tip_height().unwrap(), Some(11));
        assert_eq!(store.get_hash_for_height(12).unwrap(), None);
    }

    #[test]
    fn set_tip_back_to_genesis() {
        let mut store = store_with_chain();
        let old = store.set_tip(&blk("g", "pregenesis", 10)).unwrap();
        assert_eq!(old, "b");
        assert_eq!(store.tip_height().unwrap(), Some(10));
        assert_eq!(store.get_hash_for_height(11).unwrap(), None);
    }

    #[test]
    fn set_tip_to_foreign_boundary_block_fails() {
        let mut store = store_with_chain();
        let err = store.set_tip(&blk("g2", "pregenesis", 10)).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidParent { hash: "g2".to_string(), height: 10 }
        );
    }

    #[test]
    fn set_tip_onto_retained_branch_walks_ancestry() {
        let mut store = store_with_chain();
        store.set_tip(&blk("a2", "g", 11)).unwrap();

        // Jump back onto the old branch via a child of the stale b: the walk
        // has to re-canonicalise a and b along the way.
        let old = store.set_tip(&blk("c", "b", 13)).unwrap();
        assert_eq!(old, "a2");
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a".to_string()));
        assert_eq!(store.get_hash_for_height(12).unwrap(), Some("b".to_string()));
        assert_eq!(store.get_hash_for_height(13).unwrap(), Some("c".to_string()));
        store.sanity_check().unwrap();
    }

    #[test]
    fn stale_branch_remains_retrievable() {
        let mut store = store_with_chain();
        store.set_tip(&blk("a2", "g", 11)).unwrap();

        // The replaced blocks are still known by hash with their heights.
        assert_eq!(store.get_height_for_hash("a").unwrap(), Some(11));
        assert_eq!(store.get_height_for_hash("b").unwrap(), Some(12));
        assert_eq!(store.get_block("b").unwrap().unwrap().parent, "a");
        // But they are no longer canonical.
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a2".to_string()));
    }

    // ------------------------------------------------------------------
    // Pruning
    // ------------------------------------------------------------------

    #[test]
    fn prune_advances_low_and_discards() {
        let mut store = store_with_chain();

        let discarded = store.prune(2).unwrap();
        assert_eq!(discarded, 1); // genesis dropped, a and b kept

        assert_eq!(store.low_height().unwrap(), Some(11));
        assert_eq!(store.get_hash_for_height(10).unwrap(), None);
        assert_eq!(store.get_height_for_hash("g").unwrap(), None);
        assert_eq!(store.get_block("g").unwrap(), None);
        // Genesis metadata survives the block itself.
        assert_eq!(store.genesis().unwrap(), Some(("g".to_string(), 10)));
    }

    #[test]
    fn prune_discards_stale_branches_below_boundary() {
        let mut store = store_with_chain();
        store.set_tip(&blk("a2", "g", 11)).unwrap();
        store.set_tip(&blk("b2", "a2", 12)).unwrap();

        store.prune(1).unwrap();
        assert_eq!(store.low_height().unwrap(), Some(12));
        // Both the stale a and the once-canonical a2 at height 11 are gone.
        assert_eq!(store.get_height_for_hash("a").unwrap(), None);
        assert_eq!(store.get_height_for_hash("a2").unwrap(), None);
        assert_eq!(store.get_height_for_hash("b2").unwrap(), Some(12));
    }

    #[test]
    fn prune_is_monotone() {
        let mut store = store_with_chain();
        store.prune(1).unwrap();
        assert_eq!(store.low_height().unwrap(), Some(12));

        // Asking to keep more blocks again never lowers the boundary.
        assert_eq!(store.prune(10).unwrap(), 0);
        assert_eq!(store.low_height().unwrap(), Some(12));
    }

    #[test]
    fn prune_keeping_more_than_chain_is_noop() {
        let mut store = store_with_chain();
        assert_eq!(store.prune(100).unwrap(), 0);
        assert_eq!(store.low_height().unwrap(), Some(10));
    }

    #[test]
    fn set_tip_below_pruned_boundary_fails() {
        let mut store = store_with_chain();
        store.prune(1).unwrap();

        let err = store.set_tip(&blk("a3", "g", 11)).unwrap_err();
        assert_eq!(err, StoreError::OutOfRange { height: 11, low: 12, tip: 12 });
    }

    #[test]
    fn tip_can_be_reset_at_boundary_after_prune() {
        let mut store = store_with_chain();
        store.prune(1).unwrap();

        // Re-setting the boundary block itself as tip is allowed.
        let old = store.set_tip(&blk("b", "a", 12)).unwrap();
        assert_eq!(old, "b");
        assert_eq!(store.tip_height().unwrap(), Some(12));
    }

    // ------------------------------------------------------------------
    // Sanity check
    // ------------------------------------------------------------------

    #[test]
    fn sanity_check_accepts_valid_chain() {
        let store = store_with_chain();
        store.sanity_check().unwrap();
    }

    #[test]
    fn sanity_check_accepts_empty_store() {
        let store = MemoryChainStore::new();
        store.sanity_check().unwrap();
    }

    #[test]
    fn sanity_check_after_reorg_and_prune() {
        let mut store = store_with_chain();
        store.set_tip(&blk("a2", "g", 11)).unwrap();
        store.set_tip(&blk("b2", "a2", 12)).unwrap();
        store.prune(2).unwrap();
        store.sanity_check().unwrap();
    }
}
