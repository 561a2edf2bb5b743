//! RocksDB-backed persistent chain state.
//!
//! Implements [`ChainStore`] using column families for block data, the
//! canonical height index, a height-ordered block index (for pruning), and
//! metadata. Every mutation goes through one atomic [`WriteBatch`], so a
//! crash between operations never leaves a half-applied tip update; on
//! restart the bridge resumes from exactly the last committed state.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};

use weir_core::chainstate::ChainStore;
use weir_core::error::StoreError;
use weir_core::types::BlockData;

// --- Column family names ---

const CF_BLOCKS: &str = "blocks";
const CF_CANONICAL: &str = "canonical";
const CF_BLOCK_HEIGHTS: &str = "block_heights";
const CF_METADATA: &str = "metadata";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_BLOCKS, CF_CANONICAL, CF_BLOCK_HEIGHTS, CF_METADATA];

// --- Metadata keys ---

const META_GENESIS_HASH: &[u8] = b"genesis_hash";
const META_GENESIS_HEIGHT: &[u8] = b"genesis_height";
const META_TIP_HEIGHT: &[u8] = b"tip_height";
const META_LOW_HEIGHT: &[u8] = b"low_height";

/// RocksDB-backed persistent chain state.
///
/// Column families:
/// - `blocks`: hash → JSON-encoded [`BlockData`] for every retained block,
///   including stale branches.
/// - `canonical`: big-endian height → hash, covering `[low, tip]`.
/// - `block_heights`: big-endian height ‖ hash → (), ordering all retained
///   blocks by height so pruning can walk them oldest-first.
/// - `metadata`: genesis identity and the retained range boundaries.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db })
    }

    // --- Internal helpers ---

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family: {name}")))
    }

    /// Encode a height as big-endian bytes for ordered iteration.
    fn height_key(height: u64) -> [u8; 8] {
        height.to_be_bytes()
    }

    /// Key in the height-ordered block index: height ‖ hash.
    fn block_height_key(height: u64, hash: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + hash.len());
        key.extend_from_slice(&height.to_be_bytes());
        key.extend_from_slice(hash.as_bytes());
        key
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let cf = self.cf_handle(CF_METADATA)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn get_meta_u64(&self, key: &[u8]) -> Result<Option<u64>, StoreError> {
        match self.get_meta(key)? {
            Some(bytes) if bytes.len() == 8 => {
                Ok(Some(u64::from_le_bytes(bytes.try_into().unwrap())))
            }
            Some(_) => Err(StoreError::Corrupt("invalid metadata value length".into())),
            None => Ok(None),
        }
    }

    fn get_meta_string(&self, key: &[u8]) -> Result<Option<String>, StoreError> {
        match self.get_meta(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Corrupt("invalid metadata string".into())),
            None => Ok(None),
        }
    }

    fn decode_block(bytes: &[u8]) -> Result<BlockData, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn encode_block(block: &BlockData) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(block).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Retained range as `(low, tip)`, or `None` on an empty store.
    fn range(&self) -> Result<Option<(u64, u64)>, StoreError> {
        let Some(low) = self.get_meta_u64(META_LOW_HEIGHT)? else {
            return Ok(None);
        };
        let tip = self
            .get_meta_u64(META_TIP_HEIGHT)?
            .ok_or_else(|| StoreError::Corrupt("low height without tip height".into()))?;
        Ok(Some((low, tip)))
    }
}

impl ChainStore for RocksStore {
    fn initialise(&mut self, genesis: &BlockData) -> Result<(), StoreError> {
        if let Some(stored) = self.get_meta_string(META_GENESIS_HASH)? {
            if stored != genesis.hash {
                return Err(StoreError::GenesisMismatch {
                    stored,
                    supplied: genesis.hash.clone(),
                });
            }
            return Ok(());
        }

        let cf_blocks = self.cf_handle(CF_BLOCKS)?;
        let cf_canonical = self.cf_handle(CF_CANONICAL)?;
        let cf_heights = self.cf_handle(CF_BLOCK_HEIGHTS)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, genesis.hash.as_bytes(), Self::encode_block(genesis)?);
        batch.put_cf(
            cf_canonical,
            Self::height_key(genesis.height),
            genesis.hash.as_bytes(),
        );
        batch.put_cf(cf_heights, Self::block_height_key(genesis.height, &genesis.hash), []);
        batch.put_cf(cf_meta, META_GENESIS_HASH, genesis.hash.as_bytes());
        batch.put_cf(cf_meta, META_GENESIS_HEIGHT, genesis.height.to_le_bytes());
        batch.put_cf(cf_meta, META_TIP_HEIGHT, genesis.height.to_le_bytes());
        batch.put_cf(cf_meta, META_LOW_HEIGHT, genesis.height.to_le_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn set_tip(&mut self, block: &BlockData) -> Result<String, StoreError> {
        let (low, tip) = self.range()?.ok_or(StoreError::Uninitialised)?;

        let old_tip = self
            .get_hash_for_height(tip)?
            .ok_or_else(|| StoreError::Corrupt(format!("no canonical block at tip {tip}")))?;

        if block.height < low {
            return Err(StoreError::OutOfRange {
                height: block.height,
                low,
                tip,
            });
        }

        // Walk the ancestry down to the fork point. The path collects every
        // block that has to become canonical, newest first; all of it except
        // the new tip itself is already retained.
        let mut path = vec![block.clone()];
        loop {
            let cur = path.last().unwrap();
            if cur.height == low {
                // At the retained boundary there is no parent left to check;
                // only the boundary block itself may sit here.
                if self.get_hash_for_height(low)?.as_deref() != Some(cur.hash.as_str()) {
                    return Err(StoreError::InvalidParent {
                        hash: cur.hash.clone(),
                        height: cur.height,
                    });
                }
                break;
            }
            if self.get_hash_for_height(cur.height - 1)?.as_deref() == Some(cur.parent.as_str()) {
                break;
            }
            let parent = match self.get_block(&cur.parent)? {
                Some(p) if p.height == cur.height - 1 => p,
                _ => {
                    return Err(StoreError::InvalidParent {
                        hash: cur.hash.clone(),
                        height: cur.height,
                    });
                }
            };
            path.push(parent);
        }

        let cf_blocks = self.cf_handle(CF_BLOCKS)?;
        let cf_canonical = self.cf_handle(CF_CANONICAL)?;
        let cf_heights = self.cf_handle(CF_BLOCK_HEIGHTS)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, block.hash.as_bytes(), Self::encode_block(block)?);
        batch.put_cf(cf_heights, Self::block_height_key(block.height, &block.hash), []);

        // Truncating the canonical index above the new tip is what detaches
        // a replaced branch; its blocks stay retrievable by hash.
        for h in (block.height + 1)..=tip {
            batch.delete_cf(cf_canonical, Self::height_key(h));
        }
        for p in &path {
            batch.put_cf(cf_canonical, Self::height_key(p.height), p.hash.as_bytes());
        }
        batch.put_cf(cf_meta, META_TIP_HEIGHT, block.height.to_le_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(old_tip)
    }

    fn get_hash_for_height(&self, height: u64) -> Result<Option<String>, StoreError> {
        let cf = self.cf_handle(CF_CANONICAL)?;
        match self
            .db
            .get_cf(&cf, Self::height_key(height))
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Corrupt("invalid canonical hash".into())),
            None => Ok(None),
        }
    }

    fn get_height_for_hash(&self, hash: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.get_block(hash)?.map(|b| b.height))
    }

    fn get_block(&self, hash: &str) -> Result<Option<BlockData>, StoreError> {
        let cf = self.cf_handle(CF_BLOCKS)?;
        match self
            .db
            .get_cf(&cf, hash.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    fn tip_height(&self) -> Result<Option<u64>, StoreError> {
        self.get_meta_u64(META_TIP_HEIGHT)
    }

    fn low_height(&self) -> Result<Option<u64>, StoreError> {
        self.get_meta_u64(META_LOW_HEIGHT)
    }

    fn genesis(&self) -> Result<Option<(String, u64)>, StoreError> {
        let Some(hash) = self.get_meta_string(META_GENESIS_HASH)? else {
            return Ok(None);
        };
        let height = self
            .get_meta_u64(META_GENESIS_HEIGHT)?
            .ok_or_else(|| StoreError::Corrupt("genesis hash without height".into()))?;
        Ok(Some((hash, height)))
    }

    fn is_empty(&self) -> bool {
        matches!(self.get_meta(META_GENESIS_HASH), Ok(None))
    }

    fn prune(&mut self, keep: u64) -> Result<u64, StoreError> {
        let Some((low, tip)) = self.range()? else {
            return Ok(0);
        };

        let keep = keep.max(1);
        let cutoff = (tip + 1).saturating_sub(keep);
        if cutoff <= low {
            return Ok(0);
        }

        let cf_blocks = self.cf_handle(CF_BLOCKS)?;
        let cf_canonical = self.cf_handle(CF_CANONICAL)?;
        let cf_heights = self.cf_handle(CF_BLOCK_HEIGHTS)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;

        let mut batch = WriteBatch::default();
        let mut discarded = 0u64;

        // The height-ordered index yields all blocks below the cutoff,
        // stale branches included, without scanning the whole block space.
        let iter = self.db.iterator_cf(&cf_heights, IteratorMode::Start);
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            if key.len() < 8 {
                return Err(StoreError::Corrupt("invalid block-height key".into()));
            }
            let height = u64::from_be_bytes(key[..8].try_into().unwrap());
            if height >= cutoff {
                break;
            }
            let hash = std::str::from_utf8(&key[8..])
                .map_err(|_| StoreError::Corrupt("invalid block-height key".into()))?;
            batch.delete_cf(cf_blocks, hash.as_bytes());
            batch.delete_cf(cf_heights, &key);
            discarded += 1;
        }

        for h in low..cutoff {
            batch.delete_cf(cf_canonical, Self::height_key(h));
        }
        batch.put_cf(cf_meta, META_LOW_HEIGHT, cutoff.to_le_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::info!(cutoff, discarded, "pruned chain state");
        Ok(discarded)
    }

    fn sanity_check(&self) -> Result<(), StoreError> {
        let Some((low, tip)) = self.range()? else {
            return Ok(());
        };

        let cf = self.cf_handle(CF_CANONICAL)?;
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&Self::height_key(low), Direction::Forward),
        );

        let mut expected = low;
        let mut prev_hash: Option<String> = None;
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            if key.len() != 8 {
                return Err(StoreError::Corrupt("invalid canonical key".into()));
            }
            let height = u64::from_be_bytes(key[..8].try_into().unwrap());
            if height != expected {
                return Err(StoreError::Corrupt(format!(
                    "gap in canonical chain: expected height {expected}, found {height}"
                )));
            }
            let hash = String::from_utf8(value.to_vec())
                .map_err(|_| StoreError::Corrupt("invalid canonical hash".into()))?;
            let block = self
                .get_block(&hash)?
                .ok_or_else(|| StoreError::Corrupt(format!("missing block data for {hash}")))?;
            if block.height != height {
                return Err(StoreError::Corrupt(format!(
                    "block {hash} stored at height {height} claims height {}",
                    block.height
                )));
            }
            if let Some(prev) = &prev_hash {
                if block.parent != *prev {
                    return Err(StoreError::Corrupt(format!(
                        "block {hash} at height {height} does not link to its predecessor"
                    )));
                }
            }
            prev_hash = Some(hash);
            expected += 1;
        }

        if expected != tip + 1 {
            return Err(StoreError::Corrupt(format!(
                "canonical chain ends at {} but tip is {tip}",
                expected.saturating_sub(1)
            )));
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

    /// Create a temporary RocksStore.
    fn temp_store() -> (RocksStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path().join("chainstate")).unwrap();
        (store, dir)
    }

    fn blk(hash: &str, parent: &str, height: u64) -> BlockData {
        BlockData {
            hash: hash.to_string(),
            parent: parent.to_string(),
            height,
            rngseed: hash.to_string(),
            metadata: serde_json::json!({"timestamp": height * 60}),
            moves: vec![],
        }
    }

    /// Initialise with genesis g(10) and extend with a, b.
    fn fill_chain(store: &mut RocksStore) {
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        store.set_tip(&blk("a", "g", 11)).unwrap();
        store.set_tip(&blk("b", "a", 12)).unwrap();
    }

    // ------------------------------------------------------------------
    // Fresh store
    // ------------------------------------------------------------------

    #[test]
    fn fresh_store_is_empty() {
        let (store, _dir) = temp_store();
        assert!(store.is_empty());
        assert_eq!(store.tip_height().unwrap(), None);
        assert_eq!(store.genesis().unwrap(), None);
    }

    #[test]
    fn set_tip_before_initialise_fails() {
        let (mut store, _dir) = temp_store();
        let err = store.set_tip(&blk("a", "g", 11)).unwrap_err();
        assert_eq!(err, StoreError::Uninitialised);
    }

    // ------------------------------------------------------------------
    // Initialise and extend
    // ------------------------------------------------------------------

    #[test]
    fn initialise_and_extend() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);

        assert_eq!(store.tip_height().unwrap(), Some(12));
        assert_eq!(store.low_height().unwrap(), Some(10));
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a".to_string()));
        assert_eq!(store.get_height_for_hash("b").unwrap(), Some(12));
        assert_eq!(store.get_block("a").unwrap().unwrap().parent, "g");
        store.sanity_check().unwrap();
    }

    #[test]
    fn set_tip_returns_previous_tip() {
        let (mut store, _dir) = temp_store();
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        assert_eq!(store.set_tip(&blk("a", "g", 11)).unwrap(), "g");
        assert_eq!(store.set_tip(&blk("b", "a", 12)).unwrap(), "a");
    }

    #[test]
    fn set_tip_rejects_unlinked_block() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        let err = store.set_tip(&blk("c", "not-b", 13)).unwrap_err();
        assert_eq!(err, StoreError::InvalidParent { hash: "c".to_string(), height: 13 });
    }

    #[test]
    fn set_tip_rejects_gap() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        // Nothing retained at height 19, so the ancestry walk cannot link.
        let err = store.set_tip(&blk("far", "b", 20)).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidParent { hash: "far".to_string(), height: 20 }
        );
    }

    // ------------------------------------------------------------------
    // Reorgs
    // ------------------------------------------------------------------

    #[test]
    fn reorg_truncates_and_keeps_stale_blocks() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);

        let old = store.set_tip(&blk("a2", "g", 11)).unwrap();
        assert_eq!(old, "b");
        store.set_tip(&blk("b2", "a2", 12)).unwrap();

        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a2".to_string()));
        assert_eq!(store.get_hash_for_height(12).unwrap(), Some("b2".to_string()));
        // The replaced branch stays retrievable by hash.
        assert_eq!(store.get_height_for_hash("a").unwrap(), Some(11));
        assert_eq!(store.get_height_for_hash("b").unwrap(), Some(12));
        store.sanity_check().unwrap();
    }

    #[test]
    fn set_tip_onto_retained_branch_walks_ancestry() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        store.set_tip(&blk("a2", "g", 11)).unwrap();

        // Jump back onto the old branch via a child of the stale b.
        let old = store.set_tip(&blk("c", "b", 13)).unwrap();
        assert_eq!(old, "a2");
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a".to_string()));
        assert_eq!(store.get_hash_for_height(12).unwrap(), Some("b".to_string()));
        assert_eq!(store.get_hash_for_height(13).unwrap(), Some("c".to_string()));
        store.sanity_check().unwrap();
    }

    #[test]
    fn reorg_to_lower_tip() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);

        store.set_tip(&blk("g", "pregenesis", 10)).unwrap();
        assert_eq!(store.tip_height().unwrap(), Some(10));
        assert_eq!(store.get_hash_for_height(11).unwrap(), None);
        assert_eq!(store.get_hash_for_height(12).unwrap(), None);
        store.sanity_check().unwrap();
    }

    // ------------------------------------------------------------------
    // Genesis handling
    // ------------------------------------------------------------------

    #[test]
    fn initialise_twice_same_genesis_is_noop() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        assert_eq!(store.tip_height().unwrap(), Some(12));
    }

    #[test]
    fn initialise_with_different_genesis_fails() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        let err = store.initialise(&blk("g2", "pregenesis", 10)).unwrap_err();
        assert!(matches!(err, StoreError::GenesisMismatch { .. }));
    }

    // ------------------------------------------------------------------
    // Durability
    // ------------------------------------------------------------------

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chainstate");

        {
            let mut store = RocksStore::open(&path).unwrap();
            store.initialise(&blk("g", "pregenesis", 10)).unwrap();
            store.set_tip(&blk("a", "g", 11)).unwrap();
            store.set_tip(&blk("b", "a", 12)).unwrap();
            store.set_tip(&blk("a2", "g", 11)).unwrap();
        }

        let store = RocksStore::open(&path).unwrap();
        assert_eq!(store.tip_height().unwrap(), Some(11));
        assert_eq!(store.get_hash_for_height(11).unwrap(), Some("a2".to_string()));
        assert_eq!(store.genesis().unwrap(), Some(("g".to_string(), 10)));
        // Stale blocks survive too.
        assert_eq!(store.get_height_for_hash("b").unwrap(), Some(12));
        store.sanity_check().unwrap();
    }

    #[test]
    fn reopen_with_different_genesis_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chainstate");

        {
            let mut store = RocksStore::open(&path).unwrap();
            store.initialise(&blk("g", "pregenesis", 10)).unwrap();
        }

        let mut store = RocksStore::open(&path).unwrap();
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
    // Pruning
    // ------------------------------------------------------------------

    #[test]
    fn prune_discards_below_boundary() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);

        let discarded = store.prune(2).unwrap();
        assert_eq!(discarded, 1);
        assert_eq!(store.low_height().unwrap(), Some(11));
        assert_eq!(store.get_hash_for_height(10).unwrap(), None);
        assert_eq!(store.get_block("g").unwrap(), None);
        // Genesis identity outlives its block data.
        assert_eq!(store.genesis().unwrap(), Some(("g".to_string(), 10)));
        store.sanity_check().unwrap();
    }

    #[test]
    fn prune_discards_stale_branches() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        store.set_tip(&blk("a2", "g", 11)).unwrap();
        store.set_tip(&blk("b2", "a2", 12)).unwrap();

        store.prune(1).unwrap();
        assert_eq!(store.low_height().unwrap(), Some(12));
        assert_eq!(store.get_height_for_hash("a").unwrap(), None);
        assert_eq!(store.get_height_for_hash("a2").unwrap(), None);
        assert_eq!(store.get_height_for_hash("b").unwrap(), None);
        assert_eq!(store.get_height_for_hash("b2").unwrap(), Some(12));
    }

    #[test]
    fn prune_boundary_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chainstate");

        {
            let mut store = RocksStore::open(&path).unwrap();
            store.initialise(&blk("g", "pregenesis", 10)).unwrap();
            store.set_tip(&blk("a", "g", 11)).unwrap();
            store.set_tip(&blk("b", "a", 12)).unwrap();
            store.prune(1).unwrap();
        }

        let mut store = RocksStore::open(&path).unwrap();
        assert_eq!(store.low_height().unwrap(), Some(12));
        let err = store.set_tip(&blk("a3", "g", 11)).unwrap_err();
        assert_eq!(err, StoreError::OutOfRange { height: 11, low: 12, tip: 12 });
    }

    #[test]
    fn set_tip_at_boundary_after_prune() {
        let (mut store, _dir) = temp_store();
        fill_chain(&mut store);
        store.prune(1).unwrap();

        let old = store.set_tip(&blk("b", "a", 12)).unwrap();
        assert_eq!(old, "b");
        let err = store.set_tip(&blk("b9", "a", 12)).unwrap_err();
        assert_eq!(err, StoreError::InvalidParent { hash: "b9".to_string(), height: 12 });
    }
}
