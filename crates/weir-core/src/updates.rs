//! Catch-up computation: from a consumer's position to the current tip.
//!
//! Given the hash a game-state processor has last seen, [`compute_updates`]
//! produces the ordered detach/attach plan that brings it to the current
//! canonical tip. The computation is pure over the chain state; callers must
//! hold the chain-state lock for the duration of the call so the plan is
//! based on a single consistent snapshot.

use crate::chainstate::ChainStore;
use crate::error::{StoreError, UpdateError};
use crate::types::BlockData;

/// An ordered plan moving a consumer from its current position to the tip.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainUpdates {
    /// Hash of the canonical tip the plan ends at.
    pub tip_hash: String,
    /// Height of the canonical tip.
    pub tip_height: u64,
    /// Height of the fork point, `None` when starting before genesis.
    pub fork_height: Option<u64>,
    /// Blocks to detach, newest first (unwound like a stack).
    pub detach: Vec<BlockData>,
    /// Blocks to attach, oldest first.
    pub attach: Vec<BlockData>,
}

/// Compute the detach/attach plan from `from` to the current tip.
///
/// `from = None` means "from before genesis": the plan attaches the entire
/// canonical chain. A starting hash equal to the current tip yields an empty
/// plan. A starting hash on a reorged-away branch is walked back along its
/// own ancestry until the canonical chain is reached; everything above that
/// fork point on the old path is detached.
///
/// # Errors
///
/// - [`UpdateError::EmptyChain`] before the genesis block is known
/// - [`UpdateError::UnknownBlock`] if `from` cannot be related to the chain
/// - [`UpdateError::Pruned`] if the walk would need already-pruned history
///   (including a full replay on a store whose genesis has been pruned)
pub fn compute_updates(
    store: &dyn ChainStore,
    from: Option<&str>,
) -> Result<ChainUpdates, UpdateError> {
    let tip_height = store.tip_height()?.ok_or(UpdateError::EmptyChain)?;
    let tip_hash = store
        .get_hash_for_height(tip_height)?
        .ok_or_else(|| StoreError::Corrupt(format!("no canonical block at tip {tip_height}")))?;
    let low = store
        .low_height()?
        .ok_or_else(|| StoreError::Corrupt("retained range without a tip".to_string()))?;

    let (fork_height, detach) = match from {
        None => {
            let (genesis_hash, genesis_height) =
                store.genesis()?.ok_or(UpdateError::EmptyChain)?;
            if low > genesis_height {
                // A full replay cannot be served once genesis is pruned.
                return Err(UpdateError::Pruned {
                    hash: genesis_hash,
                    height: genesis_height,
                });
            }
            (None, Vec::new())
        }
        Some(from_hash) => {
            let mut height = store
                .get_height_for_hash(from_hash)?
                .ok_or_else(|| UpdateError::UnknownBlock(from_hash.to_string()))?;
            let mut cur = from_hash.to_string();
            let mut detach = Vec::new();

            // Walk the consumer's own ancestry down until it rejoins the
            // canonical chain. A height above the tip never matches, which
            // handles branches longer than the current chain.
            while store.get_hash_for_height(height)?.as_deref() != Some(cur.as_str()) {
                let block = store.get_block(&cur)?.ok_or_else(|| {
                    StoreError::Corrupt(format!("retained block {cur} has no data"))
                })?;
                let parent = block.parent.clone();
                detach.push(block);

                if height <= low {
                    // The fork point lies below the retained range.
                    return Err(UpdateError::Pruned {
                        hash: parent,
                        height: height.saturating_sub(1),
                    });
                }
                height -= 1;
                cur = parent;
            }

            (Some(height), detach)
        }
    };

    let attach_start = match fork_height {
        Some(f) => f + 1,
        None => low,
    };
    let mut attach = Vec::with_capacity((tip_height + 1 - attach_start) as usize);
    for h in attach_start..=tip_height {
        let hash = store
            .get_hash_for_height(h)?
            .ok_or_else(|| StoreError::Corrupt(format!("gap in canonical chain at {h}")))?;
        let block = store
            .get_block(&hash)?
            .ok_or_else(|| StoreError::Corrupt(format!("canonical block {hash} has no data")))?;
        attach.push(block);
    }

    Ok(ChainUpdates {
        tip_hash,
        tip_height,
        fork_height,
        detach,
        attach,
    })
}
