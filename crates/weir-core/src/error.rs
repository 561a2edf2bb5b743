//! Error types for the Weir bridge.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("chain state is not initialised")] Uninitialised,
    #[error("genesis mismatch: stored {stored}, supplied {supplied}")] GenesisMismatch { stored: String, supplied: String },
    #[error("block not found: {0}")] BlockNotFound(String),
    #[error("block {hash} at height {height} does not link to the canonical chain")] InvalidParent { hash: String, height: u64 },
    #[error("height {height} is outside the retained range [{low}, {tip}]")] OutOfRange { height: u64, low: u64, tip: u64 },
    #[error("chain state is corrupt: {0}")] Corrupt(String),
    #[error("storage: {0}")] Backend(String),
}

/// Errors of the catch-up computation.
///
/// These are recoverable for the RPC path (returned to the caller); the
/// live-publish path treats [`UpdateError::Pruned`] as fatal, since the
/// bridge must never skip part of a transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("chain state has no blocks yet")] EmptyChain,
    #[error("unknown starting block: {0}")] UnknownBlock(String),
    #[error("block {hash} at height {height} is already pruned")] Pruned { hash: String, height: u64 },
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaseChainError {
    #[error("base chain unavailable: {0}")] Unavailable(String),
    #[error("base chain does not support {0}")] Unsupported(&'static str),
    #[error("invalid data from base chain: {0}")] InvalidData(String),
}

/// Conditions the process cannot recover from.
///
/// These terminate the process after logging; external supervision restarts
/// it and the durable chain state resumes from the last committed tip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("block at height {height} is already pruned (retained range starts at {low})")] Pruned { height: u64, low: u64 },
    #[error("base chain returned inconsistent data: {0}")] InconsistentBaseChain(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)] Fatal(#[from] FatalError),
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Base(#[from] BaseChainError),
}

impl SyncError {
    /// Whether this error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Fatal(_) => true,
            // A corrupt store cannot be reconciled either.
            SyncError::Store(StoreError::Corrupt(_)) => true,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum WeirError {
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Update(#[from] UpdateError),
    #[error(transparent)] Base(#[from] BaseChainError),
    #[error(transparent)] Sync(#[from] SyncError),
    #[error("rpc server: {0}")] Rpc(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_display() {
        let errors: Vec<StoreError> = vec![
            StoreError::Uninitialised,
            StoreError::GenesisMismatch { stored: "a".into(), supplied: "b".into() },
            StoreError::BlockNotFound("abc".into()),
            StoreError::InvalidParent { hash: "abc".into(), height: 5 },
            StoreError::OutOfRange { height: 1, low: 2, tip: 9 },
            StoreError::Corrupt("gap".into()),
            StoreError::Backend("io".into()),
        ];
        for e in &errors {
            assert!(!format!("{e}").is_empty());
        }
    }

    #[test]
    fn pruned_message_names_the_condition() {
        let e = FatalError::Pruned { height: 3, low: 7 };
        assert!(format!("{e}").contains("is already pruned"));
    }

    #[test]
    fn sync_fatal_classification() {
        assert!(SyncError::Fatal(FatalError::Pruned { height: 1, low: 2 }).is_fatal());
        assert!(SyncError::Store(StoreError::Corrupt("x".into())).is_fatal());
        assert!(!SyncError::Base(BaseChainError::Unavailable("down".into())).is_fatal());
    }

    #[test]
    fn update_error_from_store() {
        let e: UpdateError = StoreError::Uninitialised.into();
        assert!(matches!(e, UpdateError::Store(StoreError::Uninitialised)));
    }
}
