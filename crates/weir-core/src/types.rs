//! Core data types: blocks and their opaque per-block payload.
//!
//! The bridge tracks blocks of an external base chain without interpreting
//! them. Hashes are plain strings, since their shape depends on the concrete
//! connector (hex with or without prefixes, different widths). Two blocks
//! with the same hash are identical by construction; the connector
//! guarantees this and the bridge does not re-validate it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single move (name operation) extracted from a base-chain transaction.
///
/// The bridge forwards moves verbatim to game-state processors; only the
/// connector that produced them knows their encoding.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct MoveData {
    /// Transaction id of the base-chain transaction carrying the move.
    pub txid: String,
    /// Namespace of the name that sent the move.
    pub ns: String,
    /// The name that sent the move.
    pub name: String,
    /// Raw move value as delivered by the connector.
    pub mv: String,
    /// Connector-specific extra data (e.g. payment outputs).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A block of the base chain as the bridge sees it.
///
/// `height` is strictly `parent.height + 1`; the genesis block has a
/// synthetic parent and a fixed height configured at startup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct BlockData {
    /// Block hash, uniquely identifying the block.
    pub hash: String,
    /// Hash of the parent block.
    pub parent: String,
    /// Block height on the base chain.
    pub height: u64,
    /// Seed for game randomness associated with this block.
    pub rngseed: String,
    /// Connector-specific header extras (e.g. timestamp).
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Moves contained in this block, in base-chain order.
    #[serde(default)]
    pub moves: Vec<MoveData>,
}

impl fmt::Display for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (height {})", self.hash, self.height)
    }
}
