//! Pub/sub event stream for tracked games.
//!
//! Every tip transition and every explicit catch-up request produces a
//! sequence of [`GameBlockEvent`]s, fanned out through a broadcast channel.
//! The wire transport (e.g. a ZMQ socket bound at the configured address) is
//! an external collaborator that subscribes here and frames messages with
//! [`GameBlockEvent::topic`]; in-process consumers and tests subscribe
//! directly.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use weir_core::types::BlockData;

/// Capacity of the broadcast channel; slow subscribers past this lag.
const CHANNEL_CAPACITY: usize = 1024;

/// The notification type identifier reported via `getzmqnotifications`.
pub const NOTIFICATION_TYPE: &str = "pubgameblocks";

/// Whether a block is added to or removed from a consumer's chain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockEventKind {
    Attach,
    Detach,
}

/// One published step of a detach/attach sequence for one game.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameBlockEvent {
    /// Attach or detach.
    pub kind: BlockEventKind,
    /// The tracked game this event is addressed to.
    pub game_id: String,
    /// The affected block, including its opaque payload.
    pub block: BlockData,
    /// Correlation token: empty for live pushes, the requester's token for
    /// catch-up replays.
    pub reqtoken: String,
}

impl GameBlockEvent {
    /// Topic string under which a transport binding frames this event.
    pub fn topic(&self) -> String {
        let prefix = match self.kind {
            BlockEventKind::Attach => "game-block-attach",
            BlockEventKind::Detach => "game-block-detach",
        };
        format!("{} json {}", prefix, self.game_id)
    }
}

/// Fan-out publisher of [`GameBlockEvent`]s.
pub struct Publisher {
    /// Externally visible pub/sub endpoint.
    address: String,
    tx: broadcast::Sender<GameBlockEvent>,
}

impl Publisher {
    /// Create a publisher advertising the given endpoint address.
    pub fn new(address: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            address: address.into(),
            tx,
        }
    }

    /// The advertised pub/sub endpoint.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<GameBlockEvent> {
        self.tx.subscribe()
    }

    /// Publish one event. Events without any subscriber are dropped, like
    /// on a pub/sub socket nobody listens on.
    pub fn publish(&self, event: GameBlockEvent) {
        tracing::trace!(topic = %event.topic(), block = %event.block.hash, "publish");
        let _ = self.tx.send(event);
    }
}
