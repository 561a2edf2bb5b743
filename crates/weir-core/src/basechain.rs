//! The [`BaseChain`] trait: what the bridge needs from a connector.
//!
//! A connector wraps one concrete blockchain node (JSON-RPC, ZMQ or
//! WebSocket subscriptions, batching) and exposes the small surface below.
//! The bridge trusts the connector's answers; it never validates base-chain
//! consensus rules itself.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BaseChainError;
use crate::types::BlockData;

/// Abstraction over a connector to the base chain.
///
/// Tip notifications are delivered through the broadcast channel returned by
/// [`subscribe_tips`](BaseChain::subscribe_tips). Delivery is at-least-once
/// and may be spurious (a signal without an actual tip change); consumers
/// must tolerate no-op wakeups.
#[async_trait]
pub trait BaseChain: Send + Sync {
    /// Begin delivering tip notifications. Must be called exactly once
    /// before the chain is used.
    fn start(&self) -> Result<(), BaseChainError>;

    /// Subscribe to tip-change signals. The payload is the hash the
    /// connector believes to be the new tip; it is informational only.
    fn subscribe_tips(&self) -> broadcast::Receiver<String>;

    /// Return up to `count` contiguous blocks starting at `start` in
    /// ascending height order. Returns fewer if the chain is shorter and
    /// an empty vector if `start` exceeds the current tip.
    async fn get_block_range(
        &self,
        start: u64,
        count: u64,
    ) -> Result<Vec<BlockData>, BaseChainError>;

    /// Transaction ids currently in the base chain's mempool.
    ///
    /// Optional capability; the default implementation reports it as
    /// unsupported.
    async fn get_mempool(&self) -> Result<Vec<String>, BaseChainError> {
        Err(BaseChainError::Unsupported("mempool"))
    }

    /// Network identifier string (e.g. "main", "polygon").
    async fn get_chain(&self) -> Result<String, BaseChainError>;

    /// Version of the interface exposed through this bridge.
    async fn get_version(&self) -> Result<u64, BaseChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalChain {
        tips: broadcast::Sender<String>,
    }

    #[async_trait]
    impl BaseChain for MinimalChain {
        fn start(&self) -> Result<(), BaseChainError> {
            Ok(())
        }

        fn subscribe_tips(&self) -> broadcast::Receiver<String> {
            self.tips.subscribe()
        }

        async fn get_block_range(
            &self,
            _start: u64,
            _count: u64,
        ) -> Result<Vec<BlockData>, BaseChainError> {
            Ok(vec![])
        }

        async fn get_chain(&self) -> Result<String, BaseChainError> {
            Ok("test".to_string())
        }

        async fn get_version(&self) -> Result<u64, BaseChainError> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn mempool_unsupported_by_default() {
        let (tips, _) = broadcast::channel(4);
        let chain = MinimalChain { tips };
        let err = chain.get_mempool().await.unwrap_err();
        assert_eq!(err, BaseChainError::Unsupported("mempool"));
    }

    #[tokio::test]
    async fn tip_subscription_receives_signals() {
        let (tips, _) = broadcast::channel(4);
        let chain = MinimalChain { tips: tips.clone() };
        let mut rx = chain.subscribe_tips();
        tips.send("newtip".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "newtip");
    }
}
