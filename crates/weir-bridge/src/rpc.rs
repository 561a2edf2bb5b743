//! JSON-RPC server for the bridge.
//!
//! Uses jsonrpsee 0.24 to expose the Bitcoin-style query surface game-state
//! processors expect: chain info, block lookups, catch-up requests, and
//! tracked-game management.

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};

use weir_core::error::{StoreError, UpdateError, WeirError};

use crate::controller::Controller;
use crate::publisher::NOTIFICATION_TYPE;

/// JSON representation of the chain info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainInfoJson {
    /// Network identifier of the base chain.
    pub chain: String,
    /// Current tip height.
    pub blocks: u64,
    /// Current tip hash.
    pub bestblockhash: String,
}

/// JSON representation of the network info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfoJson {
    /// Interface version exposed by this bridge.
    pub version: u64,
}

/// JSON representation of a block header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderJson {
    /// Block hash.
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Parent block hash.
    pub previousblockhash: String,
    /// Randomness seed associated with the block.
    pub rngseed: String,
}

/// Attach/detach step counts of a catch-up plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepsJson {
    pub attach: u64,
    pub detach: u64,
}

/// JSON result of `game_sendupdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSendUpdatesJson {
    /// Tip hash the published plan ends at.
    pub toblock: String,
    /// Token the replayed events are tagged with.
    pub reqtoken: String,
    /// Step counts of the plan.
    pub steps: StepsJson,
}

/// One entry of `getzmqnotifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZmqNotificationJson {
    /// Notification type identifier.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Publisher endpoint address.
    pub address: String,
}

/// Create a JSON-RPC error.
fn rpc_error(code: i32, msg: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, msg.to_string(), None::<()>)
}

/// Map a store error on a query path to an RPC error.
fn store_error(e: StoreError) -> ErrorObjectOwned {
    match e {
        StoreError::Uninitialised => rpc_error(-28, "chain state is not yet initialised"),
        other => rpc_error(-1, &other.to_string()),
    }
}

/// Map a catch-up computation error to an RPC error. These are client
/// errors by design; only the live publish path escalates them.
fn update_error(e: UpdateError) -> ErrorObjectOwned {
    match e {
        UpdateError::EmptyChain => rpc_error(-28, "chain state is not yet initialised"),
        UpdateError::UnknownBlock(hash) => {
            rpc_error(-5, &format!("unknown starting block: {hash}"))
        }
        UpdateError::Pruned { hash, height } => rpc_error(
            -5,
            &format!("block {hash} at height {height} is already pruned"),
        ),
        UpdateError::Store(e) => store_error(e),
    }
}

/// The bridge JSON-RPC interface.
#[rpc(server)]
pub trait WeirRpc {
    /// Returns chain info: network name, tip height, and tip hash.
    #[method(name = "getblockchaininfo")]
    async fn get_blockchain_info(&self) -> Result<BlockchainInfoJson, ErrorObjectOwned>;

    /// Returns the interface version.
    #[method(name = "getnetworkinfo")]
    async fn get_network_info(&self) -> Result<NetworkInfoJson, ErrorObjectOwned>;

    /// Returns the canonical block hash at the given height.
    #[method(name = "getblockhash")]
    async fn get_block_hash(&self, height: u64) -> Result<String, ErrorObjectOwned>;

    /// Returns the header of a retained block by its hash.
    #[method(name = "getblockheader")]
    async fn get_block_header(&self, hash: String) -> Result<HeaderJson, ErrorObjectOwned>;

    /// Returns the transaction ids in the base chain's mempool.
    #[method(name = "getrawmempool")]
    async fn get_raw_mempool(&self) -> Result<Vec<String>, ErrorObjectOwned>;

    /// Publishes a catch-up plan from `fromblock` (empty = genesis) for the
    /// given game, tagged with a fresh token, and returns its summary.
    #[method(name = "game_sendupdates")]
    async fn game_send_updates(
        &self,
        fromblock: String,
        gameid: String,
    ) -> Result<GameSendUpdatesJson, ErrorObjectOwned>;

    /// Adds or removes a game from the tracked set and returns the set.
    #[method(name = "trackedgames")]
    async fn tracked_games(
        &self,
        command: String,
        gameid: String,
    ) -> Result<Vec<String>, ErrorObjectOwned>;

    /// Returns the pub/sub endpoint and supported notification types.
    #[method(name = "getzmqnotifications")]
    async fn get_zmq_notifications(&self)
        -> Result<Vec<ZmqNotificationJson>, ErrorObjectOwned>;
}

/// Implementation of the bridge JSON-RPC server.
pub struct RpcServerImpl {
    controller: Arc<Controller>,
}

impl RpcServerImpl {
    /// Create a new RPC backend wrapping the given controller.
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl WeirRpcServer for RpcServerImpl {
    async fn get_blockchain_info(&self) -> Result<BlockchainInfoJson, ErrorObjectOwned> {
        let (blocks, bestblockhash) = self.controller.chain_tip().map_err(store_error)?;
        let chain = self
            .controller
            .base_chain_name()
            .await
            .map_err(|e| rpc_error(-1, &e.to_string()))?;
        Ok(BlockchainInfoJson {
            chain,
            blocks,
            bestblockhash,
        })
    }

    async fn get_network_info(&self) -> Result<NetworkInfoJson, ErrorObjectOwned> {
        let version = self
            .controller
            .base_version()
            .await
            .map_err(|e| rpc_error(-1, &e.to_string()))?;
        Ok(NetworkInfoJson { version })
    }

    async fn get_block_hash(&self, height: u64) -> Result<String, ErrorObjectOwned> {
        self.controller
            .block_hash_at(height)
            .map_err(store_error)?
            .ok_or_else(|| rpc_error(-8, "block height out of range"))
    }

    async fn get_block_header(&self, hash: String) -> Result<HeaderJson, ErrorObjectOwned> {
        let block = self
            .controller
            .block_data(&hash)
            .map_err(store_error)?
            .ok_or_else(|| rpc_error(-5, "block not found"))?;
        Ok(HeaderJson {
            hash: block.hash,
            height: block.height,
            previousblockhash: block.parent,
            rngseed: block.rngseed,
        })
    }

    async fn get_raw_mempool(&self) -> Result<Vec<String>, ErrorObjectOwned> {
        self.controller
            .base_mempool()
            .await
            .map_err(|e| rpc_error(-1, &e.to_string()))
    }

    async fn game_send_updates(
        &self,
        fromblock: String,
        gameid: String,
    ) -> Result<GameSendUpdatesJson, ErrorObjectOwned> {
        let summary = self
            .controller
            .send_updates(Some(&fromblock), &gameid)
            .map_err(update_error)?;
        Ok(GameSendUpdatesJson {
            toblock: summary.to_block,
            reqtoken: summary.reqtoken,
            steps: StepsJson {
                attach: summary.attach as u64,
                detach: summary.detach as u64,
            },
        })
    }

    async fn tracked_games(
        &self,
        command: String,
        gameid: String,
    ) -> Result<Vec<String>, ErrorObjectOwned> {
        match command.as_str() {
            "add" => self.controller.track_game(&gameid),
            "remove" => self.controller.untrack_game(&gameid),
            _ => return Err(rpc_error(-8, "command must be \"add\" or \"remove\"")),
        }
        Ok(self.controller.tracked_games())
    }

    async fn get_zmq_notifications(
        &self,
    ) -> Result<Vec<ZmqNotificationJson>, ErrorObjectOwned> {
        Ok(vec![ZmqNotificationJson {
            notification_type: NOTIFICATION_TYPE.to_string(),
            address: self.controller.zmq_address().to_string(),
        }])
    }
}

/// Start the JSON-RPC server on the given address.
///
/// Returns the handle used to stop the server and the bound address (useful
/// when binding to port 0 in tests).
pub async fn start_rpc_server(
    addr: &str,
    controller: Arc<Controller>,
) -> Result<(ServerHandle, SocketAddr), WeirError> {
    let server = Server::builder()
        .build(addr)
        .await
        .map_err(|e| WeirError::Rpc(e.to_string()))?;
    let local_addr = server
        .local_addr()
        .map_err(|e| WeirError::Rpc(e.to_string()))?;

    let rpc_impl = RpcServerImpl::new(controller);
    let handle = server.start(rpc_impl.into_rpc());

    Ok((handle, local_addr))
}
