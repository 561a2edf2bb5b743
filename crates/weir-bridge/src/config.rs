//! Bridge configuration.
//!
//! Provides [`BridgeConfig`] with defaults for the data directory, RPC
//! binding, pub/sub endpoint, and tracking parameters. A per-chain binary
//! fills this from its own flag or file parsing.

use std::path::PathBuf;

/// Default port for the JSON-RPC server.
pub const DEFAULT_RPC_PORT: u16 = 8466;

/// Configuration for a bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// IP address for the JSON-RPC server to bind to.
    pub rpc_bind: String,
    /// Port for the JSON-RPC server.
    pub rpc_port: u16,
    /// Address the pub/sub publisher is reachable at, surfaced via
    /// `getzmqnotifications`.
    pub zmq_address: String,
    /// Base-chain height local tracking starts from. Must be deeply
    /// confirmed; the block's hash is resolved from the base chain once at
    /// startup and never reorged afterwards.
    pub genesis_height: u64,
    /// If set, only the last `n + 1` blocks are retained; older data is
    /// pruned after every tip update. `None` keeps everything.
    pub pruning_depth: Option<u64>,
    /// Run slow invariant checks after every tip update. For testing, not
    /// production throughput.
    pub sanity_checks: bool,
    /// Log level filter string (e.g. "info", "weir_bridge=debug").
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weir");

        Self {
            data_dir,
            rpc_bind: "127.0.0.1".to_string(),
            rpc_port: DEFAULT_RPC_PORT,
            zmq_address: "tcp://127.0.0.1:28332".to_string(),
            genesis_height: 0,
            pruning_depth: None,
            sanity_checks: false,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Path to the RocksDB chain-state directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("chainstate")
    }

    /// Socket address string for the RPC server.
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc_bind, self.rpc_port)
    }
}
