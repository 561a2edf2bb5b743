//! # weir-bridge — Bridge daemon: RocksDB, sync, pub/sub, RPC.
//!
//! Composes the Weir subsystems into a running chain bridge:
//! - [`storage::RocksStore`] — persistent chain state backed by RocksDB
//! - [`sync::Sync`] — background reconciliation against the base chain
//! - [`publisher::Publisher`] — attach/detach event stream per tracked game
//! - [`controller::Controller`] — composition root and RPC backend
//! - [`config::BridgeConfig`] — bridge configuration
//!
//! A per-chain binary supplies a [`weir_core::basechain::BaseChain`]
//! connector and a configuration, constructs a [`controller::Controller`],
//! and runs it.

pub mod config;
pub mod controller;
pub mod publisher;
pub mod rpc;
pub mod storage;
pub mod sync;

pub use config::BridgeConfig;
pub use controller::{Controller, ControllerHandle};
pub use rpc::start_rpc_server;
pub use storage::RocksStore;

/// Initialize the tracing subscriber with the given log level and output
/// format, for per-chain binaries embedding the bridge.
///
/// Pass `format = "json"` for structured JSON output (suitable for log
/// aggregation pipelines). Any other value defaults to human-readable text.
pub fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
