//! End-to-end test suite for the Weir bridge.
//!
//! The integration tests boot a full controller (durable store, sync
//! worker, RPC server) against a [`helpers::SimulatedChain`] and verify the
//! published attach/detach streams across syncing, reorgs, restarts,
//! pruning, and catch-up requests.

pub mod helpers;
