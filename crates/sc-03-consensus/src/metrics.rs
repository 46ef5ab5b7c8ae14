//! # Consensus Metrics
//!
//! Prometheus counters for work that never reaches the event bus. Mined
//! blocks, epochs, aborted rounds and cheats are published as events and
//! counted by the node's telemetry bridge instead.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! sc-03-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `sc_consensus_blocks_validated_total` - Blocks validated by the committee
//! - `sc_consensus_request_timeouts_total` - Unanswered requests (by kind)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_VALIDATED: IntCounter = register_int_counter!(
        "sc_consensus_blocks_validated_total",
        "Total number of shard blocks validated by the committee"
    )
    .expect("Failed to create BLOCKS_VALIDATED metric");

    pub static ref REQUEST_TIMEOUTS: IntCounterVec = register_int_counter_vec!(
        "sc_consensus_request_timeouts_total",
        "Total number of unanswered requests",
        &["kind"]
    )
    .expect("Failed to create REQUEST_TIMEOUTS metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_validated() {
    BLOCKS_VALIDATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_request_timeout(kind: &str) {
    REQUEST_TIMEOUTS.with_label_values(&[kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_validated() {}

#[cfg(not(feature = "metrics"))]
pub fn record_request_timeout(_kind: &str) {}
