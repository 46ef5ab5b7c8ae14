//! Prometheus metrics for Shard-Chain nodes.
//!
//! All metrics follow the naming convention: `sc_<area>_<metric>_<unit>`
//!
//! Everything lives in the process-wide default registry, next to the
//! counters the consensus crate records itself, so one scrape shows both.
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_accepted_total)
//! - **Gauge**: Value that can go up or down (e.g., epoch_height)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    // =========================================================================
    // BLOCK METRICS
    // =========================================================================

    /// Blocks accepted (mined or validated), by shard
    pub static ref BLOCKS_ACCEPTED: CounterVec = CounterVec::new(
        Opts::new("sc_blocks_accepted_total", "Shard blocks accepted by this node"),
        &["shard"]
    ).expect("metric creation failed");

    /// Transactions included in accepted blocks
    pub static ref TRANSACTIONS_INCLUDED: Counter = Counter::new(
        "sc_transactions_included_total",
        "Transactions included in accepted shard blocks"
    ).expect("metric creation failed");

    // =========================================================================
    // EPOCH METRICS
    // =========================================================================

    /// Height of the current epoch block
    pub static ref EPOCH_HEIGHT: Gauge = Gauge::new(
        "sc_epoch_height",
        "Height of the epoch block the node is working from"
    ).expect("metric creation failed");

    /// Active shard count
    pub static ref SHARD_COUNT: Gauge = Gauge::new(
        "sc_epoch_shards",
        "Number of shards in the current epoch"
    ).expect("metric creation failed");

    /// Epochs entered
    pub static ref EPOCHS_ADVANCED: Counter = Counter::new(
        "sc_epochs_advanced_total",
        "Epoch blocks adopted by this node"
    ).expect("metric creation failed");

    /// Transaction assignments issued by the committee
    pub static ref ASSIGNMENTS_ISSUED: Counter = Counter::new(
        "sc_assignments_issued_total",
        "Transaction assignments issued"
    ).expect("metric creation failed");

    // =========================================================================
    // COMMITTEE METRICS
    // =========================================================================

    /// Committee rounds abandoned
    pub static ref ROUNDS_ABORTED: Counter = Counter::new(
        "sc_committee_rounds_aborted_total",
        "Committee rounds aborted by an invalid block"
    ).expect("metric creation failed");

    /// Contradicted state transitions, by shard
    pub static ref CHEATS_DETECTED: CounterVec = CounterVec::new(
        Opts::new("sc_committee_cheats_detected_total", "State transitions contradicted by the committee"),
        &["shard"]
    ).expect("metric creation failed");
}

/// Proof that the collectors are registered.
#[derive(Debug)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors in the registry.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the default registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Blocks
        Box::new(BLOCKS_ACCEPTED.clone()),
        Box::new(TRANSACTIONS_INCLUDED.clone()),
        // Epochs
        Box::new(EPOCH_HEIGHT.clone()),
        Box::new(SHARD_COUNT.clone()),
        Box::new(EPOCHS_ADVANCED.clone()),
        Box::new(ASSIGNMENTS_ISSUED.clone()),
        // Committee
        Box::new(ROUNDS_ABORTED.clone()),
        Box::new(CHEATS_DETECTED.clone()),
    ];
    let registered = metrics.len();

    for metric in metrics {
        match prometheus::register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode every metric of the default registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
