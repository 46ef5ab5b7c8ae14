//! # Shard-Chain Telemetry
//!
//! Logging and metrics setup shared by every Shard-Chain binary.
//!
//! ## Components
//!
//! - Structured logging through `tracing-subscriber` (human or JSON lines)
//! - Prometheus metrics in the default registry, scraped as one text page
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SC_JSON_LOGS` | `false` | JSON log lines |
//! | `SC_METRICS_PORT` | `9100` | Prometheus port |
//! | `SC_NETWORK` | `local` | Network name in logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ASSIGNMENTS_ISSUED, BLOCKS_ACCEPTED,
    CHEATS_DETECTED, EPOCHS_ADVANCED, EPOCH_HEIGHT, ROUNDS_ABORTED, SHARD_COUNT,
    TRANSACTIONS_INCLUDED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        config,
        _metrics: metrics,
    })
}

/// Keeps telemetry active.
pub struct TelemetryGuard {
    config: TelemetryConfig,
    _metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.config.service_name, "Shutting down telemetry");
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad filter".to_string());
        assert!(err.to_string().contains("bad filter"));
    }
}
