//! # Vehicle Link Telemetry
//!
//! Logging and metrics for the Vehicle Link gateway.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus collectors for the command engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VL_SERVICE_NAME` | `vehicle-link` | Service name in the startup log |
//! | `VL_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `VL_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `VL_JSON_LOGS` | `false` | JSON log lines (defaults to true when stderr is piped) |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{
    encode_metrics, register_metrics, FAN_OUTS_ABANDONED, FAN_OUT_DURATION, FAN_OUT_TIMEOUTS,
    PENDING_FAN_OUTS, REQUESTS_RECEIVED, REQUESTS_REJECTED, RESPONSES_SENT, STORAGE_WRITES,
    SUBSYSTEM_CALLS, SUBSYSTEM_REPLIES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first so counters touched during startup are exported
    register_metrics()?;
    init_logging(config)?;
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
