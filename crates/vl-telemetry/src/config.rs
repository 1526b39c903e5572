//! Telemetry configuration from environment variables.

use std::env;
use std::io::IsTerminal;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full EnvFilter directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vehicle-link".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VL_SERVICE_NAME`: Service name (default: vehicle-link)
    /// - `VL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `VL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `VL_JSON_LOGS`: Enable JSON logs (default: true when stderr is not a terminal)
    pub fn from_env() -> Self {
        let piped = !std::io::stderr().is_terminal();

        Self {
            service_name: env::var("VL_SERVICE_NAME")
                .unwrap_or_else(|_| "vehicle-link".to_string()),

            log_level: env::var("VL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("VL_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("VL_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(piped),
        }
    }

    /// Configuration for a named gateway component, e.g. `vehicle-link-runtime`.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, component);
        config
    }
}

/// Parses boolean-ish environment values. Unrecognised input keeps the default.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
