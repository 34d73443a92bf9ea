//! # Telemetry Configuration

use serde::{Deserialize, Serialize};

/// Telemetry settings, overridable from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (`trace`..`error`), also honoring `RUST_LOG`.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
    /// Service name attached to log output.
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            service_name: "cascade-chain".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Builds the configuration from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CASCADE_LOG_LEVEL` | `info` | Log level filter |
    /// | `CASCADE_JSON_LOGS` | `false` | JSON log output |
    /// | `CASCADE_SERVICE_NAME` | `cascade-chain` | Service name |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("CASCADE_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: std::env::var("CASCADE_JSON_LOGS")
                .map(|value| "1" == value || "true" == value.to_lowercase())
                .unwrap_or(defaults.json_logs),
            service_name: std::env::var("CASCADE_SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}
