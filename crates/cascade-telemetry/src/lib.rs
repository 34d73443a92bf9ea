//! # Cascade Telemetry
//!
//! Observability for the Cascade-Chain node: tracing-subscriber setup and
//! Prometheus metrics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cascade_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("telemetry init");
//!     // traces and metrics are now being collected
//! }
//! ```

mod config;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{gather, register_metrics, MetricsHandle};

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed.
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    /// Prometheus metric registration failed.
    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),
}

/// Guard keeping telemetry active; hold it for the process lifetime.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

/// Installs the tracing subscriber and registers the Prometheus metrics.
///
/// The log filter honors `RUST_LOG` and falls back to the configured level.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true);

    let init_result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    init_result.map_err(|error| TelemetryError::TracingInit(error.to_string()))?;

    let metrics = register_metrics()?;
    tracing::info!(service = %config.service_name, "Telemetry initialized");

    Ok(TelemetryGuard { _metrics: metrics })
}
