//! Telemetry initialization
//!
//! Provides the [`TelemetryGuard`] for the logging lifecycle.

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{
    Registry, filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::TelemetryConfig;

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Invalid configuration
    #[error("Invalid telemetry configuration: {0}")]
    InvalidConfiguration(String),

    /// Tracing subscriber error
    #[error("Tracing subscriber error: {0}")]
    TracingError(String),
}

/// Guard that marks the logging lifetime
///
/// Keep it alive in `main()` until the server has shut down.
#[derive(Debug)]
pub struct TelemetryGuard {
    config: TelemetryConfig,
}

impl TelemetryGuard {
    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` wins over the configured level when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the log filter is invalid or a global subscriber
    /// is already installed.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .map_err(|e| TelemetryError::InvalidConfiguration(format!("Invalid log level: {e}")))?;

        if config.json_logs {
            let fmt_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json();

            Registry::default()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::TracingError(e.to_string()))?;
        } else {
            let fmt_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .pretty();

            Registry::default()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::TracingError(e.to_string()))?;
        }

        info!(
            service_name = env!("CARGO_PKG_NAME"),
            service_version = env!("CARGO_PKG_VERSION"),
            json_logs = config.json_logs,
            "Telemetry initialized"
        );

        Ok(Self { config })
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        info!(service_name = env!("CARGO_PKG_NAME"), "Shutting down telemetry");
    }
}

