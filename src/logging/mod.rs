// Logging module for structured logging using the tracing crate

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ProxyError;

/// Initialize the tracing subscriber for structured logging
///
/// Filtering honors `RUST_LOG` when set and falls back to the configured
/// level otherwise. The format is either human-readable output for local
/// runs or JSON lines for log aggregation systems, per configuration.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), ProxyError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    result.map_err(|err| ProxyError::Config(format!("failed to initialize logging: {}", err)))
}
