// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Build the level filter. `RUST_LOG`, when set and valid, wins over the
/// configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, Box<dyn Error>> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| format!("Invalid log level '{}': {}", config.level, e).into())
}

/// Initialize the global tracing subscriber.
///
/// Events go to stdout, either as human-readable lines or as one JSON object
/// per line for log aggregation.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive or a global
/// subscriber has already been installed.
///
/// # Examples
///
/// ```
/// use watermark_worker::config::LoggingConfig;
/// use watermark_worker::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Worker started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Text => builder.with_target(false).try_init(),
    }
    .map_err(|e| format!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}
