//! Tracing setup for the relay binary
//!
//! Logs always go to stdout. When [`LoggingConfig::log_dir`] is set, a
//! daily-rolling file is written as well through a non-blocking writer;
//! the returned [`WorkerGuard`] must be held until exit so buffered lines
//! are flushed.

use crate::config::LoggingConfig;
use crate::error::{RelayError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse an `EnvFilter` directive string
pub fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| RelayError::Config(format!("Invalid log filter {:?}: {}", directives, e)))
}

/// `RUST_LOG` if set, otherwise the configured filter
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_filter(&config.filter),
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;
    let stdout_layer = tracing_subscriber::fmt::layer().with_thread_names(true);

    let Some(dir) = &config.log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .try_init()
            .map_err(|e| RelayError::Config(format!("Failed to install logger: {}", e)))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir).map_err(|e| {
        RelayError::Config(format!("Failed to create log directory {:?}: {}", dir, e))
    })?;
    let appender = tracing_appender::rolling::daily(dir, &config.log_file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RelayError::Config(format!("Failed to install logger: {}", e)))?;

    Ok(Some(guard))
}
