//! Signal Relay - Main Entry Point
//!
//! Runs the producer and consumer threads and keeps a parameter table on
//! the main thread, logging it whenever new updates arrive.
//!
//! Usage: `signal-relay [CONFIG_PATH]`

use anyhow::Context;
use signal_relay::{
    config::{self, RelayConfig},
    logging, ParameterTable, Relay,
};
use std::path::PathBuf;
use std::time::Duration;

/// How long the main thread waits for updates before looping
const PUMP_TIMEOUT: Duration = Duration::from_millis(250);

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(config::default_config_path);

    let mut config = match &config_path {
        Some(path) => RelayConfig::load_or_default(path),
        None => RelayConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    // Held until exit so the file writer flushes
    let _log_guard = logging::init_logging(&config.logging).context("Failed to set up logging")?;

    tracing::info!("Starting signal relay");
    if let Some(path) = &config_path {
        tracing::debug!("Config path: {:?}", path);
    }

    let (relay, mailbox) = Relay::new(config).context("Failed to build relay")?;

    mailbox.bind(ParameterTable::new());

    let running = relay.start().context("Failed to start relay")?;

    // Runs until the process is killed or both workers exit
    loop {
        match mailbox.process_next(PUMP_TIMEOUT) {
            Ok(true) => {
                mailbox.process_pending();
                mailbox.with_observer(|table: &ParameterTable| tracing::info!("\n{}", table));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Observer mailbox closed: {}", e);
                break;
            }
        }

        if running.is_finished() {
            tracing::warn!("Relay workers exited");
            break;
        }
    }

    let report = running.shutdown().context("Failed to stop relay")?;
    tracing::info!(?report, "Shutting down...");
    Ok(())
}
