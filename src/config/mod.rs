//! Configuration module for the signal relay
//!
//! The relay reads a small TOML file:
//!
//! ```toml
//! [producer]
//! interval_ms = 1000
//!
//! [logging]
//! filter = "info,signal_relay=debug"
//! log_dir = "/var/log/signal-relay"   # optional
//! log_file_prefix = "signal-relay.log"
//! ```
//!
//! # Config Location
//!
//! Without an explicit path the file is looked up in the
//! platform-appropriate config directory:
//!
//! - **Linux**: `~/.config/signal-relay/relay.toml`
//! - **macOS**: `~/Library/Application Support/signal-relay/relay.toml`
//! - **Windows**: `%APPDATA%\signal-relay\relay.toml`
//!
//! # Environment
//!
//! `SIGNAL_RELAY_INTERVAL_MS` overrides `producer.interval_ms`.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "signal-relay";

/// Config filename
pub const CONFIG_FILE: &str = "relay.toml";

/// Default producer interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Environment variable overriding the producer interval
pub const INTERVAL_ENV_VAR: &str = "SIGNAL_RELAY_INTERVAL_MS";

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,signal_relay=debug";

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Relay Config ====================

/// Top-level relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub producer: ProducerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            RelayError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            RelayError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.producer.interval_ms == 0 {
            return Err(RelayError::Config(
                "producer.interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(INTERVAL_ENV_VAR) {
            let interval_ms = raw.trim().parse::<u64>().map_err(|e| {
                RelayError::Config(format!("Invalid {}={:?}: {}", INTERVAL_ENV_VAR, raw, e))
            })?;
            self.producer.interval_ms = interval_ms;
        }
        self.validate()
    }
}

// ==================== Producer Config ====================

/// Producer timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Delay between generated updates in milliseconds
    pub interval_ms: u64,
}

impl ProducerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily-rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// File name prefix for rolled log files
    #[serde(default = "default_log_file_prefix")]
    pub log_file_prefix: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_log_file_prefix() -> String {
    format!("{}.log", APP_ID)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            log_dir: None,
            log_file_prefix: default_log_file_prefix(),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.producer.interval_ms, 1000);
        assert_eq!(config.producer.interval(), Duration::from_secs(1));
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.logging.log_file_prefix, "signal-relay.log");
        assert!(config.logging.log_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str("[producer]\ninterval_ms = 10\n").unwrap();
        assert_eq!(config.producer.interval_ms, 10);
        assert_eq!(config.logging, LoggingConfig::default());

        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = RelayConfig::default();
        config.producer.interval_ms = 0;
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = RelayConfig::default();
        config.producer.interval_ms = 250;
        config.logging.log_dir = Some(dir.path().join("logs"));
        config.save(&path).unwrap();

        let loaded = RelayConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[producer]\ninterval_ms = \"fast\"\n").unwrap();

        assert!(matches!(RelayConfig::load(&path), Err(RelayError::Config(_))));
        assert_eq!(RelayConfig::load_or_default(&path), RelayConfig::default());
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig::load_or_default(dir.path().join("absent.toml"));
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_env_override() {
        let mut config = RelayConfig::default();
        config
            .apply_overrides(|key| (key == INTERVAL_ENV_VAR).then(|| " 10 ".to_string()))
            .unwrap();
        assert_eq!(config.producer.interval_ms, 10);

        let mut config = RelayConfig::default();
        assert!(config
            .apply_overrides(|_| Some("soon".to_string()))
            .is_err());
        assert!(config.apply_overrides(|_| Some("0".to_string())).is_err());

        let mut config = RelayConfig::default();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config, RelayConfig::default());
    }
}
