//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::query::OutputFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub livestatus: LiveStatusConfig,

    #[serde(default)]
    pub logstore: LogStoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Query engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveStatusConfig {
    /// Log every parsed request line at debug level
    #[serde(default)]
    pub debug_queries: bool,

    /// Format used when a request has no valid `OutputFormat:`
    #[serde(default)]
    pub default_output_format: OutputFormat,

    /// Hard cap on rows per response, applied on top of `Limit:`
    #[serde(default)]
    pub max_response_rows: Option<usize>,
}

/// Log history store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogStoreConfig {
    #[serde(default = "default_database_file")]
    pub database_file: String,

    #[serde(default = "default_max_logs_age")]
    pub max_logs_age_days: u32,
}

fn default_database_file() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("livestatus").join("livestatus.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./livestatus.db".to_string())
}

fn default_max_logs_age() -> u32 {
    365
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            max_logs_age_days: default_max_logs_age(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("livestatus").join("livestatus.toml")),
            Some(PathBuf::from("/etc/livestatus/livestatus.toml")),
            Some(PathBuf::from("./livestatus.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(debug) = std::env::var("LIVESTATUS_DEBUG_QUERIES") {
            self.livestatus.debug_queries = matches!(debug.as_str(), "1" | "true" | "on" | "yes");
        }

        if let Ok(path) = std::env::var("LIVESTATUS_LOG_DB") {
            self.logstore.database_file = path;
        }

        if let Ok(level) = std::env::var("LIVESTATUS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LIVESTATUS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Livestatus Configuration
#
# Environment variables override these settings:
# - LIVESTATUS_DEBUG_QUERIES
# - LIVESTATUS_LOG_DB
# - LIVESTATUS_LOG_LEVEL
# - LIVESTATUS_LOG_FORMAT

[livestatus]
# Log every request line at debug level
debug_queries = false

# Output format when a request has no valid OutputFormat: csv, json or python
default_output_format = "csv"

# Hard cap on rows per response (unset = unlimited)
# max_response_rows = 10000

[logstore]
# SQLite database holding the log history
database_file = "~/.local/share/livestatus/livestatus.db"

# Lines older than this are purged
max_logs_age_days = 365

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/livestatus/livestatus.log"
"#
    .to_string()
}
