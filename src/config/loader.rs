use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/minitel-sender/config.toml` on Unix,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("minitel-sender").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - A serial port is named and the baud rate is non-zero
    /// - At least one open attempt is allowed
    /// - A log file path is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.port.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "link.port must not be empty".to_string(),
            });
        }

        if self.link.baud_rate == 0 {
            return Err(ConfigError::ValidationError {
                message: "link.baud_rate must be greater than zero".to_string(),
            });
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::ValidationError {
                message: "retry.max_retries must be at least 1".to_string(),
            });
        }

        if self.logging.file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "logging.file must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
