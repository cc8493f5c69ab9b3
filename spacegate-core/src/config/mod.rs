//! Configuration management
//!
//! File-based configuration with environment-variable overrides. The
//! environment wins over the file, the file over the defaults.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

mod error;

pub use error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file. `None` selects an in-memory
    /// database, which does not survive a restart.
    pub database_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to display
    pub level: String,

    /// Emit JSON-formatted log lines
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.as_str().to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: Config = toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides:
    /// `SPACEGATE_DATABASE_PATH`, `SPACEGATE_LOG_LEVEL`, `SPACEGATE_LOG_JSON`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var("SPACEGATE_DATABASE_PATH") {
            self.store.database_path = Some(PathBuf::from(path));
        }
        if let Ok(level) = env::var("SPACEGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("SPACEGATE_LOG_JSON") {
            self.logging.json_format = json == "1" || json.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging
            .level
            .parse::<LogLevel>()
            .map_err(|_| ConfigError::InvalidValue(format!("log level {:?}", self.logging.level)))?;
        Ok(())
    }

    /// The configured log level
    pub fn log_level(&self) -> LogLevel {
        self.logging.level.parse().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert!(config.store.database_path.is_none());
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [store]
            database_path = "/var/lib/spacegate/spaces.db"

            [logging]
            level = "debug"
            json_format = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config.store.database_path,
            Some(PathBuf::from("/var/lib/spacegate/spaces.db"))
        );
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        assert!(config.store.database_path.is_none());
        assert_eq!(config.log_level(), LogLevel::Warn);
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spacegate.toml");
        std::fs::write(&path, "[logging]\nlevel = \"error\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_level(), LogLevel::Error);

        assert!(matches!(
            Config::load(dir.path().join("missing.toml")),
            Err(ConfigError::FileRead(_))
        ));
    }
}
