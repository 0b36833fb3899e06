//! Configuration loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Storage backend configuration.
///
/// The backend is fixed at startup; there is no runtime re-dispatch on
/// configuration text past this point.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which backend to open.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database path for the sqlite backend. `:memory:` for a private
    /// in-memory database.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
        }
    }
}

/// The sealed set of storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database file (or `:memory:`).
    #[default]
    Sqlite,
    /// Process-local Vec; contents are lost on shutdown.
    Memory,
}

fn default_db_path() -> String {
    "cidrbans.sqlite".to_string()
}
