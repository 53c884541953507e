use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compat::DEFAULT_BASE_IMAGE_REPOSITORY;

/// Default log level when neither the config file nor RUST_LOG sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompatConfig {
    /// Directory holding the table JSON files; embedded tables are used when unset
    pub tables_dir: Option<PathBuf>,
    /// Repository prepended to CUDA base image tags
    pub base_image_repository: String,
    pub log: LogConfig,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            tables_dir: None,
            base_image_repository: DEFAULT_BASE_IMAGE_REPOSITORY.to_string(),
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    /// Also write logs to [`log_path`]
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
            file: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CompatConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for ml-compat.
/// Uses $XDG_DATA_HOME/ml-compat if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/ml-compat,
/// or ./ml-compat if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("ml-compat.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("ml-compat")
}
