use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Ingestion constants
// =============================================================================

/// Default pause between NVD page requests in milliseconds.
///
/// The public NVD API enforces a rolling rate limit; six seconds keeps an
/// unauthenticated client under it.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 6_000;

/// Maximum retry attempts for a single feed page
pub const FETCH_MAX_RETRIES: u32 = 10;

/// Ceiling for the exponential retry backoff in milliseconds (5 seconds)
pub const FETCH_MAX_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration, loaded from `config.toml`
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub nvd: NvdConfig,
}

/// Database location configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DbConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { path: db_path() }
    }
}

/// NVD feed configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NvdConfig {
    /// API key for the NVD REST API; raises the rate limit when present
    pub api_key: Option<String>,
    /// Pause between page requests in milliseconds
    pub request_delay_ms: u64,
}

impl Default for NvdConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    /// when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for vulndb.
/// Uses $XDG_DATA_HOME/vulndb if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/vulndb,
/// or ./vulndb if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vulndb")
        .join("config.toml")
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("vulndb.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("vulndb.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("vulndb")
}
