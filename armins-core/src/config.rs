//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/armins/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/armins/` (~/.config/armins/)
//! - Data: `$XDG_DATA_HOME/armins/` (~/.local/share/armins/)
//! - State/Logs: `$XDG_STATE_HOME/armins/` (~/.local/state/armins/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_BASE_URL_ENV: &str = "ARMINS_API_BASE_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Analysis service connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Where chat history and messages are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the effective base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseUrlSource {
    /// Built-in localhost fallback
    #[default]
    Default,
    /// `[api] base_url` in config.toml
    ConfigFile,
    /// `ARMINS_API_BASE_URL`
    Environment,
    /// Explicit override (e.g. a CLI flag)
    Override,
}

impl BaseUrlSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseUrlSource::Default => "default",
            BaseUrlSource::ConfigFile => "config",
            BaseUrlSource::Environment => API_BASE_URL_ENV,
            BaseUrlSource::Override => "override",
        }
    }
}

/// Analysis service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the argument-mining service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(skip)]
    pub base_url_source: BaseUrlSource,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            base_url_source: BaseUrlSource::Default,
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the base URL, recording where it came from
    pub fn set_base_url(&mut self, url: impl Into<String>, source: BaseUrlSource) {
        self.base_url = url.into();
        self.base_url_source = source;
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Which key-value backend holds persisted chats
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key in the data directory
    #[default]
    File,
    /// A key-value table in an embedded SQLite database
    Sqlite,
    /// Process memory only; nothing survives a restart
    Memory,
}

/// Persistence configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StorageBackend,

    /// Override for the backend location (directory for `file`, database file for `sqlite`)
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Location the backend should use, falling back to the XDG data directory
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match self.backend {
            StorageBackend::Sqlite => Config::data_dir().join("chats.db"),
            StorageBackend::File | StorageBackend::Memory => Config::data_dir().join("store"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides();
        config.api.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        if config.api.base_url != DEFAULT_API_BASE_URL {
            config.api.base_url_source = BaseUrlSource::ConfigFile;
        }

        Ok(config)
    }

    /// Apply `ARMINS_API_BASE_URL` if it is set to a non-empty value
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.set_base_url(url.trim(), BaseUrlSource::Environment);
            }
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/armins/config.toml` (~/.config/armins/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("armins").join("config.toml")
    }

    /// Returns the data directory path (for persisted chats)
    ///
    /// `$XDG_DATA_HOME/armins/` (~/.local/share/armins/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("armins")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/armins/` (~/.local/state/armins/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("armins")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/armins/armins.log` (~/.local/state/armins/armins.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("armins.log")
    }

    /// Returns the location of the configured storage backend
    pub fn storage_path(&self) -> PathBuf {
        self.storage.resolved_path()
    }
}
