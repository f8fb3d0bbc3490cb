//! Configuration for taskboard
//!
//! Storage backend, listen address, and item defaults. Loaded from TOML,
//! in order of precedence:
//!
//! 1. the file named by `TASKBOARD_CONFIG`
//! 2. `<project>/.taskboard/config.toml`
//! 3. `~/.taskboard/config.toml`
//! 4. built-in defaults
//!
//! `TASKBOARD_ADDR` and `TASKBOARD_DB` override single values afterwards.
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! database_path = "/var/lib/taskboard/board.db"
//!
//! [server]
//! address = "0.0.0.0:8080"
//!
//! [items]
//! date_format = "%d %b, %Y"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::format::{Item as FormatItem, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::item::DEFAULT_DATE_FORMAT;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TASKBOARD_CONFIG";
/// Environment variable overriding the listen address
pub const ADDR_ENV: &str = "TASKBOARD_ADDR";
/// Environment variable overriding the database path
pub const DB_ENV: &str = "TASKBOARD_DB";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Where boards are persisted
    pub storage: StorageConfig,
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Defaults applied to new items
    pub items: ItemConfig,
}

/// Which store implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on restart
    #[default]
    Memory,
    /// SQLite file (requires the `sqlite` feature)
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file, used by the SQLite backend
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_path: PathBuf::from("taskboard.db"),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Item defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// strftime format for the creation-date label
    pub date_format: String,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl BoardConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load and validate a TOML file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config =
            Self::from_toml(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the standard locations, then apply environment overrides
    pub fn load_standard(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::locate(project_root) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::load_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn locate(project_root: Option<&Path>) -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }

        if let Some(root) = project_root {
            let project = root.join(".taskboard").join("config.toml");
            if project.exists() {
                return Some(project);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".taskboard").join("config.toml"))
            .filter(|user| user.exists())
    }

    /// Apply `TASKBOARD_ADDR` / `TASKBOARD_DB` if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            self.server.address = addr;
        }
        if let Ok(db) = std::env::var(DB_ENV) {
            self.storage.database_path = PathBuf::from(db);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "server.address is not a socket address: {}",
                self.server.address
            )));
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.database_path.as_os_str().is_empty()
        {
            return Err(ConfigError::MissingField(
                "storage.database_path".to_string(),
            ));
        }

        if self.items.date_format.trim().is_empty() {
            return Err(ConfigError::MissingField("items.date_format".to_string()));
        }
        if StrftimeItems::new(&self.items.date_format).any(|i| matches!(i, FormatItem::Error)) {
            return Err(ConfigError::InvalidValue(format!(
                "items.date_format is not a valid strftime format: {}",
                self.items.date_format
            )));
        }

        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
