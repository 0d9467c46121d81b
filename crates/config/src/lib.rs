//! Configuration loading, validation, and management for scorecap.
//!
//! Loads configuration from `~/.scorecap/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use scorecap_core::{CAP_CEILING, CapSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names inside the data directory.
pub const LIMITS_FILE: &str = "limits.json";
pub const DATA_FILE: &str = "assignments.json";
pub const LOG_FILE: &str = "log_channel.json";
pub const BACKUP_FILE: &str = "backup.json";

/// The root configuration structure.
///
/// Maps directly to `~/.scorecap/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name recorded as the actor in the admin log and used to key recent results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Caps used when no persisted caps exist yet
    #[serde(default)]
    pub default_caps: CapSet,

    /// Interactive behaviour
    #[serde(default)]
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding limits, assignments, log destination, and backups
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name used by `export` when no output path is given
    #[serde(default = "default_backup_file")]
    pub backup_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_backup_file() -> String {
    BACKUP_FILE.into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_file: default_backup_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Seconds to wait for `CONFIRM` before a wipe or import is canceled
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Entries per page for `top` and `list`
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_confirm_timeout_secs() -> u64 {
    20
}
fn default_page_size() -> usize {
    10
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: default_confirm_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.scorecap/config.toml).
    ///
    /// Environment overrides (highest priority first):
    /// - `SCORECAP_DATA_DIR`
    /// - `FLY_APP_NAME` (any value) switches the data directory to `/data`
    /// - `SCORECAP_CONFIRM_TIMEOUT_SECS`
    /// - `SCORECAP_OPERATOR`, then `USER` / `USERNAME` when no operator is configured
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var("SCORECAP_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        } else if std::env::var("FLY_APP_NAME").is_ok() {
            self.storage.data_dir = PathBuf::from("/data");
        }

        if let Ok(raw) = std::env::var("SCORECAP_CONFIRM_TIMEOUT_SECS") {
            self.shell.confirm_timeout_secs = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "SCORECAP_CONFIRM_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
        }

        if let Ok(operator) = std::env::var("SCORECAP_OPERATOR") {
            self.operator = Some(operator);
        } else if self.operator.is_none() {
            self.operator = std::env::var("USER")
                .ok()
                .or_else(|| std::env::var("USERNAME").ok());
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".scorecap")
    }

    pub fn limits_path(&self) -> PathBuf {
        self.storage.data_dir.join(LIMITS_FILE)
    }

    pub fn data_path(&self) -> PathBuf {
        self.storage.data_dir.join(DATA_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.storage.data_dir.join(LOG_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.backup_file)
    }

    /// The operator name, falling back to `"local"`.
    pub fn operator_name(&self) -> &str {
        self.operator.as_deref().unwrap_or("local")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (component, cap) in self.default_caps.iter() {
            if !(0.0..=CAP_CEILING).contains(&cap) {
                return Err(ConfigError::ValidationError(format!(
                    "default_caps.{component} must be between 0 and {CAP_CEILING}"
                )));
            }
        }

        if self.shell.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "shell.page_size must be > 0".into(),
            ));
        }

        if self.shell.confirm_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "shell.confirm_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            operator: None,
            storage: StorageConfig::default(),
            default_caps: CapSet::default(),
            shell: ShellConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
