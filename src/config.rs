//! Application configuration, loaded from TOML.
//!
//! ```toml
//! output = "text"
//!
//! [race]
//! timeout_ms = 1000
//! settle_policy = "first-success"
//!
//! [[race.providers]]
//! name = "BrasilAPI"
//! url_template = "https://brasilapi.com.br/api/cep/v1/{query}"
//! ```
//!
//! Missing fields fall back to defaults. Command-line flags override
//! whatever the file sets.

use std::path::{Path, PathBuf};

use cepfast_race::RaceConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// How a lookup result is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `key: value` lines.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// Top-level configuration for the lookup tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output: OutputFormat,
    pub race: RaceConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from an explicit path, or from [`default_config_path`](Self::default_config_path)
    /// if it exists, or fall back to defaults.
    ///
    /// An explicit path that does not exist is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = Self::default_config_path();
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path: `~/.config/cepfast/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("cepfast").join("config.toml")
        } else if let Some(config) = dirs::config_dir() {
            config.join("cepfast").join("config.toml")
        } else {
            PathBuf::from("/tmp/cepfast-config/config.toml")
        }
    }
}
