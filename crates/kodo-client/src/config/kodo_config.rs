use std::{collections::BTreeMap, fs, path::PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::DEFAULT_HISTORY_CAP;
use crate::config::{account_config::AccountConfig, server_config::ServerConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a config directory")]
    NoConfigDir,
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

fn default_chat_history() -> usize {
    DEFAULT_HISTORY_CAP
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KodoConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,

    /// Number of chat lines kept in the session history.
    #[serde(default = "default_chat_history")]
    pub chat_history: usize,
}

impl Default for KodoConfig {
    fn default() -> Self {
        Self {
            servers: BTreeMap::new(),
            accounts: BTreeMap::new(),
            chat_history: DEFAULT_HISTORY_CAP,
        }
    }
}

impl KodoConfig {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = ProjectDirs::from("", "", "kodo").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(&path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}
