//! Configuration handling
//!
//! Configuration is stored in `mlp.toml` at the network root (project) and
//! `~/.config/mlp/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NameField, SiteId};
use crate::translation::SortPolicy;

/// File name of the network configuration
pub const CONFIG_FILE: &str = "mlp.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Defaults for translation lists
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TranslationsConfig {
    /// Ordering of language lists
    pub sort: SortPolicy,

    /// Language name shown as link text
    pub link_text: NameField,
}

/// Network-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// SQLite database, relative to the network root
    pub database: PathBuf,

    /// Prefix shared by all table names
    pub table_prefix: String,

    /// Site the command line acts as
    pub current_site: i64,

    /// Translation list settings
    pub translations: TranslationsConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("mlp.db"),
            table_prefix: "wp_".to_string(),
            current_site: 1,
            translations: TranslationsConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Checks values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        if SiteId::new(self.current_site).is_none() {
            return Err(ConfigError::Invalid(format!(
                "current_site must be a positive site ID, got {}",
                self.current_site
            )));
        }

        let prefix_ok = self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !prefix_ok {
            return Err(ConfigError::Invalid(format!(
                "table_prefix may only contain letters, digits and underscores, got '{}'",
                self.table_prefix
            )));
        }

        Ok(())
    }

    /// The configured current site
    pub fn current_site(&self) -> Result<SiteId, ConfigError> {
        SiteId::new(self.current_site).ok_or_else(|| {
            ConfigError::Invalid(format!("Invalid current_site: {}", self.current_site))
        })
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + network)
#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkConfig,
    pub global: GlobalConfig,
    pub root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let root = Self::find_root();
        let network = match &root {
            Some(root) => Self::load_network_config(root)?,
            None => NetworkConfig::default(),
        };

        Ok(Self {
            network,
            global,
            root,
        })
    }

    /// Loads configuration for a specific network root
    pub fn for_root(root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let network = Self::load_network_config(root)?;

        Ok(Self {
            network,
            global,
            root: Some(root.to_path_buf()),
        })
    }

    fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("org", "multilingualpress", "mlp")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads network configuration from a specific root
    fn load_network_config(root: &Path) -> Result<NetworkConfig> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(NetworkConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read network config: {}", config_path.display()))?;

        let config: NetworkConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse network config")?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the network root by looking for `mlp.toml`
    pub fn find_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
