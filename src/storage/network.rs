//! Network management
//!
//! Handles network initialization and provides access to its stores.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::config::CONFIG_FILE;
use super::{Config, Database, TableList};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Network already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in a network. Run 'mlp init' first.")]
    NotInNetwork,
}

/// A multisite network on disk: `mlp.toml` plus its database
pub struct Network {
    root: PathBuf,
    config: Config,
}

impl Network {
    /// Opens an existing network at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(CONFIG_FILE).is_file() {
            return Err(NetworkError::NotInNetwork.into());
        }

        let config = Config::for_root(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the network at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_root().ok_or(NetworkError::NotInNetwork)?;

        Self::open(root)
    }

    /// Initializes a new network at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);

        if config_path.exists() {
            return Err(NetworkError::AlreadyExists(root).into());
        }

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create network directory: {}", root.display()))?;

        let default_config = r#"# MultilingualPress network configuration

# SQLite database holding sites, relations and languages
database = "mlp.db"

# Prefix shared by all table names
table_prefix = "wp_"

# Site the command line acts as
current_site = 1

[translations]
# Ordering of language lists: site_id, priority or name
sort = "priority"

# Language name used as link text
link_text = "native"
"#;
        fs::write(&config_path, default_config)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

        let network = Self::open(root)?;
        network.database()?;
        info!(root = %network.root.display(), "initialized network");

        Ok(network)
    }

    /// Returns the network root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the network database, creating missing tables
    pub fn database(&self) -> Result<Arc<Database>> {
        let path = self.root.join(&self.config.network.database);
        let tables = TableList::new(self.config.network.table_prefix.clone());

        Ok(Arc::new(Database::open(&path, tables)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_config_and_database() {
        let dir = TempDir::new().unwrap();
        let network = Network::init(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).is_file());
        assert!(dir.path().join("mlp.db").is_file());
        assert_eq!(network.config().network.table_prefix, "wp_");
    }

    #[test]
    fn init_twice_fails() {
        let dir = TempDir::new().unwrap();
        Network::init(dir.path()).unwrap();

        let err = Network::init(dir.path()).err().unwrap();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn open_without_config_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Network::open(dir.path()).is_err());
    }
}
