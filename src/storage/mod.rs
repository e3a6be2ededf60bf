//! # Storage Layer
//!
//! Persistence for a multisite network, backed by one SQLite database.
//!
//! ## Tables
//!
//! | Data | Table (default prefix) |
//! |------|------------------------|
//! | Sites | `wp_blogs` |
//! | Site relations | `wp_mlp_site_relations` |
//! | Content links | `wp_multilingual_linked` |
//! | Languages | `wp_mlp_languages` |
//! | Network and site options | `wp_mlp_options` |
//! | Posts and terms | `wp_mlp_posts`, `wp_mlp_terms` |
//!
//! ## Network Layout
//!
//! ```text
//! network/
//! ├── mlp.toml      # Network configuration
//! └── mlp.db        # SQLite database
//! ```
//!
//! ## Key Types
//!
//! - [`Network`] - Entry point for a network on disk
//! - [`Database`] - Shared connection and table names
//! - [`SiteRelations`] / [`ContentRelations`] - Cross-site links
//! - [`ContentDirectory`] - Posts and terms of the current site
//! - [`Config`] - Network and global configuration

mod config;
mod content;
mod content_relations;
mod database;
mod languages;
mod network;
mod options;
mod site_relations;
mod sites;

pub use config::{
    Config, ConfigError, GlobalConfig, NetworkConfig, OutputFormat, TranslationsConfig, CONFIG_FILE,
};
pub use content::{ContentDirectory, NewPost, NewTerm, Post, Term, PUBLISHED};
pub use content_relations::ContentRelations;
pub use database::{Database, TableList};
pub use languages::Languages;
pub use network::{Network, NetworkError};
pub use options::{OptionScope, Options, SITE_LANGUAGES_OPTION};
pub use site_relations::SiteRelations;
pub use sites::{Site, Sites};
