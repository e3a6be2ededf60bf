//! Structured options
//!
//! Options are JSON values stored per scope: the whole network or one site.
//! Reading a missing option is not an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Database;
use crate::domain::{SiteId, SiteLanguage};

/// Network option holding the site-to-language mapping
pub const SITE_LANGUAGES_OPTION: &str = "inpsyde_multilingual";

/// Where an option lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionScope {
    Network,
    Site(SiteId),
}

impl OptionScope {
    fn key(self) -> i64 {
        match self {
            OptionScope::Network => 0,
            OptionScope::Site(site) => site.get(),
        }
    }
}

/// Option store backed by the network database
#[derive(Debug, Clone)]
pub struct Options {
    db: Arc<Database>,
}

impl Options {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Reads and decodes an option
    pub fn get<T: DeserializeOwned>(&self, scope: OptionScope, name: &str) -> Result<Option<T>> {
        let table = self.db.tables().options();
        let raw: Option<String> = self
            .db
            .conn()
            .query_row(
                &format!("SELECT value FROM {} WHERE scope = ?1 AND name = ?2", table),
                params![scope.key(), name],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read option '{}'", name))?;

        raw.map(|raw| {
            serde_json::from_str(&raw).with_context(|| format!("Option '{}' is malformed", name))
        })
        .transpose()
    }

    /// Encodes and stores an option, replacing any previous value
    pub fn set<T: Serialize>(&self, scope: OptionScope, name: &str, value: &T) -> Result<()> {
        let table = self.db.tables().options();
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode option '{}'", name))?;

        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (scope, name, value) VALUES (?1, ?2, ?3)",
                    table
                ),
                params![scope.key(), name, raw],
            )
            .with_context(|| format!("Failed to write option '{}'", name))?;

        Ok(())
    }

    /// Removes an option; returns whether it existed
    pub fn delete(&self, scope: OptionScope, name: &str) -> Result<bool> {
        let table = self.db.tables().options();
        let removed = self.db.conn().execute(
            &format!("DELETE FROM {} WHERE scope = ?1 AND name = ?2", table),
            params![scope.key(), name],
        )?;

        Ok(removed > 0)
    }

    /// Removes every option of a site
    pub fn delete_scope(&self, site: SiteId) -> Result<usize> {
        let table = self.db.tables().options();
        let removed = self.db.conn().execute(
            &format!("DELETE FROM {} WHERE scope = ?1", table),
            params![site.get()],
        )?;

        Ok(removed)
    }

    /// Returns the site-to-language mapping
    ///
    /// Entries with keys that are not site IDs are skipped.
    pub fn site_languages(&self) -> Result<BTreeMap<SiteId, SiteLanguage>> {
        let raw: BTreeMap<String, SiteLanguage> = self
            .get(OptionScope::Network, SITE_LANGUAGES_OPTION)?
            .unwrap_or_default();

        Ok(raw
            .into_iter()
            .filter_map(|(site, language)| Some((site.parse::<SiteId>().ok()?, language)))
            .collect())
    }

    /// Returns the language assignment of one site
    pub fn site_language(&self, site: SiteId) -> Result<Option<SiteLanguage>> {
        Ok(self.site_languages()?.remove(&site))
    }

    /// Assigns a language to a site
    pub fn set_site_language(&self, site: SiteId, language: SiteLanguage) -> Result<()> {
        let mut mapping = self.site_languages()?;
        mapping.insert(site, language);
        self.store_site_languages(&mapping)
    }

    /// Drops a site from the mapping; returns whether it was present
    pub fn remove_site_language(&self, site: SiteId) -> Result<bool> {
        let mut mapping = self.site_languages()?;
        if mapping.remove(&site).is_none() {
            return Ok(false);
        }

        self.store_site_languages(&mapping)?;
        Ok(true)
    }

    fn store_site_languages(&self, mapping: &BTreeMap<SiteId, SiteLanguage>) -> Result<()> {
        let raw: BTreeMap<String, &SiteLanguage> = mapping
            .iter()
            .map(|(site, language)| (site.to_string(), language))
            .collect();

        self.set(OptionScope::Network, SITE_LANGUAGES_OPTION, &raw)
    }
}
