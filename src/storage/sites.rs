//! Sites of the network

use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::Database;
use crate::domain::SiteId;
use crate::host::SiteDirectory;

/// A site of the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    pub path: String,
    pub public: bool,
    pub deleted: bool,
}

impl Site {
    /// Front page URL, always ending in a slash
    pub fn home_url(&self) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("https://{}/", self.domain)
        } else {
            format!("https://{}/{}/", self.domain, path)
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            domain: row.get(1)?,
            path: row.get(2)?,
            public: row.get(3)?,
            deleted: row.get(4)?,
        })
    }
}

/// Site directory backed by the network database
#[derive(Debug, Clone)]
pub struct Sites {
    db: Arc<Database>,
}

impl Sites {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Adds a site and returns its ID
    pub fn add(&self, domain: &str, path: &str, public: bool) -> Result<SiteId> {
        let table = self.db.tables().sites();
        let conn = self.db.conn();

        conn.execute(
            &format!("INSERT INTO {} (domain, path, public) VALUES (?1, ?2, ?3)", table),
            params![domain, path, public],
        )
        .with_context(|| format!("Failed to add site {}{}", domain, path))?;

        SiteId::new(conn.last_insert_rowid())
            .ok_or_else(|| anyhow::anyhow!("Database returned an invalid site ID"))
    }

    /// Returns a site that has not been deleted
    pub fn get(&self, id: SiteId) -> Result<Option<Site>> {
        let table = self.db.tables().sites();
        let site = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT id, domain, path, public, deleted FROM {} WHERE id = ?1 AND deleted = 0",
                    table
                ),
                params![id],
                Site::from_row,
            )
            .optional()?;

        Ok(site)
    }

    /// Returns all live sites ordered by ID
    pub fn list(&self) -> Result<Vec<Site>> {
        let table = self.db.tables().sites();
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, domain, path, public, deleted FROM {} WHERE deleted = 0 ORDER BY id",
            table
        ))?;

        let sites = stmt
            .query_map([], Site::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sites)
    }

    /// Removes a site row; returns whether it existed
    ///
    /// Cleanup of relations and options is done by the site-deleted signal.
    pub fn delete(&self, id: SiteId) -> Result<bool> {
        let table = self.db.tables().sites();
        let removed = self
            .db
            .conn()
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;

        Ok(removed > 0)
    }

    /// Returns the front page URL of a live site
    pub fn home_url(&self, id: SiteId) -> Result<Option<String>> {
        Ok(self.get(id)?.map(|site| site.home_url()))
    }
}

impl SiteDirectory for Sites {
    fn site_exists(&self, site: SiteId) -> Result<bool> {
        Ok(self.get(site)?.is_some())
    }
}
