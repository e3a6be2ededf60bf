//! Relations between sites
//!
//! Two sites are related when content on one may be translated on the
//! other. A relation is stored once per unordered pair, lower ID first.

use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::params;
use tracing::debug;

use super::Database;
use crate::domain::SiteId;

#[derive(Debug, Clone)]
pub struct SiteRelations {
    db: Arc<Database>,
}

impl SiteRelations {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Relates two sites; returns false if they were related already
    pub fn set_relation(&self, a: SiteId, b: SiteId) -> Result<bool> {
        if a == b {
            anyhow::bail!("A site cannot be related to itself ({})", a);
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let table = self.db.tables().site_relations();
        let inserted = self
            .db
            .conn()
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (site_1, site_2) VALUES (?1, ?2)",
                    table
                ),
                params![low, high],
            )
            .with_context(|| format!("Failed to relate sites {} and {}", a, b))?;

        Ok(inserted > 0)
    }

    /// Returns the sites related to `site`, ordered by ID
    ///
    /// With `public_only`, sites that are not public or are gone are left out.
    pub fn related_sites(&self, site: SiteId, public_only: bool) -> Result<Vec<SiteId>> {
        let tables = self.db.tables();
        let relations = tables.site_relations();
        let sites = tables.sites();

        let filter = if public_only {
            format!(
                " AND related IN (SELECT id FROM {} WHERE public = 1 AND deleted = 0)",
                sites
            )
        } else {
            String::new()
        };

        let sql = format!(
            "SELECT related FROM (
                SELECT site_2 AS related FROM {relations} WHERE site_1 = ?1
                UNION
                SELECT site_1 AS related FROM {relations} WHERE site_2 = ?1
            ) WHERE 1 = 1{filter} ORDER BY related",
            relations = relations,
            filter = filter,
        );

        let conn = self.db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let related = stmt
            .query_map(params![site], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<SiteId>>>()?;

        Ok(related)
    }

    /// Deletes the relation between `site` and `other`, or every relation
    /// of `site` when `other` is `None`; returns the number of relations removed
    pub fn delete_relation(&self, site: SiteId, other: Option<SiteId>) -> Result<usize> {
        let table = self.db.tables().site_relations();
        let conn = self.db.conn();

        let removed = match other {
            Some(other) => {
                let (low, high) = if site < other { (site, other) } else { (other, site) };
                conn.execute(
                    &format!("DELETE FROM {} WHERE site_1 = ?1 AND site_2 = ?2", table),
                    params![low, high],
                )?
            }
            None => conn.execute(
                &format!("DELETE FROM {} WHERE site_1 = ?1 OR site_2 = ?1", table),
                params![site],
            )?,
        };

        debug!(%site, removed, "deleted site relations");
        Ok(removed)
    }

    /// Returns true if no site has any relation
    pub fn is_empty(&self) -> Result<bool> {
        let table = self.db.tables().site_relations();
        let count: i64 = self
            .db
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;

        Ok(count == 0)
    }
}
