//! SQLite network database
//!
//! One database holds every table of the network. Table names share a
//! configurable prefix (`wp_` by default) followed by a fixed suffix per
//! logical table, so several networks can live in one file.

use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

/// Table names of one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableList {
    prefix: String,
}

impl TableList {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sites of the network
    pub fn sites(&self) -> String {
        format!("{}blogs", self.prefix)
    }

    /// Pairs of related sites
    pub fn site_relations(&self) -> String {
        format!("{}mlp_site_relations", self.prefix)
    }

    /// Cross-site content links
    pub fn content_relations(&self) -> String {
        format!("{}multilingual_linked", self.prefix)
    }

    pub fn languages(&self) -> String {
        format!("{}mlp_languages", self.prefix)
    }

    /// Network and per-site options
    pub fn options(&self) -> String {
        format!("{}mlp_options", self.prefix)
    }

    pub fn posts(&self) -> String {
        format!("{}mlp_posts", self.prefix)
    }

    pub fn terms(&self) -> String {
        format!("{}mlp_terms", self.prefix)
    }
}

impl Default for TableList {
    fn default() -> Self {
        Self::new("wp_")
    }
}

/// Shared connection to the network database
pub struct Database {
    conn: Mutex<Connection>,
    tables: TableList,
}

impl Database {
    /// Schema version - bump when schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database file
    pub fn open(path: &Path, tables: TableList) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open network database: {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_connection(conn, tables)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory(tables: TableList) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn, tables)
    }

    fn with_connection(conn: Connection, tables: TableList) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
            tables,
        };
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn tables(&self) -> &TableList {
        &self.tables
    }

    /// Locks the connection for the duration of the returned guard
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn schema_version(conn: &Connection) -> Result<i32> {
        let version: Option<i32> = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(version.unwrap_or(0))
    }

    /// Creates missing tables for this prefix; existing data is left untouched
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version = Self::schema_version(&conn)?;
        if version > Self::SCHEMA_VERSION {
            anyhow::bail!(
                "Network database has schema version {}, this build supports {}",
                version,
                Self::SCHEMA_VERSION
            );
        }

        let t = &self.tables;
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {sites} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                domain TEXT NOT NULL,
                path TEXT NOT NULL DEFAULT '/',
                public INTEGER NOT NULL DEFAULT 1,
                deleted INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS {site_relations} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_1 INTEGER NOT NULL,
                site_2 INTEGER NOT NULL,
                UNIQUE (site_1, site_2),
                CHECK (site_1 < site_2)
            );

            CREATE TABLE IF NOT EXISTS {content_relations} (
                ml_id INTEGER PRIMARY KEY AUTOINCREMENT,
                ml_source_blogid INTEGER NOT NULL,
                ml_source_elementid INTEGER NOT NULL,
                ml_blogid INTEGER NOT NULL,
                ml_elementid INTEGER NOT NULL,
                ml_type TEXT NOT NULL DEFAULT 'post'
            );

            CREATE INDEX IF NOT EXISTS {prefix}idx_linked_target
                ON {content_relations}(ml_blogid, ml_elementid, ml_type);
            CREATE INDEX IF NOT EXISTS {prefix}idx_linked_source
                ON {content_relations}(ml_source_blogid, ml_source_elementid, ml_type);

            CREATE TABLE IF NOT EXISTS {languages} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                english_name TEXT NOT NULL DEFAULT '',
                native_name TEXT NOT NULL DEFAULT '',
                custom_name TEXT,
                is_rtl INTEGER NOT NULL DEFAULT 0,
                iso_639_1 TEXT NOT NULL DEFAULT '',
                iso_639_2 TEXT NOT NULL DEFAULT '',
                locale TEXT NOT NULL UNIQUE,
                http_name TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 1,
                flag TEXT
            );

            CREATE TABLE IF NOT EXISTS {options} (
                scope INTEGER NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope, name)
            );

            CREATE TABLE IF NOT EXISTS {posts} (
                site_id INTEGER NOT NULL,
                id INTEGER NOT NULL,
                title TEXT NOT NULL,
                slug TEXT NOT NULL,
                post_type TEXT NOT NULL DEFAULT 'post',
                status TEXT NOT NULL DEFAULT 'publish',
                PRIMARY KEY (site_id, id)
            );

            CREATE TABLE IF NOT EXISTS {terms} (
                site_id INTEGER NOT NULL,
                term_taxonomy_id INTEGER NOT NULL,
                term_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                taxonomy TEXT NOT NULL,
                PRIMARY KEY (site_id, term_taxonomy_id)
            );
            ",
            prefix = t.prefix(),
            sites = t.sites(),
            site_relations = t.site_relations(),
            content_relations = t.content_relations(),
            languages = t.languages(),
            options = t.options(),
            posts = t.posts(),
            terms = t.terms(),
        ))?;

        conn.execute(&format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION), [])?;
        debug!(prefix = t.prefix(), "network schema ready");

        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.tables)
            .finish()
    }
}
