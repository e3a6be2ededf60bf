//! Posts and terms of each site
//!
//! Reads target whatever site the [`SiteContext`] currently points at, so a
//! lookup made inside a [`SiteSwitch`](crate::host::SiteSwitch) sees the
//! switched-to site's content.

use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, OptionScope, Options, Sites};
use crate::domain::{ContentId, SiteId};
use crate::host::SiteContext;

/// Status of a visible post
pub const PUBLISHED: &str = "publish";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: ContentId,
    pub title: String,
    pub slug: String,
    pub post_type: String,
    pub status: String,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PUBLISHED
    }
}

/// A term of a taxonomy, addressed by its term taxonomy ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub term_taxonomy_id: ContentId,
    pub term_id: i64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
}

/// A post to insert
#[derive(Debug, Clone)]
pub struct NewPost<'a> {
    /// Explicit ID, or the next free one
    pub id: Option<ContentId>,
    pub title: &'a str,
    pub slug: &'a str,
    pub status: &'a str,
}

/// A term to insert
#[derive(Debug, Clone)]
pub struct NewTerm<'a> {
    pub term_taxonomy_id: Option<ContentId>,
    pub name: &'a str,
    pub slug: &'a str,
    pub taxonomy: &'a str,
}

#[derive(Debug, Clone)]
pub struct ContentDirectory {
    db: Arc<Database>,
    sites: Sites,
    options: Options,
    context: Arc<SiteContext>,
}

impl ContentDirectory {
    pub fn new(db: Arc<Database>, context: Arc<SiteContext>) -> Self {
        Self {
            sites: Sites::new(Arc::clone(&db)),
            options: Options::new(Arc::clone(&db)),
            db,
            context,
        }
    }

    fn next_id(&self, table: &str, column: &str, site: SiteId) -> Result<ContentId> {
        let max: i64 = self.db.conn().query_row(
            &format!("SELECT COALESCE(MAX({column}), 0) FROM {table} WHERE site_id = ?1"),
            params![site],
            |row| row.get(0),
        )?;

        ContentId::new(max + 1).ok_or_else(|| anyhow::anyhow!("Invalid next ID in {}", table))
    }

    /// Inserts a post on `site` and returns its ID
    pub fn add_post(&self, site: SiteId, post: NewPost<'_>) -> Result<ContentId> {
        let table = self.db.tables().posts();
        let id = match post.id {
            Some(id) => id,
            None => self.next_id(&table, "id", site)?,
        };

        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT INTO {table} (site_id, id, title, slug, post_type, status)
                     VALUES (?1, ?2, ?3, ?4, 'post', ?5)"
                ),
                params![site, id, post.title, post.slug, post.status],
            )
            .with_context(|| format!("Failed to add post {} on site {}", id, site))?;

        Ok(id)
    }

    /// Inserts a term on `site` and returns its term taxonomy ID
    pub fn add_term(&self, site: SiteId, term: NewTerm<'_>) -> Result<ContentId> {
        let table = self.db.tables().terms();
        let id = match term.term_taxonomy_id {
            Some(id) => id,
            None => self.next_id(&table, "term_taxonomy_id", site)?,
        };

        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT INTO {table} (site_id, term_taxonomy_id, term_id, name, slug, taxonomy)
                     VALUES (?1, ?2, ?2, ?3, ?4, ?5)"
                ),
                params![site, id, term.name, term.slug, term.taxonomy],
            )
            .with_context(|| format!("Failed to add term {} on site {}", id, site))?;

        Ok(id)
    }

    fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            post_type: row.get(3)?,
            status: row.get(4)?,
        })
    }

    /// Returns a post of the current site
    pub fn post(&self, id: ContentId) -> Result<Option<Post>> {
        let table = self.db.tables().posts();
        let post = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT id, title, slug, post_type, status FROM {table}
                     WHERE site_id = ?1 AND id = ?2"
                ),
                params![self.context.current(), id],
                Self::post_from_row,
            )
            .optional()?;

        Ok(post)
    }

    /// Returns all posts of a site
    pub fn posts(&self, site: SiteId) -> Result<Vec<Post>> {
        let table = self.db.tables().posts();
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title, slug, post_type, status FROM {table} WHERE site_id = ?1 ORDER BY id"
        ))?;

        let posts = stmt
            .query_map(params![site], Self::post_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(posts)
    }

    /// Returns a term of the current site by term taxonomy ID
    pub fn term(&self, term_taxonomy_id: ContentId) -> Result<Option<Term>> {
        let table = self.db.tables().terms();
        let term = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT term_taxonomy_id, term_id, name, slug, taxonomy FROM {table}
                     WHERE site_id = ?1 AND term_taxonomy_id = ?2"
                ),
                params![self.context.current(), term_taxonomy_id],
                |row| {
                    Ok(Term {
                        term_taxonomy_id: row.get(0)?,
                        term_id: row.get(1)?,
                        name: row.get(2)?,
                        slug: row.get(3)?,
                        taxonomy: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(term)
    }

    /// Front page URL of the current site
    pub fn home_url(&self) -> Result<String> {
        let site = self.context.current();
        self.sites
            .home_url(site)?
            .ok_or_else(|| anyhow::anyhow!("Site {} does not exist", site))
    }

    /// Public URL of a post of the current site
    pub fn permalink(&self, post: &Post) -> Result<String> {
        Ok(format!("{}{}/", self.home_url()?, post.slug))
    }

    /// Admin URL for editing a post of the current site
    pub fn edit_post_url(&self, post: &Post) -> Result<String> {
        Ok(format!(
            "{}wp-admin/post.php?post={}&action=edit",
            self.home_url()?,
            post.id
        ))
    }

    /// Public URL of a term archive on the current site
    ///
    /// Categories and tags use the site's `category_base` and `tag_base`
    /// options when set; other taxonomies use their own name.
    pub fn term_link(&self, term: &Term) -> Result<String> {
        let (option, fallback) = match term.taxonomy.as_str() {
            "category" => (Some("category_base"), "category"),
            "post_tag" => (Some("tag_base"), "tag"),
            other => (None, other),
        };

        let base = match option {
            Some(name) => self
                .options
                .get::<String>(OptionScope::Site(self.context.current()), name)?
                .map(|base| base.trim_matches('/').to_string())
                .filter(|base| !base.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            None => fallback.to_string(),
        };

        Ok(format!("{}{}/{}/", self.home_url()?, base, term.slug))
    }

    /// Admin URL for editing a term of the current site
    pub fn edit_term_url(&self, term: &Term) -> Result<String> {
        Ok(format!(
            "{}wp-admin/term.php?taxonomy={}&tag_ID={}",
            self.home_url()?,
            term.taxonomy,
            term.term_id
        ))
    }

    /// Removes all posts and terms of a site
    pub fn delete_site(&self, site: SiteId) -> Result<usize> {
        let tables = self.db.tables();
        let conn = self.db.conn();
        let posts = conn.execute(
            &format!("DELETE FROM {} WHERE site_id = ?1", tables.posts()),
            params![site],
        )?;
        let terms = conn.execute(
            &format!("DELETE FROM {} WHERE site_id = ?1", tables.terms()),
            params![site],
        )?;

        Ok(posts + terms)
    }
}
