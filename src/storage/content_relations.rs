//! Cross-site content links
//!
//! Linked content is grouped under an anchor: the `(site, id)` the first
//! link was made from. Every member of a group, including the anchor
//! itself, has one row pointing back to the anchor:
//!
//! ```text
//! ml_source_blogid | ml_source_elementid | ml_blogid | ml_elementid | ml_type
//! 1                | 42                  | 1         | 42           | post
//! 1                | 42                  | 2         | 99           | post
//! ```
//!
//! Looking a member up by `(ml_blogid, ml_elementid)` yields its anchor,
//! and the anchor yields every member. Rows are stored one way but read
//! symmetrically.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::Database;
use crate::domain::{ContentId, ContentType, SiteContent, SiteId};

#[derive(Debug, Clone)]
pub struct ContentRelations {
    db: Arc<Database>,
}

impl ContentRelations {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn table(&self) -> String {
        self.db.tables().content_relations()
    }

    fn anchor_of(
        conn: &Connection,
        table: &str,
        member: SiteContent,
        content_type: ContentType,
    ) -> Result<Option<SiteContent>> {
        let anchor = conn
            .query_row(
                &format!(
                    "SELECT ml_source_blogid, ml_source_elementid FROM {}
                     WHERE ml_blogid = ?1 AND ml_elementid = ?2 AND ml_type = ?3
                     ORDER BY ml_id LIMIT 1",
                    table
                ),
                params![member.site_id, member.content_id, content_type],
                |row| Ok(SiteContent::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(anchor)
    }

    /// Links `source_id` on `source_site` to `target_id` on `target_site`
    ///
    /// The target replaces any item of `target_site` already linked to the
    /// source, and leaves whatever group it belonged to before.
    pub fn set_relation(
        &self,
        source_site: SiteId,
        target_site: SiteId,
        source_id: ContentId,
        target_id: ContentId,
        content_type: ContentType,
    ) -> Result<()> {
        if source_site == target_site {
            anyhow::bail!("Cannot link content of site {} to the same site", source_site);
        }

        let table = self.table();
        let source = SiteContent::new(source_site, source_id);
        let target = SiteContent::new(target_site, target_id);

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let mut anchor = match Self::anchor_of(&tx, &table, source, content_type)? {
            Some(anchor) => anchor,
            None => {
                tx.execute(
                    &format!(
                        "INSERT INTO {} (ml_source_blogid, ml_source_elementid, ml_blogid, ml_elementid, ml_type)
                         VALUES (?1, ?2, ?1, ?2, ?3)",
                        table
                    ),
                    params![source.site_id, source.content_id, content_type],
                )?;
                source
            }
        };

        if let Some(previous) = Self::anchor_of(&tx, &table, target, content_type)? {
            if previous == anchor {
                tx.commit()?;
                return Ok(());
            }
            Self::remove_member(&tx, &table, target, previous, content_type)?;
        }

        // The anchor is about to be replaced by another item of its site.
        if target.site_id == anchor.site_id {
            Self::reanchor(&tx, &table, anchor, source, content_type)?;
            anchor = source;
        }

        tx.execute(
            &format!(
                "DELETE FROM {} WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2
                 AND ml_blogid = ?3 AND ml_type = ?4",
                table
            ),
            params![anchor.site_id, anchor.content_id, target.site_id, content_type],
        )?;

        tx.execute(
            &format!(
                "INSERT INTO {} (ml_source_blogid, ml_source_elementid, ml_blogid, ml_elementid, ml_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table
            ),
            params![
                anchor.site_id,
                anchor.content_id,
                target.site_id,
                target.content_id,
                content_type
            ],
        )?;

        tx.commit()
            .with_context(|| format!("Failed to link {} to {}", source, target))?;

        debug!(%source, %target, %content_type, "linked content");
        Ok(())
    }

    /// Returns every member of the group `(site, id)` belongs to, keyed by
    /// site and including `site` itself; empty when the item is not linked
    pub fn relations(
        &self,
        site: SiteId,
        id: ContentId,
        content_type: ContentType,
    ) -> Result<BTreeMap<SiteId, ContentId>> {
        let table = self.table();
        let conn = self.db.conn();

        let Some(anchor) = Self::anchor_of(&conn, &table, SiteContent::new(site, id), content_type)?
        else {
            return Ok(BTreeMap::new());
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT ml_blogid, ml_elementid FROM {}
             WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2 AND ml_type = ?3",
            table
        ))?;

        let members = stmt
            .query_map(params![anchor.site_id, anchor.content_id, content_type], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<SiteId, ContentId>>>()?;

        Ok(members)
    }

    /// Returns the item linked to `(site, id)` on `target_site`
    pub fn translation_id(
        &self,
        site: SiteId,
        id: ContentId,
        target_site: SiteId,
        content_type: ContentType,
    ) -> Result<Option<ContentId>> {
        Ok(self.relations(site, id, content_type)?.remove(&target_site))
    }

    /// Removes `(site, id)` from its group; returns the number of rows removed
    ///
    /// Removing the anchor dissolves the whole group, and a group left with
    /// only its anchor is dissolved as well.
    pub fn delete_relation(&self, site: SiteId, id: ContentId, content_type: ContentType) -> Result<usize> {
        let table = self.table();
        let member = SiteContent::new(site, id);

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let removed = match Self::anchor_of(&tx, &table, member, content_type)? {
            Some(anchor) => Self::remove_member(&tx, &table, member, anchor, content_type)?,
            None => 0,
        };

        tx.commit()?;
        debug!(%member, removed, "unlinked content");
        Ok(removed)
    }

    /// Points every row of the group anchored at `from` to `to`, a member
    /// of the same group
    fn reanchor(
        conn: &Connection,
        table: &str,
        from: SiteContent,
        to: SiteContent,
        content_type: ContentType,
    ) -> Result<usize> {
        let moved = conn.execute(
            &format!(
                "UPDATE {} SET ml_source_blogid = ?3, ml_source_elementid = ?4
                 WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2 AND ml_type = ?5",
                table
            ),
            params![from.site_id, from.content_id, to.site_id, to.content_id, content_type],
        )?;

        debug!(%from, %to, moved, "moved link group to a new anchor");
        Ok(moved)
    }

    fn remove_member(
        conn: &Connection,
        table: &str,
        member: SiteContent,
        anchor: SiteContent,
        content_type: ContentType,
    ) -> Result<usize> {
        if member == anchor {
            let removed = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2 AND ml_type = ?3",
                    table
                ),
                params![anchor.site_id, anchor.content_id, content_type],
            )?;
            return Ok(removed);
        }

        let mut removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2
                 AND ml_blogid = ?3 AND ml_elementid = ?4 AND ml_type = ?5",
                table
            ),
            params![
                anchor.site_id,
                anchor.content_id,
                member.site_id,
                member.content_id,
                content_type
            ],
        )?;

        let remaining: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2 AND ml_type = ?3",
                table
            ),
            params![anchor.site_id, anchor.content_id, content_type],
            |row| row.get(0),
        )?;

        if remaining <= 1 {
            removed += conn.execute(
                &format!(
                    "DELETE FROM {} WHERE ml_source_blogid = ?1 AND ml_source_elementid = ?2 AND ml_type = ?3",
                    table
                ),
                params![anchor.site_id, anchor.content_id, content_type],
            )?;
        }

        Ok(removed)
    }

    /// Removes every row that references `site` on either side, then the
    /// groups left with a single member; returns the number of rows removed
    pub fn delete_site(&self, site: SiteId) -> Result<usize> {
        let table = self.table();
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let mut removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE ml_source_blogid = ?1 OR ml_blogid = ?1",
                table
            ),
            params![site],
        )?;

        removed += tx.execute(
            &format!(
                "DELETE FROM {table} WHERE (ml_source_blogid, ml_source_elementid, ml_type) IN (
                    SELECT ml_source_blogid, ml_source_elementid, ml_type FROM {table}
                    GROUP BY ml_source_blogid, ml_source_elementid, ml_type
                    HAVING COUNT(*) = 1
                )",
                table = table
            ),
            [],
        )?;

        tx.commit()?;

        debug!(%site, removed, "deleted content links of site");
        Ok(removed)
    }

    /// Returns the number of rows that reference `site` on either side
    pub fn count_for_site(&self, site: SiteId) -> Result<usize> {
        let table = self.table();
        let count: i64 = self.db.conn().query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE ml_source_blogid = ?1 OR ml_blogid = ?1",
                table
            ),
            params![site],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TableList;

    fn relations() -> ContentRelations {
        ContentRelations::new(Arc::new(Database::open_in_memory(TableList::default()).unwrap()))
    }

    fn site(id: i64) -> SiteId {
        SiteId::new(id).unwrap()
    }

    fn item(id: i64) -> ContentId {
        ContentId::new(id).unwrap()
    }

    #[test]
    fn unlinked_item_has_no_relations() {
        let relations = relations();
        assert!(relations.relations(site(1), item(42), ContentType::Post).unwrap().is_empty());
    }

    #[test]
    fn link_is_readable_from_both_sides() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();

        let from_source = relations.relations(site(1), item(42), ContentType::Post).unwrap();
        assert_eq!(from_source.get(&site(2)), Some(&item(99)));
        assert_eq!(from_source.get(&site(1)), Some(&item(42)));

        let from_target = relations.relations(site(2), item(99), ContentType::Post).unwrap();
        assert_eq!(from_target, from_source);

        assert!(relations.relations(site(1), item(42), ContentType::Term).unwrap().is_empty());
    }

    #[test]
    fn one_counterpart_per_site() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(1), site(2), item(42), item(100), ContentType::Post)
            .unwrap();

        assert_eq!(
            relations.translation_id(site(1), item(42), site(2), ContentType::Post).unwrap(),
            Some(item(100))
        );
        assert!(relations.relations(site(2), item(99), ContentType::Post).unwrap().is_empty());
    }

    #[test]
    fn linking_from_member_joins_group() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(2), site(3), item(99), item(7), ContentType::Post)
            .unwrap();

        let group = relations.relations(site(3), item(7), ContentType::Post).unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group.get(&site(1)), Some(&item(42)));
    }

    #[test]
    fn relinking_moves_target_between_groups() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(1), item(10), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(1), site(2), item(2), item(10), ContentType::Post)
            .unwrap();

        assert!(relations.relations(site(1), item(1), ContentType::Post).unwrap().is_empty());
        assert_eq!(
            relations.translation_id(site(2), item(10), site(1), ContentType::Post).unwrap(),
            Some(item(2))
        );
    }

    #[test]
    fn replacing_anchor_site_item_moves_the_group() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(2), site(1), item(99), item(50), ContentType::Post)
            .unwrap();

        let group = relations.relations(site(1), item(50), ContentType::Post).unwrap();
        assert_eq!(group, BTreeMap::from([(site(1), item(50)), (site(2), item(99))]));
        assert!(relations.relations(site(1), item(42), ContentType::Post).unwrap().is_empty());

        relations
            .set_relation(site(1), site(3), item(42), item(7), ContentType::Post)
            .unwrap();

        assert_eq!(
            relations.relations(site(1), item(42), ContentType::Post).unwrap(),
            BTreeMap::from([(site(1), item(42)), (site(3), item(7))])
        );
        assert_eq!(
            relations.relations(site(2), item(99), ContentType::Post).unwrap(),
            BTreeMap::from([(site(1), item(50)), (site(2), item(99))])
        );
    }

    #[test]
    fn removing_last_member_dissolves_group() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();

        assert_eq!(relations.delete_relation(site(2), item(99), ContentType::Post).unwrap(), 2);
        assert!(relations.relations(site(1), item(42), ContentType::Post).unwrap().is_empty());
        assert_eq!(relations.delete_relation(site(2), item(99), ContentType::Post).unwrap(), 0);
    }

    #[test]
    fn removing_anchor_dissolves_group() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(1), site(3), item(42), item(5), ContentType::Post)
            .unwrap();

        assert_eq!(relations.delete_relation(site(1), item(42), ContentType::Post).unwrap(), 3);
        assert!(relations.relations(site(3), item(5), ContentType::Post).unwrap().is_empty());
    }

    #[test]
    fn delete_site_removes_both_directions() {
        let relations = relations();
        relations
            .set_relation(site(1), site(2), item(42), item(99), ContentType::Post)
            .unwrap();
        relations
            .set_relation(site(2), site(3), item(5), item(6), ContentType::Term)
            .unwrap();

        assert_eq!(relations.count_for_site(site(2)).unwrap(), 3);
        assert_eq!(relations.delete_site(site(2)).unwrap(), 4);

        assert_eq!(relations.count_for_site(site(2)).unwrap(), 0);
        assert!(relations.relations(site(1), item(42), ContentType::Post).unwrap().is_empty());
        assert!(relations.relations(site(3), item(6), ContentType::Term).unwrap().is_empty());
    }
}
