//! Languages table

use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::domain::Language;

const COLUMNS: &str = "english_name, native_name, custom_name, is_rtl, iso_639_1, iso_639_2, locale, http_name, priority";

#[derive(Debug, Clone)]
pub struct Languages {
    db: Arc<Database>,
}

impl Languages {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Language> {
        Ok(Language {
            english_name: row.get(0)?,
            native_name: row.get(1)?,
            custom_name: row.get(2)?,
            is_rtl: row.get(3)?,
            iso_639_1: row.get(4)?,
            iso_639_2: row.get(5)?,
            locale: row.get(6)?,
            http_name: row.get(7)?,
            priority: row.get(8)?,
        })
    }

    /// Inserts a language, or replaces the one with the same locale
    pub fn upsert(&self, language: &Language) -> Result<()> {
        let table = self.db.tables().languages();
        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT INTO {table} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(locale) DO UPDATE SET
                        english_name = excluded.english_name,
                        native_name = excluded.native_name,
                        custom_name = excluded.custom_name,
                        is_rtl = excluded.is_rtl,
                        iso_639_1 = excluded.iso_639_1,
                        iso_639_2 = excluded.iso_639_2,
                        http_name = excluded.http_name,
                        priority = excluded.priority",
                ),
                params![
                    language.english_name,
                    language.native_name,
                    language.custom_name,
                    language.is_rtl,
                    language.iso_639_1,
                    language.iso_639_2,
                    language.locale,
                    language.http_name,
                    language.priority,
                ],
            )
            .with_context(|| format!("Failed to store language {}", language.locale))?;

        Ok(())
    }

    /// Returns all languages, highest priority first
    pub fn all(&self) -> Result<Vec<Language>> {
        let table = self.db.tables().languages();
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM {table} ORDER BY priority DESC, english_name"
        ))?;

        let languages = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(languages)
    }

    /// Looks a language up by locale (`de_DE`) or HTTP tag (`de-DE`)
    pub fn by_locale(&self, locale: &str) -> Result<Option<Language>> {
        let table = self.db.tables().languages();
        let language = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM {table} WHERE locale = ?1 OR http_name = ?2 LIMIT 1"
                ),
                params![locale, locale.replace('_', "-")],
                Self::from_row,
            )
            .optional()?;

        Ok(language)
    }

    /// Looks a language up by ISO 639-1 code, preferring the highest priority
    pub fn by_iso(&self, iso: &str) -> Result<Option<Language>> {
        let table = self.db.tables().languages();
        let language = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM {table} WHERE iso_639_1 = ?1 ORDER BY priority DESC LIMIT 1"
                ),
                params![iso.to_lowercase()],
                Self::from_row,
            )
            .optional()?;

        Ok(language)
    }

    /// Returns the flag image configured for a locale, if any
    pub fn flag(&self, locale: &str) -> Result<Option<String>> {
        let table = self.db.tables().languages();
        let flag: Option<Option<String>> = self
            .db
            .conn()
            .query_row(
                &format!("SELECT flag FROM {table} WHERE locale = ?1"),
                params![locale],
                |row| row.get(0),
            )
            .optional()?;

        Ok(flag.flatten().filter(|flag| !flag.is_empty()))
    }

    /// Sets the flag image of a locale
    pub fn set_flag(&self, locale: &str, flag: &str) -> Result<bool> {
        let table = self.db.tables().languages();
        let updated = self.db.conn().execute(
            &format!("UPDATE {table} SET flag = ?1 WHERE locale = ?2"),
            params![flag, locale],
        )?;

        Ok(updated > 0)
    }
}
