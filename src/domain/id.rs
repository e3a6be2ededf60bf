//! Identifiers shared across the network
//!
//! ID Format:
//! - Site IDs: positive integers (`1`, `2`, ...), one site per language
//! - Content IDs: positive integers, unique per site and content type
//! - Site content references: `{site}:{content}` (e.g., `2:99`)
//! - Module IDs: lowercase slugs (e.g., `trasher`)
//!
//! IDs are plain integers in storage; the newtypes keep a site ID from being
//! passed where a content ID is expected.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid site ID: expected a positive integer, got '{0}'")]
    InvalidSiteId(String),

    #[error("Invalid content ID: expected a positive integer, got '{0}'")]
    InvalidContentId(String),

    #[error("Invalid content reference: expected '{{site}}:{{content}}', got '{0}'")]
    InvalidReference(String),

    #[error("Invalid content type: expected 'post' or 'term', got '{0}'")]
    InvalidContentType(String),

    #[error("Invalid module ID: expected a lowercase slug, got '{0}'")]
    InvalidModuleId(String),
}

fn parse_positive(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident, $error:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Creates an ID, rejecting zero and negative values
            pub fn new(id: i64) -> Option<Self> {
                (id > 0).then_some(Self(id))
            }

            /// Returns the raw integer value
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_positive(s)
                    .map(Self)
                    .ok_or_else(|| IdError::$error(s.to_string()))
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdError;

            fn try_from(id: i64) -> Result<Self, Self::Error> {
                Self::new(id).ok_or_else(|| IdError::$error(id.to_string()))
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let id = i64::column_result(value)?;
                Self::new(id).ok_or(FromSqlError::OutOfRange(id))
            }
        }
    };
}

integer_id!(
    /// ID of a site in the network
    SiteId,
    InvalidSiteId
);

integer_id!(
    /// ID of a post or a term taxonomy entry on one site
    ContentId,
    InvalidContentId
);

/// Kind of content linked across sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Post,
    Term,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Term => "term",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "post" => Ok(ContentType::Post),
            "term" => Ok(ContentType::Term),
            other => Err(IdError::InvalidContentType(other.to_string())),
        }
    }
}

impl ToSql for ContentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// A content item on a specific site, written `{site}:{content}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteContent {
    pub site_id: SiteId,
    pub content_id: ContentId,
}

impl SiteContent {
    pub fn new(site_id: SiteId, content_id: ContentId) -> Self {
        Self {
            site_id,
            content_id,
        }
    }
}

impl fmt::Display for SiteContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site_id, self.content_id)
    }
}

impl FromStr for SiteContent {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (site, content) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| IdError::InvalidReference(s.to_string()))?;

        let site_id = site
            .parse()
            .map_err(|_| IdError::InvalidReference(s.to_string()))?;
        let content_id = content
            .parse()
            .map_err(|_| IdError::InvalidReference(s.to_string()))?;

        Ok(Self::new(site_id, content_id))
    }
}

/// Identifier of a feature module (e.g., `trasher`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId(String);

impl ModuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slug used when registering the module with the module manager
    pub fn slug(&self) -> String {
        format!("module-{}", self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if !valid {
            return Err(IdError::InvalidModuleId(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ModuleId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.0
    }
}
