//! Language lists built from translations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{ContentId, NameField, SiteId};

/// Ordering of a language list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Target site ID ascending
    #[value(name = "site_id")]
    SiteId,
    /// Language priority descending, original order among equals
    #[default]
    Priority,
    /// Display name ascending, ignoring case
    Name,
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortPolicy::SiteId => "site_id",
            SortPolicy::Priority => "priority",
            SortPolicy::Name => "name",
        };
        f.write_str(name)
    }
}

impl FromStr for SortPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "site_id" | "blogid" => Ok(SortPolicy::SiteId),
            "priority" => Ok(SortPolicy::Priority),
            "name" => Ok(SortPolicy::Name),
            other => Err(format!("Unknown sort policy: {}", other)),
        }
    }
}

/// One entry of a language switcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageLink {
    pub site_id: SiteId,

    /// HTTP language tag of the target ("de-DE")
    pub language: String,

    /// Text to show, per the requested [`NameField`]
    pub text: String,

    pub url: String,

    /// Title of the linked content, empty for home page fallbacks
    pub title: String,

    pub icon_url: String,
    pub priority: i32,

    /// The entry points at the site being viewed
    pub is_current: bool,
}

/// Options for [`TranslationApi::linked_elements_list`](super::TranslationApi::linked_elements_list)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListArgs {
    pub link_text: NameField,
    pub sort: SortPolicy,
    pub include_base: bool,
    pub strict: bool,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            link_text: NameField::Native,
            sort: SortPolicy::Priority,
            include_base: false,
            strict: false,
        }
    }
}

/// A translated post's public URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterlinkedPermalink {
    /// The linked post on the target site
    pub post_id: ContentId,
    pub permalink: String,
    pub title: String,

    /// Flag image of the target site's language, empty when there is none
    pub flag: String,

    /// Locale of the target site
    pub language: String,
}

/// Sorts links in place; all orderings are stable
pub fn sort_links(links: &mut [LanguageLink], policy: SortPolicy) {
    match policy {
        SortPolicy::SiteId => links.sort_by_key(|link| link.site_id),
        SortPolicy::Priority => links.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortPolicy::Name => links.sort_by_cached_key(|link| link.text.to_lowercase()),
    }
}
