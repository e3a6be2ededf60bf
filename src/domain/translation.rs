//! Translation results
//!
//! A [`Translation`] is derived on demand from a relationship record plus the
//! remote site's language and content. It is never persisted.

use serde::{Deserialize, Serialize};

use super::id::{ContentId, ContentType, SiteId};
use super::language::Language;

/// Title and URL of a content item as seen from inside its own site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteContent {
    pub title: String,
    pub url: String,
}

/// A content item's counterpart on another site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub source_site_id: SiteId,
    pub target_site_id: SiteId,
    pub source_content_id: ContentId,

    /// Linked item on the target site; `None` when the translation falls
    /// back to the target site's home page
    pub target_content_id: Option<ContentId>,

    pub content_type: ContentType,
    pub remote_title: String,
    pub remote_url: String,
    pub icon_url: String,
    pub language: Language,
}

impl Translation {
    /// Returns true if the target is an actual linked item, not a fallback
    pub fn is_exact(&self) -> bool {
        self.target_content_id.is_some()
    }
}
