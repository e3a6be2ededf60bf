//! Domain models for MultilingualPress
//!
//! Identifiers, languages and translation results, without any I/O concerns.

mod id;
mod language;
mod translation;

pub use id::{ContentId, ContentType, IdError, ModuleId, SiteContent, SiteId};
pub use language::{Language, NameField, SiteLanguage};
pub use translation::{RemoteContent, Translation};
