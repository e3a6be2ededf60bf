//! # Translation Layer
//!
//! Finds the counterparts of a content item on the other sites of the
//! network.
//!
//! ## Lookup
//!
//! ```text
//! source (site, id) ──► related sites ──► link group ──► switch to target
//!                                                            │
//!                         Translation { url, title, language } ◄┘
//! ```
//!
//! Every cross-site read happens inside a [`SiteSwitch`](crate::host::SiteSwitch),
//! so the current site is restored on every exit path.
//!
//! ## Key Types
//!
//! - [`TranslationApi`] - Post and term translations, language helpers
//! - [`TermTranslator`] - Term lookups behind the object cache
//! - [`LanguageLink`] / [`SortPolicy`] - Language switcher entries

mod api;
mod links;
mod term;

pub use api::{TranslationApi, TranslationArgs, TranslationSources};
pub use links::{sort_links, InterlinkedPermalink, LanguageLink, ListArgs, SortPolicy};
pub use term::{TermTranslator, CACHE_GROUP};
