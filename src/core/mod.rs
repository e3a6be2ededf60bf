//! # Core
//!
//! The services every request needs, wired by [`CoreServiceProvider`], and
//! the housekeeping attached to host signals by [`CoreSetup`].
//!
//! | Signal | Handling |
//! |--------|----------|
//! | `SiteDeleted(id)` | Drop the site's relations, language and links |
//! | `AdminNotices` | Raise [`Notice::NoSiteRelations`] on an unconfigured network |

mod notices;
mod provider;
mod setup;

pub use notices::{Notice, Notices};
pub use provider::CoreServiceProvider;
pub use setup::CoreSetup;
