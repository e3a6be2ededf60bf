//! # Host Layer
//!
//! The collaborators a multisite host provides to the plugin, reduced to
//! their contracts:
//!
//! - [`SiteContext`] - Which site queries target, with a scoped [`SiteSwitch`]
//! - [`ObjectCache`] - Process object cache keyed by `(key, group)`
//! - [`RequestContext`] - Endpoint, viewed content and [`Session`] of the request

mod cache;
mod request;
mod site_context;

pub use cache::{MemoryCache, ObjectCache, ObjectCacheExt};
pub use request::{Endpoint, QueriedObject, RequestContext, Session, EDIT_POSTS, EDIT_TERMS};
pub use site_context::{SiteContext, SiteContextError, SiteDirectory, SiteSwitch};
