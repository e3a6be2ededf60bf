//! Current-site execution context
//!
//! Which site's data the content queries target. Switching is a stack:
//! [`SiteContext::switch_to`] pushes a site and returns a [`SiteSwitch`]
//! guard that restores the previous site when dropped, on every exit path.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::trace;

use crate::domain::SiteId;

#[derive(Debug, Error)]
pub enum SiteContextError {
    #[error("Cannot switch to site {0}: it does not exist")]
    UnknownSite(SiteId),

    #[error("Failed to look up site {site}: {message}")]
    Lookup { site: SiteId, message: String },
}

/// Answers whether a site exists
pub trait SiteDirectory: Send + Sync {
    fn site_exists(&self, site: SiteId) -> anyhow::Result<bool>;
}

/// Stack of switched-to sites over the site of the request
pub struct SiteContext {
    home: SiteId,
    stack: Mutex<Vec<SiteId>>,
    directory: Arc<dyn SiteDirectory>,
}

impl SiteContext {
    pub fn new(home: SiteId, directory: Arc<dyn SiteDirectory>) -> Self {
        Self {
            home,
            stack: Mutex::new(Vec::new()),
            directory,
        }
    }

    /// Site the request started on
    pub fn home(&self) -> SiteId {
        self.home
    }

    /// Site queries currently target
    pub fn current(&self) -> SiteId {
        self.stack.lock().last().copied().unwrap_or(self.home)
    }

    /// Returns true while any switch is active
    pub fn is_switched(&self) -> bool {
        !self.stack.lock().is_empty()
    }

    /// Number of active switches
    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }

    /// Makes `site` current until the returned guard is dropped
    pub fn switch_to(&self, site: SiteId) -> Result<SiteSwitch<'_>, SiteContextError> {
        let exists = self
            .directory
            .site_exists(site)
            .map_err(|err| SiteContextError::Lookup {
                site,
                message: format!("{:#}", err),
            })?;

        if !exists {
            return Err(SiteContextError::UnknownSite(site));
        }

        let mut stack = self.stack.lock();
        let depth = stack.len();
        stack.push(site);
        trace!(%site, depth = depth + 1, "switched site");

        Ok(SiteSwitch {
            context: self,
            depth,
        })
    }

    /// Runs `f` with `site` current, restoring the previous site afterwards
    pub fn within<T, F>(&self, site: SiteId, f: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        let _switch = self.switch_to(site)?;
        f()
    }

    fn restore(&self, depth: usize) {
        let mut stack = self.stack.lock();
        stack.truncate(depth);
        trace!(site = %stack.last().copied().unwrap_or(self.home), depth, "restored site");
    }
}

impl fmt::Debug for SiteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteContext")
            .field("home", &self.home)
            .field("stack", &*self.stack.lock())
            .finish()
    }
}

/// Restores the previous site when dropped
#[must_use = "the site is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SiteSwitch<'a> {
    context: &'a SiteContext,
    depth: usize,
}

impl SiteSwitch<'_> {
    /// The site this guard switched to
    pub fn site(&self) -> SiteId {
        self.context.stack.lock().get(self.depth).copied().unwrap_or(self.context.home)
    }
}

impl Drop for SiteSwitch<'_> {
    fn drop(&mut self) {
        self.context.restore(self.depth);
    }
}
