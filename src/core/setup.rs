//! Housekeeping the core attaches to host signals

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use super::notices::{Notice, Notices};
use crate::domain::SiteId;
use crate::hooks::{EventBus, Signal, Topic, DEFAULT_PRIORITY};
use crate::host::{Endpoint, RequestContext};
use crate::service::{keys, Container};
use crate::storage::{ContentRelations, Options, SiteRelations};

/// Cleans up after deleted sites and reports an unconfigured network
pub struct CoreSetup {
    site_relations: Arc<SiteRelations>,
    content_relations: Arc<ContentRelations>,
    options: Arc<Options>,
    request: Arc<RequestContext>,
    notices: Arc<Notices>,
}

impl CoreSetup {
    /// Collects the shared services it needs
    pub fn from_container(container: &Container) -> Result<Self> {
        Ok(Self {
            site_relations: container.get(keys::SITE_RELATIONS)?,
            content_relations: container.get(keys::CONTENT_RELATIONS)?,
            options: container.get(keys::OPTIONS)?,
            request: container.get(keys::REQUEST)?,
            notices: container.get(keys::NOTICES)?,
        })
    }

    /// Subscribes to site deletions and notice collection
    pub fn attach(self: Arc<Self>, events: &EventBus) {
        let setup = Arc::clone(&self);
        events.subscribe(Topic::SiteDeleted, DEFAULT_PRIORITY, move |signal| match signal {
            Signal::SiteDeleted(site) => setup.delete_site(*site),
            _ => Ok(()),
        });

        events.subscribe(Signal::AdminNotices, DEFAULT_PRIORITY, move |_| {
            self.check_site_relations()
        });
    }

    /// Removes every trace of a site from the plugin's data
    pub fn delete_site(&self, site: SiteId) -> Result<()> {
        let relations = self.site_relations.delete_relation(site, None)?;
        let mapped = self.options.remove_site_language(site)?;
        let links = self.content_relations.delete_site(site)?;

        info!(%site, relations, mapped, links, "removed deleted site from the network");
        Ok(())
    }

    /// Raises [`Notice::NoSiteRelations`] for super admins on site screens
    /// while no site has a language
    pub fn check_site_relations(&self) -> Result<()> {
        let request = &self.request;
        if !request.session.super_admin
            || matches!(request.endpoint, Endpoint::NetworkAdmin | Endpoint::AdminAjax)
        {
            return Ok(());
        }

        if self.options.site_languages()?.is_empty() {
            self.notices.raise(Notice::NoSiteRelations);
        } else {
            debug!("site languages configured");
        }

        Ok(())
    }
}
