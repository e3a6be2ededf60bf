//! The provider that wires every core service

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use super::notices::Notices;
use super::setup::CoreSetup;
use crate::hooks::EventBus;
use crate::host::{MemoryCache, ObjectCache, RequestContext, SiteContext};
use crate::module::ModuleManager;
use crate::service::{
    keys, BootstrappableProvider, Container, Definition, Service, ServiceProvider,
};
use crate::storage::{
    ContentDirectory, ContentRelations, Database, Languages, NetworkConfig, Options,
    SiteRelations, Sites,
};
use crate::translation::{TermTranslator, TranslationApi, TranslationSources};

/// Shared services that must be built before the container is bootstrapped,
/// since non-shared construction details are unreachable afterwards
const WARM_UP: &[&str] = &[
    keys::OPTIONS,
    keys::SITE_CONTEXT,
    keys::SITE_RELATIONS,
    keys::CONTENT_RELATIONS,
    keys::TRANSLATION_API,
    keys::MODULE_MANAGER,
];

/// Registers the core services of one request
pub struct CoreServiceProvider {
    database: Arc<Database>,
    request: RequestContext,
    config: NetworkConfig,
}

impl CoreServiceProvider {
    pub fn new(database: Arc<Database>, request: RequestContext) -> Self {
        Self {
            database,
            request,
            config: NetworkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }
}

impl ServiceProvider for CoreServiceProvider {
    fn register(&self, container: &Container) -> Result<()> {
        let home = self.request.site_id;

        container.share(keys::CONFIG, Definition::value(self.config.clone()))?;
        container.share(keys::EVENTS, Definition::value(EventBus::new()))?;
        container.share(keys::REQUEST, Definition::value(self.request.clone()))?;
        container.share(keys::NOTICES, Definition::value(Notices::new()))?;
        container.set(
            keys::DATABASE,
            Definition::service(Arc::clone(&self.database) as Service),
        )?;

        container.share(
            keys::OPTIONS,
            Definition::factory(|c: &Container| Ok(Options::new(c.get(keys::DATABASE)?))),
        )?;
        container.set(
            keys::SITES,
            Definition::factory(|c: &Container| Ok(Sites::new(c.get(keys::DATABASE)?))),
        )?;
        container.share(
            keys::SITE_CONTEXT,
            Definition::factory(move |c: &Container| {
                let sites: Arc<Sites> = c.get(keys::SITES)?;
                Ok(SiteContext::new(home, sites))
            }),
        )?;
        container.set(
            keys::OBJECT_CACHE,
            Definition::factory(|_: &Container| {
                Ok(Arc::new(MemoryCache::new()) as Arc<dyn ObjectCache>)
            }),
        )?;
        container.share(
            keys::SITE_RELATIONS,
            Definition::factory(|c: &Container| Ok(SiteRelations::new(c.get(keys::DATABASE)?))),
        )?;
        container.share(
            keys::CONTENT_RELATIONS,
            Definition::factory(|c: &Container| {
                Ok(ContentRelations::new(c.get(keys::DATABASE)?))
            }),
        )?;
        container.set(
            keys::LANGUAGES,
            Definition::factory(|c: &Container| Ok(Languages::new(c.get(keys::DATABASE)?))),
        )?;
        container.set(
            keys::CONTENT_DIRECTORY,
            Definition::factory(|c: &Container| {
                Ok(ContentDirectory::new(
                    c.get(keys::DATABASE)?,
                    c.get(keys::SITE_CONTEXT)?,
                ))
            }),
        )?;
        container.set(
            keys::TERM_TRANSLATOR,
            Definition::factory(|c: &Container| {
                let cache: Arc<Arc<dyn ObjectCache>> = c.get(keys::OBJECT_CACHE)?;
                Ok(TermTranslator::new(
                    c.get::<ContentRelations>(keys::CONTENT_RELATIONS)?.as_ref().clone(),
                    c.get::<ContentDirectory>(keys::CONTENT_DIRECTORY)?.as_ref().clone(),
                    c.get(keys::SITE_CONTEXT)?,
                    cache.as_ref().clone(),
                    c.get(keys::REQUEST)?,
                ))
            }),
        )?;
        container.share(
            keys::TRANSLATION_API,
            Definition::factory(|c: &Container| {
                Ok(TranslationApi::new(TranslationSources {
                    site_relations: c.get::<SiteRelations>(keys::SITE_RELATIONS)?.as_ref().clone(),
                    content_relations: c
                        .get::<ContentRelations>(keys::CONTENT_RELATIONS)?
                        .as_ref()
                        .clone(),
                    content: c.get::<ContentDirectory>(keys::CONTENT_DIRECTORY)?.as_ref().clone(),
                    languages: c.get::<Languages>(keys::LANGUAGES)?.as_ref().clone(),
                    options: c.get::<Options>(keys::OPTIONS)?.as_ref().clone(),
                    context: c.get(keys::SITE_CONTEXT)?,
                    terms: c.get(keys::TERM_TRANSLATOR)?,
                    request: c.get(keys::REQUEST)?,
                }))
            }),
        )?;
        container.share(
            keys::MODULE_MANAGER,
            Definition::factory(|c: &Container| {
                Ok(ModuleManager::new(c.get::<Options>(keys::OPTIONS)?.as_ref().clone()))
            }),
        )?;

        debug!(site = %home, "registered core services");
        Ok(())
    }
}

impl BootstrappableProvider for CoreServiceProvider {
    fn bootstrap(&self, container: &Container) -> Result<()> {
        for key in WARM_UP {
            container
                .get_raw(key)
                .with_context(|| format!("Failed to build core service '{}'", key))?;
        }

        let events: Arc<EventBus> = container.get(keys::EVENTS)?;
        Arc::new(CoreSetup::from_container(container)?).attach(&events);

        debug!("bootstrapped core services");
        Ok(())
    }
}
