//! Container keys of the core services
//!
//! Keys marked *shared* stay readable after the container is bootstrapped;
//! the rest are construction details of other services.

/// Loaded [`NetworkConfig`](crate::storage::NetworkConfig) (shared)
pub const CONFIG: &str = "mlp.config";

/// [`EventBus`](crate::hooks::EventBus) (shared)
pub const EVENTS: &str = "mlp.events";

/// [`RequestContext`](crate::host::RequestContext) of the running request (shared)
pub const REQUEST: &str = "mlp.request";

/// [`Notices`](crate::core::Notices) raised for administrators (shared)
pub const NOTICES: &str = "mlp.notices";

/// [`Database`](crate::storage::Database) handle
pub const DATABASE: &str = "mlp.database";

/// Network and site [`Options`](crate::storage::Options) (shared)
pub const OPTIONS: &str = "mlp.options";

/// [`Sites`](crate::storage::Sites) directory
pub const SITES: &str = "mlp.sites";

/// Current-site [`SiteContext`](crate::host::SiteContext) (shared)
pub const SITE_CONTEXT: &str = "mlp.site_context";

/// Process [`ObjectCache`](crate::host::ObjectCache)
pub const OBJECT_CACHE: &str = "mlp.object_cache";

/// [`SiteRelations`](crate::storage::SiteRelations) (shared)
pub const SITE_RELATIONS: &str = "mlp.site_relations";

/// [`ContentRelations`](crate::storage::ContentRelations) (shared)
pub const CONTENT_RELATIONS: &str = "mlp.content_relations";

/// [`Languages`](crate::storage::Languages) table
pub const LANGUAGES: &str = "mlp.languages";

/// [`ContentDirectory`](crate::storage::ContentDirectory) for posts and terms
pub const CONTENT_DIRECTORY: &str = "mlp.content_directory";

/// [`TermTranslator`](crate::translation::TermTranslator)
pub const TERM_TRANSLATOR: &str = "mlp.term_translator";

/// [`TranslationApi`](crate::translation::TranslationApi) (shared)
pub const TRANSLATION_API: &str = "mlp.translation_api";

/// [`ModuleManager`](crate::module::ModuleManager) (shared)
pub const MODULE_MANAGER: &str = "mlp.module_manager";
