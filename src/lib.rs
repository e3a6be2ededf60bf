//! MultilingualPress - Link content across the sites of a multisite network
//!
//! Every site of a network represents one language. Posts and terms are
//! linked across sites, and the translation API answers "where is this item
//! on the other sites" for language switchers, editors and redirects.
//!
//! The plugin is composed in a dependency injection [`Container`] by service
//! providers and started by the [`MultilingualPress`] front controller.

pub mod cli;
pub mod controller;
pub mod core;
pub mod domain;
pub mod hooks;
pub mod host;
pub mod module;
pub mod service;
pub mod storage;
pub mod translation;

use std::sync::Arc;

use anyhow::Result;

pub use controller::{ControllerError, ControllerState, MultilingualPress};
pub use domain::{ContentId, ContentType, Language, ModuleId, SiteId, Translation};
pub use service::{Container, ContainerError, ContainerStatus, Definition, Provider};
pub use translation::{TranslationApi, TranslationArgs};

/// Boots the plugin for one request
///
/// Registers the core services, then `modules` in order, and bootstraps.
/// The controller takes part in the process-wide state, see
/// [`MultilingualPress::new`].
pub fn init(
    database: Arc<storage::Database>,
    config: storage::NetworkConfig,
    request: host::RequestContext,
    modules: impl IntoIterator<Item = Provider>,
) -> Result<MultilingualPress> {
    start(MultilingualPress::new(Container::new()), database, config, request, modules)
}

/// Like [`init`], with a controller of its own, see
/// [`MultilingualPress::isolated`]
pub fn init_isolated(
    database: Arc<storage::Database>,
    config: storage::NetworkConfig,
    request: host::RequestContext,
    modules: impl IntoIterator<Item = Provider>,
) -> Result<MultilingualPress> {
    start(MultilingualPress::isolated(Container::new()), database, config, request, modules)
}

fn start(
    mut controller: MultilingualPress,
    database: Arc<storage::Database>,
    config: storage::NetworkConfig,
    request: host::RequestContext,
    modules: impl IntoIterator<Item = Provider>,
) -> Result<MultilingualPress> {
    controller.add_provider(Provider::bootstrappable(
        crate::core::CoreServiceProvider::new(database, request).with_config(config),
    ))?;
    for module in modules {
        controller.add_provider(module)?;
    }

    controller.bootstrap()?;
    Ok(controller)
}
