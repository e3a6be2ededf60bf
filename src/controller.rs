//! Front controller
//!
//! [`MultilingualPress`] owns the container, collects providers and runs
//! the two-phase startup:
//!
//! 1. `add_provider` registers definitions right away
//! 2. `bootstrap` locks the container, decides whether the current site
//!    takes part in the network, bootstraps providers, lets modules decide
//!    whether they are active, and finally restricts the container to its
//!    shared services
//!
//! Host callbacks that cannot be handed the container reach shared services
//! through [`MultilingualPress::resolve`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ModuleId;
use crate::hooks::{EventBus, Signal};
use crate::host::RequestContext;
use crate::module::ModuleManager;
use crate::service::{keys, Container, ContainerError, Provider};
use crate::storage::Options;

static CONTAINER: OnceLock<Arc<Container>> = OnceLock::new();
static ACTIVE_SITE: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Cannot {operation} a controller that is {state}")]
    IllegalState {
        operation: &'static str,
        state: ControllerState,
    },

    #[error("Cannot resolve '{0}' before MultilingualPress is initialized")]
    PrematureAccess(String),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Lifecycle phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ControllerState {
    Constructed,
    ProvidersAdded,
    Bootstrapped,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ControllerState::Constructed => "constructed",
            ControllerState::ProvidersAdded => "providers-added",
            ControllerState::Bootstrapped => "bootstrapped",
        };
        f.write_str(state)
    }
}

/// Whether a controller takes part in the process-wide state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Process,
    Isolated,
}

/// The plugin's front controller
pub struct MultilingualPress {
    container: Arc<Container>,
    scope: Scope,
    state: ControllerState,
    providers: Vec<Provider>,
    active_site: Option<bool>,
    activated: Vec<ModuleId>,
}

impl MultilingualPress {
    /// Creates the controller; the first controller of the process backs
    /// [`resolve`](Self::resolve), and the first active-site decision holds
    /// for every controller of the process
    pub fn new(container: Container) -> Self {
        let controller = Self::with_scope(container, Scope::Process);
        if CONTAINER.set(Arc::clone(&controller.container)).is_ok() {
            debug!("published process-wide container");
        }
        controller
    }

    /// Creates a controller that neither publishes its container nor shares
    /// the process-wide active-site decision
    ///
    /// For hosting several networks in one process.
    pub fn isolated(container: Container) -> Self {
        Self::with_scope(container, Scope::Isolated)
    }

    fn with_scope(container: Container, scope: Scope) -> Self {
        Self {
            container: Arc::new(container),
            scope,
            state: ControllerState::Constructed,
            providers: Vec::new(),
            active_site: None,
            activated: Vec::new(),
        }
    }

    /// Reads a service from the process-wide container
    pub fn resolve<T: Send + Sync + 'static>(key: &str) -> Result<Arc<T>, ControllerError> {
        let container = CONTAINER
            .get()
            .ok_or_else(|| ControllerError::PrematureAccess(key.to_string()))?;

        Ok(container.get(key)?)
    }

    /// Whether the first bootstrapped controller of the process ran on an
    /// active site; `None` before any controller decided
    pub fn is_active_site() -> Option<bool> {
        ACTIVE_SITE.get().copied()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Active-site decision of this controller, once bootstrapped
    pub fn active_site(&self) -> Option<bool> {
        self.active_site
    }

    /// Modules that were activated during bootstrap, in provider order
    pub fn activated_modules(&self) -> &[ModuleId] {
        &self.activated
    }

    /// Registers a provider's definitions and keeps it for bootstrapping
    pub fn add_provider(&mut self, provider: Provider) -> Result<()> {
        if self.state == ControllerState::Bootstrapped {
            return Err(ControllerError::IllegalState {
                operation: "add a provider to",
                state: self.state,
            }
            .into());
        }

        provider
            .register(&self.container)
            .with_context(|| format!("Failed to register {:?}", provider))?;

        let capabilities = provider.capabilities();
        debug!(?provider, ?capabilities, "added provider");

        if capabilities.bootstraps {
            self.providers.push(provider);
        }

        self.state = ControllerState::ProvidersAdded;
        Ok(())
    }

    /// Runs the bootstrap phase; callable once, after providers were added
    pub fn bootstrap(&mut self) -> Result<()> {
        if self.state != ControllerState::ProvidersAdded {
            return Err(ControllerError::IllegalState {
                operation: "bootstrap",
                state: self.state,
            }
            .into());
        }

        let container = Arc::clone(&self.container);
        container.lock()?;

        let active = self.determine_active_site()?;

        for provider in &self.providers {
            if provider.capabilities().module && !active {
                debug!(?provider, "skipping module on inactive site");
                continue;
            }

            provider
                .bootstrap(&container)
                .with_context(|| format!("Failed to bootstrap {:?}", provider))?;
        }

        if active {
            let events: Arc<EventBus> = container.get(keys::EVENTS)?;
            events.emit(&Signal::Init)?;
            events.emit(&Signal::Loaded)?;

            let modules: Arc<ModuleManager> = container.get(keys::MODULE_MANAGER)?;
            for provider in &self.providers {
                let Provider::Module(module_provider) = provider else {
                    continue;
                };

                let module = module_provider.module();
                let enabled = module_provider
                    .register_module(&modules, &container)
                    .with_context(|| format!("Failed to register module {}", module))?;

                if enabled {
                    info!(%module, "activating module");
                    events.emit(&Signal::ModuleActivated(module.clone()))?;
                    self.activated.push(module);
                }
            }
        }

        container.bootstrap()?;
        self.state = ControllerState::Bootstrapped;

        info!(active, modules = self.activated.len(), "MultilingualPress bootstrapped");
        Ok(())
    }

    /// Network-wide endpoints are always active; anything else is active when
    /// the current site has a language
    fn determine_active_site(&mut self) -> Result<bool> {
        if let Some(active) = self.active_site {
            return Ok(active);
        }

        if self.scope == Scope::Process {
            if let Some(&active) = ACTIVE_SITE.get() {
                debug!(active, "active site already decided for this process");
                self.active_site = Some(active);
                return Ok(active);
            }
        }

        let request: Arc<RequestContext> = self.container.get(keys::REQUEST)?;
        let mut active = if request.endpoint.is_network_wide() {
            true
        } else {
            let options: Arc<Options> = self.container.get(keys::OPTIONS)?;
            options.site_languages()?.contains_key(&request.site_id)
        };

        if self.scope == Scope::Process {
            active = *ACTIVE_SITE.get_or_init(|| active);
        }

        debug!(site = %request.site_id, endpoint = ?request.endpoint, active, "decided active site");
        self.active_site = Some(active);
        Ok(active)
    }
}

impl fmt::Debug for MultilingualPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultilingualPress")
            .field("scope", &self.scope)
            .field("state", &self.state)
            .field("providers", &self.providers.len())
            .field("active_site", &self.active_site)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::CoreServiceProvider;
    use crate::domain::{SiteId, SiteLanguage};
    use crate::host::{Endpoint, RequestContext};
    use crate::module::{ActivationAwareness, ModuleDescriptor};
    use crate::service::{
        BootstrappableProvider, ContainerStatus, Definition, ModuleProvider, ServiceProvider,
    };
    use crate::storage::{Database, Sites, TableList};

    #[derive(Default)]
    struct Counters {
        bootstrapped: AtomicUsize,
        activated: AtomicUsize,
    }

    struct Trasher {
        counters: Arc<Counters>,
        active_by_default: bool,
    }

    struct TrasherSettings {
        label: String,
    }

    impl ServiceProvider for Trasher {
        fn register(&self, container: &Container) -> Result<()> {
            container.set("trasher.settings", Definition::value(TrasherSettings {
                label: "Trasher".to_string(),
            }))?;
            container.set("trasher.label", Definition::value("Trasher".to_string()))?;
            Ok(())
        }
    }

    impl BootstrappableProvider for Trasher {
        fn bootstrap(&self, container: &Container) -> Result<()> {
            self.counters.bootstrapped.fetch_add(1, Ordering::SeqCst);

            let events: Arc<EventBus> = container.get(keys::EVENTS)?;
            let counters = Arc::clone(&self.counters);
            self.on_activation(&events, move || {
                counters.activated.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        }
    }

    impl ModuleProvider for Trasher {
        fn module(&self) -> ModuleId {
            "trasher".parse().unwrap()
        }

        fn register_module(&self, modules: &ModuleManager, _: &Container) -> Result<bool> {
            let mut descriptor = ModuleDescriptor::new(&self.module(), "Trasher");
            if !self.active_by_default {
                descriptor = descriptor.inactive_by_default();
            }
            modules.register(descriptor)
        }
    }

    struct Setup {
        controller: MultilingualPress,
        counters: Arc<Counters>,
    }

    fn setup(endpoint: Endpoint, with_language: bool, active_by_default: bool) -> Setup {
        let db = Arc::new(Database::open_in_memory(TableList::default()).unwrap());
        let site = Sites::new(Arc::clone(&db)).add("example.com", "/", true).unwrap();
        if with_language {
            Options::new(Arc::clone(&db))
                .set_site_language(site, SiteLanguage::new("en_US"))
                .unwrap();
        }

        let request = RequestContext::frontend(site).with_endpoint(endpoint);
        let counters = Arc::new(Counters::default());

        let mut controller = MultilingualPress::isolated(Container::new());
        controller
            .add_provider(Provider::bootstrappable(CoreServiceProvider::new(db, request)))
            .unwrap();
        controller
            .add_provider(Provider::module(Trasher {
                counters: Arc::clone(&counters),
                active_by_default,
            }))
            .unwrap();

        Setup {
            controller,
            counters,
        }
    }

    fn fired(controller: &MultilingualPress, signal: Signal) -> usize {
        controller
            .container()
            .get::<EventBus>(keys::EVENTS)
            .unwrap()
            .fired(&signal)
    }

    #[test]
    fn active_site_activates_modules() {
        let mut s = setup(Endpoint::Frontend, true, true);
        assert_eq!(s.controller.state(), ControllerState::ProvidersAdded);

        s.controller.bootstrap().unwrap();

        assert_eq!(s.controller.state(), ControllerState::Bootstrapped);
        assert_eq!(s.controller.container().status(), ContainerStatus::Bootstrapped);
        assert_eq!(s.controller.active_site(), Some(true));
        assert_eq!(s.counters.bootstrapped.load(Ordering::SeqCst), 1);
        assert_eq!(s.counters.activated.load(Ordering::SeqCst), 1);
        assert_eq!(fired(&s.controller, Signal::Init), 1);
        assert_eq!(fired(&s.controller, Signal::Loaded), 1);
        assert_eq!(
            s.controller.activated_modules(),
            &["trasher".parse::<ModuleId>().unwrap()]
        );
    }

    #[test]
    fn inactive_site_skips_modules() {
        let mut s = setup(Endpoint::Frontend, false, true);
        s.controller.bootstrap().unwrap();

        assert_eq!(s.controller.active_site(), Some(false));
        assert_eq!(s.controller.container().status(), ContainerStatus::Bootstrapped);
        assert_eq!(s.counters.bootstrapped.load(Ordering::SeqCst), 0);
        assert_eq!(fired(&s.controller, Signal::Init), 0);
        assert!(s.controller.activated_modules().is_empty());
    }

    #[test]
    fn network_admin_is_always_active() {
        let mut s = setup(Endpoint::NetworkAdmin, false, true);
        s.controller.bootstrap().unwrap();

        assert_eq!(s.controller.active_site(), Some(true));
        assert_eq!(s.counters.activated.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_module_bootstraps_but_never_activates() {
        let mut s = setup(Endpoint::Frontend, true, false);
        s.controller.bootstrap().unwrap();

        assert_eq!(s.counters.bootstrapped.load(Ordering::SeqCst), 1);
        assert_eq!(s.counters.activated.load(Ordering::SeqCst), 0);
        assert_eq!(fired(&s.controller, Signal::Loaded), 1);
        assert!(s.controller.activated_modules().is_empty());
    }

    #[test]
    fn bootstrap_is_one_shot() {
        let mut s = setup(Endpoint::Frontend, true, true);
        s.controller.bootstrap().unwrap();

        let err = s.controller.bootstrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ControllerError>(),
            Some(ControllerError::IllegalState { .. })
        ));
        assert_eq!(s.counters.activated.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bootstrap_needs_providers() {
        let mut controller = MultilingualPress::isolated(Container::new());
        let err = controller.bootstrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ControllerError>(),
            Some(ControllerError::IllegalState {
                state: ControllerState::Constructed,
                ..
            })
        ));
    }

    #[test]
    fn no_providers_after_bootstrap() {
        let mut s = setup(Endpoint::Frontend, true, true);
        s.controller.bootstrap().unwrap();

        let late = Trasher {
            counters: Arc::new(Counters::default()),
            active_by_default: true,
        };
        let err = s.controller.add_provider(Provider::module(late)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ControllerError>(),
            Some(ControllerError::IllegalState { .. })
        ));
    }

    #[test]
    fn conflicting_registration_fails() {
        let mut s = setup(Endpoint::Frontend, true, true);
        let twin = Trasher {
            counters: Arc::new(Counters::default()),
            active_by_default: true,
        };

        let err = s.controller.add_provider(Provider::module(twin)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContainerError>(),
            Some(ContainerError::ServiceAlreadyDefined(_))
        ));
    }

    #[test]
    fn non_shared_services_are_sealed_after_bootstrap() {
        let mut s = setup(Endpoint::Frontend, true, true);
        s.controller.bootstrap().unwrap();

        let err = s
            .controller
            .container()
            .get::<TrasherSettings>("trasher.settings")
            .map(|settings| settings.label.clone())
            .unwrap_err();
        assert!(matches!(err, ContainerError::BootstrappedContainer { .. }));
        assert_eq!(
            *s.controller.container().get::<String>("trasher.label").unwrap(),
            "Trasher"
        );

        let site: SiteId = s.controller.container().get::<RequestContext>(keys::REQUEST).unwrap().site_id;
        assert_eq!(site.get(), 1);
    }
}
