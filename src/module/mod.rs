//! # Modules
//!
//! Feature modules that an administrator can switch on and off. Their
//! state is persisted as the network option `state_modules`, a map of
//! module slug to enabled flag.
//!
//! A module provider defers its setup with
//! [`ActivationAwareness::on_activation`]; the setup runs only if
//! [`ModuleManager::register`] reports the module as active.

use std::collections::BTreeMap;

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ModuleId;
use crate::hooks::{EventBus, Signal, DEFAULT_PRIORITY};
use crate::service::ModuleProvider;
use crate::storage::{OptionScope, Options};

/// Network option holding module states
pub const MODULE_STATE_OPTION: &str = "state_modules";

/// Metadata a module registers with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub active_by_default: bool,
}

impl ModuleDescriptor {
    /// A descriptor for `module`, active unless switched off
    pub fn new(module: &ModuleId, display_name: impl Into<String>) -> Self {
        Self {
            slug: module.slug(),
            display_name: display_name.into(),
            description: String::new(),
            active_by_default: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inactive_by_default(mut self) -> Self {
        self.active_by_default = false;
        self
    }
}

/// A registered module and its current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    #[serde(flatten)]
    pub descriptor: ModuleDescriptor,
    pub active: bool,
}

/// Registry of modules with persisted enable/disable state
#[derive(Debug)]
pub struct ModuleManager {
    options: Options,
    modules: Mutex<BTreeMap<String, ModuleDescriptor>>,
}

impl ModuleManager {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            modules: Mutex::new(BTreeMap::new()),
        }
    }

    fn states(&self) -> Result<BTreeMap<String, bool>> {
        Ok(self
            .options
            .get(OptionScope::Network, MODULE_STATE_OPTION)?
            .unwrap_or_default())
    }

    fn save_states(&self, states: &BTreeMap<String, bool>) -> Result<()> {
        self.options.set(OptionScope::Network, MODULE_STATE_OPTION, states)
    }

    /// Records a module and returns whether it is active
    ///
    /// A module seen for the first time takes its default state, which is
    /// persisted.
    pub fn register(&self, descriptor: ModuleDescriptor) -> Result<bool> {
        let mut states = self.states()?;

        let active = match states.get(&descriptor.slug) {
            Some(active) => *active,
            None => {
                states.insert(descriptor.slug.clone(), descriptor.active_by_default);
                self.save_states(&states)?;
                descriptor.active_by_default
            }
        };

        debug!(module = %descriptor.slug, active, "registered module");
        self.modules.lock().insert(descriptor.slug.clone(), descriptor);

        Ok(active)
    }

    /// Switches a module on
    pub fn enable(&self, slug: &str) -> Result<()> {
        self.set_state(slug, true)
    }

    /// Switches a module off
    pub fn disable(&self, slug: &str) -> Result<()> {
        self.set_state(slug, false)
    }

    fn set_state(&self, slug: &str, active: bool) -> Result<()> {
        let mut states = self.states()?;
        states.insert(slug.to_string(), active);
        self.save_states(&states)?;

        info!(module = slug, active, "changed module state");
        Ok(())
    }

    /// Returns the persisted state of a module; unknown modules are inactive
    pub fn is_active(&self, slug: &str) -> Result<bool> {
        Ok(self.states()?.get(slug).copied().unwrap_or(false))
    }

    /// Returns every module registered in this process with its state
    pub fn modules(&self) -> Result<Vec<ModuleStatus>> {
        let states = self.states()?;
        let modules = self.modules.lock();

        Ok(modules
            .values()
            .map(|descriptor| ModuleStatus {
                active: states.get(&descriptor.slug).copied().unwrap_or(false),
                descriptor: descriptor.clone(),
            })
            .collect())
    }

    /// Returns every persisted module state, registered in this process or not
    pub fn states_snapshot(&self) -> Result<BTreeMap<String, bool>> {
        self.states()
    }

    pub fn has_modules(&self) -> bool {
        !self.modules.lock().is_empty()
    }
}

/// Deferred setup for module providers
pub trait ActivationAwareness: ModuleProvider {
    /// Runs `handler` when the controller reports this module as activated
    fn on_activation<F>(&self, events: &EventBus, handler: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let module = self.module();
        debug!(%module, "deferring module setup until activation");
        events.subscribe(Signal::ModuleActivated(module), DEFAULT_PRIORITY, move |_| {
            handler()
        });
    }
}

impl<P: ModuleProvider + ?Sized> ActivationAwareness for P {}
