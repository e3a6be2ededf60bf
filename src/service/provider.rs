//! Service providers
//!
//! A provider is a unit of composition. Every provider registers
//! definitions into the container. Some also bootstrap, which means they
//! attach side effects once the container is locked. Module providers
//! additionally enroll themselves with the [`ModuleManager`].
//!
//! The front controller never inspects providers at runtime: the
//! [`Provider`] tag says what a provider can do.

use std::fmt;

use anyhow::Result;

use super::Container;
use crate::domain::ModuleId;
use crate::module::ModuleManager;

/// Registers definitions into a container
///
/// Registration must be free of side effects outside the container.
pub trait ServiceProvider: Send + Sync {
    fn register(&self, container: &Container) -> Result<()>;
}

/// A provider with a bootstrap step that runs after the container is locked
pub trait BootstrappableProvider: ServiceProvider {
    fn bootstrap(&self, container: &Container) -> Result<()>;
}

/// A provider backing a feature module that can be switched on and off
pub trait ModuleProvider: BootstrappableProvider {
    /// Identifier of the module
    fn module(&self) -> ModuleId;

    /// Enrolls the module and returns whether it is active
    ///
    /// The controller emits the module's activation signal when this returns
    /// true.
    fn register_module(&self, modules: &ModuleManager, container: &Container) -> Result<bool>;
}

/// What a provider can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub bootstraps: bool,
    pub module: bool,
}

/// A provider tagged with its capabilities
pub enum Provider {
    Plain(Box<dyn ServiceProvider>),
    Bootstrappable(Box<dyn BootstrappableProvider>),
    Module(Box<dyn ModuleProvider>),
}

impl Provider {
    pub fn plain(provider: impl ServiceProvider + 'static) -> Self {
        Provider::Plain(Box::new(provider))
    }

    pub fn bootstrappable(provider: impl BootstrappableProvider + 'static) -> Self {
        Provider::Bootstrappable(Box::new(provider))
    }

    pub fn module(provider: impl ModuleProvider + 'static) -> Self {
        Provider::Module(Box::new(provider))
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Provider::Plain(_) => Capabilities::default(),
            Provider::Bootstrappable(_) => Capabilities {
                bootstraps: true,
                module: false,
            },
            Provider::Module(_) => Capabilities {
                bootstraps: true,
                module: true,
            },
        }
    }

    /// Runs the register step of any provider kind
    pub fn register(&self, container: &Container) -> Result<()> {
        match self {
            Provider::Plain(provider) => provider.register(container),
            Provider::Bootstrappable(provider) => provider.register(container),
            Provider::Module(provider) => provider.register(container),
        }
    }

    /// Runs the bootstrap step; plain providers have none
    pub fn bootstrap(&self, container: &Container) -> Result<()> {
        match self {
            Provider::Plain(_) => Ok(()),
            Provider::Bootstrappable(provider) => provider.bootstrap(container),
            Provider::Module(provider) => provider.bootstrap(container),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Plain(_) => f.write_str("Provider::Plain"),
            Provider::Bootstrappable(_) => f.write_str("Provider::Bootstrappable"),
            Provider::Module(provider) => write!(f, "Provider::Module({})", provider.module()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Definition;

    struct Values;

    impl ServiceProvider for Values {
        fn register(&self, container: &Container) -> Result<()> {
            container.set("values.answer", Definition::value(42u32))?;
            Ok(())
        }
    }

    #[test]
    fn plain_provider_capabilities() {
        let provider = Provider::plain(Values);
        assert_eq!(provider.capabilities(), Capabilities::default());

        let container = Container::new();
        provider.register(&container).unwrap();
        provider.bootstrap(&container).unwrap();
        assert_eq!(*container.get::<u32>("values.answer").unwrap(), 42);
    }

    #[test]
    fn double_registration_propagates() {
        let container = Container::new();
        Provider::plain(Values).register(&container).unwrap();

        let err = Provider::plain(Values).register(&container).unwrap_err();
        assert!(err.to_string().contains("already defined"));
    }
}
