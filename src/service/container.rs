//! Service container
//!
//! A keyed registry of lazily constructed services with a one-directional
//! lifecycle:
//!
//! ```text
//! Idle ──set/share──▶ Unlocked ──lock()──▶ Locked ──bootstrap()──▶ Bootstrapped
//! ```
//!
//! - `Idle`/`Unlocked`: definitions may be added, removed and extended
//! - `Locked`: definitions are frozen, every key can still be read
//! - `Bootstrapped`: only shared keys can be read
//!
//! Factories run at most once. The resulting value is memoized and handed
//! out as an `Arc` to every caller.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

/// A type-erased service value
pub type Service = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn FnOnce(&Container) -> anyhow::Result<Service> + Send>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Cannot {action} service '{key}': it is not registered in the container")]
    ServiceNotFound { key: String, action: &'static str },

    #[error("Cannot {action} service '{key}': the container is locked")]
    LockedContainer { key: String, action: &'static str },

    #[error("Cannot {action} service '{key}': the container is bootstrapped and the service is not shared")]
    BootstrappedContainer { key: String, action: &'static str },

    #[error("Can't {action} '{key}' because it was already resolved")]
    ServiceLocked { key: String, action: &'static str },

    #[error("Cannot {operation} a container that is {status}")]
    IllegalState {
        operation: &'static str,
        status: ContainerStatus,
    },

    #[error("Service '{0}' is already defined")]
    ServiceAlreadyDefined(String),

    #[error("Service '{key}' is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Service '{0}' depends on itself")]
    CircularDependency(String),

    #[error("Factory for service '{key}' failed: {message}")]
    FactoryFailed { key: String, message: String },
}

/// Lifecycle phase of a container, ordered from least to most restricted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContainerStatus {
    Idle,
    Unlocked,
    Locked,
    Bootstrapped,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ContainerStatus::Idle => "idle",
            ContainerStatus::Unlocked => "unlocked",
            ContainerStatus::Locked => "locked",
            ContainerStatus::Bootstrapped => "bootstrapped",
        };
        f.write_str(status)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Raw scalar values, which are always readable after bootstrap
pub trait Scalar: sealed::Sealed + Send + Sync + 'static {}

macro_rules! scalars {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Scalar for $ty {}
        )*

        fn is_scalar(value: &(dyn Any + Send + Sync)) -> bool {
            $(value.is::<$ty>())||*
        }
    };
}

scalars!(
    bool,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
    char,
    String,
    &'static str,
);

enum DefinitionKind {
    Value(Service),
    Factory(Factory),
}

/// Something that can be stored under a key: a ready value or a factory
pub struct Definition {
    kind: DefinitionKind,
    implicitly_shared: bool,
}

impl Definition {
    /// A ready value
    ///
    /// Scalars (numbers, `bool`, `char`, `String`, `&'static str`) are shared
    /// even when stored with `set`.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::service(Arc::new(value))
    }

    /// A ready value that is already behind an `Arc`
    pub fn service(service: Service) -> Self {
        let implicitly_shared = is_scalar(service.as_ref());
        Self {
            kind: DefinitionKind::Value(service),
            implicitly_shared,
        }
    }

    /// A raw scalar value, checked at compile time
    pub fn scalar<T: Scalar>(value: T) -> Self {
        Self::value(value)
    }

    /// A factory, invoked with the container on first access
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(&Container) -> anyhow::Result<T> + Send + 'static,
    {
        Self {
            kind: DefinitionKind::Factory(Box::new(move |container: &Container| {
                factory(container).map(|value| Arc::new(value) as Service)
            })),
            implicitly_shared: false,
        }
    }

    /// Returns true if this definition is lazily constructed
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, DefinitionKind::Factory(_))
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("factory", &self.is_factory())
            .field("implicitly_shared", &self.implicitly_shared)
            .finish()
    }
}

enum Slot {
    Factory(Factory),
    Resolving,
    Resolved { value: Service, from_factory: bool },
    Failed(String),
}

struct Entry {
    slot: Slot,
    shared: bool,
}

struct Inner {
    status: ContainerStatus,
    entries: HashMap<String, Entry>,
}

/// Dependency injection container
pub struct Container {
    inner: Mutex<Inner>,
}

impl Container {
    /// Creates an empty, idle container
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                status: ContainerStatus::Idle,
                entries: HashMap::new(),
            }),
        }
    }

    /// Returns the current lifecycle phase
    pub fn status(&self) -> ContainerStatus {
        self.inner.lock().status
    }

    /// Stores a definition under `key`
    pub fn set(&self, key: impl Into<String>, definition: Definition) -> Result<(), ContainerError> {
        self.define(key.into(), definition, false)
    }

    /// Stores a definition under `key` and keeps it readable after bootstrap
    pub fn share(
        &self,
        key: impl Into<String>,
        definition: Definition,
    ) -> Result<(), ContainerError> {
        self.define(key.into(), definition, true)
    }

    fn define(&self, key: String, definition: Definition, shared: bool) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();

        if inner.status >= ContainerStatus::Locked {
            return Err(ContainerError::LockedContainer { key, action: "set" });
        }

        if inner.entries.contains_key(&key) {
            return Err(ContainerError::ServiceAlreadyDefined(key));
        }

        let shared = shared || definition.implicitly_shared;
        let slot = match definition.kind {
            DefinitionKind::Value(value) => Slot::Resolved {
                value,
                from_factory: false,
            },
            DefinitionKind::Factory(factory) => Slot::Factory(factory),
        };

        trace!(key = %key, shared, "defining service");
        inner.entries.insert(key, Entry { slot, shared });

        if inner.status == ContainerStatus::Idle {
            inner.status = ContainerStatus::Unlocked;
        }

        Ok(())
    }

    /// Returns true if `key` has a factory or a value, regardless of phase
    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Returns true if `key` is registered and readable after bootstrap
    pub fn is_shared(&self, key: &str) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.shared)
    }

    /// Returns all registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns the service stored under `key`, downcast to `T`
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>, ContainerError> {
        self.get_raw(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Returns the type-erased service stored under `key`
    ///
    /// Unresolved factories are invoked here, without the container's lock
    /// held, so a factory may read other services.
    pub fn get_raw(&self, key: &str) -> Result<Service, ContainerError> {
        let factory = {
            let mut inner = self.inner.lock();
            let bootstrapped = inner.status == ContainerStatus::Bootstrapped;

            let entry = inner
                .entries
                .get_mut(key)
                .ok_or_else(|| ContainerError::ServiceNotFound {
                    key: key.to_string(),
                    action: "get",
                })?;

            if bootstrapped && !entry.shared {
                return Err(ContainerError::BootstrappedContainer {
                    key: key.to_string(),
                    action: "get",
                });
            }

            match std::mem::replace(&mut entry.slot, Slot::Resolving) {
                Slot::Factory(factory) => factory,
                Slot::Resolved {
                    value,
                    from_factory,
                } => {
                    let service = Arc::clone(&value);
                    entry.slot = Slot::Resolved {
                        value,
                        from_factory,
                    };
                    return Ok(service);
                }
                Slot::Resolving => {
                    return Err(ContainerError::CircularDependency(key.to_string()));
                }
                Slot::Failed(message) => {
                    entry.slot = Slot::Failed(message.clone());
                    return Err(ContainerError::FactoryFailed {
                        key: key.to_string(),
                        message,
                    });
                }
            }
        };

        trace!(key, "resolving service");
        let outcome = factory(self);

        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(key)
            .ok_or_else(|| ContainerError::ServiceNotFound {
                key: key.to_string(),
                action: "get",
            })?;

        match outcome {
            Ok(value) => {
                entry.slot = Slot::Resolved {
                    value: Arc::clone(&value),
                    from_factory: true,
                };
                Ok(value)
            }
            Err(err) => {
                let message = format!("{:#}", err);
                entry.slot = Slot::Failed(message.clone());
                Err(ContainerError::FactoryFailed {
                    key: key.to_string(),
                    message,
                })
            }
        }
    }

    /// Removes `key`
    ///
    /// Resolved factory services cannot be removed: their value may already
    /// be held by other services.
    pub fn unset(&self, key: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();

        if inner.status >= ContainerStatus::Locked {
            return Err(ContainerError::LockedContainer {
                key: key.to_string(),
                action: "unset",
            });
        }

        let entry = inner
            .entries
            .get(key)
            .ok_or_else(|| ContainerError::ServiceNotFound {
                key: key.to_string(),
                action: "unset",
            })?;

        if matches!(
            entry.slot,
            Slot::Resolving
                | Slot::Resolved {
                    from_factory: true,
                    ..
                }
        ) {
            return Err(ContainerError::ServiceLocked {
                key: key.to_string(),
                action: "unset",
            });
        }

        inner.entries.remove(key);
        Ok(())
    }

    /// Wraps the unresolved factory of `key` with `decorator`
    ///
    /// The decorator receives the value produced by the previous factory and
    /// the container, and its result becomes the service.
    pub fn extend<T, U, F>(&self, key: &str, decorator: F) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: FnOnce(Arc<T>, &Container) -> anyhow::Result<U> + Send + 'static,
    {
        let mut inner = self.inner.lock();

        if inner.status >= ContainerStatus::Locked {
            return Err(ContainerError::LockedContainer {
                key: key.to_string(),
                action: "extend",
            });
        }

        let entry = inner
            .entries
            .get_mut(key)
            .ok_or_else(|| ContainerError::ServiceNotFound {
                key: key.to_string(),
                action: "extend",
            })?;

        let previous = match std::mem::replace(&mut entry.slot, Slot::Resolving) {
            Slot::Factory(factory) => factory,
            Slot::Resolved {
                value,
                from_factory: false,
            } => {
                entry.slot = Slot::Resolved {
                    value,
                    from_factory: false,
                };
                return Err(ContainerError::ServiceNotFound {
                    key: key.to_string(),
                    action: "extend",
                });
            }
            other => {
                entry.slot = other;
                return Err(ContainerError::ServiceLocked {
                    key: key.to_string(),
                    action: "extend",
                });
            }
        };

        let owned_key = key.to_string();
        entry.slot = Slot::Factory(Box::new(move |container: &Container| {
            let value = previous(container)?
                .downcast::<T>()
                .map_err(|_| ContainerError::TypeMismatch {
                    key: owned_key,
                    expected: type_name::<T>(),
                })?;

            decorator(value, container).map(|decorated| Arc::new(decorated) as Service)
        }));

        debug!(key, "extended service factory");
        Ok(())
    }

    /// Freezes all definitions
    pub fn lock(&self) -> Result<(), ContainerError> {
        self.transition("lock", ContainerStatus::Unlocked, ContainerStatus::Locked)
    }

    /// Restricts reads to shared services
    pub fn bootstrap(&self) -> Result<(), ContainerError> {
        self.transition(
            "bootstrap",
            ContainerStatus::Locked,
            ContainerStatus::Bootstrapped,
        )
    }

    fn transition(
        &self,
        operation: &'static str,
        from: ContainerStatus,
        to: ContainerStatus,
    ) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();

        if inner.status != from {
            return Err(ContainerError::IllegalState {
                operation,
                status: inner.status,
            });
        }

        inner.status = to;
        debug!(services = inner.entries.len(), "container is now {}", to);
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Container")
            .field("status", &inner.status)
            .field("services", &inner.entries.len())
            .finish()
    }
}
