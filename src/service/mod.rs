//! # Service Layer
//!
//! The dependency injection container and the provider protocol that
//! composes the plugin.
//!
//! ## Lifecycle
//!
//! | Phase | `set`/`share`/`unset`/`extend` | `get` |
//! |-------|-------------------------------|-------|
//! | Idle, Unlocked | allowed | every key |
//! | Locked | `LockedContainer` | every key |
//! | Bootstrapped | `LockedContainer` | shared keys only |
//!
//! ## Key Types
//!
//! - [`Container`] - Keyed registry of lazily constructed services
//! - [`Definition`] - A value, scalar or factory to store under a key
//! - [`Provider`] - A service provider tagged with its capabilities
//! - [`keys`] - Keys of the core services

mod container;
pub mod keys;
mod provider;

pub use container::{Container, ContainerError, ContainerStatus, Definition, Scalar, Service};
pub use provider::{BootstrappableProvider, Capabilities, ModuleProvider, Provider, ServiceProvider};
