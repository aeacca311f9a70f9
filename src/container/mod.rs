//! Controller instances and the dependency-injection boundary.
//!
//! The dispatch engine never constructs controllers itself. It asks an
//! [`InstanceProvider`], which delegates to a [`Container`]. Hosts can plug in
//! their own container; [`SimpleContainer`] is the built-in one.

mod error;
mod key;
mod provider;
mod simple;

pub use error::ContainerError;
pub use key::{Factory, Instance, TypeKey};
pub use provider::InstanceProvider;
pub use simple::{Scope, SimpleContainer};

use crate::dispatch::ConnectionContext;

/// A dependency-injection container.
///
/// `scope` is the connection the instance is requested for, so containers
/// can implement per-connection scoping. Implementations decide all caching.
pub trait Container: Send + Sync {
    /// Resolve an instance of the type identified by `key`.
    fn get(&self, key: &TypeKey, scope: &ConnectionContext) -> Result<Instance, ContainerError>;

    /// Drop cached instances. Used between test runs.
    fn reset(&self);
}

