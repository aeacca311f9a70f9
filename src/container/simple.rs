//! Default in-process container.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::error::ContainerError;
use super::key::{Factory, Instance, TypeKey};
use super::Container;
use crate::dispatch::ConnectionContext;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One instance for the container's lifetime (until `reset`).
    #[default]
    Singleton,
    /// One instance per live connection.
    Connection,
    /// A fresh instance on every request.
    Transient,
}

#[derive(Clone)]
struct Registration {
    scope: Scope,
    factory: Factory,
}

/// A registry of factories with singleton, per-connection, and transient
/// scoping.
///
/// Singletons are built while holding the cache lock, so a type is
/// constructed at most once even when two deliveries race for it. Factories
/// must not call back into the same container.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use socket_controllers::{Scope, SimpleContainer};
///
/// #[derive(Default)]
/// struct Greeter;
///
/// let container = SimpleContainer::new();
/// container.register_default::<Greeter>();
/// container.register(Scope::Transient, || String::from("fresh"));
/// ```
#[derive(Default)]
pub struct SimpleContainer {
    registrations: RwLock<HashMap<TypeKey, Registration>>,
    singletons: Mutex<HashMap<TypeKey, Instance>>,
}

impl SimpleContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `T` with the given scope.
    ///
    /// Re-registering a type replaces its factory and drops any cached
    /// singleton.
    pub fn register<T, F>(&self, scope: Scope, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Instance);
        self.register_factory(TypeKey::of::<T>(), scope, factory);
    }

    /// Register `T::default` as a singleton factory.
    pub fn register_default<T>(&self)
    where
        T: Default + Send + Sync + 'static,
    {
        self.register(Scope::Singleton, T::default);
    }

    /// Register an already-built singleton.
    pub fn insert<T>(&self, instance: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let shared: Instance = instance;
        let cached = shared.clone();
        self.register_factory(key, Scope::Singleton, Arc::new(move || cached.clone()));
        self.singletons.lock().insert(key, shared);
    }

    /// Register a type-erased factory.
    pub fn register_factory(&self, key: TypeKey, scope: Scope, factory: Factory) {
        self.registrations
            .write()
            .insert(key, Registration { scope, factory });
        self.singletons.lock().remove(&key);
    }

    /// Whether a factory is registered for `key`.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.registrations.read().contains_key(key)
    }

    /// Resolve `T` and downcast it.
    pub fn resolve<T>(&self, scope: &ConnectionContext) -> Result<Arc<T>, ContainerError>
    where
        T: Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        self.get(&key, scope)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                type_name: key.name().to_string(),
            })
    }
}

impl Container for SimpleContainer {
    fn get(&self, key: &TypeKey, scope: &ConnectionContext) -> Result<Instance, ContainerError> {
        let registration = self
            .registrations
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ContainerError::NotRegistered {
                type_name: key.name().to_string(),
            })?;

        match registration.scope {
            Scope::Singleton => {
                let mut cache = self.singletons.lock();
                if let Some(instance) = cache.get(key) {
                    return Ok(instance.clone());
                }
                tracing::debug!(service = %key, "constructing singleton");
                let instance = (registration.factory)();
                cache.insert(*key, instance.clone());
                Ok(instance)
            }
            Scope::Connection => Ok(scope.scoped_instance(*key, || (registration.factory)())),
            Scope::Transient => Ok((registration.factory)()),
        }
    }

    fn reset(&self) {
        self.singletons.lock().clear();
    }
}
