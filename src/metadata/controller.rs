//! Controller declarations.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::action::{Action, ActionDescriptor, Trigger};
use super::namespace::NamespacePattern;
use crate::container::{Factory, Instance, TypeKey};
use crate::error::ConfigError;
use crate::middleware::Middleware;

/// A declared controller, independent of its type.
pub struct ControllerDescriptor {
    key: TypeKey,
    namespace: String,
    actions: Vec<Arc<ActionDescriptor>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    factory: Option<Factory>,
}

impl ControllerDescriptor {
    /// The controller type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The namespace pattern as declared.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Parse the namespace pattern.
    pub fn pattern(&self) -> Result<NamespacePattern, ConfigError> {
        NamespacePattern::parse(&self.namespace)
    }

    /// Actions in declaration order.
    pub fn actions(&self) -> &[Arc<ActionDescriptor>] {
        &self.actions
    }

    /// Actions with a given trigger kind, in declaration order.
    pub fn actions_for<'a>(
        &'a self,
        matches: impl Fn(&Trigger) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Arc<ActionDescriptor>> + 'a {
        self.actions.iter().filter(move |a| matches(a.trigger()))
    }

    /// Per-controller middleware.
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Fallback factory used when no container is configured.
    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// Check the namespace pattern and every action.
    pub fn validate(&self) -> Result<NamespacePattern, ConfigError> {
        let pattern = self.pattern()?;
        let mut events: HashMap<&str, &ActionDescriptor> = HashMap::new();
        for action in &self.actions {
            action.validate()?;
            if let Trigger::Message(event) = action.trigger() {
                if let Some(first) = events.insert(event.as_str(), action.as_ref()) {
                    return Err(ConfigError::DuplicateEvent {
                        namespace: self.namespace.clone(),
                        event: event.clone(),
                        first: first.qualified_name(),
                        second: action.qualified_name(),
                    });
                }
            }
        }
        Ok(pattern)
    }
}

impl fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("controller", &self.key)
            .field("namespace", &self.namespace)
            .field("actions", &self.actions)
            .field("middlewares", &self.middlewares.len())
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// Builder for a controller of type `C`.
///
/// ## Example
///
/// ```
/// use socket_controllers::{Action, Controller, Param};
/// use serde_json::Value;
///
/// #[derive(Default)]
/// struct Rooms;
///
/// let controller = Controller::<Rooms>::new("/rooms/:roomId")
///     .action(
///         Action::on_connect("joined")
///             .param(Param::namespace_param("roomId"))
///             .handle_sync(|_rooms, params| Ok(params.value(0)?.cloned().unwrap_or(Value::Null))),
///     )
///     .build();
///
/// assert_eq!(controller.actions().len(), 1);
/// ```
pub struct Controller<C> {
    descriptor: ControllerDescriptor,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Default + Send + Sync + 'static> Controller<C> {
    /// Declare a controller on `namespace`, built with `C::default` unless a
    /// container supplies it.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_factory(namespace, C::default)
    }
}

impl<C: Send + Sync + 'static> Controller<C> {
    fn with(namespace: String, factory: Option<Factory>) -> Self {
        Self {
            descriptor: ControllerDescriptor {
                key: TypeKey::of::<C>(),
                namespace,
                actions: Vec::new(),
                middlewares: Vec::new(),
                factory,
            },
            _controller: PhantomData,
        }
    }

    /// Declare a controller built by `factory` unless a container supplies it.
    pub fn with_factory<F>(namespace: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Instance);
        Self::with(namespace.into(), Some(factory))
    }

    /// Declare a controller that only a container can supply.
    pub fn injected(namespace: impl Into<String>) -> Self {
        Self::with(namespace.into(), None)
    }

    /// Add an action.
    pub fn action(mut self, action: Action<C>) -> Self {
        self.descriptor
            .actions
            .push(Arc::new(action.into_descriptor()));
        self
    }

    /// Add per-controller middleware. Runs after global middleware.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.descriptor.middlewares.push(Arc::new(middleware));
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> ControllerDescriptor {
        self.descriptor
    }
}

impl<C: Send + Sync + 'static> From<Controller<C>> for ControllerDescriptor {
    fn from(controller: Controller<C>) -> Self {
        controller.build()
    }
}
