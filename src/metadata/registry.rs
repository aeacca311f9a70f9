//! Metadata registry: the declared controllers bootstrap reads from.

use std::collections::HashSet;
use std::sync::Arc;

use super::controller::ControllerDescriptor;
use crate::container::TypeKey;
use crate::error::ConfigError;

/// Ordered collection of controller declarations keyed by controller type.
///
/// Registration happens once at program initialization; afterwards the
/// registry is only read. Re-registering a controller type is ignored so
/// routes are never duplicated.
///
/// ## Example
///
/// ```
/// use socket_controllers::{Action, Controller, MetadataRegistry};
/// use serde_json::Value;
///
/// #[derive(Default)]
/// struct Chat;
///
/// let chat = || {
///     Controller::<Chat>::new("/chat")
///         .action(Action::on_connect("hello").handle_sync(|_, _| Ok(Value::Null)))
/// };
///
/// let mut registry = MetadataRegistry::new();
/// assert!(registry.register(chat()).unwrap());
/// assert!(!registry.register(chat()).unwrap());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    controllers: Vec<Arc<ControllerDescriptor>>,
    keys: HashSet<TypeKey>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a controller.
    ///
    /// Returns `Ok(false)` without changing anything when the controller
    /// type is already registered.
    pub fn register(
        &mut self,
        controller: impl Into<ControllerDescriptor>,
    ) -> Result<bool, ConfigError> {
        let controller = controller.into();
        if self.keys.contains(&controller.key()) {
            tracing::debug!(controller = %controller.key(), "controller already registered");
            return Ok(false);
        }
        controller.validate()?;

        tracing::debug!(
            controller = %controller.key(),
            namespace = controller.namespace(),
            actions = controller.actions().len(),
            "registered controller"
        );
        self.keys.insert(controller.key());
        self.controllers.push(Arc::new(controller));
        Ok(true)
    }

    /// All registered controllers in registration order.
    pub fn all(&self) -> &[Arc<ControllerDescriptor>] {
        &self.controllers
    }

    /// Look up a controller by type key.
    pub fn get(&self, key: &TypeKey) -> Option<&Arc<ControllerDescriptor>> {
        self.controllers.iter().find(|c| c.key() == *key)
    }

    /// Whether controller type `C` is registered.
    pub fn contains<C: 'static>(&self) -> bool {
        self.keys.contains(&TypeKey::of::<C>())
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Remove everything. Intended for test teardown.
    pub fn clear(&mut self) {
        self.controllers.clear();
        self.keys.clear();
    }
}

/// Register controller modules that follow the convention pattern.
///
/// Each module must export `fn controller() -> ControllerDescriptor` (or any
/// type convertible into one). Stops at the first error.
///
/// # Example
/// ```ignore
/// let mut registry = MetadataRegistry::new();
/// socket_controllers::register_controllers!(
///     registry,
///     controllers::chat,
///     controllers::rooms,
/// )?;
/// ```
#[macro_export]
macro_rules! register_controllers {
    ($registry:expr, $( $($seg:ident)::+ ),+ $(,)?) => {{
        let mut result: ::core::result::Result<(), $crate::ConfigError> = Ok(());
        $(
            if result.is_ok() {
                result = $registry.register($($seg)::+::controller()).map(|_| ());
            }
        )+
        result
    }};
}
