//! Resolves controllers to live instances for each event delivery.

use std::sync::Arc;

use super::error::ContainerError;
use super::key::{Instance, TypeKey};
use super::simple::{Scope, SimpleContainer};
use super::Container;
use crate::dispatch::ConnectionContext;
use crate::error::ConfigError;
use crate::metadata::ControllerDescriptor;

/// Hands out controller instances from the configured container.
///
/// When no container is configured, a [`SimpleContainer`] is populated with
/// every controller's fallback factory as a singleton, which gives one
/// instance per controller for the process lifetime. The dispatcher calls
/// [`InstanceProvider::get`] once per controller per event delivery and
/// leaves caching to the container.
#[derive(Clone)]
pub struct InstanceProvider {
    container: Arc<dyn Container>,
}

impl InstanceProvider {
    /// Delegate to `container`.
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self { container }
    }

    /// Build a provider for `controllers`, using `container` if given.
    pub fn for_controllers(
        container: Option<Arc<dyn Container>>,
        controllers: &[Arc<ControllerDescriptor>],
    ) -> Result<Self, ConfigError> {
        if let Some(container) = container {
            return Ok(Self::new(container));
        }

        let fallback = SimpleContainer::new();
        for controller in controllers {
            let factory = controller
                .factory()
                .ok_or_else(|| ConfigError::MissingFactory {
                    name: controller.key().short_name().to_string(),
                })?;
            fallback.register_factory(controller.key(), Scope::Singleton, factory.clone());
        }
        Ok(Self::new(Arc::new(fallback)))
    }

    /// Get the instance for `controller` within `context`.
    pub fn get(
        &self,
        controller: TypeKey,
        context: &ConnectionContext,
    ) -> Result<Instance, ContainerError> {
        tracing::trace!(controller = %controller, socket_id = context.socket_id(), "resolving controller");
        self.container.get(&controller, context)
    }

    /// The underlying container.
    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }
}
