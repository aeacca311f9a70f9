//! Plain configuration for [`SocketControllers::start`](super::SocketControllers::start).

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::container::{Container, TypeKey};
use crate::dispatch::ErrorHandler;
use crate::metadata::{ControllerDescriptor, MetadataRegistry};
use crate::middleware::Middleware;
use crate::resolver::BodyBinding;
use crate::transport::Transport;

/// Everything `start` needs.
///
/// Only `transport` is required. Without a `container`, controllers are
/// built from their fallback factories, once each. Without an explicit
/// `controllers` list, every descriptor is attached.
#[derive(Clone, Default)]
pub struct Options {
    /// The socket server to attach to.
    pub transport: Option<Arc<dyn Transport>>,
    /// The DI container that supplies controller instances.
    pub container: Option<Arc<dyn Container>>,
    /// Allow-list of controller types. `None` attaches every descriptor.
    pub controllers: Option<Vec<TypeKey>>,
    /// Declared controllers, in registration order.
    pub descriptors: Vec<Arc<ControllerDescriptor>>,
    /// Global middleware, run before controller and action middleware.
    pub middlewares: Vec<Arc<dyn Middleware>>,
    /// Receives unrecovered dispatch failures. Defaults to logging them.
    pub error_handler: Option<ErrorHandler>,
    /// Which payload argument unindexed body parameters receive.
    pub body_binding: BodyBinding,
    /// Runtime handlers run on. Defaults to the current runtime.
    pub runtime: Option<Handle>,
}

impl Options {
    /// Options attached to `transport` with everything else defaulted.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    /// Add every controller in `registry`.
    pub fn with_registry(mut self, registry: &MetadataRegistry) -> Self {
        self.descriptors.extend(registry.all().iter().cloned());
        self
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("transport", &self.transport.is_some())
            .field("container", &self.container.is_some())
            .field("controllers", &self.controllers)
            .field("descriptors", &self.descriptors.len())
            .field("middlewares", &self.middlewares.len())
            .field("error_handler", &self.error_handler.is_some())
            .field("body_binding", &self.body_binding)
            .finish()
    }
}
