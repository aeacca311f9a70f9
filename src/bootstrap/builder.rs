//! Fluent construction of [`Options`].

use std::sync::Arc;

use tokio::runtime::Handle;

use super::options::Options;
use super::SocketControllers;
use crate::container::{Container, TypeKey};
use crate::dispatch::DispatchInvocation;
use crate::error::{ConfigError, DispatchError};
use crate::metadata::{ControllerDescriptor, MetadataRegistry};
use crate::middleware::Middleware;
use crate::resolver::BodyBinding;
use crate::transport::Transport;

/// Builder for [`SocketControllers`].
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use socket_controllers::memory::MemoryServer;
/// use socket_controllers::{Action, Controller, SocketControllers};
/// use serde_json::Value;
///
/// #[derive(Default)]
/// struct Ping;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), socket_controllers::ConfigError> {
/// let server = Arc::new(MemoryServer::new());
/// let app = SocketControllers::builder()
///     .transport(server.clone())
///     .controller_descriptor(
///         Controller::<Ping>::new("/ping")
///             .action(Action::on_message("ping", "ping").emit_on_success("pong").handle_sync(|_, _| Ok(Value::Null))),
///     )
///     .start()?;
///
/// assert_eq!(server.listener_count(), 1);
/// app.stop();
/// assert_eq!(server.listener_count(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SocketControllersBuilder {
    options: Options,
}

impl SocketControllersBuilder {
    /// Start from empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// The socket server to attach to.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.options.transport = Some(transport);
        self
    }

    /// Add every controller in `registry`.
    pub fn registry(mut self, registry: &MetadataRegistry) -> Self {
        self.options = self.options.with_registry(registry);
        self
    }

    /// Add one controller declaration.
    pub fn controller_descriptor(mut self, controller: impl Into<ControllerDescriptor>) -> Self {
        self.options.descriptors.push(Arc::new(controller.into()));
        self
    }

    /// Restrict attachment to an explicit list; call once per controller.
    pub fn controller<C: 'static>(mut self) -> Self {
        self.options
            .controllers
            .get_or_insert_with(Vec::new)
            .push(TypeKey::of::<C>());
        self
    }

    /// The DI container that supplies controller instances.
    pub fn container(mut self, container: Arc<dyn Container>) -> Self {
        self.options.container = Some(container);
        self
    }

    /// Add global middleware.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.options.middlewares.push(Arc::new(middleware));
        self
    }

    /// Receive unrecovered dispatch failures.
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DispatchError, &DispatchInvocation) + Send + Sync + 'static,
    {
        self.options.error_handler = Some(Arc::new(handler));
        self
    }

    /// Binding policy for unindexed body parameters.
    pub fn body_binding(mut self, binding: BodyBinding) -> Self {
        self.options.body_binding = binding;
        self
    }

    /// Run handlers on `runtime` instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.options.runtime = Some(runtime);
        self
    }

    /// The options built so far.
    pub fn into_options(self) -> Options {
        self.options
    }

    /// Validate, attach, and start dispatching.
    pub fn start(self) -> Result<SocketControllers, ConfigError> {
        SocketControllers::start(self.options)
    }
}
