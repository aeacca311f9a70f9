//! The single entry point a host calls.
//!
//! `start` reads the declared controllers, validates them, builds one
//! [`NamespaceDispatcher`] per distinct namespace shape (patterns differing
//! only in parameter names share one), and attaches each to the transport. `stop` (or dropping the handle) detaches everything.

mod builder;
mod options;

pub use builder::SocketControllersBuilder;
pub use options::Options;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::container::{InstanceProvider, TypeKey};
use crate::dispatch::{log_error_handler, NamespaceDispatcher, Pipeline};
use crate::error::ConfigError;
use crate::metadata::{ControllerDescriptor, NamespacePattern};
use crate::resolver::ParameterResolver;
use crate::transport::{ConnectionListener, ListenerId, SocketRef, Transport};

/// A running set of controllers attached to one transport.
pub struct SocketControllers {
    transport: Arc<dyn Transport>,
    dispatchers: Vec<Arc<NamespaceDispatcher>>,
    listeners: Mutex<Vec<ListenerId>>,
    provider: InstanceProvider,
    stopped: AtomicBool,
}

impl SocketControllers {
    /// Start building.
    pub fn builder() -> SocketControllersBuilder {
        SocketControllersBuilder::new()
    }

    /// Validate `options`, attach to the transport, and start dispatching.
    ///
    /// Configuration errors are returned before anything is attached. If
    /// attaching fails part way, listeners already attached are removed.
    pub fn start(options: Options) -> Result<Self, ConfigError> {
        let transport = options.transport.ok_or(ConfigError::MissingTransport)?;
        let runtime = match options.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| ConfigError::NoRuntime)?,
        };

        let controllers = select_controllers(options.descriptors, options.controllers)?;
        let provider = InstanceProvider::for_controllers(options.container, &controllers)?;
        let pipeline = Arc::new(Pipeline::new(
            provider.clone(),
            ParameterResolver::new(options.body_binding),
            options.middlewares,
            options.error_handler.unwrap_or_else(log_error_handler),
            runtime,
        ));

        let mut dispatchers = Vec::new();
        for (pattern, group) in group_by_shape(controllers)? {
            dispatchers.push(NamespaceDispatcher::new(pattern, group, pipeline.clone())?);
        }

        let app = Self {
            transport,
            dispatchers,
            listeners: Mutex::new(Vec::new()),
            provider,
            stopped: AtomicBool::new(false),
        };
        app.attach()?;

        tracing::info!(
            namespaces = app.dispatchers.len(),
            "socket controllers started"
        );
        Ok(app)
    }

    fn attach(&self) -> Result<(), ConfigError> {
        for dispatcher in &self.dispatchers {
            let weak = Arc::downgrade(dispatcher);
            let listener: ConnectionListener = Arc::new(move |socket: SocketRef| {
                if let Some(dispatcher) = weak.upgrade() {
                    dispatcher.accept(socket);
                }
            });
            match self
                .transport
                .on_connection(dispatcher.pattern().clone(), listener)
            {
                Ok(id) => self.listeners.lock().push(id),
                Err(e) => {
                    tracing::error!(
                        namespace = %dispatcher.pattern(),
                        error = %e,
                        "failed to attach namespace"
                    );
                    self.stop();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Detach from the transport and stop handling events on every open
    /// connection. Safe to call more than once.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let listeners: Vec<ListenerId> = self.listeners.lock().drain(..).collect();
        for id in listeners {
            self.transport.remove_listener(id);
        }
        for dispatcher in &self.dispatchers {
            dispatcher.deactivate();
        }
        tracing::info!(namespaces = self.dispatchers.len(), "socket controllers stopped");
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Attached namespace patterns.
    pub fn namespaces(&self) -> Vec<&str> {
        self.dispatchers.iter().map(|d| d.pattern().as_str()).collect()
    }

    /// Live connections across every namespace.
    pub fn connection_count(&self) -> usize {
        self.dispatchers.iter().map(|d| d.connection_count()).sum()
    }

    /// The dispatchers, one per namespace shape.
    pub fn dispatchers(&self) -> &[Arc<NamespaceDispatcher>] {
        &self.dispatchers
    }

    /// The instance provider handlers are resolved through.
    pub fn provider(&self) -> &InstanceProvider {
        &self.provider
    }
}

impl Drop for SocketControllers {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SocketControllers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketControllers")
            .field("namespaces", &self.namespaces())
            .field("connections", &self.connection_count())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Deduplicate by controller type, validate, and apply the allow-list.
fn select_controllers(
    descriptors: Vec<Arc<ControllerDescriptor>>,
    allow: Option<Vec<TypeKey>>,
) -> Result<Vec<Arc<ControllerDescriptor>>, ConfigError> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for descriptor in descriptors {
        if seen.insert(descriptor.key()) {
            descriptor.validate()?;
            selected.push(descriptor);
        }
    }

    if let Some(allow) = allow {
        if let Some(missing) = allow.iter().find(|key| !seen.contains(*key)) {
            return Err(ConfigError::UnknownController {
                name: missing.short_name().to_string(),
            });
        }
        selected.retain(|d| allow.contains(&d.key()));
    }
    Ok(selected)
}

/// Group controllers whose patterns match the same namespaces, keeping
/// first-seen order. `/rooms/:id` and `/rooms/:roomId` share a group, named
/// after the first.
fn group_by_shape(
    controllers: Vec<Arc<ControllerDescriptor>>,
) -> Result<Vec<(NamespacePattern, Vec<Arc<ControllerDescriptor>>)>, ConfigError> {
    let mut groups: Vec<(NamespacePattern, Vec<Arc<ControllerDescriptor>>)> = Vec::new();
    for controller in controllers {
        let pattern = controller.pattern()?;
        match groups.iter_mut().find(|(shape, _)| shape.same_shape(&pattern)) {
            Some((_, group)) => group.push(controller),
            None => groups.push((pattern, vec![controller])),
        }
    }
    Ok(groups)
}
