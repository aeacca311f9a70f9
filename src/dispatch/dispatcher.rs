//! One dispatcher per declared namespace pattern.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::context::ConnectionContext;
use super::invocation::DispatchInvocation;
use super::pipeline::Pipeline;
use crate::container::TypeKey;
use crate::error::ConfigError;
use crate::metadata::{ActionDescriptor, ControllerDescriptor, NamespacePattern, Trigger};
use crate::transport::{AckSender, DisconnectReason, SocketRef};

/// An action together with the controller that declared it.
#[derive(Debug, Clone)]
struct Route {
    controller: Arc<ControllerDescriptor>,
    action: Arc<ActionDescriptor>,
}

/// Work for a connection's dispatch task, in delivery order.
enum Job {
    Message {
        route: Route,
        invocation: DispatchInvocation,
    },
    Disconnect(DisconnectReason),
}

/// A live connection. Dropping it closes the queue, which ends the
/// connection's dispatch task.
struct Connection {
    context: Arc<ConnectionContext>,
    queue: mpsc::UnboundedSender<Job>,
}

impl Connection {
    fn push(&self, job: Job) {
        if self.queue.send(job).is_err() {
            tracing::trace!(
                socket_id = self.context.socket_id(),
                "dispatch task gone, event dropped"
            );
        }
    }
}

/// Ends the connect phase when dropped, whether or not it completed.
struct ReadyGuard<'a>(&'a ConnectionContext);

impl Drop for ReadyGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_ready();
    }
}

/// Routes connections on one namespace pattern to the actions of every
/// controller declared on it.
///
/// Per connection the lifecycle is `Connecting → Connected → Disconnected`:
/// connect actions run first, in registration order, then message actions
/// are dispatched as events arrive, then disconnect actions run and the
/// context is released.
///
/// Every connection has one task draining a queue fed by its socket
/// listeners. That task starts each dispatch (resolve, `before` hooks,
/// instance, handler call) in delivery order, then spawns the rest, so a
/// slow async handler never holds up other events.
///
/// Socket listeners only hold weak references to the dispatcher and to the
/// connection. Once the dispatcher is deactivated or the connection
/// released, late deliveries are dropped.
pub struct NamespaceDispatcher {
    pattern: NamespacePattern,
    controllers: Vec<Arc<ControllerDescriptor>>,
    connect: Vec<Route>,
    disconnect: Vec<Route>,
    messages: Vec<(String, Route)>,
    any: Vec<Route>,
    patterns: Vec<(TypeKey, NamespacePattern)>,
    pipeline: Arc<Pipeline>,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
    active: AtomicBool,
}

impl NamespaceDispatcher {
    /// Build the routing table for `controllers`, which must all be declared
    /// on `pattern` or on a pattern of the same shape. Two message actions for
    /// the same event are an error.
    pub fn new(
        pattern: NamespacePattern,
        controllers: Vec<Arc<ControllerDescriptor>>,
        pipeline: Arc<Pipeline>,
    ) -> Result<Arc<Self>, ConfigError> {
        let mut connect = Vec::new();
        let mut disconnect = Vec::new();
        let mut messages: Vec<(String, Route)> = Vec::new();
        let mut any = Vec::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut patterns = Vec::new();

        for controller in &controllers {
            let own = controller.pattern()?;
            if !own.same_shape(&pattern) {
                return Err(ConfigError::InvalidNamespace {
                    pattern: own.to_string(),
                    reason: format!("does not match the dispatcher pattern '{}'", pattern),
                });
            }
            if own != pattern {
                patterns.push((controller.key(), own));
            }
            for action in controller.actions() {
                let route = Route {
                    controller: controller.clone(),
                    action: action.clone(),
                };
                match action.trigger() {
                    Trigger::Connect => connect.push(route),
                    Trigger::Disconnect => disconnect.push(route),
                    Trigger::AnyMessage => any.push(route),
                    Trigger::Message(event) => {
                        if let Some(first) = owners.get(event) {
                            return Err(ConfigError::DuplicateEvent {
                                namespace: pattern.to_string(),
                                event: event.clone(),
                                first: first.clone(),
                                second: action.qualified_name(),
                            });
                        }
                        owners.insert(event.clone(), action.qualified_name());
                        messages.push((event.clone(), route));
                    }
                }
            }
        }

        tracing::debug!(
            namespace = %pattern,
            controllers = controllers.len(),
            connect = connect.len(),
            messages = messages.len(),
            disconnect = disconnect.len(),
            "namespace dispatcher ready"
        );

        Ok(Arc::new(Self {
            pattern,
            controllers,
            connect,
            disconnect,
            messages,
            any,
            patterns,
            pipeline,
            connections: Mutex::new(HashMap::new()),
            active: AtomicBool::new(true),
        }))
    }

    /// The namespace pattern this dispatcher serves.
    pub fn pattern(&self) -> &NamespacePattern {
        &self.pattern
    }

    /// Controllers declared on this namespace, in registration order.
    pub fn controllers(&self) -> &[Arc<ControllerDescriptor>] {
        &self.controllers
    }

    /// Event names with a message action.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|(event, _)| event.as_str())
    }

    /// Whether the dispatcher still handles events.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Take over a newly accepted connection.
    pub fn accept(self: &Arc<Self>, socket: SocketRef) {
        if !self.is_active() {
            return;
        }
        let Some(params) = self.pattern.captures(socket.namespace()) else {
            tracing::warn!(
                pattern = %self.pattern,
                namespace = socket.namespace(),
                "connection does not match namespace pattern"
            );
            return;
        };
        let captures = self
            .patterns
            .iter()
            .filter_map(|(key, pattern)| Some((*key, pattern.captures(socket.namespace())?)))
            .collect();

        let context = ConnectionContext::with_captures(socket.clone(), params, captures);
        let (queue, jobs) = mpsc::unbounded_channel();
        let connection = Arc::new(Connection {
            context: context.clone(),
            queue,
        });
        self.connections
            .lock()
            .insert(socket.id().to_string(), connection.clone());
        tracing::debug!(
            namespace = socket.namespace(),
            socket_id = socket.id(),
            "connection accepted"
        );

        self.subscribe(&socket, &connection);

        let span = tracing::debug_span!(
            "connection",
            namespace = socket.namespace(),
            socket_id = socket.id()
        );
        self.pipeline.spawn(span, self.clone().drive(context, jobs));
    }

    fn subscribe(self: &Arc<Self>, socket: &SocketRef, connection: &Arc<Connection>) {
        for (event, route) in &self.messages {
            let dispatcher = Arc::downgrade(self);
            let connection = Arc::downgrade(connection);
            let route = route.clone();
            let name = event.clone();
            socket.on_message(
                event,
                Arc::new(move |args: Vec<Value>, ack: Option<AckSender>| {
                    Self::deliver(&dispatcher, &connection, &route, &name, args, ack);
                }),
            );
        }

        if !self.any.is_empty() {
            let dispatcher = Arc::downgrade(self);
            let connection = Arc::downgrade(connection);
            let routes = self.any.clone();
            socket.on_any(Arc::new(
                move |event: &str, args: Vec<Value>, ack: Option<AckSender>| {
                    for route in &routes {
                        Self::deliver(
                            &dispatcher,
                            &connection,
                            route,
                            event,
                            args.clone(),
                            ack.clone(),
                        );
                    }
                },
            ));
        }

        let dispatcher = Arc::downgrade(self);
        let connection = Arc::downgrade(connection);
        socket.on_disconnect(Arc::new(move |reason: DisconnectReason| {
            if let (Some(dispatcher), Some(connection)) =
                (dispatcher.upgrade(), connection.upgrade())
            {
                if dispatcher.is_active() {
                    connection.push(Job::Disconnect(reason));
                }
            }
        }));
    }

    fn deliver(
        dispatcher: &Weak<Self>,
        connection: &Weak<Connection>,
        route: &Route,
        event: &str,
        args: Vec<Value>,
        ack: Option<AckSender>,
    ) {
        let (Some(this), Some(connection)) = (dispatcher.upgrade(), connection.upgrade()) else {
            return;
        };
        if !this.is_active() || connection.context.is_released() {
            return;
        }
        let invocation = DispatchInvocation::new(
            route.action.clone(),
            event,
            args,
            ack,
            connection.context.clone(),
        );
        connection.push(Job::Message {
            route: route.clone(),
            invocation,
        });
    }

    /// The connection's dispatch task: connect phase, then queued events in
    /// delivery order, until disconnect or deactivation.
    async fn drive(
        self: Arc<Self>,
        context: Arc<ConnectionContext>,
        mut jobs: mpsc::UnboundedReceiver<Job>,
    ) {
        {
            let _ready = ReadyGuard(&context);
            for route in &self.connect {
                if !self.is_active() || context.is_released() {
                    break;
                }
                let invocation = DispatchInvocation::new(
                    route.action.clone(),
                    "connect",
                    Vec::new(),
                    None,
                    context.clone(),
                );
                self.pipeline.run(&route.controller, invocation).await;
            }
        }

        while let Some(job) = jobs.recv().await {
            if !self.is_active() || context.is_released() {
                break;
            }
            match job {
                Job::Message { route, invocation } => {
                    let span = tracing::debug_span!(
                        "dispatch",
                        namespace = context.namespace(),
                        socket_id = context.socket_id(),
                        event = invocation.event()
                    );
                    let started = self.pipeline.start(&route.controller, &invocation);
                    let pipeline = self.pipeline.clone();
                    self.pipeline.spawn(span, async move {
                        pipeline.finish(&route.controller, invocation, started).await;
                    });
                }
                Job::Disconnect(reason) => {
                    self.disconnected(&context, reason).await;
                    break;
                }
            }
        }
    }

    async fn disconnected(&self, context: &Arc<ConnectionContext>, reason: DisconnectReason) {
        for route in &self.disconnect {
            if !self.is_active() {
                break;
            }
            let invocation = DispatchInvocation::new(
                route.action.clone(),
                "disconnect",
                Vec::new(),
                None,
                context.clone(),
            );
            self.pipeline.run(&route.controller, invocation).await;
        }
        self.connections.lock().remove(context.socket_id());
        context.release();
        tracing::debug!(
            socket_id = context.socket_id(),
            reason = ?reason,
            "connection released"
        );
    }

    /// Stop handling events and release every live connection.
    pub fn deactivate(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let connections: Vec<_> = self.connections.lock().drain().map(|(_, c)| c).collect();
        for connection in &connections {
            connection.context.release();
        }
        tracing::debug!(
            namespace = %self.pattern,
            released = connections.len(),
            "namespace dispatcher deactivated"
        );
    }
}

impl std::fmt::Debug for NamespaceDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceDispatcher")
            .field("pattern", &self.pattern)
            .field("controllers", &self.controllers.len())
            .field("connections", &self.connection_count())
            .field("active", &self.is_active())
            .finish()
    }
}
