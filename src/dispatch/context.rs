//! Per-connection state owned by a namespace dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::container::{Instance, TypeKey};
use crate::metadata::PathParams;
use crate::transport::{Handshake, SocketRef};

/// Lifecycle of a connection as the dispatcher sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted; connect actions are still running.
    Connecting,
    /// Connect actions finished; messages are dispatched.
    Connected,
    /// Terminal. The context has been released.
    Disconnected,
}

/// Everything the dispatcher knows about one live connection.
///
/// The connect phase ends with [`ConnectionContext::mark_ready`]; hosts can
/// wait for it with [`ConnectionContext::ready`]. Controllers sharing a
/// namespace under different parameter names each see their own captures
/// through [`ConnectionContext::params_for`].
pub struct ConnectionContext {
    socket: SocketRef,
    params: PathParams,
    captures: HashMap<TypeKey, PathParams>,
    state: Mutex<ConnectionState>,
    instances: Mutex<HashMap<TypeKey, Instance>>,
    ready: AtomicBool,
    ready_notify: Notify,
}

impl ConnectionContext {
    /// Create the context for a freshly accepted connection.
    pub fn new(socket: SocketRef, params: PathParams) -> Arc<Self> {
        Self::with_captures(socket, params, HashMap::new())
    }

    /// Like [`ConnectionContext::new`], with captures named after each
    /// controller's own pattern.
    pub fn with_captures(
        socket: SocketRef,
        params: PathParams,
        captures: HashMap<TypeKey, PathParams>,
    ) -> Arc<Self> {
        Arc::new(Self {
            socket,
            params,
            captures,
            state: Mutex::new(ConnectionState::Connecting),
            instances: Mutex::new(HashMap::new()),
            ready: AtomicBool::new(false),
            ready_notify: Notify::new(),
        })
    }

    /// The connection handle.
    pub fn socket(&self) -> &SocketRef {
        &self.socket
    }

    /// The transport-assigned connection id.
    pub fn socket_id(&self) -> &str {
        self.socket.id()
    }

    /// The namespace the client actually connected to.
    pub fn namespace(&self) -> &str {
        self.socket.namespace()
    }

    /// Values captured from the controller's namespace pattern.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Captures named after `controller`'s pattern, falling back to
    /// [`ConnectionContext::params`].
    pub fn params_for(&self, controller: TypeKey) -> &PathParams {
        self.captures.get(&controller).unwrap_or(&self.params)
    }

    /// Handshake data sent by the client.
    pub fn handshake(&self) -> &Handshake {
        self.socket.handshake()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Get the connection-scoped instance for `key`, building it with
    /// `build` on first use. Construction happens under the cache lock.
    pub fn scoped_instance(&self, key: TypeKey, build: impl FnOnce() -> Instance) -> Instance {
        self.instances.lock().entry(key).or_insert_with(build).clone()
    }

    /// Mark the connect phase as finished and wake everything waiting on it.
    pub fn mark_ready(&self) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Connected;
            }
        }
        self.ready.store(true, Ordering::Release);
        self.ready_notify.notify_waiters();
    }

    /// Whether the connect phase has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Wait until the connect phase has finished.
    pub async fn ready(&self) {
        loop {
            let notified = self.ready_notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    /// Enter the terminal state and drop connection-scoped instances.
    /// Anything still waiting on [`ConnectionContext::ready`] is released.
    pub fn release(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
        self.instances.lock().clear();
        self.ready.store(true, Ordering::Release);
        self.ready_notify.notify_waiters();
    }

    /// Whether the context has been released.
    pub fn is_released(&self) -> bool {
        self.state() == ConnectionState::Disconnected
    }

    /// A context on a socket that is not attached to any transport.
    #[cfg(test)]
    pub(crate) fn detached(namespace: &str) -> Arc<Self> {
        Self::new(Arc::new(detached::DetachedSocket::new(namespace)), PathParams::default())
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("socket_id", &self.socket_id())
            .field("namespace", &self.namespace())
            .field("params", &self.params)
            .field("state", &self.state())
            .finish()
    }
}
