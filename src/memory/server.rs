//! In-process socket server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::client::MemoryClient;
use super::inbox::Inbox;
use super::socket::MemorySocket;
use crate::metadata::NamespacePattern;
use crate::transport::{
    ConnectionListener, DisconnectReason, Handshake, ListenerId, SocketRef, Transport,
    TransportError,
};

struct Attached {
    id: ListenerId,
    pattern: NamespacePattern,
    listener: ConnectionListener,
}

/// State shared between the server and its sockets.
#[derive(Default)]
pub(crate) struct ServerState {
    listeners: RwLock<Vec<Attached>>,
    sockets: Mutex<HashMap<String, Arc<MemorySocket>>>,
    next_listener: AtomicU64,
    closed: AtomicBool,
}

impl ServerState {
    pub(crate) fn forget(&self, socket_id: &str) {
        self.sockets.lock().remove(socket_id);
    }
}

/// A [`Transport`] that lives entirely in memory.
///
/// Clients connect with [`MemoryServer::connect`] and get a
/// [`MemoryClient`] back. Everything is delivered synchronously on the
/// caller's thread, which keeps per-connection delivery order intact.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use socket_controllers::memory::MemoryServer;
/// use socket_controllers::{NamespacePattern, Socket, Transport};
///
/// let server = MemoryServer::new();
/// server
///     .on_connection(
///         NamespacePattern::parse("/echo").unwrap(),
///         Arc::new(|socket| {
///             let reply = socket.clone();
///             socket.on_message("ping", Arc::new(move |args, _ack| {
///                 reply.emit("pong", args).unwrap();
///             }));
///         }),
///     )
///     .unwrap();
///
/// let client = server.connect("/echo").unwrap();
/// client.emit("ping", vec![1.into()]).unwrap();
/// assert_eq!(client.try_take("pong"), Some(vec![1.into()]));
/// ```
#[derive(Default)]
pub struct MemoryServer {
    state: Arc<ServerState>,
}

impl MemoryServer {
    /// Create a server with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection on `namespace` with an empty handshake.
    pub fn connect(&self, namespace: &str) -> Result<MemoryClient, TransportError> {
        self.connect_with(namespace, Handshake::new())
    }

    /// Open a connection on `namespace`.
    ///
    /// Fails with [`TransportError::UnknownNamespace`] when no listener
    /// matches and with [`TransportError::Closed`] after [`close`](Self::close).
    pub fn connect_with(
        &self,
        namespace: &str,
        handshake: Handshake,
    ) -> Result<MemoryClient, TransportError> {
        if self.state.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let listeners: Vec<ConnectionListener> = self
            .state
            .listeners
            .read()
            .iter()
            .filter(|attached| attached.pattern.matches(namespace))
            .map(|attached| attached.listener.clone())
            .collect();
        if listeners.is_empty() {
            return Err(TransportError::UnknownNamespace(namespace.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let inbox = Arc::new(Inbox::new());
        let socket = Arc::new(MemorySocket::new(
            id.clone(),
            namespace.to_string(),
            handshake,
            inbox.clone(),
            Arc::downgrade(&self.state),
        ));
        self.state.sockets.lock().insert(id.clone(), socket.clone());
        tracing::debug!(socket_id = %id, namespace, "client connected");

        for listener in listeners {
            listener(socket.clone() as SocketRef);
        }
        Ok(MemoryClient::new(socket, inbox))
    }

    /// Disconnect every client and drop every listener. Further connects
    /// fail with [`TransportError::Closed`].
    pub fn close(&self) {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.listeners.write().clear();
        let sockets: Vec<Arc<MemorySocket>> =
            self.state.sockets.lock().drain().map(|(_, s)| s).collect();
        for socket in sockets {
            socket.close(DisconnectReason::ServerShutdown);
        }
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Number of attached namespace listeners.
    pub fn listener_count(&self) -> usize {
        self.state.listeners.read().len()
    }

    /// Number of open connections.
    pub fn connected_count(&self) -> usize {
        self.state.sockets.lock().len()
    }

    /// Server side of an open connection.
    pub fn socket(&self, id: &str) -> Option<Arc<MemorySocket>> {
        self.state.sockets.lock().get(id).cloned()
    }
}

impl Transport for MemoryServer {
    fn on_connection(
        &self,
        pattern: NamespacePattern,
        listener: ConnectionListener,
    ) -> Result<ListenerId, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let id = ListenerId::new(self.state.next_listener.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(pattern = %pattern, listener = id.get(), "listener attached");
        self.state.listeners.write().push(Attached {
            id,
            pattern,
            listener,
        });
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state.listeners.write().retain(|attached| attached.id != id);
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryServer")
            .field("listeners", &self.listener_count())
            .field("connected", &self.connected_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
