//! Traits the dispatch engine needs from a socket server.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::ack::AckSender;
use super::error::TransportError;
use super::handshake::Handshake;
use crate::metadata::NamespacePattern;

/// Shared handle to a live connection.
pub type SocketRef = Arc<dyn Socket>;

/// Called once per accepted connection on a matching namespace.
pub type ConnectionListener = Arc<dyn Fn(SocketRef) + Send + Sync>;

/// Called for each message with a specific event name.
pub type MessageListener = Arc<dyn Fn(Vec<Value>, Option<AckSender>) + Send + Sync>;

/// Called for every message regardless of event name.
pub type AnyMessageListener = Arc<dyn Fn(&str, Vec<Value>, Option<AckSender>) + Send + Sync>;

/// Called once when the connection goes away.
pub type DisconnectListener = Arc<dyn Fn(DisconnectReason) + Send + Sync>;

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client closed the connection.
    ClientDisconnect,
    /// The server closed this connection.
    ServerDisconnect,
    /// The whole server shut down.
    ServerShutdown,
    /// The underlying transport failed.
    TransportError,
}

/// Identifies a namespace listener attached to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create an id. Transports hand these out; uniqueness is theirs to keep.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A socket server that accepts connections grouped by namespace.
///
/// Implementations route each incoming connection to every listener whose
/// pattern matches the requested namespace. Connections on namespaces nobody
/// listens on are the transport's business and never reach a listener.
pub trait Transport: Send + Sync {
    /// Attach a listener for connections whose namespace matches `pattern`.
    fn on_connection(
        &self,
        pattern: NamespacePattern,
        listener: ConnectionListener,
    ) -> Result<ListenerId, TransportError>;

    /// Detach a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// One live connection as seen by the server.
pub trait Socket: Send + Sync {
    /// Transport-assigned identifier, unique among live connections and
    /// stable for the connection's lifetime.
    fn id(&self) -> &str;

    /// The namespace this connection was opened on.
    fn namespace(&self) -> &str;

    /// Data the client sent when connecting.
    fn handshake(&self) -> &Handshake;

    /// Subscribe to messages with the given event name.
    fn on_message(&self, event: &str, listener: MessageListener);

    /// Subscribe to every message.
    fn on_any(&self, listener: AnyMessageListener);

    /// Subscribe to the disconnect notification.
    fn on_disconnect(&self, listener: DisconnectListener);

    /// Send a named event with arguments to this connection.
    fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), TransportError>;

    /// Close the connection from the server side.
    fn disconnect(&self);

    /// Whether the connection is still open.
    fn is_connected(&self) -> bool;
}

impl fmt::Debug for dyn Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.id())
            .field("namespace", &self.namespace())
            .field("connected", &self.is_connected())
            .finish()
    }
}
