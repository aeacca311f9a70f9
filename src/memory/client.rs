//! Client side of an in-memory connection.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;

use super::inbox::{Inbox, Received};
use super::socket::MemorySocket;
use crate::transport::{AckSender, DisconnectReason, Socket, TransportError};

/// A test peer connected to a [`MemoryServer`](super::MemoryServer).
pub struct MemoryClient {
    socket: Arc<MemorySocket>,
    inbox: Arc<Inbox>,
}

impl MemoryClient {
    pub(crate) fn new(socket: Arc<MemorySocket>, inbox: Arc<Inbox>) -> Self {
        Self { socket, inbox }
    }

    /// The connection id, as the server sees it.
    pub fn id(&self) -> &str {
        self.socket.id()
    }

    /// The namespace this client connected to.
    pub fn namespace(&self) -> &str {
        self.socket.namespace()
    }

    /// Send `event` with `args` to the server.
    pub fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), TransportError> {
        self.socket.deliver(event, args, None)
    }

    /// Send `event` with a trailing acknowledgement function. The receiver
    /// resolves with the server's reply; it errors if the server never
    /// replies and drops the callback.
    pub fn emit_with_ack(
        &self,
        event: &str,
        args: Vec<Value>,
    ) -> Result<oneshot::Receiver<Vec<Value>>, TransportError> {
        let (tx, rx) = oneshot::channel();
        let ack = AckSender::new(move |reply| {
            let _ = tx.send(reply);
        });
        self.socket.deliver(event, args, Some(ack))?;
        Ok(rx)
    }

    /// Wait for the next unconsumed `event` from the server.
    pub async fn wait_for(&self, event: &str) -> Vec<Value> {
        self.inbox.wait_for(event).await
    }

    /// Take the next unconsumed `event` if it has already arrived.
    pub fn try_take(&self, event: &str) -> Option<Vec<Value>> {
        self.inbox.try_take(event)
    }

    /// Every event received so far, in order.
    pub fn received(&self) -> Vec<Received> {
        self.inbox.received()
    }

    /// Close the connection from the client side.
    pub fn disconnect(&self) {
        self.socket.close(DisconnectReason::ClientDisconnect);
    }

    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.socket.is_connected()
    }
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClient")
            .field("id", &self.id())
            .field("namespace", &self.namespace())
            .field("connected", &self.is_connected())
            .finish()
    }
}
