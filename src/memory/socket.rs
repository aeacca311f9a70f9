//! Server side of an in-memory connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::inbox::Inbox;
use super::server::ServerState;
use crate::transport::{
    AckSender, AnyMessageListener, DisconnectListener, DisconnectReason, Handshake,
    MessageListener, Socket, TransportError,
};

/// A connection accepted by [`MemoryServer`](super::MemoryServer).
///
/// Client emits are delivered synchronously to the listeners registered
/// here, in registration order; server emits land in the client's inbox.
pub struct MemorySocket {
    id: String,
    namespace: String,
    handshake: Handshake,
    connected: AtomicBool,
    messages: RwLock<HashMap<String, Vec<MessageListener>>>,
    any: RwLock<Vec<AnyMessageListener>>,
    disconnect: Mutex<Vec<DisconnectListener>>,
    client: Arc<Inbox>,
    server: Weak<ServerState>,
}

impl MemorySocket {
    pub(crate) fn new(
        id: String,
        namespace: String,
        handshake: Handshake,
        client: Arc<Inbox>,
        server: Weak<ServerState>,
    ) -> Self {
        Self {
            id,
            namespace,
            handshake,
            connected: AtomicBool::new(true),
            messages: RwLock::new(HashMap::new()),
            any: RwLock::new(Vec::new()),
            disconnect: Mutex::new(Vec::new()),
            client,
            server,
        }
    }

    /// Deliver a client message to every matching listener.
    pub(crate) fn deliver(
        &self,
        event: &str,
        args: Vec<Value>,
        ack: Option<AckSender>,
    ) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected(self.id.clone()));
        }

        let specific: Vec<MessageListener> = self
            .messages
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();
        let any: Vec<AnyMessageListener> = self.any.read().clone();
        tracing::trace!(
            socket_id = %self.id,
            event,
            listeners = specific.len() + any.len(),
            "delivering message"
        );

        for listener in &specific {
            listener(args.clone(), ack.clone());
        }
        for listener in &any {
            listener(event, args.clone(), ack.clone());
        }
        Ok(())
    }

    /// Close the connection and notify disconnect listeners once.
    pub(crate) fn close(&self, reason: DisconnectReason) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        self.messages.write().clear();
        self.any.write().clear();
        let listeners: Vec<DisconnectListener> = self.disconnect.lock().drain(..).collect();
        if let Some(server) = self.server.upgrade() {
            server.forget(&self.id);
        }
        tracing::debug!(socket_id = %self.id, reason = ?reason, "socket closed");
        for listener in listeners {
            listener(reason);
        }
    }

    /// Number of event-specific listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.messages.read().values().map(Vec::len).sum::<usize>() + self.any.read().len()
    }
}

impl Socket for MemorySocket {
    fn id(&self) -> &str {
        &self.id
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    fn on_message(&self, event: &str, listener: MessageListener) {
        if !self.is_connected() {
            return;
        }
        self.messages
            .write()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    fn on_any(&self, listener: AnyMessageListener) {
        if self.is_connected() {
            self.any.write().push(listener);
        }
    }

    fn on_disconnect(&self, listener: DisconnectListener) {
        if self.is_connected() {
            self.disconnect.lock().push(listener);
        }
    }

    fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected(self.id.clone()));
        }
        self.client.push(event, args);
        Ok(())
    }

    fn disconnect(&self) {
        self.close(DisconnectReason::ServerDisconnect);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
