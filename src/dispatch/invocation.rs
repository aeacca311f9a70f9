//! One event routed to one action.

use std::sync::Arc;

use serde_json::Value;

use super::context::ConnectionContext;
use crate::metadata::ActionDescriptor;
use crate::transport::{AckSender, SocketRef};

/// The transient record of one delivery: which action, which event, the
/// payload arguments, the sender's ack, and the connection.
///
/// `args` holds payload arguments only; the acknowledgement callback is kept
/// apart so body indices never count it.
#[derive(Debug, Clone)]
pub struct DispatchInvocation {
    action: Arc<ActionDescriptor>,
    event: String,
    args: Vec<Value>,
    ack: Option<AckSender>,
    context: Arc<ConnectionContext>,
}

impl DispatchInvocation {
    /// Build an invocation.
    pub fn new(
        action: Arc<ActionDescriptor>,
        event: impl Into<String>,
        args: Vec<Value>,
        ack: Option<AckSender>,
        context: Arc<ConnectionContext>,
    ) -> Self {
        Self {
            action,
            event: event.into(),
            args,
            ack,
            context,
        }
    }

    /// The action being invoked.
    pub fn action(&self) -> &Arc<ActionDescriptor> {
        &self.action
    }

    /// The event name. `connect` and `disconnect` for lifecycle actions.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Payload arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Payload argument at `index`, if the sender supplied it.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// The sender's acknowledgement callback, if any.
    pub fn ack(&self) -> Option<&AckSender> {
        self.ack.as_ref()
    }

    /// The connection.
    pub fn context(&self) -> &Arc<ConnectionContext> {
        &self.context
    }

    /// Shortcut for the connection handle.
    pub fn socket(&self) -> &SocketRef {
        self.context.socket()
    }
}
