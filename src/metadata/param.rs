//! Parameter declarations: what each handler argument is extracted from.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::DispatchInvocation;
use crate::error::HandlerError;

/// A user-supplied extraction function.
pub type CustomExtractor =
    Arc<dyn Fn(&DispatchInvocation) -> Result<Value, HandlerError> + Send + Sync>;

/// Where a handler argument comes from.
#[derive(Clone)]
pub enum ParamKind {
    /// The connection handle.
    ConnectedSocket,
    /// The transport-assigned connection id.
    SocketId,
    /// A message payload argument. With `index`, the argument at that
    /// position; without, decided by the body binding policy.
    MessageBody { index: Option<usize> },
    /// The acknowledgement callback, or a no-op one.
    Ack,
    /// All values captured from the namespace pattern.
    NamespaceParams,
    /// One value captured from the namespace pattern.
    NamespaceParam(String),
    /// One handshake query parameter.
    QueryParam(String),
    /// The name of the event being dispatched.
    EventName,
    /// A custom extraction function.
    Custom(CustomExtractor),
}

impl ParamKind {
    /// Short label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::ConnectedSocket => "connected socket",
            ParamKind::SocketId => "socket id",
            ParamKind::MessageBody { .. } => "message body",
            ParamKind::Ack => "ack",
            ParamKind::NamespaceParams => "namespace params",
            ParamKind::NamespaceParam(_) => "namespace param",
            ParamKind::QueryParam(_) => "query param",
            ParamKind::EventName => "event name",
            ParamKind::Custom(_) => "custom",
        }
    }

    /// Whether this is a message body parameter.
    pub fn is_body(&self) -> bool {
        matches!(self, ParamKind::MessageBody { .. })
    }
}

impl fmt::Debug for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::MessageBody { index } => {
                f.debug_struct("MessageBody").field("index", index).finish()
            }
            ParamKind::NamespaceParam(name) => f.debug_tuple("NamespaceParam").field(name).finish(),
            ParamKind::QueryParam(name) => f.debug_tuple("QueryParam").field(name).finish(),
            ParamKind::Custom(_) => f.write_str("Custom(..)"),
            other => f.write_str(other.label()),
        }
    }
}

/// Constructors for parameter kinds, one per declaration.
///
/// ```
/// use socket_controllers::Param;
///
/// let body = Param::message_body_at(1);
/// assert!(body.is_body());
/// ```
pub struct Param;

impl Param {
    /// The connection handle.
    pub fn connected_socket() -> ParamKind {
        ParamKind::ConnectedSocket
    }

    /// The connection id.
    pub fn socket_id() -> ParamKind {
        ParamKind::SocketId
    }

    /// A message payload argument positioned by the body binding policy.
    pub fn message_body() -> ParamKind {
        ParamKind::MessageBody { index: None }
    }

    /// The message payload argument at `index` (0-based, ack excluded).
    pub fn message_body_at(index: usize) -> ParamKind {
        ParamKind::MessageBody { index: Some(index) }
    }

    /// The acknowledgement callback.
    pub fn ack() -> ParamKind {
        ParamKind::Ack
    }

    /// All namespace captures.
    pub fn namespace_params() -> ParamKind {
        ParamKind::NamespaceParams
    }

    /// One namespace capture.
    pub fn namespace_param(name: impl Into<String>) -> ParamKind {
        ParamKind::NamespaceParam(name.into())
    }

    /// One handshake query parameter.
    pub fn query_param(name: impl Into<String>) -> ParamKind {
        ParamKind::QueryParam(name.into())
    }

    /// The dispatched event name.
    pub fn event_name() -> ParamKind {
        ParamKind::EventName
    }

    /// A value computed by `extract`.
    pub fn custom<F>(extract: F) -> ParamKind
    where
        F: Fn(&DispatchInvocation) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        ParamKind::Custom(Arc::new(extract))
    }
}

/// One declared handler parameter.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    position: usize,
    kind: ParamKind,
}

impl ParamDescriptor {
    /// Declare `kind` at `position` in the handler's parameter list.
    pub fn new(position: usize, kind: ParamKind) -> Self {
        Self { position, kind }
    }

    /// Position in the handler's parameter list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// What the parameter is extracted from.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}
