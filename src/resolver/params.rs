//! Resolved handler arguments.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HandlerError;
use crate::metadata::PathParams;
use crate::transport::{AckSender, SocketRef};

/// One resolved argument.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// The connection handle.
    Socket(SocketRef),
    /// The connection id.
    SocketId(String),
    /// A payload argument; `None` when the sender supplied fewer arguments.
    Body(Option<Value>),
    /// The acknowledgement callback (no-op when the sender supplied none).
    Ack(AckSender),
    /// Everything captured from the namespace pattern.
    NamespaceParams(PathParams),
    /// A single value from a namespace capture, query parameter, event name,
    /// or custom extractor.
    Value(Option<Value>),
}

impl Resolved {
    fn label(&self) -> &'static str {
        match self {
            Resolved::Socket(_) => "connected socket",
            Resolved::SocketId(_) => "socket id",
            Resolved::Body(_) => "message body",
            Resolved::Ack(_) => "ack",
            Resolved::NamespaceParams(_) => "namespace params",
            Resolved::Value(_) => "value",
        }
    }
}

/// The resolved arguments of one handler call, indexed by declared position.
///
/// Accessors check the kind at each position, so reading a socket where a
/// body was declared is a [`HandlerError::Param`] rather than a panic.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: Vec<Resolved>,
}

impl Params {
    /// Wrap resolved values in position order.
    pub fn new(values: Vec<Resolved>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the action declared no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw resolved value at `position`.
    pub fn get(&self, position: usize) -> Option<&Resolved> {
        self.values.get(position)
    }

    /// Iterate in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Resolved> {
        self.values.iter()
    }

    fn mismatch(&self, position: usize, expected: &'static str) -> HandlerError {
        HandlerError::Param {
            position,
            expected,
            found: self.values.get(position).map_or("missing", Resolved::label),
        }
    }

    /// The connection handle declared at `position`.
    pub fn socket(&self, position: usize) -> Result<&SocketRef, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::Socket(socket)) => Ok(socket),
            _ => Err(self.mismatch(position, "connected socket")),
        }
    }

    /// The connection id declared at `position`.
    pub fn socket_id(&self, position: usize) -> Result<&str, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::SocketId(id)) => Ok(id),
            _ => Err(self.mismatch(position, "socket id")),
        }
    }

    /// The raw payload argument declared at `position`.
    pub fn body_value(&self, position: usize) -> Result<Option<&Value>, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::Body(body)) => Ok(body.as_ref()),
            _ => Err(self.mismatch(position, "message body")),
        }
    }

    /// Deserialize the payload argument declared at `position`.
    ///
    /// Returns `Ok(None)` when the sender did not supply that argument.
    pub fn body<T: DeserializeOwned>(&self, position: usize) -> Result<Option<T>, HandlerError> {
        self.body_value(position)?
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| HandlerError::DecodeFailed(format!("parameter {}: {}", position, e)))
    }

    /// The acknowledgement callback declared at `position`.
    pub fn ack(&self, position: usize) -> Result<&AckSender, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::Ack(ack)) => Ok(ack),
            _ => Err(self.mismatch(position, "ack")),
        }
    }

    /// The namespace captures declared at `position`.
    pub fn namespace_params(&self, position: usize) -> Result<&PathParams, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::NamespaceParams(params)) => Ok(params),
            _ => Err(self.mismatch(position, "namespace params")),
        }
    }

    /// A namespace capture, query parameter, event name, or custom value.
    pub fn value(&self, position: usize) -> Result<Option<&Value>, HandlerError> {
        match self.values.get(position) {
            Some(Resolved::Value(value)) => Ok(value.as_ref()),
            _ => Err(self.mismatch(position, "value")),
        }
    }
}
