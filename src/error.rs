//! Error types for configuration, dispatch, and handler code.
//!
//! - [`ConfigError`] is raised synchronously while registering controllers or
//!   starting [`crate::SocketControllers`]. It is fatal to `start`.
//! - [`HandlerError`] is what handlers, custom extractors, and middleware return.
//! - [`DispatchError`] wraps a failure with the stage of the pipeline it came
//!   from and is what the configured error handler receives.

use std::error::Error;

use thiserror::Error;

use crate::container::ContainerError;
use crate::transport::TransportError;

/// Invalid controller declarations or bootstrap options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `start` was called without a transport server.
    #[error("no transport server was configured")]
    MissingTransport,
    /// No runtime handle was given and none is current.
    #[error("no tokio runtime is available to run handlers")]
    NoRuntime,
    /// A controller namespace pattern could not be parsed.
    #[error("invalid namespace pattern '{pattern}': {reason}")]
    InvalidNamespace { pattern: String, reason: String },
    /// A message action declared an empty event name.
    #[error("action {action} listens for an empty event name")]
    EmptyEventName { action: String },
    /// An action was declared without a handler body.
    #[error("action {action} has no handler")]
    MissingHandler { action: String },
    /// Two actions on one namespace listen for the same event.
    #[error("event '{event}' on namespace '{namespace}' is handled by both {first} and {second}")]
    DuplicateEvent {
        namespace: String,
        event: String,
        first: String,
        second: String,
    },
    /// The explicit controller list names a controller that was never registered.
    #[error("controller '{name}' is not registered")]
    UnknownController { name: String },
    /// No container was configured and the controller has no factory.
    #[error("controller '{name}' has no factory and no container was configured")]
    MissingFactory { name: String },
    /// Attaching to the transport failed.
    #[error("failed to attach to transport: {0}")]
    Transport(#[from] TransportError),
}

/// Error type for handlers, extractors, and middleware.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A parameter was read as the wrong kind, or does not exist.
    #[error("parameter {position} is {found}, not {expected}")]
    Param {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
    /// Payload decode / deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Business logic rejected the message.
    #[error("rejected: {0}")]
    Rejected(String),
    /// A resource the message refers to does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Replying over the transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Other error.
    #[error("{0}")]
    Other(Box<dyn Error + Send + Sync>),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

/// Result type returned by handler bodies.
pub type HandlerResult = Result<serde_json::Value, HandlerError>;

/// A failure while dispatching one event to one action.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A parameter could not be resolved; the handler was not called.
    #[error("failed to resolve parameter {position} of {action}: {source}")]
    Resolution {
        action: String,
        position: usize,
        #[source]
        source: HandlerError,
    },
    /// A middleware aborted the chain before the handler ran.
    #[error("middleware '{middleware}' aborted {action}: {source}")]
    Middleware {
        middleware: String,
        action: String,
        #[source]
        source: HandlerError,
    },
    /// The handler returned an error.
    #[error("handler {action} failed: {source}")]
    Handler {
        action: String,
        #[source]
        source: HandlerError,
    },
    /// The handler panicked.
    #[error("handler {action} panicked: {message}")]
    Panicked { action: String, message: String },
    /// The controller instance could not be obtained.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl DispatchError {
    /// The handler-level error behind this failure, if there is one.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            DispatchError::Resolution { source, .. }
            | DispatchError::Middleware { source, .. }
            | DispatchError::Handler { source, .. } => Some(source),
            DispatchError::Panicked { .. } | DispatchError::Container(_) => None,
        }
    }
}
