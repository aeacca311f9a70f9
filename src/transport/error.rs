//! Errors reported by transport implementations.

use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The socket is no longer connected.
    #[error("socket {0} is disconnected")]
    Disconnected(String),
    /// No namespace listener matches the requested namespace.
    #[error("no namespace is listening on {0}")]
    UnknownNamespace(String),
    /// The transport server has been closed.
    #[error("transport is closed")]
    Closed,
    /// Other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}
