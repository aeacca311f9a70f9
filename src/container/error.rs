use thiserror::Error;

/// Errors from resolving instances out of a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Nothing is registered for the requested type.
    #[error("no service registered for {type_name}")]
    NotRegistered { type_name: String },
    /// The container returned an instance of a different type.
    #[error("container returned a value that is not a {type_name}")]
    TypeMismatch { type_name: String },
    /// The container could not build the instance.
    #[error("failed to construct {type_name}: {message}")]
    Construction { type_name: String, message: String },
}
