//! Closure adapters for one-sided middleware.

use serde_json::Value;

use super::{Flow, Middleware};
use crate::dispatch::DispatchInvocation;
use crate::error::{DispatchError, HandlerError};

/// Middleware made from a `before` closure. See [`before`].
pub struct Before<F> {
    name: String,
    hook: F,
}

/// Middleware made from an `after` closure. See [`after`].
pub struct After<F> {
    name: String,
    hook: F,
}

/// Build middleware that only runs before the handler.
///
/// ```
/// use socket_controllers::{middleware, Flow};
///
/// let only_chat = middleware::before("only-chat", |inv| {
///     Ok(if inv.event().starts_with("chat.") { Flow::Continue } else { Flow::Skip })
/// });
/// ```
pub fn before<F>(name: impl Into<String>, hook: F) -> Before<F>
where
    F: Fn(&DispatchInvocation) -> Result<Flow, HandlerError> + Send + Sync,
{
    Before {
        name: name.into(),
        hook,
    }
}

/// Build middleware that only runs after the handler.
pub fn after<F>(name: impl Into<String>, hook: F) -> After<F>
where
    F: Fn(&DispatchInvocation, Result<Value, DispatchError>) -> Result<Value, DispatchError>
        + Send
        + Sync,
{
    After {
        name: name.into(),
        hook,
    }
}

impl<F> Middleware for Before<F>
where
    F: Fn(&DispatchInvocation) -> Result<Flow, HandlerError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn before(&self, invocation: &DispatchInvocation) -> Result<Flow, HandlerError> {
        (self.hook)(invocation)
    }
}

impl<F> Middleware for After<F>
where
    F: Fn(&DispatchInvocation, Result<Value, DispatchError>) -> Result<Value, DispatchError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn after(
        &self,
        invocation: &DispatchInvocation,
        result: Result<Value, DispatchError>,
    ) -> Result<Value, DispatchError> {
        (self.hook)(invocation, result)
    }
}
