//! Interceptors that run around handler invocation.
//!
//! Middleware is layered global, then per-controller, then per-action, and
//! every layer runs strictly in registration order:
//!
//! ```text
//! before: global[0..] → controller[0..] → action[0..] → handler
//! after:  global[0..] → controller[0..] → action[0..] → emit / error handler
//! ```
//!
//! A `before` returning [`Flow::Skip`] silently drops the event. A `before`
//! returning an error aborts the remaining chain and goes to the error
//! handler. Resolution and handler failures travel the `after` chain as
//! `Err`, so an `after` hook can observe, replace, or recover them.

mod chain;
mod closure;

pub use chain::MiddlewareChain;
pub use closure::{after, before, After, Before};

use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::DispatchInvocation;
use crate::error::{DispatchError, HandlerError};

/// What to do after a `before` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going.
    Continue,
    /// Skip the handler and the rest of the chain without reporting an error.
    Skip,
}

/// An interceptor around handler invocation.
///
/// Both hooks default to pass-through, so implementations only override the
/// side they care about.
///
/// ## Example
///
/// ```
/// use socket_controllers::{DispatchInvocation, Flow, HandlerError, Middleware};
///
/// struct RequireToken;
///
/// impl Middleware for RequireToken {
///     fn name(&self) -> &str {
///         "require-token"
///     }
///
///     fn before(&self, invocation: &DispatchInvocation) -> Result<Flow, HandlerError> {
///         match invocation.context().socket().handshake().query("token") {
///             Some(_) => Ok(Flow::Continue),
///             None => Err(HandlerError::Rejected("missing token".into())),
///         }
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Name used in logs and in [`DispatchError::Middleware`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before the handler.
    fn before(&self, _invocation: &DispatchInvocation) -> Result<Flow, HandlerError> {
        Ok(Flow::Continue)
    }

    /// Runs after the handler (or after a resolution failure) and may
    /// replace the outcome.
    fn after(
        &self,
        _invocation: &DispatchInvocation,
        result: Result<Value, DispatchError>,
    ) -> Result<Value, DispatchError> {
        result
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn before(&self, invocation: &DispatchInvocation) -> Result<Flow, HandlerError> {
        (**self).before(invocation)
    }

    fn after(
        &self,
        invocation: &DispatchInvocation,
        result: Result<Value, DispatchError>,
    ) -> Result<Value, DispatchError> {
        (**self).after(invocation, result)
    }
}
