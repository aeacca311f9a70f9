//! Action declarations: one handler bound to one trigger.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use super::param::{ParamDescriptor, ParamKind};
use crate::container::{ContainerError, Instance, TypeKey};
use crate::error::{ConfigError, HandlerResult};
use crate::middleware::Middleware;
use crate::resolver::Params;

/// Type-erased handler body: downcasts the instance and starts the call.
pub type ErasedHandler = Arc<
    dyn Fn(Instance, Params) -> Result<BoxFuture<'static, HandlerResult>, ContainerError>
        + Send
        + Sync,
>;

/// What makes an action run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// A connection was accepted on the controller's namespace.
    Connect,
    /// The connection went away.
    Disconnect,
    /// A message with this event name arrived.
    Message(String),
    /// Any message arrived.
    AnyMessage,
}

impl Trigger {
    /// The event name for message triggers.
    pub fn event(&self) -> Option<&str> {
        match self {
            Trigger::Message(event) => Some(event),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Connect => f.write_str("connect"),
            Trigger::Disconnect => f.write_str("disconnect"),
            Trigger::Message(event) => write!(f, "message '{}'", event),
            Trigger::AnyMessage => f.write_str("any message"),
        }
    }
}

/// A declared action, independent of the controller type.
pub struct ActionDescriptor {
    controller: TypeKey,
    method: String,
    trigger: Trigger,
    params: Vec<ParamDescriptor>,
    middlewares: Vec<Arc<dyn Middleware>>,
    success_event: Option<String>,
    fail_event: Option<String>,
    skip_empty_result: bool,
    handler: Option<ErasedHandler>,
}

impl ActionDescriptor {
    /// The owning controller type.
    pub fn controller(&self) -> TypeKey {
        self.controller
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// `Controller::method`, for logs and errors.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.controller.short_name(), self.method)
    }

    /// The trigger.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Declared parameters in position order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Per-action middleware.
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Event emitted with the handler's result on success.
    pub fn success_event(&self) -> Option<&str> {
        self.success_event.as_deref()
    }

    /// Event emitted with the error message on failure.
    pub fn fail_event(&self) -> Option<&str> {
        self.fail_event.as_deref()
    }

    /// Whether a `null` result suppresses the success event.
    pub fn skips_empty_result(&self) -> bool {
        self.skip_empty_result
    }

    /// The handler body, if one was bound.
    pub fn handler(&self) -> Option<&ErasedHandler> {
        self.handler.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if matches!(&self.trigger, Trigger::Message(event) if event.is_empty()) {
            return Err(ConfigError::EmptyEventName {
                action: self.qualified_name(),
            });
        }
        if self.handler.is_none() {
            return Err(ConfigError::MissingHandler {
                action: self.qualified_name(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("action", &self.qualified_name())
            .field("trigger", &self.trigger)
            .field("params", &self.params)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Builder for an action on controller `C`.
///
/// Parameters are positional: the first `param` call declares position 0,
/// the next position 1, and so on. The handler reads them back from
/// [`Params`] by the same positions.
///
/// ## Example
///
/// ```
/// use socket_controllers::{Action, Param};
/// use serde_json::Value;
///
/// #[derive(Default)]
/// struct Chat;
///
/// let action = Action::<Chat>::on_message("say", "say")
///     .param(Param::message_body())
///     .param(Param::connected_socket())
///     .handle(|_chat, params| async move {
///         let text: Option<String> = params.body(0)?;
///         params.socket(1)?.emit("said", vec![text.into()])?;
///         Ok(Value::Null)
///     });
/// ```
pub struct Action<C> {
    descriptor: ActionDescriptor,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> Action<C> {
    fn new(method: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            descriptor: ActionDescriptor {
                controller: TypeKey::of::<C>(),
                method: method.into(),
                trigger,
                params: Vec::new(),
                middlewares: Vec::new(),
                success_event: None,
                fail_event: None,
                skip_empty_result: false,
                handler: None,
            },
            _controller: PhantomData,
        }
    }

    /// Run `method` when a connection is accepted.
    pub fn on_connect(method: impl Into<String>) -> Self {
        Self::new(method, Trigger::Connect)
    }

    /// Run `method` when a connection goes away.
    pub fn on_disconnect(method: impl Into<String>) -> Self {
        Self::new(method, Trigger::Disconnect)
    }

    /// Run `method` for every `event` message.
    pub fn on_message(method: impl Into<String>, event: impl Into<String>) -> Self {
        Self::new(method, Trigger::Message(event.into()))
    }

    /// Run `method` for every message.
    pub fn on_any_message(method: impl Into<String>) -> Self {
        Self::new(method, Trigger::AnyMessage)
    }

    /// Declare the next parameter.
    pub fn param(mut self, kind: ParamKind) -> Self {
        let position = self.descriptor.params.len();
        self.descriptor
            .params
            .push(ParamDescriptor::new(position, kind));
        self
    }

    /// Add per-action middleware. Runs after global and controller middleware.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.descriptor.middlewares.push(Arc::new(middleware));
        self
    }

    /// Emit `event` with the handler's result when it succeeds.
    pub fn emit_on_success(mut self, event: impl Into<String>) -> Self {
        self.descriptor.success_event = Some(event.into());
        self
    }

    /// Emit `event` with `{"message": ..}` when dispatch fails.
    pub fn emit_on_fail(mut self, event: impl Into<String>) -> Self {
        self.descriptor.fail_event = Some(event.into());
        self
    }

    /// Do not emit the success event when the result is `null`.
    pub fn skip_emit_on_empty_result(mut self) -> Self {
        self.descriptor.skip_empty_result = true;
        self
    }

    /// Bind the handler body.
    pub fn handle<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<C>, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = self.descriptor.controller;
        self.descriptor.handler = Some(Arc::new(move |instance: Instance, params: Params| {
            let this = instance
                .downcast::<C>()
                .map_err(|_| ContainerError::TypeMismatch {
                    type_name: key.name().to_string(),
                })?;
            Ok(handler(this, params).boxed())
        }));
        self
    }

    /// Bind a synchronous handler body.
    pub fn handle_sync<F>(self, handler: F) -> Self
    where
        F: Fn(Arc<C>, Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.handle(move |this, params| future::ready(handler(this, params)))
    }

    pub(crate) fn into_descriptor(self) -> ActionDescriptor {
        self.descriptor
    }
}
