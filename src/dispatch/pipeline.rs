//! The per-invocation pipeline shared by every dispatcher of one bootstrap.
//!
//! A dispatch is split in two. [`Pipeline::start`] resolves parameters, runs
//! the `before` hooks, fetches the instance, and calls the handler, all
//! synchronously so a connection's events start in delivery order.
//! [`Pipeline::finish`] awaits the handler's future, runs the `after` hooks,
//! emits, and reports. Panics in user code on either side become
//! [`DispatchError::Panicked`].

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tracing::Instrument;

use super::invocation::DispatchInvocation;
use crate::container::InstanceProvider;
use crate::error::{DispatchError, HandlerError};
use crate::metadata::ControllerDescriptor;
use crate::middleware::{Flow, Middleware, MiddlewareChain};
use crate::resolver::{ParameterResolver, Params};

/// Receives every dispatch failure that was not recovered by middleware.
pub type ErrorHandler = Arc<dyn Fn(&DispatchError, &DispatchInvocation) + Send + Sync>;

/// The error handler used when none is configured: log and drop.
pub fn log_error_handler() -> ErrorHandler {
    Arc::new(|error: &DispatchError, invocation: &DispatchInvocation| {
        tracing::error!(
            namespace = invocation.context().namespace(),
            socket_id = invocation.context().socket_id(),
            event = invocation.event(),
            action = %invocation.action().qualified_name(),
            error = %error,
            "dispatch failed"
        );
    })
}

/// Outcome of [`Pipeline::start`].
pub enum Started {
    /// A middleware skipped the event.
    Skipped,
    /// Dispatch stopped before the handler ran: a `before` hook failed or
    /// resolving, intercepting, or instantiating panicked. The `after` hooks
    /// do not run.
    Aborted(DispatchError),
    /// Settles into the result the `after` hooks receive.
    Pending(BoxFuture<'static, Result<Value, DispatchError>>),
}

impl std::fmt::Debug for Started {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Started::Skipped => f.write_str("Skipped"),
            Started::Aborted(error) => f.debug_tuple("Aborted").field(error).finish(),
            Started::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Resolve, intercept, instantiate, invoke, emit, report.
pub struct Pipeline {
    provider: InstanceProvider,
    resolver: ParameterResolver,
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: ErrorHandler,
    runtime: Handle,
}

impl Pipeline {
    pub fn new(
        provider: InstanceProvider,
        resolver: ParameterResolver,
        middlewares: Vec<Arc<dyn Middleware>>,
        error_handler: ErrorHandler,
        runtime: Handle,
    ) -> Self {
        Self {
            provider,
            resolver,
            middlewares,
            error_handler,
            runtime,
        }
    }

    /// The instance provider.
    pub fn provider(&self) -> &InstanceProvider {
        &self.provider
    }

    /// Run `future` on the captured runtime.
    pub fn spawn<F>(&self, span: tracing::Span, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future.instrument(span));
    }

    /// Dispatch one invocation end to end.
    pub async fn run(&self, controller: &ControllerDescriptor, invocation: DispatchInvocation) {
        let started = self.start(controller, &invocation);
        self.finish(controller, invocation, started).await;
    }

    /// Everything up to and including the after-chain, without emitting or
    /// reporting. `None` means a middleware skipped the event.
    pub async fn execute(
        &self,
        controller: &ControllerDescriptor,
        invocation: &DispatchInvocation,
    ) -> Option<Result<Value, DispatchError>> {
        let started = self.start(controller, invocation);
        self.settle(controller, invocation, started).await
    }

    /// The ordered half of a dispatch. Never panics.
    pub fn start(
        &self,
        controller: &ControllerDescriptor,
        invocation: &DispatchInvocation,
    ) -> Started {
        panic::catch_unwind(AssertUnwindSafe(|| self.begin(controller, invocation)))
            .unwrap_or_else(|panic| Started::Aborted(panicked(invocation, panic)))
    }

    /// Await a started dispatch, then emit and report its outcome.
    pub async fn finish(
        &self,
        controller: &ControllerDescriptor,
        invocation: DispatchInvocation,
        started: Started,
    ) {
        let Some(outcome) = self.settle(controller, &invocation, started).await else {
            return;
        };
        self.emit_result(&invocation, &outcome);
        if let Err(error) = outcome {
            let reported =
                panic::catch_unwind(AssertUnwindSafe(|| (self.error_handler)(&error, &invocation)));
            if let Err(panic) = reported {
                tracing::error!(
                    error = %error,
                    panic = %panic_message(panic),
                    "error handler panicked"
                );
            }
        }
    }

    fn chain<'a>(
        &'a self,
        controller: &'a ControllerDescriptor,
        invocation: &'a DispatchInvocation,
    ) -> MiddlewareChain<'a> {
        MiddlewareChain::new(
            &self.middlewares,
            controller.middlewares(),
            invocation.action().middlewares(),
        )
    }

    fn begin(&self, controller: &ControllerDescriptor, invocation: &DispatchInvocation) -> Started {
        let params = match self.resolver.resolve_all(invocation) {
            Ok(params) => params,
            Err(error) => return Started::Pending(future::ready(Err(error)).boxed()),
        };

        match self.chain(controller, invocation).run_before(invocation) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Skip) => return Started::Skipped,
            Err(error) => return Started::Aborted(error),
        }

        match self.invoke(invocation, params) {
            Ok(pending) => Started::Pending(pending),
            Err(error) => Started::Pending(future::ready(Err(error)).boxed()),
        }
    }

    /// Get the instance and call the handler. Handler panics, whether in the
    /// call or in the returned future, become `Panicked` results.
    fn invoke(
        &self,
        invocation: &DispatchInvocation,
        params: Params,
    ) -> Result<BoxFuture<'static, Result<Value, DispatchError>>, DispatchError> {
        let action = invocation.action();
        let handler = action.handler().ok_or_else(|| DispatchError::Handler {
            action: action.qualified_name(),
            source: HandlerError::NotFound(format!("handler for {}", action.qualified_name())),
        })?;
        let instance = self.provider.get(action.controller(), invocation.context())?;

        tracing::trace!(action = %action.qualified_name(), "invoking handler");
        let pending = panic::catch_unwind(AssertUnwindSafe(|| handler(instance, params)))
            .map_err(|panic| panicked(invocation, panic))??;

        let name = action.qualified_name();
        Ok(async move {
            match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(DispatchError::Handler {
                    action: name,
                    source,
                }),
                Err(panic) => Err(DispatchError::Panicked {
                    action: name,
                    message: panic_message(panic),
                }),
            }
        }
        .boxed())
    }

    async fn settle(
        &self,
        controller: &ControllerDescriptor,
        invocation: &DispatchInvocation,
        started: Started,
    ) -> Option<Result<Value, DispatchError>> {
        let pending = match started {
            Started::Skipped => return None,
            Started::Aborted(error) => return Some(Err(error)),
            Started::Pending(pending) => pending,
        };
        let outcome = pending.await;
        let chain = self.chain(controller, invocation);
        Some(
            panic::catch_unwind(AssertUnwindSafe(|| chain.run_after(invocation, outcome)))
                .unwrap_or_else(|panic| Err(panicked(invocation, panic))),
        )
    }

    /// Emit the declared success or failure event for `outcome`.
    pub fn emit_result(
        &self,
        invocation: &DispatchInvocation,
        outcome: &Result<Value, DispatchError>,
    ) {
        let action = invocation.action();
        let emitted = match outcome {
            Ok(value) => match action.success_event() {
                Some(_) if action.skips_empty_result() && value.is_null() => None,
                Some(event) => Some((event, vec![value.clone()])),
                None => None,
            },
            Err(error) => action.fail_event().map(|event| {
                let message = error
                    .handler_error()
                    .map_or_else(|| error.to_string(), |e| e.to_string());
                (event, vec![json!({ "message": message })])
            }),
        };

        if let Some((event, args)) = emitted {
            if let Err(e) = invocation.socket().emit(event, args) {
                tracing::warn!(
                    socket_id = invocation.context().socket_id(),
                    event,
                    error = %e,
                    "failed to emit result"
                );
            }
        }
    }
}

fn panicked(invocation: &DispatchInvocation, panic: Box<dyn Any + Send>) -> DispatchError {
    DispatchError::Panicked {
        action: invocation.action().qualified_name(),
        message: panic_message(panic),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
