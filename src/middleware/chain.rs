//! The ordered middleware layers of one action.

use std::sync::Arc;

use serde_json::Value;

use super::{Flow, Middleware};
use crate::dispatch::DispatchInvocation;
use crate::error::DispatchError;

/// Global, controller, and action middleware flattened in run order.
pub struct MiddlewareChain<'a> {
    layers: Vec<&'a Arc<dyn Middleware>>,
}

impl<'a> MiddlewareChain<'a> {
    /// Flatten the three layers.
    pub fn new(
        global: &'a [Arc<dyn Middleware>],
        controller: &'a [Arc<dyn Middleware>],
        action: &'a [Arc<dyn Middleware>],
    ) -> Self {
        Self {
            layers: global.iter().chain(controller).chain(action).collect(),
        }
    }

    /// Number of middleware in the chain.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run every `before` hook until one skips or fails.
    pub fn run_before(&self, invocation: &DispatchInvocation) -> Result<Flow, DispatchError> {
        for middleware in &self.layers {
            match middleware.before(invocation) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Skip) => {
                    tracing::debug!(
                        middleware = middleware.name(),
                        event = invocation.event(),
                        "middleware skipped dispatch"
                    );
                    return Ok(Flow::Skip);
                }
                Err(source) => {
                    return Err(DispatchError::Middleware {
                        middleware: middleware.name().to_string(),
                        action: invocation.action().qualified_name(),
                        source,
                    })
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Thread the outcome through every `after` hook.
    pub fn run_after(
        &self,
        invocation: &DispatchInvocation,
        result: Result<Value, DispatchError>,
    ) -> Result<Value, DispatchError> {
        self.layers
            .iter()
            .fold(result, |result, middleware| middleware.after(invocation, result))
    }
}
