//! Turns parameter declarations into handler arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::params::{Params, Resolved};
use crate::dispatch::DispatchInvocation;
use crate::error::{DispatchError, HandlerError};
use crate::metadata::{ParamDescriptor, ParamKind};
use crate::transport::AckSender;

/// Which payload argument an unindexed message body parameter receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyBinding {
    /// The n-th body parameter in declaration order receives argument n.
    #[default]
    Ordinal,
    /// Every unindexed body parameter receives argument 0.
    First,
}

/// Resolves the declared parameters of an action against one invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterResolver {
    binding: BodyBinding,
}

impl ParameterResolver {
    /// Create a resolver using `binding` for unindexed body parameters.
    pub fn new(binding: BodyBinding) -> Self {
        Self { binding }
    }

    /// The body binding policy.
    pub fn binding(&self) -> BodyBinding {
        self.binding
    }

    /// The payload index a body parameter reads, ack excluded.
    fn body_index(&self, param: &ParamDescriptor, invocation: &DispatchInvocation) -> usize {
        match param.kind() {
            ParamKind::MessageBody { index: Some(index) } => *index,
            _ => match self.binding {
                BodyBinding::First => 0,
                BodyBinding::Ordinal => invocation
                    .action()
                    .params()
                    .iter()
                    .filter(|p| p.position() < param.position() && p.kind().is_body())
                    .count(),
            },
        }
    }

    /// Resolve one parameter.
    pub fn resolve(
        &self,
        param: &ParamDescriptor,
        invocation: &DispatchInvocation,
    ) -> Result<Resolved, HandlerError> {
        let context = invocation.context();
        let resolved = match param.kind() {
            ParamKind::ConnectedSocket => Resolved::Socket(context.socket().clone()),
            ParamKind::SocketId => Resolved::SocketId(context.socket_id().to_string()),
            ParamKind::MessageBody { .. } => {
                let index = self.body_index(param, invocation);
                Resolved::Body(invocation.arg(index).cloned())
            }
            ParamKind::Ack => {
                Resolved::Ack(invocation.ack().cloned().unwrap_or_else(AckSender::noop))
            }
            ParamKind::NamespaceParams => Resolved::NamespaceParams(
                context.params_for(invocation.action().controller()).clone(),
            ),
            ParamKind::NamespaceParam(name) => Resolved::Value(
                context
                    .params_for(invocation.action().controller())
                    .get(name)
                    .map(|v| Value::String(v.to_string())),
            ),
            ParamKind::QueryParam(name) => Resolved::Value(
                context
                    .socket()
                    .handshake()
                    .query(name)
                    .map(|v| Value::String(v.to_string())),
            ),
            ParamKind::EventName => Resolved::Value(Some(Value::String(invocation.event().to_string()))),
            ParamKind::Custom(extract) => Resolved::Value(Some(extract(invocation)?)),
        };
        Ok(resolved)
    }

    /// Resolve every declared parameter, left to right. Stops at the first
    /// failure so the handler is never called with a partial list.
    pub fn resolve_all(&self, invocation: &DispatchInvocation) -> Result<Params, DispatchError> {
        let action = invocation.action();
        action
            .params()
            .iter()
            .map(|param| {
                self.resolve(param, invocation)
                    .map_err(|source| DispatchError::Resolution {
                        action: action.qualified_name(),
                        position: param.position(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Params::new)
    }
}
