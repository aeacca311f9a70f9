//! Declarative controllers for socket connections.
//!
//! Controllers declare a namespace and a set of actions bound to connection
//! lifecycle events and named messages. [`SocketControllers`] attaches them
//! to a [`Transport`] and routes every delivered event to the right handler
//! with its arguments resolved.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use socket_controllers::memory::MemoryServer;
//! use socket_controllers::{Action, Controller, Param, SocketControllers};
//! use serde_json::{json, Value};
//!
//! #[derive(Default)]
//! struct Echo;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Arc::new(MemoryServer::new());
//! let _app = SocketControllers::builder()
//!     .transport(server.clone())
//!     .controller_descriptor(
//!         Controller::<Echo>::new("/echo").action(
//!             Action::on_message("echo", "echo")
//!                 .param(Param::message_body())
//!                 .emit_on_success("echoed")
//!                 .handle_sync(|_, params| Ok(params.body_value(0)?.cloned().unwrap_or(Value::Null))),
//!         ),
//!     )
//!     .start()?;
//!
//! let client = server.connect("/echo")?;
//! client.emit("echo", vec![json!("hi")])?;
//! assert_eq!(client.wait_for("echoed").await, vec![json!("hi")]);
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod container;
mod dispatch;
mod error;
mod metadata;
mod resolver;
mod transport;

pub mod middleware;

#[cfg(feature = "memory")]
pub mod memory;

pub use bootstrap::{Options, SocketControllers, SocketControllersBuilder};
pub use container::{
    Container, ContainerError, Factory, Instance, InstanceProvider, Scope, SimpleContainer,
    TypeKey,
};
pub use dispatch::{
    log_error_handler, ConnectionContext, ConnectionState, DispatchInvocation, ErrorHandler,
    NamespaceDispatcher, Pipeline, Started,
};
pub use error::{ConfigError, DispatchError, HandlerError, HandlerResult};
pub use metadata::{
    Action, ActionDescriptor, Controller, ControllerDescriptor, CustomExtractor, ErasedHandler,
    MetadataRegistry, NamespacePattern, Param, ParamDescriptor, ParamKind, PathParams, Trigger,
};
pub use middleware::{Flow, Middleware, MiddlewareChain};
pub use resolver::{BodyBinding, ParameterResolver, Params, Resolved};
pub use transport::{
    AckSender, AnyMessageListener, ConnectionListener, DisconnectListener, DisconnectReason,
    Handshake, ListenerId, MessageListener, Socket, SocketRef, Transport, TransportError,
};
