//! Runtime dispatch: connection contexts, invocations, and the pipeline that
//! turns a delivered event into a handler call.
//!
//! ```text
//! transport event ─► NamespaceDispatcher ─► per-connection queue
//!                                                  │ (one task, delivery order)
//!   start:  resolve params ─► before chain ─► instance ─► handler call
//!                                                  │ (spawned per event)
//!   finish: await handler ─► after chain ─► emit success/fail ─► error handler
//! ```

mod context;
mod dispatcher;
mod invocation;
mod pipeline;

pub use context::{ConnectionContext, ConnectionState};
pub use dispatcher::NamespaceDispatcher;
pub use invocation::DispatchInvocation;
pub use pipeline::{log_error_handler, ErrorHandler, Pipeline, Started};
