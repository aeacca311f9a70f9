//! Declarations: controllers, actions, parameters, and the registry that
//! holds them.
//!
//! Declarations are plain data built with [`Controller`] and [`Action`] at
//! program initialization. Nothing here runs handlers; the dispatcher reads
//! the descriptors at bootstrap.

mod action;
mod controller;
mod namespace;
mod param;
mod registry;

pub use action::{Action, ActionDescriptor, ErasedHandler, Trigger};
pub use controller::{Controller, ControllerDescriptor};
pub use namespace::{NamespacePattern, PathParams};
pub use param::{CustomExtractor, Param, ParamDescriptor, ParamKind};
pub use registry::MetadataRegistry;
