//! Parameter resolution: from a raw event to the arguments a handler reads.

mod params;
mod resolver;

pub use params::{Params, Resolved};
pub use resolver::{BodyBinding, ParameterResolver};
