pub mod listener;
pub mod registry;

pub use listener::*;
pub use registry::*;
