mod graph;
pub mod sanitize;
mod spec;
pub mod storage;
mod validation;

pub use graph::*;
pub use spec::*;
pub use validation::*;
