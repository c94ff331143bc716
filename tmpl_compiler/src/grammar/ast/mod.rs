//! Template syntax tree

pub mod nodes;
pub mod visit;

pub use nodes::*;
