// Internal modules
pub mod config;
pub mod environment;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use environment::{Environment, EnvironmentError, NewlineSequence, SyntaxConfig};
pub use grammar::ast::Node;
pub use pipeline::{PipelineError, PipelineResult};
pub use syntax::{SyntaxError, SyntaxResult};
