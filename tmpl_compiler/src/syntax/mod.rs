//! Syntax analysis: token stream to syntax tree
//!
//! [`Parser`] drives the recursive descent; built-in statements and
//! expressions are parsed by its methods, other tags by registered
//! [`Extension`]s.

mod error;
mod expressions;
mod extension;
mod parser;
mod statements;

pub use error::{SyntaxError, SyntaxResult};
pub use expressions::{AssignTargetOptions, TupleOptions};
pub use extension::{ExprStmtExtension, Extension, LoopControlExtension};
pub use parser::{EndTokens, Parser};

use crate::grammar::ast::Node;
use crate::tokens::TokenStream;
use std::sync::Arc;

/// Parse a token stream without extensions
pub fn parse_template(stream: TokenStream) -> SyntaxResult<Node> {
    Parser::new(stream, &[]).parse()
}

/// The extensions every command line build registers
pub fn default_extensions() -> Vec<Arc<dyn Extension>> {
    vec![Arc::new(ExprStmtExtension), Arc::new(LoopControlExtension)]
}
