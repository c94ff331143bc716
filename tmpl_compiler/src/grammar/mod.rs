//! Grammar definitions: the syntax tree and the statement keywords

pub mod ast;
pub mod keywords;

// Re-export AST types
pub use ast::nodes::*;

// Re-export keywords
pub use keywords::{is_end_tag, is_reserved_keyword, StatementKeyword};
