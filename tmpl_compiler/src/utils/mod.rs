//! Shared helpers used by the lexer and parser

pub mod identifier;

pub use identifier::{is_identifier, is_identifier_bytes};
