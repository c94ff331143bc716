//! Token model shared by the lexer and the parser
//!
//! - [`TokenKind`] is the closed token vocabulary; its snake_case names
//!   double as the test-expression language (`name:endif`).
//! - [`Token`] pairs a kind with a line number and a decoded payload.
//! - [`TokenStream`] is the parser's one-token-lookahead cursor.

pub mod token;
pub mod token_stream;

pub use token::{
    describe_token, describe_token_expr, describe_token_type, operator_kind, Token, TokenKind,
    TokenValue, UnknownTokenKind, OPERATORS,
};
pub use token_stream::TokenStream;
