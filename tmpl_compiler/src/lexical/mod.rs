//! Lexical analysis for template source
//!
//! A [`Lexer`] is compiled from a [`SyntaxConfig`](crate::environment::SyntaxConfig)
//! into a per-mode rule table and then drives a mode-stack state machine
//! over the source. [`Lexer::tokeniter`] yields raw tokens, [`Lexer::wrap`]
//! filters and decodes them, and [`Lexer::tokenize`] hands the result to the
//! parser as a [`TokenStream`](crate::tokens::TokenStream). Compiled lexers
//! are shared through a [`LexerCache`].

pub mod cache;
pub mod patterns;
pub mod rules;
pub mod tokenizer;
pub mod wrap;

pub use cache::LexerCache;
pub use patterns::{count_newlines, unescape_string};
pub use rules::{Anchoring, GroupToken, Mode, ModeCommand, Rule, RuleAction, RuleTable};
pub use tokenizer::{LexicalMetrics, Lexer, RawToken};
pub use wrap::{parse_float, parse_integer};
