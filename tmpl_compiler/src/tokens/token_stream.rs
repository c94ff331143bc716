//! One-token-lookahead cursor used by the parser
//!
//! `current` is always valid: once the underlying tokens run out it is an
//! `eof` token carrying the last seen line number.

use super::token::{describe_token, describe_token_expr, Token, TokenKind};
use crate::logging::codes;
use crate::syntax::{SyntaxError, SyntaxResult};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: std::vec::IntoIter<Token>,
    pushed: VecDeque<Token>,
    current: Token,
    name: Option<String>,
    filename: Option<String>,
    closed: bool,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, name: Option<&str>, filename: Option<&str>) -> Self {
        let mut stream = Self {
            tokens: tokens.into_iter(),
            pushed: VecDeque::new(),
            current: Token::new(1, TokenKind::Initial, ""),
            name: name.map(str::to_string),
            filename: filename.map(str::to_string),
            closed: false,
        };
        stream.next_token();
        stream
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True once the current token is `eof` and nothing was pushed back
    pub fn is_eos(&self) -> bool {
        self.pushed.is_empty() && self.current.kind == TokenKind::Eof
    }

    /// Re-inject a token; it becomes current after the present one
    pub fn push(&mut self, token: Token) {
        self.pushed.push_back(token);
    }

    /// Advance and return the token that was current
    pub fn next_token(&mut self) -> Token {
        let upcoming = if let Some(token) = self.pushed.pop_front() {
            Some(token)
        } else if self.current.kind != TokenKind::Eof {
            self.tokens.next()
        } else {
            return self.current.clone();
        };

        match upcoming {
            Some(token) => std::mem::replace(&mut self.current, token),
            None => {
                let previous = self.current.clone();
                self.close();
                previous
            }
        }
    }

    /// The token after `current`, without consuming anything
    pub fn look(&mut self) -> Token {
        if let Some(token) = self.pushed.front() {
            return token.clone();
        }
        if self.current.kind == TokenKind::Eof {
            return self.current.clone();
        }
        match self.tokens.next() {
            Some(token) => {
                self.pushed.push_back(token.clone());
                token
            }
            None => Token::eof(self.current.lineno),
        }
    }

    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.next_token();
        }
    }

    /// Consume and return the current token if it matches `expr`
    pub fn next_if(&mut self, expr: &str) -> Option<Token> {
        if self.current.test(expr) {
            Some(self.next_token())
        } else {
            None
        }
    }

    pub fn skip_if(&mut self, expr: &str) -> bool {
        self.next_if(expr).is_some()
    }

    /// Consume the current token or fail with a descriptive error
    pub fn expect(&mut self, expr: &str) -> SyntaxResult<Token> {
        if self.current.test(expr) {
            return Ok(self.next_token());
        }

        let described = describe_token_expr(expr);
        let error = if self.current.kind == TokenKind::Eof {
            SyntaxError::template(
                codes::syntax::UNEXPECTED_END,
                format!("unexpected end of template, expected '{}'.", described),
                self.current.lineno,
            )
        } else {
            SyntaxError::template(
                codes::syntax::UNEXPECTED_TOKEN,
                format!(
                    "expected token '{}', got '{}'",
                    described,
                    describe_token(&self.current)
                ),
                self.current.lineno,
            )
        };
        Err(error.with_template(self.name(), self.filename()))
    }

    /// Drop the remaining tokens and park on `eof`
    pub fn close(&mut self) {
        self.current = Token::eof(self.current.lineno);
        self.tokens = Vec::new().into_iter();
        self.pushed.clear();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn stream() -> TokenStream {
        TokenStream::new(
            vec![
                Token::new(1, TokenKind::BlockBegin, "{%"),
                Token::new(1, TokenKind::Name, "if"),
                Token::new(1, TokenKind::Name, "x"),
                Token::new(2, TokenKind::BlockEnd, "%}"),
            ],
            Some("test"),
            None,
        )
    }

    #[test]
    fn test_next_returns_previous_current() {
        let mut tokens = stream();
        assert_eq!(tokens.current().kind, TokenKind::BlockBegin);
        let previous = tokens.next_token();
        assert_eq!(previous.kind, TokenKind::BlockBegin);
        assert!(tokens.current().is_name("if"));
    }

    #[test]
    fn test_look_does_not_consume() {
        let mut tokens = stream();
        tokens.next_token();
        let ahead = tokens.look();
        assert!(ahead.is_name("x"));
        assert!(tokens.current().is_name("if"));
        assert!(tokens.next_token().is_name("if"));
        assert!(tokens.next_token().is_name("x"));
        assert_eq!(tokens.current().kind, TokenKind::BlockEnd);
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut tokens = stream();
        tokens.skip(4);
        assert!(tokens.is_eos());
        assert_eq!(tokens.current().lineno, 2);
        assert_eq!(tokens.next_token().kind, TokenKind::Eof);
        assert_eq!(tokens.look().kind, TokenKind::Eof);
        assert!(tokens.is_closed());
    }

    #[test]
    fn test_conditional_consumption() {
        let mut tokens = stream();
        assert!(tokens.next_if("name").is_none());
        assert!(tokens.skip_if("block_begin"));
        assert!(tokens.skip_if("name:if"));
        assert!(!tokens.skip_if("name:else"));
    }

    #[test]
    fn test_push_reinjects_ahead_of_cursor() {
        let mut tokens = stream();
        tokens.push(Token::new(1, TokenKind::Name, "pushed"));
        assert!(!tokens.is_eos());
        tokens.next_token();
        assert!(tokens.current().is_name("pushed"));
        tokens.next_token();
        assert!(tokens.current().is_name("if"));
    }

    #[test]
    fn test_expect_errors() {
        let mut tokens = stream();
        let error = tokens.expect("name").unwrap_err();
        assert_eq!(
            error.to_string(),
            "expected token 'name', got 'begin of statement block'"
        );
        assert_eq!(error.name(), Some("test"));

        tokens.skip(4);
        let error = tokens.expect("name:endif").unwrap_err();
        assert_matches!(error, SyntaxError::Template { lineno: 2, .. });
        assert_eq!(error.to_string(), "unexpected end of template, expected 'endif'.");
    }
}
