//! Post-processing of raw tokens into the typed tokens the parser reads

use super::patterns::unescape_string;
use super::tokenizer::{Lexer, RawToken};
use crate::logging::codes;
use crate::syntax::{SyntaxError, SyntaxResult};
use crate::tokens::{operator_kind, Token, TokenKind, TokenValue};
use crate::utils::is_identifier;

impl Lexer {
    /// Drop ignored tokens and raw markers, fold line statements into
    /// blocks, and decode names, strings, numbers and operators
    pub fn wrap(
        &self,
        raw: Vec<RawToken>,
        name: Option<&str>,
        filename: Option<&str>,
    ) -> SyntaxResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(raw.len());
        for token in raw {
            if token.kind.is_ignored() {
                continue;
            }
            let wrapped = self
                .wrap_token(token)
                .map_err(|error| error.with_template(name, filename))?;
            if let Some(wrapped) = wrapped {
                tokens.push(wrapped);
            }
        }
        Ok(tokens)
    }

    fn wrap_token(&self, raw: RawToken) -> SyntaxResult<Option<Token>> {
        let RawToken {
            lineno,
            kind,
            value,
        } = raw;

        let token = match kind {
            TokenKind::LinestatementBegin => Token::new(lineno, TokenKind::BlockBegin, value),
            TokenKind::LinestatementEnd => Token::new(lineno, TokenKind::BlockEnd, value),
            TokenKind::RawBegin | TokenKind::RawEnd => return Ok(None),
            TokenKind::Data => Token::new(lineno, kind, self.normalize_newlines(&value)),
            TokenKind::Name => {
                if !is_identifier(&value) {
                    return Err(SyntaxError::template(
                        codes::lexical::INVALID_IDENTIFIER,
                        "Invalid character in identifier",
                        lineno,
                    ));
                }
                Token::new(lineno, kind, value)
            }
            TokenKind::String => {
                let body = value.get(1..value.len().saturating_sub(1)).unwrap_or("");
                Token::new(
                    lineno,
                    kind,
                    unescape_string(&self.normalize_newlines(body)),
                )
            }
            TokenKind::Integer => {
                Token::new(lineno, kind, TokenValue::Int(parse_integer(&value, lineno)?))
            }
            TokenKind::Float => {
                Token::new(lineno, kind, TokenValue::Float(parse_float(&value, lineno)?))
            }
            TokenKind::Operator => {
                let operator = operator_kind(&value).ok_or_else(|| {
                    SyntaxError::lexer_internal(format!("unknown operator '{}'", value), lineno)
                })?;
                Token::new(lineno, operator, value)
            }
            _ => Token::new(lineno, kind, value),
        };
        Ok(Some(token))
    }
}

/// Integer literal with optional `0b`/`0o`/`0x` prefix and `_` separators
pub fn parse_integer(text: &str, lineno: usize) -> SyntaxResult<i64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else {
        (10, lower.as_str())
    };
    i64::from_str_radix(body, radix).map_err(|error| {
        SyntaxError::template(
            codes::lexical::INVALID_NUMBER,
            format!("invalid integer literal '{}': {}", text, error),
            lineno,
        )
    })
}

pub fn parse_float(text: &str, lineno: usize) -> SyntaxResult<f64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits.parse::<f64>().map_err(|error| {
        SyntaxError::template(
            codes::lexical::INVALID_NUMBER,
            format!("invalid float literal '{}': {}", text, error),
            lineno,
        )
    })
}
