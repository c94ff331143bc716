//! Token kinds, payloads and the diagnostic descriptions used in parse errors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed token classification shared by the lexer and the parser.
///
/// The snake_case names are the stable wire vocabulary used by test
/// expressions such as `name:endif`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Add,
    Assign,
    Colon,
    Comma,
    Div,
    Dot,
    Eq,
    Floordiv,
    Gt,
    Gteq,
    Lbrace,
    Lbracket,
    Lparen,
    Lt,
    Lteq,
    Mod,
    Mul,
    Ne,
    Pipe,
    Pow,
    Rbrace,
    Rbracket,
    Rparen,
    Semicolon,
    Sub,
    Tilde,
    Whitespace,
    Float,
    Integer,
    Name,
    String,
    Operator,
    BlockBegin,
    BlockEnd,
    VariableBegin,
    VariableEnd,
    RawBegin,
    RawEnd,
    CommentBegin,
    CommentEnd,
    Comment,
    LinestatementBegin,
    LinestatementEnd,
    LinecommentBegin,
    LinecommentEnd,
    Linecomment,
    Data,
    Initial,
    Eof,
}

impl TokenKind {
    pub const ALL: [TokenKind; 49] = [
        Self::Add,
        Self::Assign,
        Self::Colon,
        Self::Comma,
        Self::Div,
        Self::Dot,
        Self::Eq,
        Self::Floordiv,
        Self::Gt,
        Self::Gteq,
        Self::Lbrace,
        Self::Lbracket,
        Self::Lparen,
        Self::Lt,
        Self::Lteq,
        Self::Mod,
        Self::Mul,
        Self::Ne,
        Self::Pipe,
        Self::Pow,
        Self::Rbrace,
        Self::Rbracket,
        Self::Rparen,
        Self::Semicolon,
        Self::Sub,
        Self::Tilde,
        Self::Whitespace,
        Self::Float,
        Self::Integer,
        Self::Name,
        Self::String,
        Self::Operator,
        Self::BlockBegin,
        Self::BlockEnd,
        Self::VariableBegin,
        Self::VariableEnd,
        Self::RawBegin,
        Self::RawEnd,
        Self::CommentBegin,
        Self::CommentEnd,
        Self::Comment,
        Self::LinestatementBegin,
        Self::LinestatementEnd,
        Self::LinecommentBegin,
        Self::LinecommentEnd,
        Self::Linecomment,
        Self::Data,
        Self::Initial,
        Self::Eof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Assign => "assign",
            Self::Colon => "colon",
            Self::Comma => "comma",
            Self::Div => "div",
            Self::Dot => "dot",
            Self::Eq => "eq",
            Self::Floordiv => "floordiv",
            Self::Gt => "gt",
            Self::Gteq => "gteq",
            Self::Lbrace => "lbrace",
            Self::Lbracket => "lbracket",
            Self::Lparen => "lparen",
            Self::Lt => "lt",
            Self::Lteq => "lteq",
            Self::Mod => "mod",
            Self::Mul => "mul",
            Self::Ne => "ne",
            Self::Pipe => "pipe",
            Self::Pow => "pow",
            Self::Rbrace => "rbrace",
            Self::Rbracket => "rbracket",
            Self::Rparen => "rparen",
            Self::Semicolon => "semicolon",
            Self::Sub => "sub",
            Self::Tilde => "tilde",
            Self::Whitespace => "whitespace",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Name => "name",
            Self::String => "string",
            Self::Operator => "operator",
            Self::BlockBegin => "block_begin",
            Self::BlockEnd => "block_end",
            Self::VariableBegin => "variable_begin",
            Self::VariableEnd => "variable_end",
            Self::RawBegin => "raw_begin",
            Self::RawEnd => "raw_end",
            Self::CommentBegin => "comment_begin",
            Self::CommentEnd => "comment_end",
            Self::Comment => "comment",
            Self::LinestatementBegin => "linestatement_begin",
            Self::LinestatementEnd => "linestatement_end",
            Self::LinecommentBegin => "linecomment_begin",
            Self::LinecommentEnd => "linecomment_end",
            Self::Linecomment => "linecomment",
            Self::Data => "data",
            Self::Initial => "initial",
            Self::Eof => "eof",
        }
    }

    /// Tokens dropped by `wrap` before the parser sees the stream
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            Self::CommentBegin
                | Self::Comment
                | Self::CommentEnd
                | Self::Whitespace
                | Self::LinecommentBegin
                | Self::LinecommentEnd
                | Self::Linecomment
        )
    }

    /// Tokens the tokenizer skips when their matched text is empty
    pub fn is_ignored_if_empty(&self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::Data | Self::Comment | Self::Linecomment
        )
    }

    /// Source text of an operator kind
    pub fn operator_symbol(&self) -> Option<&'static str> {
        OPERATORS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(symbol, _)| *symbol)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token kind '{0}'")]
pub struct UnknownTokenKind(pub String);

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTokenKind(s.to_string()))
    }
}

/// Operator text to token kind, longest symbols first so the lexer's
/// alternation never stops at a prefix (`**` before `*`)
pub const OPERATORS: [(&str, TokenKind); 26] = [
    ("//", TokenKind::Floordiv),
    ("**", TokenKind::Pow),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::Ne),
    (">=", TokenKind::Gteq),
    ("<=", TokenKind::Lteq),
    ("+", TokenKind::Add),
    ("-", TokenKind::Sub),
    ("/", TokenKind::Div),
    ("*", TokenKind::Mul),
    ("%", TokenKind::Mod),
    ("~", TokenKind::Tilde),
    ("[", TokenKind::Lbracket),
    ("]", TokenKind::Rbracket),
    ("(", TokenKind::Lparen),
    (")", TokenKind::Rparen),
    ("{", TokenKind::Lbrace),
    ("}", TokenKind::Rbrace),
    (">", TokenKind::Gt),
    ("<", TokenKind::Lt),
    ("=", TokenKind::Assign),
    (".", TokenKind::Dot),
    (":", TokenKind::Colon),
    ("|", TokenKind::Pipe),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
];

/// Look up the token kind of an operator's source text
pub fn operator_kind(symbol: &str) -> Option<TokenKind> {
    OPERATORS
        .iter()
        .find(|(text, _)| *text == symbol)
        .map(|(_, kind)| *kind)
}

/// Semantic payload of a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl TokenValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// One lexed token; immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub lineno: usize,
    pub kind: TokenKind,
    pub value: TokenValue,
}

impl Token {
    pub fn new(lineno: usize, kind: TokenKind, value: impl Into<TokenValue>) -> Self {
        Self {
            lineno,
            kind,
            value: value.into(),
        }
    }

    /// End of stream marker at `lineno`
    pub fn eof(lineno: usize) -> Self {
        Self::new(lineno, TokenKind::Eof, "")
    }

    /// String payload, empty for numeric tokens
    pub fn value_str(&self) -> &str {
        self.value.as_str().unwrap_or("")
    }

    /// Test against a token expression: a bare kind (`block_end`) or a
    /// kind with an exact value (`name:endfor`)
    pub fn test(&self, expr: &str) -> bool {
        if self.kind.as_str() == expr {
            return true;
        }
        match expr.split_once(':') {
            Some((kind, value)) => {
                kind == self.kind.as_str() && self.value.as_str() == Some(value)
            }
            None => false,
        }
    }

    pub fn test_any(&self, exprs: &[&str]) -> bool {
        exprs.iter().any(|expr| self.test(expr))
    }

    pub fn is_name(&self, value: &str) -> bool {
        self.kind == TokenKind::Name && self.value.as_str() == Some(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_token(self))
    }
}

/// Human description of a token kind for error messages
pub fn describe_token_type(kind: TokenKind) -> String {
    if let Some(symbol) = kind.operator_symbol() {
        return symbol.to_string();
    }
    match kind {
        TokenKind::CommentBegin => "begin of comment",
        TokenKind::CommentEnd => "end of comment",
        TokenKind::Comment | TokenKind::Linecomment => "comment",
        TokenKind::BlockBegin => "begin of statement block",
        TokenKind::BlockEnd => "end of statement block",
        TokenKind::VariableBegin => "begin of print statement",
        TokenKind::VariableEnd => "end of print statement",
        TokenKind::LinestatementBegin => "begin of line statement",
        TokenKind::LinestatementEnd => "end of line statement",
        TokenKind::Data => "template data / text",
        TokenKind::Eof => "end of template",
        other => other.as_str(),
    }
    .to_string()
}

/// Names describe themselves by value, everything else by kind
pub fn describe_token(token: &Token) -> String {
    if token.kind == TokenKind::Name {
        return token.value.to_string();
    }
    describe_token_type(token.kind)
}

/// Describe a token expression as used by `expect`
pub fn describe_token_expr(expr: &str) -> String {
    let (kind, value) = match expr.split_once(':') {
        Some((kind, value)) => (kind, Some(value)),
        None => (expr, None),
    };
    if let (Some(value), "name") = (value, kind) {
        return value.to_string();
    }
    match kind.parse::<TokenKind>() {
        Ok(kind) => describe_token_type(kind),
        Err(_) => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_through_wire_names() {
        for kind in TokenKind::ALL {
            assert_eq!(kind.as_str().parse::<TokenKind>(), Ok(kind));
        }
        assert!("bogus".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_operator_table_is_longest_first() {
        let mut seen_single = false;
        for (symbol, _) in OPERATORS {
            if symbol.len() == 1 {
                seen_single = true;
            } else {
                assert!(!seen_single, "{} listed after a single-char operator", symbol);
            }
        }
        assert_eq!(operator_kind("**"), Some(TokenKind::Pow));
        assert_eq!(operator_kind("?"), None);
        assert_eq!(TokenKind::Floordiv.operator_symbol(), Some("//"));
    }

    #[test]
    fn test_token_expressions() {
        let token = Token::new(1, TokenKind::Name, "endif");
        assert!(token.test("name"));
        assert!(token.test("name:endif"));
        assert!(!token.test("name:endfor"));
        assert!(!token.test("block_end"));
        assert!(token.test_any(&["name:elif", "name:else", "name:endif"]));

        let integer = Token::new(1, TokenKind::Integer, TokenValue::Int(5));
        assert!(!integer.test("integer:5"));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(describe_token(&Token::new(1, TokenKind::Name, "foo")), "foo");
        assert_eq!(describe_token(&Token::eof(3)), "end of template");
        assert_eq!(describe_token(&Token::new(1, TokenKind::Add, "+")), "+");
        assert_eq!(describe_token_expr("name:endfor"), "endfor");
        assert_eq!(describe_token_expr("block_end"), "end of statement block");
        assert_eq!(describe_token_expr("string:x"), "string");
        assert_eq!(describe_token_expr("rparen"), ")");
    }

    #[test]
    fn test_ignored_sets() {
        assert!(TokenKind::Comment.is_ignored());
        assert!(TokenKind::Whitespace.is_ignored());
        assert!(!TokenKind::Data.is_ignored());
        assert!(TokenKind::Data.is_ignored_if_empty());
        assert!(!TokenKind::Name.is_ignored_if_empty());
    }

    #[test]
    fn test_token_serialization() {
        let token = Token::new(2, TokenKind::VariableBegin, "{{");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"lineno":2,"kind":"variable_begin","value":"{{"}"#);
    }
}
