//! Statement keywords recognised after a block start
//!
//! Keywords are not reserved at the lexical level: `for`, `if` and friends
//! lex as ordinary names and only gain meaning when they follow `{%`.
use serde::{Deserialize, Serialize};

/// Built-in statement tags dispatched by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKeyword {
    For,
    If,
    Block,
    Extends,
    Print,
    Macro,
    Include,
    From,
    Import,
    Set,
    With,
    Autoescape,
    Call,
    Filter,
}

impl StatementKeyword {
    pub const ALL: [StatementKeyword; 14] = [
        Self::For,
        Self::If,
        Self::Block,
        Self::Extends,
        Self::Print,
        Self::Macro,
        Self::Include,
        Self::From,
        Self::Import,
        Self::Set,
        Self::With,
        Self::Autoescape,
        Self::Call,
        Self::Filter,
    ];

    /// Get the exact string representation as it appears in template source
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::If => "if",
            Self::Block => "block",
            Self::Extends => "extends",
            Self::Print => "print",
            Self::Macro => "macro",
            Self::Include => "include",
            Self::From => "from",
            Self::Import => "import",
            Self::Set => "set",
            Self::With => "with",
            Self::Autoescape => "autoescape",
            Self::Call => "call",
            Self::Filter => "filter",
        }
    }

    /// Parse keyword from string with exact case matching
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.as_str() == s)
    }

    /// Closing tag for keywords that open a body
    ///
    /// `set` only has a body in its block form, which the parser decides
    /// after looking at the rest of the tag.
    pub const fn end_tag(self) -> Option<&'static str> {
        match self {
            Self::For => Some("endfor"),
            Self::If => Some("endif"),
            Self::Block => Some("endblock"),
            Self::Macro => Some("endmacro"),
            Self::Set => Some("endset"),
            Self::With => Some("endwith"),
            Self::Autoescape => Some("endautoescape"),
            Self::Call => Some("endcall"),
            Self::Filter => Some("endfilter"),
            Self::Extends | Self::Print | Self::Include | Self::From | Self::Import => None,
        }
    }
}

/// Names that always evaluate to constants and can never be assigned
pub const CONSTANT_NAMES: [&str; 6] = ["true", "false", "none", "True", "False", "None"];

pub fn is_reserved_keyword(name: &str) -> bool {
    CONSTANT_NAMES.contains(&name)
}

/// End tags the parser reports as "expected" when it meets an unknown tag
pub fn is_end_tag(name: &str) -> bool {
    StatementKeyword::ALL
        .iter()
        .filter_map(|keyword| keyword.end_tag())
        .any(|tag| tag == name)
        || matches!(name, "elif" | "else")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for keyword in StatementKeyword::ALL {
            assert_eq!(StatementKeyword::parse(keyword.as_str()), Some(keyword));
        }
        assert_eq!(StatementKeyword::parse("FOR"), None);
        assert_eq!(StatementKeyword::parse("endfor"), None);
    }

    #[test]
    fn test_end_tags() {
        assert_eq!(StatementKeyword::For.end_tag(), Some("endfor"));
        assert_eq!(StatementKeyword::Include.end_tag(), None);
        assert!(is_end_tag("endautoescape"));
        assert!(is_end_tag("elif"));
        assert!(!is_end_tag("endinclude"));
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_keyword("None"));
        assert!(is_reserved_keyword("true"));
        assert!(!is_reserved_keyword("nothing"));
    }
}
