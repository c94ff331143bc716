//! Regular expression sources and text helpers shared by the rule builder
//! and the wrap pass

use crate::tokens::OPERATORS;

pub const WHITESPACE: &str = r"\s+";

/// Floats with a fraction, an exponent, or both; `_` separators allowed.
/// Must not follow a `.`, which the rule enforces with a guard.
pub const FLOAT: &str =
    r"(?i)([0-9]+_)*[0-9]+((\.([0-9]+_)*[0-9]+)?e[+\-]?([0-9]+_)*[0-9]+|\.([0-9]+_)*[0-9]+)";

pub const INTEGER: &str =
    r"(?i)(0b(_?[0-1])+|0o(_?[0-7])+|0x(_?[0-9a-f])+|[1-9](_?[0-9])*|0(_?0)*)";

/// Word characters plus the extra identifier code points; the wrap pass
/// rejects matches that are not valid identifiers
pub const NAME: &str = r"[\w\x{B7}\x{387}\x{1369}-\x{1371}\x{19DA}\x{1885}\x{1886}\x{2118}\x{212E}\x{309B}\x{309C}]+";

pub const STRING: &str = r#"(?s)('([^'\\]*(?:\\.[^'\\]*)*)'|"([^"\\]*(?:\\.[^"\\]*)*)")"#;

/// Alternation over every operator, longest first
pub fn operator_pattern() -> String {
    OPERATORS
        .iter()
        .map(|(symbol, _)| regex::escape(symbol))
        .collect::<Vec<_>>()
        .join("|")
}

/// Count line breaks, treating `\r\n` as one
pub fn count_newlines(value: &str) -> usize {
    let mut count = 0;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                count += 1;
            }
            '\n' => count += 1,
            _ => {}
        }
    }
    count
}

/// Replace every `\r\n`, `\r` and `\n` with `sequence`
pub fn normalize_newlines(value: &str, sequence: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push_str(sequence);
            }
            '\n' => out.push_str(sequence),
            c => out.push(c),
        }
    }
    out
}

/// Resolve backslash escapes inside a string literal body.
///
/// Only `\"`, `\'` and `\\` are escapes; any other backslash, including a
/// trailing one, is kept as written.
pub fn unescape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next_if(|next| matches!(next, '"' | '\'' | '\\')) {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn anchored(pattern: &str) -> Regex {
        Regex::new(&format!(r"\A(?:{})", pattern)).unwrap()
    }

    fn full_match(pattern: &str, text: &str) -> bool {
        anchored(pattern)
            .find(text)
            .map_or(false, |m| m.end() == text.len())
    }

    #[test]
    fn test_count_newlines() {
        assert_eq!(count_newlines("\nb\n\naaaaaa"), 3);
        assert_eq!(count_newlines("\rb\r\raaaaaa"), 3);
        assert_eq!(count_newlines("\r\nb\n\r\r\n\r\n\naaaaaa"), 6);
        assert_eq!(count_newlines("no breaks"), 0);
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\nd", "\n"), "a\nb\nc\nd");
        assert_eq!(normalize_newlines("a\nb", "\r\n"), "a\r\nb");
    }

    #[test]
    fn test_unescape_string() {
        assert_eq!(unescape_string(r#"a\"b\""#), r#"a"b""#);
        assert_eq!(unescape_string(r"a\'b\'"), "a'b'");
        assert_eq!(unescape_string(r#"a\'b\""#), r#"a'b""#);
        assert_eq!(unescape_string(r#"a\\'b\""#), r#"a\'b""#);
        assert_eq!(unescape_string(r"a\nb"), r"a\nb");
        assert_eq!(unescape_string(r"trailing\"), r"trailing\");
        assert_eq!(unescape_string("a"), "a");
    }

    #[test]
    fn test_number_patterns() {
        for text in ["0b1_01", "0O17", "0xdead_BEEF", "1_000", "0", "0_0"] {
            assert!(full_match(INTEGER, text), "{}", text);
        }
        assert!(!full_match(INTEGER, "01"));

        for text in ["1.5", "1e10", "1_0.2_5", "2.5E-3"] {
            assert!(full_match(FLOAT, text), "{}", text);
        }
        assert!(!full_match(FLOAT, "12"));
    }

    #[test]
    fn test_string_and_operator_patterns() {
        assert!(full_match(STRING, r#""say \"hi\"""#));
        assert!(full_match(STRING, "'multi\nline'"));
        assert!(!full_match(STRING, "'open"));

        let operators = anchored(&operator_pattern());
        assert_eq!(operators.find("**2").map(|m| m.as_str()), Some("**"));
        assert_eq!(operators.find("//2").map(|m| m.as_str()), Some("//"));
        assert_eq!(operators.find("<=x").map(|m| m.as_str()), Some("<="));
    }
}
