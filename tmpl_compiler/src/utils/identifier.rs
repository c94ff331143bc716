//! Unicode identifier classification
//!
//! An identifier starts with a letter, a letter number, an underscore or one
//! of the legacy `Other_ID_Start` characters, and continues with any of those
//! plus combining marks, decimal digits, connector punctuation and the legacy
//! `Other_ID_Continue` characters.

use unicode_general_category::{get_general_category, GeneralCategory};

const OTHER_ID_START: &[char] = &[
    '\u{1885}', '\u{1886}', '\u{2118}', '\u{212E}', '\u{309B}', '\u{309C}',
];

const OTHER_ID_CONTINUE: &[char] = &[
    '\u{00B7}', '\u{0387}', '\u{1369}', '\u{136A}', '\u{136B}', '\u{136C}', '\u{136D}',
    '\u{136E}', '\u{136F}', '\u{1370}', '\u{1371}', '\u{19DA}',
];

pub fn is_id_start(c: char) -> bool {
    if c == '_' || OTHER_ID_START.contains(&c) {
        return true;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::LetterNumber
    )
}

pub fn is_id_continue(c: char) -> bool {
    if is_id_start(c) || OTHER_ID_CONTINUE.contains(&c) {
        return true;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::DecimalNumber
            | GeneralCategory::ConnectorPunctuation
    )
}

/// Check whether `s` is a legal template identifier
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_id_start(first) => chars.all(is_id_continue),
        _ => false,
    }
}

/// Byte-level variant; invalid UTF-8 is never an identifier
pub fn is_identifier_bytes(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).map_or(false, is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_identifiers() {
        assert!(is_identifier("_foo9"));
        assert!(is_identifier("name"));
        assert!(is_identifier("_"));
        assert!(!is_identifier("9foo"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("foo-bar"));
        assert!(!is_identifier("foo bar"));
    }

    #[test]
    fn test_unicode_identifiers() {
        assert!(is_identifier("über"));
        assert!(is_identifier("名前"));
        assert!(is_identifier("a\u{0301}"));
        assert!(is_identifier("x\u{00B7}y"));
        assert!(is_identifier("\u{2118}"));
        assert!(!is_identifier("\u{00B7}x"));
        assert!(!is_identifier("٣x"));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(is_identifier_bytes(b"valid_name"));
        assert!(!is_identifier_bytes(&[0x66, 0x6f, 0xff, 0x6f]));
        assert!(!is_identifier_bytes(&[0xc3]));
        assert!(!is_identifier_bytes(b""));
    }
}
