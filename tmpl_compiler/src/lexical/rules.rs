//! Lexer rule table: per-mode ordered rules compiled from a `SyntaxConfig`

use super::patterns;
use crate::environment::SyntaxConfig;
use crate::logging::{codes, Code};
use crate::syntax::{SyntaxError, SyntaxResult};
use crate::tokens::TokenKind;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Lexer state; the stack of modes is never empty during tokenization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Root,
    BlockBegin,
    VariableBegin,
    CommentBegin,
    RawBegin,
    LinestatementBegin,
    LinecommentBegin,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::BlockBegin => "block_begin",
            Self::VariableBegin => "variable_begin",
            Self::CommentBegin => "comment_begin",
            Self::RawBegin => "raw_begin",
            Self::LinestatementBegin => "linestatement_begin",
            Self::LinecommentBegin => "linecomment_begin",
        }
    }

    /// Mode entered when the named opening group of the root rule matched
    pub fn from_group_name(name: &str) -> Option<Self> {
        match name {
            "block_begin" => Some(Self::BlockBegin),
            "variable_begin" => Some(Self::VariableBegin),
            "comment_begin" => Some(Self::CommentBegin),
            "raw_begin" => Some(Self::RawBegin),
            "linestatement_begin" => Some(Self::LinestatementBegin),
            "linecomment_begin" => Some(Self::LinecommentBegin),
            _ => None,
        }
    }
}

/// Mode stack transition applied after a rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    Pop,
    Push(Mode),
    /// Push the mode named by whichever named group matched
    PushResolved,
}

/// Token assigned to one capture group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupToken {
    Kind(TokenKind),
    /// Emit the first named group that matched, using its name as the kind
    ResolveByGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// One token from the whole match
    Emit(TokenKind),
    /// One token per capture group, in order. With `optional_lstrip` the
    /// first group is leading text that whitespace control may trim, and
    /// every second group after the first named one holds a `-`/`+` sign.
    EmitGroups {
        tokens: Vec<GroupToken>,
        optional_lstrip: bool,
    },
    /// Matching this rule is a template error
    Fail { message: &'static str, code: Code },
}

impl RuleAction {
    /// End-of-tag rules are skipped while brackets are unbalanced
    pub fn closes_tag(&self) -> bool {
        matches!(
            self,
            Self::Emit(TokenKind::VariableEnd | TokenKind::BlockEnd | TokenKind::LinestatementEnd)
        )
    }
}

/// How a rule's pattern is applied at the current offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchoring {
    /// Compiled with a `\A` anchor and run against the remaining input
    Slice,
    /// Run against the full source so `^` sees the preceding text; only a
    /// match starting exactly at the offset counts
    Source,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub action: RuleAction,
    pub command: Option<ModeCommand>,
    pub anchoring: Anchoring,
    /// The rule never matches directly after this character
    pub not_after: Option<char>,
}

/// A successful rule match; `end` is an absolute byte offset
#[derive(Debug)]
pub struct RuleMatch<'s> {
    pub captures: Captures<'s>,
    pub end: usize,
}

impl<'s> RuleMatch<'s> {
    pub fn text(&self) -> &'s str {
        self.captures.get(0).map_or("", |m| m.as_str())
    }

    /// Capture groups after the whole match; `None` for groups that did not
    /// participate
    pub fn groups(&self) -> Vec<Option<&'s str>> {
        self.captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str()))
            .collect()
    }
}

impl Rule {
    fn new(pattern: &str, action: RuleAction, command: Option<ModeCommand>) -> SyntaxResult<Self> {
        Self::build(pattern, action, command, Anchoring::Slice, None)
    }

    fn build(
        pattern: &str,
        action: RuleAction,
        command: Option<ModeCommand>,
        anchoring: Anchoring,
        not_after: Option<char>,
    ) -> SyntaxResult<Self> {
        let source = match anchoring {
            Anchoring::Slice => format!(r"\A(?:{})", pattern),
            Anchoring::Source => pattern.to_string(),
        };
        let pattern = Regex::new(&source).map_err(|error| {
            SyntaxError::lexer_internal(format!("invalid lexer rule {:?}: {}", pattern, error), 1)
        })?;
        Ok(Self {
            pattern,
            action,
            command,
            anchoring,
            not_after,
        })
    }

    pub fn match_at<'s>(&self, source: &'s str, pos: usize) -> Option<RuleMatch<'s>> {
        if let Some(c) = self.not_after {
            if source[..pos].ends_with(c) {
                return None;
            }
        }
        match self.anchoring {
            Anchoring::Slice => {
                let captures = self.pattern.captures(&source[pos..])?;
                let end = pos + captures.get(0)?.end();
                Some(RuleMatch { captures, end })
            }
            Anchoring::Source => {
                let captures = self.pattern.captures_at(source, pos)?;
                let whole = captures.get(0)?;
                if whole.start() != pos {
                    return None;
                }
                let end = whole.end();
                Some(RuleMatch { captures, end })
            }
        }
    }

    /// First named group that took part in the match
    pub fn resolve_group<'s>(&self, found: &RuleMatch<'s>) -> Option<(&str, &'s str)> {
        self.pattern
            .capture_names()
            .enumerate()
            .find_map(|(index, name)| {
                let name = name?;
                found.captures.get(index).map(|m| (name, m.as_str()))
            })
    }

    pub fn group_matched(&self, found: &RuleMatch<'_>, name: &str) -> bool {
        found
            .captures
            .name(name)
            .map_or(false, |m| !m.as_str().is_empty())
    }
}

/// Rules keyed by mode; order within a mode is significant
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: HashMap<Mode, Vec<Rule>>,
}

impl RuleTable {
    pub fn rules_for(&self, mode: Mode) -> &[Rule] {
        self.rules.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mode_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn build(config: &SyntaxConfig) -> SyntaxResult<Self> {
        let e = |s: &str| regex::escape(s);
        let block_start = e(&config.block_start_string);
        let block_end = e(&config.block_end_string);
        let comment_end = e(&config.comment_end_string);
        let variable_end = e(&config.variable_end_string);
        let block_suffix = if config.trim_blocks { r"\n?" } else { "" };

        let root_raw = format!(
            r"(?P<raw_begin>{block_start}(-|\+|)\s*raw\s*(?:-{block_end}\s*|{block_end}))"
        );
        let mut root_parts = vec![root_raw];
        for (mode, pattern) in root_tag_rules(config) {
            root_parts.push(format!(r"(?P<{}>{}(-|\+|))", mode.as_str(), pattern));
        }
        let root_parts = root_parts.join("|");

        let mut rules = HashMap::new();
        rules.insert(
            Mode::Root,
            vec![
                Rule::build(
                    &format!(r"(?ms)(.*?)(?:{root_parts})"),
                    RuleAction::EmitGroups {
                        tokens: vec![GroupToken::Kind(TokenKind::Data), GroupToken::ResolveByGroup],
                        optional_lstrip: true,
                    },
                    Some(ModeCommand::PushResolved),
                    Anchoring::Source,
                    None,
                )?,
                Rule::new(r"(?ms).+", RuleAction::Emit(TokenKind::Data), None)?,
            ],
        );
        rules.insert(
            Mode::CommentBegin,
            vec![
                Rule::new(
                    &format!(
                        r"(?ms)(.*?)((?:\+{comment_end}|-{comment_end}\s*|{comment_end}{block_suffix}))"
                    ),
                    RuleAction::EmitGroups {
                        tokens: vec![
                            GroupToken::Kind(TokenKind::Comment),
                            GroupToken::Kind(TokenKind::CommentEnd),
                        ],
                        optional_lstrip: false,
                    },
                    Some(ModeCommand::Pop),
                )?,
                Rule::new(
                    r"(?ms)(.)",
                    RuleAction::Fail {
                        message: "Missing end of comment tag",
                        code: codes::lexical::UNTERMINATED_COMMENT,
                    },
                    None,
                )?,
            ],
        );

        let mut block_rules = vec![Rule::new(
            &format!(r"(?ms)(?:\+{block_end}|-{block_end}\s*|{block_end}{block_suffix})"),
            RuleAction::Emit(TokenKind::BlockEnd),
            Some(ModeCommand::Pop),
        )?];
        block_rules.extend(tag_rules()?);
        rules.insert(Mode::BlockBegin, block_rules);

        let mut variable_rules = vec![Rule::new(
            &format!(r"(?ms)-{variable_end}\s*|{variable_end}"),
            RuleAction::Emit(TokenKind::VariableEnd),
            Some(ModeCommand::Pop),
        )?];
        variable_rules.extend(tag_rules()?);
        rules.insert(Mode::VariableBegin, variable_rules);

        rules.insert(
            Mode::RawBegin,
            vec![
                Rule::new(
                    &format!(
                        r"(?ms)(.*?)((?:{block_start}(-|\+|))\s*endraw\s*(?:\+{block_end}|-{block_end}\s*|{block_end}{block_suffix}))"
                    ),
                    RuleAction::EmitGroups {
                        tokens: vec![
                            GroupToken::Kind(TokenKind::Data),
                            GroupToken::Kind(TokenKind::RawEnd),
                        ],
                        optional_lstrip: true,
                    },
                    Some(ModeCommand::Pop),
                )?,
                Rule::new(
                    r"(?ms)(.)",
                    RuleAction::Fail {
                        message: "Missing end of raw directive",
                        code: codes::lexical::UNTERMINATED_RAW,
                    },
                    None,
                )?,
            ],
        );

        let mut line_statement_rules = vec![Rule::new(
            r"(?ms)\s*(\n|$)",
            RuleAction::Emit(TokenKind::LinestatementEnd),
            Some(ModeCommand::Pop),
        )?];
        line_statement_rules.extend(tag_rules()?);
        rules.insert(Mode::LinestatementBegin, line_statement_rules);

        rules.insert(
            Mode::LinecommentBegin,
            vec![Rule::new(
                r"([^\n]*)()",
                RuleAction::EmitGroups {
                    tokens: vec![
                        GroupToken::Kind(TokenKind::Linecomment),
                        GroupToken::Kind(TokenKind::LinecommentEnd),
                    ],
                    optional_lstrip: false,
                },
                Some(ModeCommand::Pop),
            )?],
        );

        Ok(Self { rules })
    }
}

/// Expression-level rules shared by blocks, variables and line statements
fn tag_rules() -> SyntaxResult<Vec<Rule>> {
    Ok(vec![
        Rule::new(patterns::WHITESPACE, RuleAction::Emit(TokenKind::Whitespace), None)?,
        Rule::build(
            patterns::FLOAT,
            RuleAction::Emit(TokenKind::Float),
            None,
            Anchoring::Slice,
            Some('.'),
        )?,
        Rule::new(patterns::INTEGER, RuleAction::Emit(TokenKind::Integer), None)?,
        Rule::new(patterns::NAME, RuleAction::Emit(TokenKind::Name), None)?,
        Rule::new(patterns::STRING, RuleAction::Emit(TokenKind::String), None)?,
        Rule::new(
            &patterns::operator_pattern(),
            RuleAction::Emit(TokenKind::Operator),
            None,
        )?,
    ])
}

/// Opening delimiters recognised in root mode, longest first so that a
/// delimiter never loses to one of its own prefixes
fn root_tag_rules(config: &SyntaxConfig) -> Vec<(Mode, String)> {
    let e = |s: &str| regex::escape(s);
    let mut rules = vec![
        (
            config.comment_start_string.len(),
            Mode::CommentBegin,
            e(&config.comment_start_string),
        ),
        (
            config.block_start_string.len(),
            Mode::BlockBegin,
            e(&config.block_start_string),
        ),
        (
            config.variable_start_string.len(),
            Mode::VariableBegin,
            e(&config.variable_start_string),
        ),
    ];
    if let Some(prefix) = &config.line_statement_prefix {
        rules.push((
            prefix.len(),
            Mode::LinestatementBegin,
            format!(r"^[ \t\v]*{}", e(prefix)),
        ));
    }
    if let Some(prefix) = &config.line_comment_prefix {
        rules.push((
            prefix.len(),
            Mode::LinecommentBegin,
            format!(r"[^\S\r\n]*{}", e(prefix)),
        ));
    }
    rules.sort_by(|a, b| (b.0, b.1.as_str()).cmp(&(a.0, a.1.as_str())));
    rules
        .into_iter()
        .map(|(_, mode, pattern)| (mode, pattern))
        .collect()
}
