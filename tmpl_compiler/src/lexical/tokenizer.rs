//! Mode-stack tokenizer driving the compiled rule table

use super::patterns::normalize_newlines;
use super::rules::{GroupToken, Mode, ModeCommand, Rule, RuleAction, RuleMatch, RuleTable};
use crate::config::compile_time::lexer::MAX_TOKEN_COUNT;
use crate::config::runtime::preferences;
use crate::environment::{NewlineSequence, SyntaxConfig};
use crate::logging::codes;
use crate::syntax::{SyntaxError, SyntaxResult};
use crate::tokens::{TokenKind, TokenStream};
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::collections::HashMap;

/// Token as produced by the state machine, before `wrap` decodes payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawToken {
    pub lineno: usize,
    pub kind: TokenKind,
    pub value: String,
}

impl RawToken {
    fn new(lineno: usize, kind: TokenKind, value: &str) -> Self {
        Self {
            lineno,
            kind,
            value: value.to_string(),
        }
    }
}

/// Per-run counters, logged when token summaries are enabled
#[derive(Debug, Clone, Default)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub lines: usize,
    pub max_bracket_depth: usize,
    pub by_kind: HashMap<TokenKind, usize>,
}

impl LexicalMetrics {
    fn record(&mut self, token: &RawToken) {
        self.total_tokens += 1;
        *self.by_kind.entry(token.kind).or_insert(0) += 1;
    }
}

/// Working state of one `tokeniter` run
struct Scanner<'s> {
    source: &'s str,
    pos: usize,
    lineno: usize,
    stack: Vec<Mode>,
    balancing: Vec<char>,
    newlines_stripped: usize,
    line_starting: bool,
    tokens: Vec<RawToken>,
    metrics: LexicalMetrics,
}

impl<'s> Scanner<'s> {
    fn emit(&mut self, kind: TokenKind, value: &str) -> SyntaxResult<()> {
        let token = RawToken::new(self.lineno, kind, value);
        self.metrics.record(&token);
        self.tokens.push(token);
        if self.tokens.len() > MAX_TOKEN_COUNT {
            return Err(SyntaxError::template(
                codes::lexical::TOO_MANY_TOKENS,
                format!("template produces more than {} tokens", MAX_TOKEN_COUNT),
                self.lineno,
            ));
        }
        Ok(())
    }

    fn mode(&self) -> SyntaxResult<Mode> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| SyntaxError::lexer_internal("lexer mode stack is empty", self.lineno))
    }

    /// Track bracket nesting on operator tokens
    fn balance(&mut self, data: &str) -> SyntaxResult<()> {
        let closing = match data {
            "{" => Some('}'),
            "(" => Some(')'),
            "[" => Some(']'),
            "}" | ")" | "]" => None,
            _ => return Ok(()),
        };
        if let Some(closing) = closing {
            self.balancing.push(closing);
            self.metrics.max_bracket_depth =
                self.metrics.max_bracket_depth.max(self.balancing.len());
            return Ok(());
        }

        match self.balancing.pop() {
            None => Err(SyntaxError::template(
                codes::lexical::UNBALANCED_BRACKET,
                format!("unexpected '{}'", data),
                self.lineno,
            )),
            Some(expected) if !data.starts_with(expected) => Err(SyntaxError::template(
                codes::lexical::UNBALANCED_BRACKET,
                format!("unexpected '{}', expected '{}'", data, expected),
                self.lineno,
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Compiled lexer for one syntax configuration
#[derive(Debug, Clone)]
pub struct Lexer {
    rules: RuleTable,
    lstrip_blocks: bool,
    newline_sequence: NewlineSequence,
    keep_trailing_newline: bool,
}

impl Lexer {
    pub fn new(config: &SyntaxConfig) -> SyntaxResult<Self> {
        let rules = RuleTable::build(config)?;
        log_success!(
            codes::success::LEXER_TABLE_BUILT,
            "Lexer rule table built",
            "modes" => rules.mode_count(),
            "rules" => rules.rule_count()
        );
        Ok(Self {
            rules,
            lstrip_blocks: config.lstrip_blocks,
            newline_sequence: config.newline_sequence,
            keep_trailing_newline: config.keep_trailing_newline,
        })
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn newline_sequence(&self) -> NewlineSequence {
        self.newline_sequence
    }

    pub(crate) fn normalize_newlines(&self, value: &str) -> String {
        normalize_newlines(value, self.newline_sequence.as_str())
    }

    /// Lex and wrap `source` into a token stream for the parser
    pub fn tokenize(
        &self,
        source: &str,
        name: Option<&str>,
        filename: Option<&str>,
        state: Option<&str>,
    ) -> SyntaxResult<TokenStream> {
        let result = self
            .tokeniter(source, name, filename, state)
            .and_then(|raw| self.wrap(raw, name, filename));

        match result {
            Ok(tokens) => {
                log_success!(
                    codes::success::TOKENIZATION_COMPLETE,
                    "Tokenization completed",
                    "template" => name.unwrap_or("<template>"),
                    "tokens" => tokens.len()
                );
                Ok(TokenStream::new(tokens, name, filename))
            }
            Err(error) => {
                log_error!(error.error_code(), error.message(),
                    line = error.lineno(),
                    "template" => name.unwrap_or("<template>")
                );
                Err(error)
            }
        }
    }

    /// Line endings become `\n` and one trailing newline is dropped unless
    /// it is meant to be kept
    fn prepare_source(&self, source: &str) -> String {
        let mut source = normalize_newlines(source, "\n");
        if !self.keep_trailing_newline && source.ends_with('\n') {
            source.pop();
        }
        source
    }

    /// Run the state machine and return every raw token, including the
    /// whitespace, comment and raw markers that `wrap` later drops
    pub fn tokeniter(
        &self,
        source: &str,
        name: Option<&str>,
        filename: Option<&str>,
        state: Option<&str>,
    ) -> SyntaxResult<Vec<RawToken>> {
        let source = self.prepare_source(source);
        let mut stack = vec![Mode::Root];
        match state {
            None | Some("root") => {}
            Some("variable") => stack.push(Mode::VariableBegin),
            Some("block") => stack.push(Mode::BlockBegin),
            Some(other) => {
                return Err(SyntaxError::lexer_internal(
                    format!("invalid lexer state '{}'", other),
                    1,
                ))
            }
        }

        let mut scanner = Scanner {
            source: &source,
            pos: 0,
            lineno: 1,
            stack,
            balancing: Vec::new(),
            newlines_stripped: 0,
            line_starting: true,
            tokens: Vec::new(),
            metrics: LexicalMetrics::default(),
        };

        self.run(&mut scanner)
            .map_err(|error| error.with_template(name, filename))?;

        scanner.metrics.lines = scanner.lineno;
        if preferences().lexical.log_token_summary {
            log_debug!("Token summary",
                "template" => name.unwrap_or("<template>"),
                "tokens" => scanner.metrics.total_tokens,
                "lines" => scanner.metrics.lines,
                "max_bracket_depth" => scanner.metrics.max_bracket_depth
            );
        }
        Ok(scanner.tokens)
    }

    fn run(&self, scanner: &mut Scanner<'_>) -> SyntaxResult<()> {
        'tokenizer: loop {
            let mode = scanner.mode()?;
            for rule in self.rules.rules_for(mode) {
                let Some(found) = rule.match_at(scanner.source, scanner.pos) else {
                    continue;
                };

                // a bracket is still open, so an end delimiter is operator text
                if !scanner.balancing.is_empty() && rule.action.closes_tag() {
                    continue;
                }

                self.apply_action(scanner, rule, &found)?;
                scanner.line_starting = found.text().ends_with('\n');

                match rule.command {
                    Some(ModeCommand::Pop) => {
                        scanner.stack.pop();
                        if scanner.stack.is_empty() {
                            return Err(SyntaxError::lexer_internal(
                                "lexer popped past the root mode",
                                scanner.lineno,
                            ));
                        }
                    }
                    Some(ModeCommand::Push(next)) => scanner.stack.push(next),
                    Some(ModeCommand::PushResolved) => {
                        let next = rule
                            .resolve_group(&found)
                            .and_then(|(group, _)| Mode::from_group_name(group))
                            .ok_or_else(|| {
                                SyntaxError::lexer_internal(
                                    format!(
                                        "{:?} wanted to resolve the new state dynamically but no group matched",
                                        rule.pattern.as_str()
                                    ),
                                    scanner.lineno,
                                )
                            })?;
                        scanner.stack.push(next);
                    }
                    None if found.end == scanner.pos => {
                        return Err(SyntaxError::lexer_internal(
                            format!(
                                "{:?} yielded empty string without stack change",
                                rule.pattern.as_str()
                            ),
                            scanner.lineno,
                        ));
                    }
                    None => {}
                }

                scanner.pos = found.end;
                continue 'tokenizer;
            }

            if scanner.pos >= scanner.source.len() {
                return Ok(());
            }
            let offending = scanner.source[scanner.pos..].chars().next().unwrap_or(' ');
            let offset = scanner.source[..scanner.pos].chars().count();
            return Err(SyntaxError::template(
                codes::lexical::INVALID_CHARACTER,
                format!("unexpected char {:?} at {}", offending, offset),
                scanner.lineno,
            ));
        }
    }

    fn apply_action(
        &self,
        scanner: &mut Scanner<'_>,
        rule: &Rule,
        found: &RuleMatch<'_>,
    ) -> SyntaxResult<()> {
        match &rule.action {
            RuleAction::Fail { message, code } => {
                Err(SyntaxError::template(*code, *message, scanner.lineno))
            }
            RuleAction::Emit(kind) => {
                let data = found.text();
                if *kind == TokenKind::Operator {
                    scanner.balance(data)?;
                }
                if !data.is_empty() || !kind.is_ignored_if_empty() {
                    scanner.emit(*kind, data)?;
                }
                scanner.lineno += data.matches('\n').count();
                Ok(())
            }
            RuleAction::EmitGroups {
                tokens,
                optional_lstrip,
            } => {
                let mut groups = found.groups();
                if *optional_lstrip {
                    self.strip_leading_text(scanner, rule, found, &mut groups);
                }
                for (index, token) in tokens.iter().enumerate() {
                    match token {
                        GroupToken::ResolveByGroup => {
                            let (group, value) = rule.resolve_group(found).ok_or_else(|| {
                                SyntaxError::lexer_internal(
                                    format!(
                                        "{:?} wanted to resolve the token dynamically but no group matched",
                                        rule.pattern.as_str()
                                    ),
                                    scanner.lineno,
                                )
                            })?;
                            let kind = group.parse::<TokenKind>().map_err(|error| {
                                SyntaxError::lexer_internal(error.to_string(), scanner.lineno)
                            })?;
                            scanner.emit(kind, value)?;
                            scanner.lineno += value.matches('\n').count();
                        }
                        GroupToken::Kind(kind) => {
                            let data = groups.get(index).copied().flatten().unwrap_or("");
                            if !data.is_empty() || !kind.is_ignored_if_empty() {
                                scanner.emit(*kind, data)?;
                            }
                            scanner.lineno += data.matches('\n').count() + scanner.newlines_stripped;
                            scanner.newlines_stripped = 0;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Whitespace control for the text in front of an opening tag: `-`
    /// strips all trailing whitespace, `+` keeps it, and otherwise
    /// `lstrip_blocks` removes indentation between a newline and a block tag
    fn strip_leading_text<'s>(
        &self,
        scanner: &mut Scanner<'_>,
        rule: &Rule,
        found: &RuleMatch<'s>,
        groups: &mut [Option<&'s str>],
    ) {
        let Some(text) = groups.first().copied().flatten() else {
            return;
        };
        let strip_sign = groups.iter().skip(2).step_by(2).find_map(|group| *group);

        match strip_sign {
            Some("-") => {
                let stripped = text.trim_end();
                scanner.newlines_stripped = text[stripped.len()..].matches('\n').count();
                groups[0] = Some(stripped);
            }
            Some("+") => {}
            _ if self.lstrip_blocks
                && !rule.group_matched(found, Mode::VariableBegin.as_str()) =>
            {
                let line_start = text.rfind('\n').map_or(0, |index| index + 1);
                if line_start > 0 || scanner.line_starting {
                    let indent = &text[line_start..];
                    if !indent.is_empty() && indent.chars().all(char::is_whitespace) {
                        groups[0] = Some(&text[..line_start]);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lexer(config: SyntaxConfig) -> Lexer {
        Lexer::new(&config).unwrap()
    }

    fn kinds(tokens: &[RawToken]) -> Vec<TokenKind> {
        tokens.iter().map(|token| token.kind).collect()
    }

    #[test]
    fn test_raw_tokens_keep_whitespace_and_comments() {
        let tokens = lexer(SyntaxConfig::default())
            .tokeniter("{# note #}{{ x }}", None, None, None)
            .unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::CommentBegin,
                TokenKind::Comment,
                TokenKind::CommentEnd,
                TokenKind::VariableBegin,
                TokenKind::Whitespace,
                TokenKind::Name,
                TokenKind::Whitespace,
                TokenKind::VariableEnd,
            ]
        );
        assert_eq!(tokens[1].value, " note ");
    }

    #[test]
    fn test_balanced_braces_do_not_close_variable() {
        let tokens = lexer(SyntaxConfig::default())
            .tokeniter("{{ {'a': 1}['a'] }}", None, None, None)
            .unwrap();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::VariableEnd);
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::VariableEnd).count(),
            1
        );
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Operator && t.value == "}"));
    }

    #[test]
    fn test_unbalanced_brackets() {
        let lexer = lexer(SyntaxConfig::default());
        let error = lexer.tokeniter("{{ x) }}", None, None, None).unwrap_err();
        assert_eq!(error.to_string(), "unexpected ')'");
        assert_eq!(error.error_code(), codes::lexical::UNBALANCED_BRACKET);

        let error = lexer.tokeniter("{{ (x] }}", None, None, None).unwrap_err();
        assert_eq!(error.to_string(), "unexpected ']', expected ')'");
    }

    #[test]
    fn test_trim_blocks_consumes_newline() {
        let config = SyntaxConfig {
            trim_blocks: true,
            ..SyntaxConfig::default()
        };
        let tokens = lexer(config)
            .tokeniter("{% if x %}\nY{% endif %}", None, None, None)
            .unwrap();
        let data: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Data)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(data, vec!["Y"]);
        assert_eq!(tokens[6].value, "%}\n");
    }

    #[test]
    fn test_minus_strips_and_keeps_line_numbers() {
        let tokens = lexer(SyntaxConfig::default())
            .tokeniter("a  \n\n  {%- x %}", None, None, None)
            .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Data);
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[1].kind, TokenKind::BlockBegin);
        assert_eq!(tokens[1].value, "{%-");
        assert_eq!(tokens[1].lineno, 3);
    }

    #[test]
    fn test_lstrip_blocks() {
        let config = SyntaxConfig {
            lstrip_blocks: true,
            ..SyntaxConfig::default()
        };
        let lexer = lexer(config);
        let tokens = lexer.tokeniter("a\n    {% x %}", None, None, None).unwrap();
        assert_eq!(tokens[0].value, "a\n");

        let tokens = lexer.tokeniter("    {% x %}", None, None, None).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BlockBegin);

        let tokens = lexer.tokeniter("a\n    {%+ x %}", None, None, None).unwrap();
        assert_eq!(tokens[0].value, "a\n    ");

        let tokens = lexer.tokeniter("a\n    {{ x }}", None, None, None).unwrap();
        assert_eq!(tokens[0].value, "a\n    ");
    }

    #[test]
    fn test_raw_block() {
        let tokens = lexer(SyntaxConfig::default())
            .tokeniter("{% raw %}{{ x }}{% endraw %}", None, None, None)
            .unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::RawBegin, TokenKind::Data, TokenKind::RawEnd]
        );
        assert_eq!(tokens[1].value, "{{ x }}");
    }

    #[test]
    fn test_unterminated_comment_and_raw() {
        let lexer = lexer(SyntaxConfig::default());
        let error = lexer.tokeniter("{# open", Some("t"), None, None).unwrap_err();
        assert_eq!(error.to_string(), "Missing end of comment tag");
        assert_eq!(error.name(), Some("t"));

        let error = lexer.tokeniter("{% raw %}x", None, None, None).unwrap_err();
        assert_eq!(error.error_code(), codes::lexical::UNTERMINATED_RAW);
    }

    #[test]
    fn test_unexpected_char() {
        let error = lexer(SyntaxConfig::default())
            .tokeniter("{{ a ? b }}", None, None, None)
            .unwrap_err();
        assert_eq!(error.to_string(), "unexpected char '?' at 5");
        assert_matches!(error, SyntaxError::Template { lineno: 1, .. });
    }

    #[test]
    fn test_start_states() {
        let lexer = lexer(SyntaxConfig::default());
        let tokens = lexer.tokeniter("x + 1", None, None, Some("variable")).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Name);

        let error = lexer.tokeniter("x", None, None, Some("comment")).unwrap_err();
        assert_matches!(error, SyntaxError::Internal { .. });
    }

    #[test]
    fn test_line_statements_and_comments() {
        let config = SyntaxConfig {
            line_statement_prefix: Some("#".into()),
            line_comment_prefix: Some("##".into()),
            ..SyntaxConfig::default()
        };
        let tokens = lexer(config)
            .tokeniter("# for x in y\n  {{ x }} ## note\n# endfor", None, None, None)
            .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LinestatementBegin);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::LinestatementEnd));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::LinecommentBegin));
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Linecomment && t.value == " note"));
    }

    #[test]
    fn test_line_statement_requires_line_start() {
        let config = SyntaxConfig {
            line_statement_prefix: Some("%".into()),
            ..SyntaxConfig::default()
        };
        let tokens = lexer(config)
            .tokeniter("{{ x }} % y", None, None, None)
            .unwrap();
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::LinestatementBegin));
        assert_eq!(tokens.last().unwrap().value, " % y");
    }

    #[test]
    fn test_trailing_newline_handling() {
        let tokens = lexer(SyntaxConfig::default())
            .tokeniter("a\r\n", None, None, None)
            .unwrap();
        assert_eq!(tokens[0].value, "a");

        let config = SyntaxConfig {
            keep_trailing_newline: true,
            ..SyntaxConfig::default()
        };
        let tokens = lexer(config).tokeniter("a\r\n", None, None, None).unwrap();
        assert_eq!(tokens[0].value, "a\n");
    }

    #[test]
    fn test_equal_configs_lex_identically() {
        let config = SyntaxConfig {
            block_start_string: "<%".into(),
            block_end_string: "%>".into(),
            line_statement_prefix: Some("#".into()),
            line_comment_prefix: Some("##".into()),
            trim_blocks: true,
            lstrip_blocks: true,
            ..SyntaxConfig::default()
        };
        let first = lexer(config.clone());
        let second = lexer(config);

        let sources = [
            "",
            "plain text",
            "<% if a %>\n  {{ {'k': [1, 2.5]}['k'] }}\n<% endif %>",
            "# for x in y\n{{ x|upper }} ## loop\n{# c #}\n# endfor",
            "<% raw %>{{ kept }}<% endraw %>  tail\r\n",
        ];
        for source in sources {
            assert_eq!(
                first.tokeniter(source, None, None, None).unwrap(),
                second.tokeniter(source, None, None, None).unwrap(),
                "source: {:?}",
                source
            );
        }
        assert_eq!(
            first.tokeniter("{{ x) }}", None, None, None).unwrap_err().to_string(),
            second.tokeniter("{{ x) }}", None, None, None).unwrap_err().to_string()
        );
    }
}
