//! Recursive-descent parser from token stream to syntax tree
//!
//! The parser owns the [`TokenStream`] and keeps two stacks for diagnostics:
//! the tags of statements currently being parsed and the end tokens each
//! open body is waiting for. Statement parsers live in `statements.rs`,
//! expression parsers in `expressions.rs`.

use super::error::{SyntaxError, SyntaxResult};
use super::extension::Extension;
use crate::config::compile_time::parser::MAX_NESTING_DEPTH;
use crate::config::runtime::preferences;
use crate::grammar::ast::{Context, Node, NodeKind};
use crate::grammar::StatementKeyword;
use crate::logging::codes::{self, Code};
use crate::tokens::{describe_token_expr, TokenKind, TokenStream};
use crate::{log_debug, log_error, log_success};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// End-token list of an open body, e.g. `["name:endfor", "name:else"]`
pub type EndTokens = &'static [&'static str];

pub struct Parser {
    stream: TokenStream,
    extensions: HashMap<&'static str, Arc<dyn Extension>>,
    last_identifier: usize,
    tag_stack: Vec<String>,
    end_token_stack: Vec<EndTokens>,
    depth: usize,
}

impl Parser {
    /// Later extensions win when two register the same tag
    pub fn new(stream: TokenStream, extensions: &[Arc<dyn Extension>]) -> Self {
        let mut tagged: HashMap<&'static str, Arc<dyn Extension>> = HashMap::new();
        for extension in extensions {
            for tag in extension.tags() {
                tagged.insert(*tag, Arc::clone(extension));
            }
        }
        log_debug!("Creating template parser",
            "template" => stream.name().unwrap_or("<template>"),
            "extension_tags" => tagged.len()
        );

        Self {
            stream,
            extensions: tagged,
            last_identifier: 0,
            tag_stack: Vec::new(),
            end_token_stack: Vec::new(),
            depth: 0,
        }
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    /// Extensions consume their own tokens through this
    pub fn stream_mut(&mut self) -> &mut TokenStream {
        &mut self.stream
    }

    /// Tags of the statements currently open, innermost last
    pub fn tag_stack(&self) -> &[String] {
        &self.tag_stack
    }

    /// Parse the whole template into a `Template` node
    pub fn parse(&mut self) -> SyntaxResult<Node> {
        let template = self.stream.name().unwrap_or("<template>").to_string();
        let result = self
            .subparse(None)
            .map(|body| Node::new(1, NodeKind::Template { body }));

        match &result {
            Ok(tree) => {
                log_success!(
                    codes::success::AST_CONSTRUCTION_COMPLETE,
                    "Template parsing completed",
                    "template" => template,
                    "statements" => tree.children().len()
                );
            }
            Err(error) => {
                log_error!(error.error_code(), error.message(),
                    line = error.lineno(),
                    "template" => template
                );
            }
        }
        result
    }

    /// Parse body nodes until end of input or one of `end_tokens` follows a
    /// block start. The end token itself is left in the stream.
    pub fn subparse(&mut self, end_tokens: Option<EndTokens>) -> SyntaxResult<Vec<Node>> {
        if let Some(end_tokens) = end_tokens {
            self.end_token_stack.push(end_tokens);
        }
        let result = self.subparse_body(end_tokens);
        if end_tokens.is_some() {
            self.end_token_stack.pop();
        }
        result
    }

    fn subparse_body(&mut self, end_tokens: Option<EndTokens>) -> SyntaxResult<Vec<Node>> {
        let mut body = Vec::new();
        let mut data_buffer: Vec<Node> = Vec::new();

        while !self.stream.is_eos() {
            let token = self.stream.current().clone();
            match token.kind {
                TokenKind::Data => {
                    let data = token.value_str();
                    if !data.is_empty() {
                        data_buffer.push(Node::new(
                            token.lineno,
                            NodeKind::TemplateData {
                                data: data.to_string(),
                            },
                        ));
                    }
                    self.stream.next_token();
                }
                TokenKind::VariableBegin => {
                    self.stream.next_token();
                    data_buffer.push(self.parse_tuple(Default::default())?);
                    self.stream.expect("variable_end")?;
                }
                TokenKind::BlockBegin => {
                    flush_data(&mut body, &mut data_buffer);
                    self.stream.next_token();
                    if let Some(end_tokens) = end_tokens {
                        if self.stream.current().test_any(end_tokens) {
                            return Ok(body);
                        }
                    }
                    body.extend(self.parse_statement()?);
                    self.stream.expect("block_end")?;
                }
                _ => {
                    return Err(SyntaxError::internal("internal parsing error", token.lineno));
                }
            }
        }

        flush_data(&mut body, &mut data_buffer);
        Ok(body)
    }

    /// Parse a single statement; extensions may return several nodes
    pub fn parse_statement(&mut self) -> SyntaxResult<Vec<Node>> {
        let token = self.stream.current().clone();
        if token.kind != TokenKind::Name {
            return Err(self.fail("tag name expected", token.lineno));
        }
        let tag = token.value_str().to_string();

        self.tag_stack.push(tag.clone());
        let dispatched = self.nested(|parser| parser.dispatch_statement(&tag));
        self.tag_stack.pop();

        match dispatched? {
            Some(nodes) => Ok(nodes),
            None => Err(self.fail_unknown_tag(&tag, token.lineno)),
        }
    }

    fn dispatch_statement(&mut self, tag: &str) -> SyntaxResult<Option<Vec<Node>>> {
        if preferences().parser.log_statement_dispatch {
            log_debug!("Dispatching statement",
                "tag" => tag,
                "depth" => self.tag_stack.len()
            );
        }

        if let Some(keyword) = StatementKeyword::parse(tag) {
            let node = match keyword {
                StatementKeyword::For => self.parse_for()?,
                StatementKeyword::If => self.parse_if()?,
                StatementKeyword::Block => self.parse_block()?,
                StatementKeyword::Extends => self.parse_extends()?,
                StatementKeyword::Print => self.parse_print()?,
                StatementKeyword::Macro => self.parse_macro()?,
                StatementKeyword::Include => self.parse_include()?,
                StatementKeyword::From => self.parse_from()?,
                StatementKeyword::Import => self.parse_import()?,
                StatementKeyword::Set => self.parse_set()?,
                StatementKeyword::With => self.parse_with()?,
                StatementKeyword::Autoescape => self.parse_autoescape()?,
                StatementKeyword::Call => self.parse_call_block()?,
                StatementKeyword::Filter => self.parse_filter_block()?,
            };
            return Ok(Some(vec![node]));
        }

        match self.extensions.get(tag).cloned() {
            Some(extension) => extension.parse(self).map(Some),
            None => Ok(None),
        }
    }

    /// Parse the body of a statement up to one of `end_tokens`, optionally
    /// consuming the end token
    pub fn parse_statements(
        &mut self,
        end_tokens: EndTokens,
        drop_needle: bool,
    ) -> SyntaxResult<Vec<Node>> {
        self.stream.skip_if("colon");
        self.stream.expect("block_end")?;
        let body = self.subparse(Some(end_tokens))?;

        // subparse stops quietly at end of input
        if self.stream.current().kind == TokenKind::Eof {
            let lineno = self.stream.current().lineno;
            return Err(self.fail_eof(Some(end_tokens), lineno));
        }
        if drop_needle {
            self.stream.next_token();
        }
        Ok(body)
    }

    /// A name no template can spell, unique within this parser
    pub fn free_identifier(&mut self, lineno: usize) -> Node {
        self.last_identifier += 1;
        Node::name(format!("fi{}", self.last_identifier), Context::Load, lineno)
    }

    /// Run `parse` one nesting level deeper, failing past the configured limit
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> SyntaxResult<T>,
    ) -> SyntaxResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let lineno = self.stream.current().lineno;
            return Err(self.fail_with(
                codes::syntax::MAX_NESTING_DEPTH,
                format!("maximum nesting depth of {} exceeded", MAX_NESTING_DEPTH),
                lineno,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === FAILURES ===

    pub fn fail(&self, message: impl Into<String>, lineno: usize) -> SyntaxError {
        self.fail_with(codes::syntax::GRAMMAR_VIOLATION, message, lineno)
    }

    pub fn fail_with(&self, code: Code, message: impl Into<String>, lineno: usize) -> SyntaxError {
        SyntaxError::template(code, message, lineno)
            .with_template(self.stream.name(), self.stream.filename())
    }

    pub fn fail_unknown_tag(&self, name: &str, lineno: usize) -> SyntaxError {
        self.fail_ut_eof(Some(name), &self.end_token_stack, lineno)
    }

    pub fn fail_eof(&self, end_tokens: Option<EndTokens>, lineno: usize) -> SyntaxError {
        let mut stack = self.end_token_stack.clone();
        stack.extend(end_tokens);
        self.fail_ut_eof(None, &stack, lineno)
    }

    fn fail_ut_eof(&self, name: Option<&str>, stack: &[EndTokens], lineno: usize) -> SyntaxError {
        let expected: BTreeSet<String> = stack
            .iter()
            .flat_map(|exprs| exprs.iter())
            .map(|expr| describe_token_expr(expr))
            .collect();
        let currently_looking = stack.last().map(|exprs| {
            exprs
                .iter()
                .map(|expr| format!("'{}'", describe_token_expr(expr)))
                .collect::<Vec<_>>()
                .join(" or ")
        });

        let (code, mut messages) = match name {
            Some(name) => (
                codes::syntax::UNKNOWN_TAG,
                vec![format!("Encountered unknown tag '{}'.", name)],
            ),
            None => (
                codes::syntax::UNEXPECTED_END,
                vec!["Unexpected end of template.".to_string()],
            ),
        };

        if let Some(looking) = currently_looking {
            if name.is_some_and(|name| expected.contains(name)) {
                messages.push(format!(
                    "You probably made a nesting mistake. The parser is expecting this tag, \
                     but currently looking for {}.",
                    looking
                ));
            } else {
                messages.push(format!(
                    "The parser was looking for the following tags: {}.",
                    looking
                ));
            }
        }

        if let Some(tag) = self.tag_stack.last() {
            messages.push(format!(
                "The innermost block that needs to be closed is '{}'.",
                tag
            ));
        }

        self.fail_with(code, messages.join(" "), lineno)
    }
}

fn flush_data(body: &mut Vec<Node>, buffer: &mut Vec<Node>) {
    if let Some(first) = buffer.first() {
        let lineno = first.lineno;
        body.push(Node::new(
            lineno,
            NodeKind::Output {
                nodes: std::mem::take(buffer),
            },
        ));
    }
}
