//! Statement parsers, one per built-in tag
//!
//! Each parser is entered with the tag name as the current token and leaves
//! the stream on the `block_end` of its final tag.

use super::error::SyntaxResult;
use super::expressions::{AssignTargetOptions, TupleOptions};
use super::parser::Parser;
use crate::grammar::ast::{Context, ImportName, Keyword, Node, NodeKind};
use crate::tokens::TokenKind;

const IF_BODY_END: &[&str] = &["name:elif", "name:else", "name:endif"];
const FOR_BODY_END: &[&str] = &["name:endfor", "name:else"];

impl Parser {
    pub(crate) fn parse_for(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().expect("name:for")?.lineno;
        let target = self.parse_assign_target(AssignTargetOptions {
            extra_end_rules: &["name:in"],
            ..Default::default()
        })?;
        self.stream_mut().expect("name:in")?;
        let iter = self.parse_tuple(TupleOptions {
            with_condexpr: false,
            extra_end_rules: &["name:recursive"],
            ..Default::default()
        })?;
        let test = if self.stream_mut().skip_if("name:if") {
            Some(self.parse_expression(true)?.boxed())
        } else {
            None
        };
        let recursive = self.stream_mut().skip_if("name:recursive");
        let body = self.parse_statements(FOR_BODY_END, false)?;
        let else_ = if self.stream_mut().next_token().is_name("endfor") {
            Vec::new()
        } else {
            self.parse_statements(&["name:endfor"], true)?
        };

        Ok(Node::new(
            lineno,
            NodeKind::For {
                target: target.boxed(),
                iter: iter.boxed(),
                body,
                else_,
                test,
                recursive,
            },
        ))
    }

    /// `elif` branches become bare `If` nodes on the first node's `elif` list
    pub(crate) fn parse_if(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().expect("name:if")?.lineno;
        let (test, body) = self.parse_if_branch()?;
        let mut elif = Vec::new();
        let mut else_ = Vec::new();

        let mut token = self.stream_mut().next_token();
        while token.is_name("elif") {
            let branch_lineno = self.stream().current().lineno;
            let (test, body) = self.parse_if_branch()?;
            elif.push(Node::new(
                branch_lineno,
                NodeKind::If {
                    test,
                    body,
                    elif: Vec::new(),
                    else_: Vec::new(),
                },
            ));
            token = self.stream_mut().next_token();
        }
        if token.is_name("else") {
            else_ = self.parse_statements(&["name:endif"], true)?;
        }

        Ok(Node::new(
            lineno,
            NodeKind::If {
                test,
                body,
                elif,
                else_,
            },
        ))
    }

    fn parse_if_branch(&mut self) -> SyntaxResult<(Box<Node>, Vec<Node>)> {
        let test = self.parse_tuple(TupleOptions {
            with_condexpr: false,
            ..Default::default()
        })?;
        let body = self.parse_statements(IF_BODY_END, false)?;
        Ok((test.boxed(), body))
    }

    pub(crate) fn parse_block(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let name = self.stream_mut().expect("name")?.value_str().to_string();
        let scoped = self.stream_mut().skip_if("name:scoped");
        let required = self.stream_mut().skip_if("name:required");

        // `{% block my-name %}` lexes as `my - name`
        if self.stream().current().kind == TokenKind::Sub {
            let lineno = self.stream().current().lineno;
            return Err(self.fail(
                "Block names have to be valid identifiers and may not contain hyphens, \
                 use an underscore instead.",
                lineno,
            ));
        }

        let body = self.parse_statements(&["name:endblock"], true)?;

        if required && !body.iter().all(is_blank_output) {
            let lineno = self.stream().current().lineno;
            return Err(self.fail(
                "Required blocks can only contain comments or whitespace",
                lineno,
            ));
        }

        self.stream_mut().skip_if(&format!("name:{}", name));
        Ok(Node::new(
            lineno,
            NodeKind::Block {
                name,
                body,
                scoped,
                required,
            },
        ))
    }

    pub(crate) fn parse_extends(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let template = self.parse_expression(true)?;
        Ok(Node::new(
            lineno,
            NodeKind::Extends {
                template: template.boxed(),
            },
        ))
    }

    pub(crate) fn parse_print(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let mut nodes = Vec::new();
        while self.stream().current().kind != TokenKind::BlockEnd {
            if !nodes.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            nodes.push(self.parse_expression(true)?);
        }
        Ok(Node::new(lineno, NodeKind::Output { nodes }))
    }

    pub(crate) fn parse_macro(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let (name, _) = self.parse_assign_name()?;
        let (args, defaults) = self.parse_signature()?;
        let body = self.parse_statements(&["name:endmacro"], true)?;
        Ok(Node::new(
            lineno,
            NodeKind::Macro {
                name,
                args,
                defaults,
                body,
            },
        ))
    }

    /// `(a, b=1)` parameter list of macros and call blocks
    fn parse_signature(&mut self) -> SyntaxResult<(Vec<Node>, Vec<Node>)> {
        let mut args = Vec::new();
        let mut defaults = Vec::new();

        self.stream_mut().expect("lparen")?;
        while self.stream().current().kind != TokenKind::Rparen {
            if !args.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            let (name, lineno) = self.parse_assign_name()?;
            if self.stream_mut().skip_if("assign") {
                defaults.push(self.parse_expression(true)?);
            } else if !defaults.is_empty() {
                let lineno = self.stream().current().lineno;
                return Err(self.fail("non-default argument follows default argument", lineno));
            }
            args.push(Node::name(name, Context::Param, lineno));
        }
        self.stream_mut().expect("rparen")?;
        Ok((args, defaults))
    }

    pub(crate) fn parse_include(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let template = self.parse_expression(true)?;
        let ignore_missing = if self.stream().current().is_name("ignore")
            && self.stream_mut().look().is_name("missing")
        {
            self.stream_mut().skip(2);
            true
        } else {
            false
        };
        let with_context = self.parse_context_clause().unwrap_or(true);
        Ok(Node::new(
            lineno,
            NodeKind::Include {
                template: template.boxed(),
                with_context,
                ignore_missing,
            },
        ))
    }

    pub(crate) fn parse_import(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let template = self.parse_expression(true)?;
        self.stream_mut().expect("name:as")?;
        let (target, _) = self.parse_assign_name()?;
        let with_context = self.parse_context_clause().unwrap_or(false);
        Ok(Node::new(
            lineno,
            NodeKind::Import {
                template: template.boxed(),
                target,
                with_context,
            },
        ))
    }

    pub(crate) fn parse_from(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let template = self.parse_expression(true)?;
        self.stream_mut().expect("name:import")?;

        let mut names: Vec<ImportName> = Vec::new();
        let mut with_context = None;
        loop {
            if !names.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            if self.stream().current().kind != TokenKind::Name {
                self.stream_mut().expect("name")?;
                continue;
            }

            with_context = self.parse_context_clause();
            if with_context.is_some() {
                break;
            }
            let (name, name_lineno) = self.parse_assign_name()?;
            if name.starts_with('_') {
                return Err(self.fail(
                    "names starting with an underline can not be imported",
                    name_lineno,
                ));
            }
            let alias = if self.stream_mut().skip_if("name:as") {
                Some(self.parse_assign_name()?.0)
            } else {
                None
            };
            names.push(ImportName { name, alias });

            with_context = self.parse_context_clause();
            if with_context.is_some() || self.stream().current().kind != TokenKind::Comma {
                break;
            }
        }

        Ok(Node::new(
            lineno,
            NodeKind::FromImport {
                template: template.boxed(),
                names,
                with_context: with_context.unwrap_or(false),
            },
        ))
    }

    /// Optional `with context` / `without context` suffix
    fn parse_context_clause(&mut self) -> Option<bool> {
        let current = self.stream().current();
        if !(current.is_name("with") || current.is_name("without")) {
            return None;
        }
        if !self.stream_mut().look().is_name("context") {
            return None;
        }
        let with = self.stream_mut().next_token().is_name("with");
        self.stream_mut().skip(1);
        Some(with)
    }

    /// `set` with `=` is a plain assignment, otherwise a block capture with
    /// an optional filter chain
    pub(crate) fn parse_set(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let target = self.parse_assign_target(AssignTargetOptions {
            with_namespace: true,
            ..Default::default()
        })?;

        if self.stream_mut().skip_if("assign") {
            let node = self.parse_tuple(TupleOptions::default())?;
            return Ok(Node::new(
                lineno,
                NodeKind::Assign {
                    target: target.boxed(),
                    node: node.boxed(),
                },
            ));
        }

        let filter = self.parse_filter(None, false)?;
        let body = self.parse_statements(&["name:endset"], true)?;
        Ok(Node::new(
            lineno,
            NodeKind::AssignBlock {
                target: target.boxed(),
                filter: filter.map(Node::boxed),
                body,
            },
        ))
    }

    pub(crate) fn parse_with(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let mut targets = Vec::new();
        let mut values = Vec::new();

        while self.stream().current().kind != TokenKind::BlockEnd {
            if !targets.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            let mut target = self.parse_assign_target(AssignTargetOptions::default())?;
            target.set_ctx(Context::Param);
            targets.push(target);
            self.stream_mut().expect("assign")?;
            values.push(self.parse_expression(true)?);
        }

        let body = self.parse_statements(&["name:endwith"], true)?;
        Ok(Node::new(
            lineno,
            NodeKind::With {
                targets,
                values,
                body,
            },
        ))
    }

    /// `autoescape` wraps its body in a scope carrying the option
    pub(crate) fn parse_autoescape(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let value = self.parse_expression(true)?;
        let options = vec![Keyword {
            lineno: value.lineno,
            key: "autoescape".to_string(),
            value,
        }];
        let body = self.parse_statements(&["name:endautoescape"], true)?;
        let modifier = Node::new(
            lineno,
            NodeKind::ScopedEvalContextModifier { options, body },
        );
        Ok(Node::new(
            lineno,
            NodeKind::Scope {
                body: vec![modifier],
            },
        ))
    }

    pub(crate) fn parse_call_block(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let (args, defaults) = if self.stream().current().kind == TokenKind::Lparen {
            self.parse_signature()?
        } else {
            (Vec::new(), Vec::new())
        };

        let call = self.parse_expression(true)?;
        if !matches!(call.kind, NodeKind::Call { .. }) {
            return Err(self.fail("expected call", lineno));
        }

        let body = self.parse_statements(&["name:endcall"], true)?;
        Ok(Node::new(
            lineno,
            NodeKind::CallBlock {
                call: call.boxed(),
                args,
                defaults,
                body,
            },
        ))
    }

    pub(crate) fn parse_filter_block(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream_mut().next_token().lineno;
        let mut filter = self.parse_filter_step(None)?;
        while self.stream_mut().skip_if("pipe") {
            filter = self.parse_filter_step(Some(filter))?;
        }
        let body = self.parse_statements(&["name:endfilter"], true)?;
        Ok(Node::new(
            lineno,
            NodeKind::FilterBlock {
                body,
                filter: filter.boxed(),
            },
        ))
    }
}

/// Output made only of whitespace template data
fn is_blank_output(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Output { nodes } => nodes.iter().all(|node| {
            matches!(&node.kind, NodeKind::TemplateData { data }
                if !data.is_empty() && data.chars().all(char::is_whitespace))
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::environment::{Environment, SyntaxConfig};
    use crate::grammar::ast::{CompareOp, Context, Literal, Node, NodeKind};
    use crate::logging::codes;
    use crate::syntax::{SyntaxError, SyntaxResult};
    use assert_matches::assert_matches;

    fn parse(source: &str) -> SyntaxResult<Node> {
        Environment::new(SyntaxConfig::default())
            .unwrap()
            .parse(source, None, None)
    }

    fn statement(source: &str) -> Node {
        match parse(source).unwrap().kind {
            NodeKind::Template { mut body } => body.remove(0),
            other => panic!("expected template, got {:?}", other),
        }
    }

    fn error(source: &str) -> SyntaxError {
        parse(source).unwrap_err()
    }

    #[test]
    fn test_for_loop() {
        let node = statement("{% for k, v in items if v recursive %}{{ k }}{% else %}none{% endfor %}");
        assert_matches!(node.kind, NodeKind::For { target, iter, body, else_, test: Some(_), recursive: true } => {
            assert_matches!(target.kind, NodeKind::Tuple { items, ctx: Context::Store } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].ctx(), Some(Context::Store));
            });
            assert_matches!(iter.kind, NodeKind::Name { name, ctx: Context::Load } if name == "items");
            assert_eq!(body.len(), 1);
            assert_eq!(else_.len(), 1);
        });
    }

    #[test]
    fn test_for_without_else() {
        assert_matches!(
            statement("{% for x in y %}{% endfor %}").kind,
            NodeKind::For { else_, test: None, recursive: false, .. } if else_.is_empty()
        );
    }

    #[test]
    fn test_if_elif_else() {
        let node = statement("{% if a %}1{% elif b %}2{% elif c %}3{% else %}4{% endif %}");
        assert_matches!(node.kind, NodeKind::If { test, body, elif, else_ } => {
            assert_matches!(test.kind, NodeKind::Name { name, .. } if name == "a");
            assert_eq!(body.len(), 1);
            assert_eq!(elif.len(), 2);
            assert_matches!(&elif[1].kind, NodeKind::If { test, elif, .. } => {
                assert_matches!(&test.kind, NodeKind::Name { name, .. } if name == "c");
                assert!(elif.is_empty());
            });
            assert_eq!(else_.len(), 1);
        });
    }

    #[test]
    fn test_if_test_with_comparison() {
        assert_matches!(statement("{% if name != 'OFF' %}x{% endif %}").kind, NodeKind::If { test, .. } => {
            assert_matches!(test.kind, NodeKind::Compare { ops, .. } if ops[0].op == CompareOp::Ne);
        });
    }

    #[test]
    fn test_block() {
        assert_matches!(
            statement("{% block content scoped %}hi{% endblock content %}").kind,
            NodeKind::Block { name, scoped: true, required: false, body } if name == "content" && body.len() == 1
        );
        assert_matches!(
            statement("{% block r required %}  {# note #}\n{% endblock %}").kind,
            NodeKind::Block { required: true, .. }
        );
        assert_eq!(
            error("{% block r required %}text{% endblock %}").message(),
            "Required blocks can only contain comments or whitespace"
        );
        assert!(error("{% block my-name %}{% endblock %}")
            .message()
            .contains("may not contain hyphens"));
    }

    #[test]
    fn test_extends_include_import() {
        assert_matches!(statement("{% extends 'base.html' %}").kind, NodeKind::Extends { template } => {
            assert_matches!(template.kind, NodeKind::Const { value: Literal::Str(s) } if s == "base.html");
        });
        assert_matches!(
            statement("{% include 'x' ignore missing without context %}").kind,
            NodeKind::Include { ignore_missing: true, with_context: false, .. }
        );
        assert_matches!(
            statement("{% include 'x' %}").kind,
            NodeKind::Include { ignore_missing: false, with_context: true, .. }
        );
        assert_matches!(
            statement("{% import 'forms.html' as forms with context %}").kind,
            NodeKind::Import { target, with_context: true, .. } if target == "forms"
        );
    }

    #[test]
    fn test_from_import() {
        assert_matches!(
            statement("{% from 'forms.html' import input as field, textarea with context %}").kind,
            NodeKind::FromImport { names, with_context: true, .. } => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[0].name, "input");
                assert_eq!(names[0].alias.as_deref(), Some("field"));
                assert_eq!(names[1].alias, None);
            }
        );
        assert_eq!(
            error("{% from 'f' import _private %}").message(),
            "names starting with an underline can not be imported"
        );
    }

    #[test]
    fn test_macro_and_call_block() {
        assert_matches!(
            statement("{% macro input(name, value='', type='text') %}x{% endmacro %}").kind,
            NodeKind::Macro { name, args, defaults, body } => {
                assert_eq!(name, "input");
                assert_eq!(args.len(), 3);
                assert_eq!(args[0].ctx(), Some(Context::Param));
                assert_eq!(defaults.len(), 2);
                assert_eq!(body.len(), 1);
            }
        );
        assert_eq!(
            error("{% macro m(a=1, b) %}{% endmacro %}").message(),
            "non-default argument follows default argument"
        );
        assert_matches!(
            statement("{% call(user) list_users(users) %}{{ user }}{% endcall %}").kind,
            NodeKind::CallBlock { args, call, .. } => {
                assert_eq!(args.len(), 1);
                assert_matches!(call.kind, NodeKind::Call { .. });
            }
        );
        assert_eq!(error("{% call foo %}{% endcall %}").message(), "expected call");
    }

    #[test]
    fn test_set_forms() {
        assert_matches!(statement("{% set a, b = 1, 2 %}").kind, NodeKind::Assign { target, node } => {
            assert_matches!(target.kind, NodeKind::Tuple { ctx: Context::Store, .. });
            assert_matches!(node.kind, NodeKind::Tuple { .. });
        });
        assert_matches!(
            statement("{% set ns.count = 3 %}").kind,
            NodeKind::Assign { target, .. } => {
                assert_matches!(target.kind, NodeKind::NSRef { name, attr } if name == "ns" && attr == "count");
            }
        );
        assert_matches!(
            statement("{% set body | trim %}  x  {% endset %}").kind,
            NodeKind::AssignBlock { filter: Some(filter), body, .. } => {
                assert_matches!(filter.kind, NodeKind::Filter { node: None, name, .. } if name == "trim");
                assert_eq!(body.len(), 1);
            }
        );
        assert_matches!(
            statement("{% set body %}x{% endset %}").kind,
            NodeKind::AssignBlock { filter: None, .. }
        );
    }

    #[test]
    fn test_invalid_assignment_targets() {
        let err = error("{% set 1 = 2 %}");
        assert_eq!(err.message(), "can't assign to 'const'");
        assert_eq!(err.error_code(), codes::syntax::INVALID_ASSIGNMENT);
        assert_eq!(error("{% set None = 2 %}").message(), "can't assign to 'const'");
        assert_eq!(error("{% macro true() %}{% endmacro %}").message(), "can't assign to 'name'");
    }

    #[test]
    fn test_with_and_autoescape() {
        assert_matches!(statement("{% with a = 1, b = a %}{{ b }}{% endwith %}").kind, NodeKind::With { targets, values, body } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(targets[0].ctx(), Some(Context::Param));
            assert_eq!(values.len(), 2);
            assert_eq!(body.len(), 1);
        });
        assert_matches!(statement("{% autoescape true %}x{% endautoescape %}").kind, NodeKind::Scope { body } => {
            assert_matches!(&body[0].kind, NodeKind::ScopedEvalContextModifier { options, body } => {
                assert_eq!(options[0].key, "autoescape");
                assert_eq!(body.len(), 1);
            });
        });
    }

    #[test]
    fn test_filter_block_and_print() {
        assert_matches!(statement("{% filter upper | trim %}x{% endfilter %}").kind, NodeKind::FilterBlock { filter, .. } => {
            assert_matches!(filter.kind, NodeKind::Filter { node: Some(inner), name, .. } => {
                assert_eq!(name, "trim");
                assert_matches!(inner.kind, NodeKind::Filter { node: None, .. });
            });
        });
        assert_matches!(statement("{% print a, b %}").kind, NodeKind::Output { nodes } if nodes.len() == 2);
    }

    #[test]
    fn test_trim_blocks_drops_newline() {
        let config = SyntaxConfig {
            trim_blocks: true,
            ..SyntaxConfig::default()
        };
        let tree = Environment::new(config)
            .unwrap()
            .parse("{% if x %}\nY{% endif %}", None, None)
            .unwrap();
        let data = tree.find_all(|node| matches!(node.kind, NodeKind::TemplateData { .. }));
        assert_matches!(&data[0].kind, NodeKind::TemplateData { data } if data == "Y");
    }
}
