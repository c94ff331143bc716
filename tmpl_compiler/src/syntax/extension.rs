//! Statement extensions
//!
//! An extension claims one or more tag names. When the parser meets a tag
//! that is not built in, it hands itself to the extension registered for
//! that tag, positioned on the tag name token.

use super::error::SyntaxResult;
use super::expressions::TupleOptions;
use super::parser::Parser;
use crate::grammar::ast::{Node, NodeKind};

pub trait Extension: Send + Sync {
    /// Tag names this extension parses
    fn tags(&self) -> &[&'static str];

    /// Parse one statement; must stop before the closing `block_end`
    fn parse(&self, parser: &mut Parser) -> SyntaxResult<Vec<Node>>;
}

/// `{% do expr %}` evaluates an expression and discards the result
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprStmtExtension;

impl Extension for ExprStmtExtension {
    fn tags(&self) -> &[&'static str] {
        &["do"]
    }

    fn parse(&self, parser: &mut Parser) -> SyntaxResult<Vec<Node>> {
        let lineno = parser.stream_mut().next_token().lineno;
        let node = parser.parse_tuple(TupleOptions::default())?;
        Ok(vec![Node::new(
            lineno,
            NodeKind::ExprStmt {
                node: node.boxed(),
            },
        )])
    }
}

/// `{% break %}` and `{% continue %}` inside `for` loops
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopControlExtension;

impl Extension for LoopControlExtension {
    fn tags(&self) -> &[&'static str] {
        &["break", "continue"]
    }

    fn parse(&self, parser: &mut Parser) -> SyntaxResult<Vec<Node>> {
        let token = parser.stream_mut().next_token();
        let tag = token.value_str();

        // the innermost entry is this tag; a macro or call resets loop scope
        let in_loop = parser
            .tag_stack()
            .iter()
            .rev()
            .skip(1)
            .take_while(|open| !matches!(open.as_str(), "macro" | "call"))
            .any(|open| open == "for");
        if !in_loop {
            return Err(parser.fail(format!("'{}' outside of a loop", tag), token.lineno));
        }

        let kind = if tag == "break" {
            NodeKind::Break
        } else {
            NodeKind::Continue
        };
        Ok(vec![Node::new(token.lineno, kind)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, SyntaxConfig};
    use crate::logging::codes;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn env() -> Environment {
        Environment::new(SyntaxConfig::default())
            .unwrap()
            .with_extension(Arc::new(ExprStmtExtension))
            .with_extension(Arc::new(LoopControlExtension))
    }

    #[test]
    fn test_do_statement() {
        let tree = env().parse("{% do items.append(1) %}", None, None).unwrap();
        let stmts = tree.find_all(|node| matches!(node.kind, NodeKind::ExprStmt { .. }));
        assert_eq!(stmts.len(), 1);
        assert_matches!(&stmts[0].kind, NodeKind::ExprStmt { node } => {
            assert_matches!(node.kind, NodeKind::Call { .. });
        });
    }

    #[test]
    fn test_loop_controls_inside_for() {
        let tree = env()
            .parse(
                "{% for x in y %}{% if x %}{% break %}{% else %}{% continue %}{% endif %}{% endfor %}",
                None,
                None,
            )
            .unwrap();
        assert_eq!(tree.find_all(|n| matches!(n.kind, NodeKind::Break)).len(), 1);
        assert_eq!(tree.find_all(|n| matches!(n.kind, NodeKind::Continue)).len(), 1);
    }

    #[test]
    fn test_loop_controls_outside_for() {
        let error = env().parse("{% break %}", None, None).unwrap_err();
        assert_eq!(error.message(), "'break' outside of a loop");
        assert_eq!(error.error_code(), codes::syntax::GRAMMAR_VIOLATION);

        let error = env()
            .parse(
                "{% for x in y %}{% macro m() %}{% continue %}{% endmacro %}{% endfor %}",
                None,
                None,
            )
            .unwrap_err();
        assert_eq!(error.message(), "'continue' outside of a loop");
    }

    #[test]
    fn test_unregistered_extension_tag_is_unknown() {
        let error = Environment::new(SyntaxConfig::default())
            .unwrap()
            .parse("{% do x %}", None, None)
            .unwrap_err();
        assert_eq!(error.error_code(), codes::syntax::UNKNOWN_TAG);
    }
}
