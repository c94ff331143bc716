//! AST node definitions produced by the template parser
//!
//! Design principles:
//! - One node type: every statement and expression is a [`Node`] carrying its
//!   line number and a [`NodeKind`] variant
//! - Owned children: subtrees are boxed or held in vectors, never shared
//! - Serde compatible: the tree serialises with a `type` tag per node so the
//!   CLI can dump it as JSON

use crate::grammar::keywords::CONSTANT_NAMES;
use serde::{Deserialize, Serialize};
use std::fmt;

// === CONTEXT ===

/// How a name-like expression is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    #[default]
    Load,
    Store,
    Param,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Store => "store",
            Self::Param => "param",
        }
    }
}

// === LITERALS ===

/// Constant value folded into the tree at parse time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{:?}", value),
            Self::Str(value) => write!(f, "{:?}", value),
        }
    }
}

// === OPERATORS ===

/// Binary operators, including the short-circuit logical ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
            Self::FloorDiv => "FloorDiv",
            Self::Mod => "Mod",
            Self::Pow => "Pow",
            Self::And => "And",
            Self::Or => "Or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pos => "+",
            Self::Neg => "-",
            Self::Not => "not",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pos => "Pos",
            Self::Neg => "Neg",
            Self::Not => "Not",
        }
    }
}

/// Comparison operators, named after their token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gteq,
    Lt,
    Lteq,
    In,
    #[serde(rename = "notin")]
    NotIn,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gteq => "gteq",
            Self::Lt => "lt",
            Self::Lteq => "lteq",
            Self::In => "in",
            Self::NotIn => "notin",
        }
    }
}

// === HELPERS ===

/// Key/value entry of a dict literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub lineno: usize,
    pub key: Node,
    pub value: Node,
}

/// Keyword argument or eval-context option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub lineno: usize,
    pub key: String,
    pub value: Node,
}

/// One `(operator, right-hand side)` link of a comparison chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub op: CompareOp,
    pub expr: Node,
}

/// Arguments shared by calls, filters and tests
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallArgs {
    pub args: Vec<Node>,
    pub kwargs: Vec<Keyword>,
    pub dyn_args: Option<Box<Node>>,
    pub dyn_kwargs: Option<Box<Node>>,
}

impl CallArgs {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
            && self.kwargs.is_empty()
            && self.dyn_args.is_none()
            && self.dyn_kwargs.is_none()
    }
}

/// Name pulled in by `{% from ... import ... %}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

// === NODES ===

/// A node of the template tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub lineno: usize,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    // --- statements ---
    /// Root of every parsed template
    Template { body: Vec<Node> },
    /// Run of template data and `{{ }}` expressions written in order
    Output { nodes: Vec<Node> },
    Extends { template: Box<Node> },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        #[serde(rename = "else")]
        else_: Vec<Node>,
        test: Option<Box<Node>>,
        recursive: bool,
    },
    /// `elif` branches are nested `If` nodes kept on the first one
    If {
        test: Box<Node>,
        body: Vec<Node>,
        elif: Vec<Node>,
        #[serde(rename = "else")]
        else_: Vec<Node>,
    },
    Macro {
        name: String,
        args: Vec<Node>,
        defaults: Vec<Node>,
        body: Vec<Node>,
    },
    CallBlock {
        call: Box<Node>,
        args: Vec<Node>,
        defaults: Vec<Node>,
        body: Vec<Node>,
    },
    FilterBlock { body: Vec<Node>, filter: Box<Node> },
    With {
        targets: Vec<Node>,
        values: Vec<Node>,
        body: Vec<Node>,
    },
    Block {
        name: String,
        body: Vec<Node>,
        scoped: bool,
        required: bool,
    },
    Include {
        template: Box<Node>,
        with_context: bool,
        ignore_missing: bool,
    },
    Import {
        template: Box<Node>,
        target: String,
        with_context: bool,
    },
    FromImport {
        template: Box<Node>,
        names: Vec<ImportName>,
        with_context: bool,
    },
    ExprStmt { node: Box<Node> },
    Assign { target: Box<Node>, node: Box<Node> },
    AssignBlock {
        target: Box<Node>,
        filter: Option<Box<Node>>,
        body: Vec<Node>,
    },
    Break,
    Continue,
    Scope { body: Vec<Node> },
    EvalContextModifier { options: Vec<Keyword> },
    ScopedEvalContextModifier { options: Vec<Keyword>, body: Vec<Node> },

    // --- expressions ---
    Name { name: String, ctx: Context },
    /// `namespace.attr` used as an assignment target
    NSRef { name: String, attr: String },
    Const { value: Literal },
    TemplateData { data: String },
    Tuple { items: Vec<Node>, ctx: Context },
    List { items: Vec<Node> },
    Dict { items: Vec<Pair> },
    CondExpr {
        test: Box<Node>,
        expr1: Box<Node>,
        expr2: Option<Box<Node>>,
    },
    BinExpr {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryExpr { op: UnaryOp, node: Box<Node> },
    Compare { expr: Box<Node>, ops: Vec<Operand> },
    Concat { nodes: Vec<Node> },
    Getattr {
        node: Box<Node>,
        attr: String,
        ctx: Context,
    },
    Getitem {
        node: Box<Node>,
        arg: Box<Node>,
        ctx: Context,
    },
    Slice {
        start: Option<Box<Node>>,
        stop: Option<Box<Node>>,
        step: Option<Box<Node>>,
    },
    Call {
        node: Box<Node>,
        #[serde(flatten)]
        call: CallArgs,
    },
    /// `node` is absent for the filter of a `{% filter %}` block
    Filter {
        node: Option<Box<Node>>,
        name: String,
        #[serde(flatten)]
        call: CallArgs,
    },
    Test {
        node: Box<Node>,
        name: String,
        #[serde(flatten)]
        call: CallArgs,
    },
}

impl Node {
    pub fn new(lineno: usize, kind: NodeKind) -> Self {
        Self { lineno, kind }
    }

    pub fn boxed(self) -> Box<Node> {
        Box::new(self)
    }

    pub fn name(name: impl Into<String>, ctx: Context, lineno: usize) -> Self {
        Self::new(
            lineno,
            NodeKind::Name {
                name: name.into(),
                ctx,
            },
        )
    }

    pub fn constant(value: Literal, lineno: usize) -> Self {
        Self::new(lineno, NodeKind::Const { value })
    }

    /// Class-style name of the node, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Template { .. } => "Template",
            NodeKind::Output { .. } => "Output",
            NodeKind::Extends { .. } => "Extends",
            NodeKind::For { .. } => "For",
            NodeKind::If { .. } => "If",
            NodeKind::Macro { .. } => "Macro",
            NodeKind::CallBlock { .. } => "CallBlock",
            NodeKind::FilterBlock { .. } => "FilterBlock",
            NodeKind::With { .. } => "With",
            NodeKind::Block { .. } => "Block",
            NodeKind::Include { .. } => "Include",
            NodeKind::Import { .. } => "Import",
            NodeKind::FromImport { .. } => "FromImport",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::AssignBlock { .. } => "AssignBlock",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Scope { .. } => "Scope",
            NodeKind::EvalContextModifier { .. } => "EvalContextModifier",
            NodeKind::ScopedEvalContextModifier { .. } => "ScopedEvalContextModifier",
            NodeKind::Name { .. } => "Name",
            NodeKind::NSRef { .. } => "NSRef",
            NodeKind::Const { .. } => "Const",
            NodeKind::TemplateData { .. } => "TemplateData",
            NodeKind::Tuple { .. } => "Tuple",
            NodeKind::List { .. } => "List",
            NodeKind::Dict { .. } => "Dict",
            NodeKind::CondExpr { .. } => "CondExpr",
            NodeKind::BinExpr { op, .. } => op.type_name(),
            NodeKind::UnaryExpr { op, .. } => op.type_name(),
            NodeKind::Compare { .. } => "Compare",
            NodeKind::Concat { .. } => "Concat",
            NodeKind::Getattr { .. } => "Getattr",
            NodeKind::Getitem { .. } => "Getitem",
            NodeKind::Slice { .. } => "Slice",
            NodeKind::Call { .. } => "Call",
            NodeKind::Filter { .. } => "Filter",
            NodeKind::Test { .. } => "Test",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Template { .. }
                | NodeKind::Output { .. }
                | NodeKind::Extends { .. }
                | NodeKind::For { .. }
                | NodeKind::If { .. }
                | NodeKind::Macro { .. }
                | NodeKind::CallBlock { .. }
                | NodeKind::FilterBlock { .. }
                | NodeKind::With { .. }
                | NodeKind::Block { .. }
                | NodeKind::Include { .. }
                | NodeKind::Import { .. }
                | NodeKind::FromImport { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::Assign { .. }
                | NodeKind::AssignBlock { .. }
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Scope { .. }
                | NodeKind::EvalContextModifier { .. }
                | NodeKind::ScopedEvalContextModifier { .. }
        )
    }

    /// Whether the node may appear on the left of an assignment
    pub fn can_assign(&self) -> bool {
        match &self.kind {
            NodeKind::Name { name, .. } => !CONSTANT_NAMES.contains(&name.as_str()),
            NodeKind::NSRef { .. } => true,
            NodeKind::Tuple { items, .. } => items.iter().all(Node::can_assign),
            _ => false,
        }
    }

    /// Context of name-like expressions, `None` for everything else
    pub fn ctx(&self) -> Option<Context> {
        match &self.kind {
            NodeKind::Name { ctx, .. }
            | NodeKind::Tuple { ctx, .. }
            | NodeKind::Getattr { ctx, .. }
            | NodeKind::Getitem { ctx, .. } => Some(*ctx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_assign() {
        assert!(Node::name("x", Context::Load, 1).can_assign());
        assert!(!Node::name("None", Context::Load, 1).can_assign());
        assert!(!Node::constant(Literal::Int(1), 1).can_assign());

        let tuple = Node::new(
            1,
            NodeKind::Tuple {
                items: vec![
                    Node::name("a", Context::Load, 1),
                    Node::name("b", Context::Load, 1),
                ],
                ctx: Context::Load,
            },
        );
        assert!(tuple.can_assign());

        let bad_tuple = Node::new(
            1,
            NodeKind::Tuple {
                items: vec![Node::name("a", Context::Load, 1), Node::constant(Literal::None, 1)],
                ctx: Context::Load,
            },
        );
        assert!(!bad_tuple.can_assign());
    }

    #[test]
    fn test_type_name_uses_operator_class() {
        let node = Node::new(
            3,
            NodeKind::BinExpr {
                op: BinaryOp::FloorDiv,
                left: Node::constant(Literal::Int(1), 3).boxed(),
                right: Node::constant(Literal::Int(2), 3).boxed(),
            },
        );
        assert_eq!(node.type_name(), "FloorDiv");
        assert!(!node.is_statement());
        assert_eq!(Node::new(1, NodeKind::Break).type_name(), "Break");
    }

    #[test]
    fn test_serialises_with_type_tag() {
        let node = Node::new(
            2,
            NodeKind::Output {
                nodes: vec![Node::new(
                    2,
                    NodeKind::TemplateData {
                        data: "hi".to_string(),
                    },
                )],
            },
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Output");
        assert_eq!(json["lineno"], 2);
        assert_eq!(json["nodes"][0]["type"], "TemplateData");
        assert_eq!(json["nodes"][0]["data"], "hi");
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::None.to_string(), "None");
        assert_eq!(Literal::Bool(true).to_string(), "True");
        assert_eq!(Literal::Float(1.0).to_string(), "1.0");
        assert_eq!(Literal::Str("a".into()).to_string(), "\"a\"");
    }
}
