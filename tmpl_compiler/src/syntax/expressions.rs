//! Expression grammar
//!
//! Precedence, loosest first: conditional, `or`, `and`, `not`, comparison,
//! `+ -`, `~`, `* / // %`, `**`, unary sign, then postfix and filter/test
//! application on top of primaries. Every binary level chains left to right.

use super::error::{SyntaxError, SyntaxResult};
use super::parser::Parser;
use crate::grammar::ast::{
    BinaryOp, CallArgs, CompareOp, Context, Keyword, Literal, Node, NodeKind, Operand, Pair,
    UnaryOp,
};
use crate::grammar::is_reserved_keyword;
use crate::logging::codes;
use crate::tokens::{describe_token, Token, TokenKind, TokenValue};

/// Knobs of [`Parser::parse_tuple`]
#[derive(Debug, Clone, Copy)]
pub struct TupleOptions<'a> {
    /// Only primaries, no operators; used for assignment targets
    pub simplified: bool,
    pub with_condexpr: bool,
    /// Token expressions that end the tuple besides the closing delimiters
    pub extra_end_rules: &'a [&'a str],
    /// Whether `()` was written, which makes an empty tuple legal
    pub explicit_parentheses: bool,
}

impl Default for TupleOptions<'_> {
    fn default() -> Self {
        Self {
            simplified: false,
            with_condexpr: true,
            extra_end_rules: &[],
            explicit_parentheses: false,
        }
    }
}

/// Knobs of [`Parser::parse_assign_target`]
#[derive(Debug, Clone, Copy)]
pub struct AssignTargetOptions<'a> {
    pub with_tuple: bool,
    pub name_only: bool,
    pub extra_end_rules: &'a [&'a str],
    /// Allow `namespace.attr` targets
    pub with_namespace: bool,
}

impl Default for AssignTargetOptions<'_> {
    fn default() -> Self {
        Self {
            with_tuple: true,
            name_only: false,
            extra_end_rules: &[],
            with_namespace: false,
        }
    }
}

fn compare_op(kind: TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Eq => Some(CompareOp::Eq),
        TokenKind::Ne => Some(CompareOp::Ne),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::Lteq => Some(CompareOp::Lteq),
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::Gteq => Some(CompareOp::Gteq),
        _ => None,
    }
}

fn literal(token: &Token) -> Literal {
    match &token.value {
        TokenValue::Int(value) => Literal::Int(*value),
        TokenValue::Float(value) => Literal::Float(*value),
        TokenValue::Str(value) => Literal::Str(value.clone()),
    }
}

fn binary(op: BinaryOp, left: Node, right: Node, lineno: usize) -> Node {
    Node::new(
        lineno,
        NodeKind::BinExpr {
            op,
            left: left.boxed(),
            right: right.boxed(),
        },
    )
}

impl Parser {
    /// Comma-separated expressions; a single item without a trailing comma
    /// is returned as-is rather than wrapped in a tuple
    pub fn parse_tuple(&mut self, options: TupleOptions<'_>) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut items = Vec::new();
        let mut is_tuple = false;

        loop {
            if !items.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            if self.is_tuple_end(options.extra_end_rules) {
                break;
            }
            let item = if options.simplified {
                self.parse_primary()?
            } else {
                self.parse_expression(options.with_condexpr)?
            };
            items.push(item);
            if self.stream().current().kind == TokenKind::Comma {
                is_tuple = true;
            } else {
                break;
            }
            lineno = self.stream().current().lineno;
        }

        if !is_tuple {
            if let Some(item) = items.pop() {
                return Ok(item);
            }
            if !options.explicit_parentheses {
                let current = self.stream().current();
                return Err(self.fail(
                    format!("Expected an expression, got '{}'", describe_token(current)),
                    current.lineno,
                ));
            }
        }

        Ok(Node::new(
            lineno,
            NodeKind::Tuple {
                items,
                ctx: Context::Load,
            },
        ))
    }

    fn is_tuple_end(&self, extra_end_rules: &[&str]) -> bool {
        let current = self.stream().current();
        matches!(
            current.kind,
            TokenKind::VariableEnd | TokenKind::BlockEnd | TokenKind::Rparen
        ) || current.test_any(extra_end_rules)
    }

    pub fn parse_expression(&mut self, with_condexpr: bool) -> SyntaxResult<Node> {
        if with_condexpr {
            self.parse_condexpr()
        } else {
            self.parse_or()
        }
    }

    fn parse_condexpr(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut expr1 = self.parse_or()?;

        while self.stream_mut().skip_if("name:if") {
            let test = self.parse_or()?;
            let expr2 = if self.stream_mut().skip_if("name:else") {
                Some(self.nested(Self::parse_condexpr)?.boxed())
            } else {
                None
            };
            expr1 = Node::new(
                lineno,
                NodeKind::CondExpr {
                    test: test.boxed(),
                    expr1: expr1.boxed(),
                    expr2,
                },
            );
            lineno = self.stream().current().lineno;
        }
        Ok(expr1)
    }

    fn parse_or(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut left = self.parse_and()?;
        while self.stream_mut().skip_if("name:or") {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right, lineno);
            lineno = self.stream().current().lineno;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut left = self.parse_not()?;
        while self.stream_mut().skip_if("name:and") {
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right, lineno);
            lineno = self.stream().current().lineno;
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> SyntaxResult<Node> {
        if !self.stream().current().test("name:not") {
            return self.parse_compare();
        }
        let lineno = self.stream_mut().next_token().lineno;
        let node = self.nested(Self::parse_not)?;
        Ok(Node::new(
            lineno,
            NodeKind::UnaryExpr {
                op: UnaryOp::Not,
                node: node.boxed(),
            },
        ))
    }

    fn parse_compare(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream().current().lineno;
        let expr = self.parse_math1()?;
        let mut ops = Vec::new();

        loop {
            let kind = self.stream().current().kind;
            let op = if let Some(op) = compare_op(kind) {
                self.stream_mut().next_token();
                op
            } else if self.stream_mut().skip_if("name:in") {
                CompareOp::In
            } else if self.stream().current().test("name:not")
                && self.stream_mut().look().test("name:in")
            {
                self.stream_mut().skip(2);
                CompareOp::NotIn
            } else {
                break;
            };
            ops.push(Operand {
                op,
                expr: self.parse_math1()?,
            });
        }

        if ops.is_empty() {
            return Ok(expr);
        }
        Ok(Node::new(
            lineno,
            NodeKind::Compare {
                expr: expr.boxed(),
                ops,
            },
        ))
    }

    fn parse_math1(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.stream().current().kind {
                TokenKind::Add => BinaryOp::Add,
                TokenKind::Sub => BinaryOp::Sub,
                _ => break,
            };
            self.stream_mut().next_token();
            let right = self.parse_concat()?;
            left = binary(op, left, right, lineno);
            lineno = self.stream().current().lineno;
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream().current().lineno;
        let mut nodes = vec![self.parse_math2()?];
        while self.stream_mut().skip_if("tilde") {
            nodes.push(self.parse_math2()?);
        }
        if nodes.len() == 1 {
            return Ok(nodes.swap_remove(0));
        }
        Ok(Node::new(lineno, NodeKind::Concat { nodes }))
    }

    fn parse_math2(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut left = self.parse_pow()?;
        loop {
            let op = match self.stream().current().kind {
                TokenKind::Mul => BinaryOp::Mul,
                TokenKind::Div => BinaryOp::Div,
                TokenKind::Floordiv => BinaryOp::FloorDiv,
                TokenKind::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.stream_mut().next_token();
            let right = self.parse_pow()?;
            left = binary(op, left, right, lineno);
            lineno = self.stream().current().lineno;
        }
        Ok(left)
    }

    /// `**` chains left to right: `2 ** 3 ** 2` is `(2 ** 3) ** 2`
    fn parse_pow(&mut self) -> SyntaxResult<Node> {
        let mut lineno = self.stream().current().lineno;
        let mut left = self.parse_unary(true)?;
        while self.stream_mut().skip_if("pow") {
            let right = self.parse_unary(true)?;
            left = binary(BinaryOp::Pow, left, right, lineno);
            lineno = self.stream().current().lineno;
        }
        Ok(left)
    }

    pub fn parse_unary(&mut self, with_filter: bool) -> SyntaxResult<Node> {
        let token = self.stream().current().clone();
        let sign = match token.kind {
            TokenKind::Sub => Some(UnaryOp::Neg),
            TokenKind::Add => Some(UnaryOp::Pos),
            _ => None,
        };

        let mut node = match sign {
            Some(op) => {
                self.stream_mut().next_token();
                let operand = self.nested(|parser| parser.parse_unary(false))?;
                Node::new(
                    token.lineno,
                    NodeKind::UnaryExpr {
                        op,
                        node: operand.boxed(),
                    },
                )
            }
            None => self.parse_primary()?,
        };

        node = self.parse_postfix(node)?;
        if with_filter {
            node = self.parse_filter_expr(node)?;
        }
        Ok(node)
    }

    pub fn parse_primary(&mut self) -> SyntaxResult<Node> {
        let token = self.stream().current().clone();
        match token.kind {
            TokenKind::Name => {
                let node = match token.value_str() {
                    "True" | "true" => Node::constant(Literal::Bool(true), token.lineno),
                    "False" | "false" => Node::constant(Literal::Bool(false), token.lineno),
                    "None" | "none" => Node::constant(Literal::None, token.lineno),
                    name => Node::name(name, Context::Load, token.lineno),
                };
                self.stream_mut().next_token();
                Ok(node)
            }
            TokenKind::String => {
                self.stream_mut().next_token();
                // adjacent string literals are joined
                let mut buffer = token.value_str().to_string();
                while self.stream().current().kind == TokenKind::String {
                    buffer.push_str(self.stream().current().value_str());
                    self.stream_mut().next_token();
                }
                Ok(Node::constant(Literal::Str(buffer), token.lineno))
            }
            TokenKind::Integer | TokenKind::Float => {
                self.stream_mut().next_token();
                Ok(Node::constant(literal(&token), token.lineno))
            }
            TokenKind::Lparen => {
                self.stream_mut().next_token();
                let node = self.nested(|parser| {
                    parser.parse_tuple(TupleOptions {
                        explicit_parentheses: true,
                        ..Default::default()
                    })
                })?;
                self.stream_mut().expect("rparen")?;
                Ok(node)
            }
            TokenKind::Lbracket => self.nested(Self::parse_list),
            TokenKind::Lbrace => self.nested(Self::parse_dict),
            _ => Err(self.fail(
                format!("unexpected '{}'", describe_token(&token)),
                token.lineno,
            )),
        }
    }

    fn parse_list(&mut self) -> SyntaxResult<Node> {
        let token = self.stream_mut().expect("lbracket")?;
        let mut items = Vec::new();
        while self.stream().current().kind != TokenKind::Rbracket {
            if !items.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            if self.stream().current().kind == TokenKind::Rbracket {
                break;
            }
            items.push(self.parse_expression(true)?);
        }
        self.stream_mut().expect("rbracket")?;
        Ok(Node::new(token.lineno, NodeKind::List { items }))
    }

    fn parse_dict(&mut self) -> SyntaxResult<Node> {
        let token = self.stream_mut().expect("lbrace")?;
        let mut items = Vec::new();
        while self.stream().current().kind != TokenKind::Rbrace {
            if !items.is_empty() {
                self.stream_mut().expect("comma")?;
            }
            if self.stream().current().kind == TokenKind::Rbrace {
                break;
            }
            let key = self.parse_expression(true)?;
            self.stream_mut().expect("colon")?;
            let value = self.parse_expression(true)?;
            items.push(Pair {
                lineno: key.lineno,
                key,
                value,
            });
        }
        self.stream_mut().expect("rbrace")?;
        Ok(Node::new(token.lineno, NodeKind::Dict { items }))
    }

    pub fn parse_postfix(&mut self, mut node: Node) -> SyntaxResult<Node> {
        loop {
            node = match self.stream().current().kind {
                TokenKind::Dot | TokenKind::Lbracket => self.parse_subscript(node)?,
                TokenKind::Lparen => self.parse_call(node)?,
                _ => return Ok(node),
            };
        }
    }

    pub fn parse_filter_expr(&mut self, mut node: Node) -> SyntaxResult<Node> {
        loop {
            let current = self.stream().current();
            let (kind, is_test) = (current.kind, current.is_name("is"));
            node = match kind {
                TokenKind::Pipe => {
                    self.stream_mut().next_token();
                    self.parse_filter_step(Some(node))?
                }
                TokenKind::Name if is_test => self.parse_test(node)?,
                TokenKind::Lparen => self.parse_call(node)?,
                _ => return Ok(node),
            };
        }
    }

    fn parse_subscript(&mut self, node: Node) -> SyntaxResult<Node> {
        let token = self.stream_mut().next_token();
        match token.kind {
            TokenKind::Dot => {
                let attr = self.stream_mut().next_token();
                match attr.kind {
                    TokenKind::Name => Ok(Node::new(
                        attr.lineno,
                        NodeKind::Getattr {
                            node: node.boxed(),
                            attr: attr.value_str().to_string(),
                            ctx: Context::Load,
                        },
                    )),
                    TokenKind::Integer => Ok(Node::new(
                        attr.lineno,
                        NodeKind::Getitem {
                            node: node.boxed(),
                            arg: Node::constant(literal(&attr), attr.lineno).boxed(),
                            ctx: Context::Load,
                        },
                    )),
                    other => Err(self.fail(
                        format!("expected name or number, got {}", other.as_str()),
                        attr.lineno,
                    )),
                }
            }
            TokenKind::Lbracket => {
                let mut args = Vec::new();
                while self.stream().current().kind != TokenKind::Rbracket {
                    if !args.is_empty() {
                        self.stream_mut().expect("comma")?;
                    }
                    args.push(self.parse_subscribed()?);
                }
                self.stream_mut().expect("rbracket")?;

                let arg = if args.len() == 1 {
                    args.swap_remove(0)
                } else {
                    Node::new(
                        token.lineno,
                        NodeKind::Tuple {
                            items: args,
                            ctx: Context::Load,
                        },
                    )
                };
                Ok(Node::new(
                    token.lineno,
                    NodeKind::Getitem {
                        node: node.boxed(),
                        arg: arg.boxed(),
                        ctx: Context::Load,
                    },
                ))
            }
            _ => Err(self.fail("expected subscript expression", token.lineno)),
        }
    }

    /// One subscript item: a plain expression or a `start:stop:step` slice
    fn parse_subscribed(&mut self) -> SyntaxResult<Node> {
        let lineno = self.stream().current().lineno;

        let start = if self.stream_mut().skip_if("colon") {
            None
        } else {
            let node = self.parse_expression(true)?;
            if !self.stream_mut().skip_if("colon") {
                return Ok(node);
            }
            Some(node.boxed())
        };

        let stop = match self.stream().current().kind {
            TokenKind::Colon | TokenKind::Rbracket | TokenKind::Comma => None,
            _ => Some(self.parse_expression(true)?.boxed()),
        };

        let step = if self.stream_mut().skip_if("colon") {
            match self.stream().current().kind {
                TokenKind::Rbracket | TokenKind::Comma => None,
                _ => Some(self.parse_expression(true)?.boxed()),
            }
        } else {
            None
        };

        Ok(Node::new(lineno, NodeKind::Slice { start, stop, step }))
    }

    fn parse_call(&mut self, node: Node) -> SyntaxResult<Node> {
        let lineno = self.stream().current().lineno;
        let call = self.parse_call_args()?;
        Ok(Node::new(
            lineno,
            NodeKind::Call {
                node: node.boxed(),
                call,
            },
        ))
    }

    /// Parenthesised argument list. Positional arguments come first, then
    /// keywords; `*args` and `**kwargs` may each appear once.
    pub fn parse_call_args(&mut self) -> SyntaxResult<CallArgs> {
        let lineno = self.stream_mut().expect("lparen")?.lineno;

        let mut call = CallArgs::default();
        let mut require_comma = false;

        while self.stream().current().kind != TokenKind::Rparen {
            if require_comma {
                self.stream_mut().expect("comma")?;
                // trailing comma
                if self.stream().current().kind == TokenKind::Rparen {
                    break;
                }
            }

            let kind = self.stream().current().kind;
            match kind {
                TokenKind::Mul => {
                    if call.dyn_args.is_some() || call.dyn_kwargs.is_some() {
                        return Err(self.invalid_call(lineno));
                    }
                    self.stream_mut().next_token();
                    call.dyn_args = Some(self.parse_expression(true)?.boxed());
                }
                TokenKind::Pow => {
                    if call.dyn_kwargs.is_some() {
                        return Err(self.invalid_call(lineno));
                    }
                    self.stream_mut().next_token();
                    call.dyn_kwargs = Some(self.parse_expression(true)?.boxed());
                }
                TokenKind::Name if self.stream_mut().look().kind == TokenKind::Assign => {
                    if call.dyn_kwargs.is_some() {
                        return Err(self.invalid_call(lineno));
                    }
                    let key = self.stream().current().value_str().to_string();
                    self.stream_mut().skip(2);
                    let value = self.parse_expression(true)?;
                    call.kwargs.push(Keyword {
                        lineno: value.lineno,
                        key,
                        value,
                    });
                }
                _ => {
                    if call.dyn_args.is_some()
                        || call.dyn_kwargs.is_some()
                        || !call.kwargs.is_empty()
                    {
                        return Err(self.invalid_call(lineno));
                    }
                    call.args.push(self.parse_expression(true)?);
                }
            }
            require_comma = true;
        }

        self.stream_mut().expect("rparen")?;
        Ok(call)
    }

    /// Filter chain after `|`; with `start_inline` the first filter name is
    /// expected without a leading pipe
    pub fn parse_filter(
        &mut self,
        mut node: Option<Node>,
        mut start_inline: bool,
    ) -> SyntaxResult<Option<Node>> {
        while start_inline || self.stream().current().kind == TokenKind::Pipe {
            if !start_inline {
                self.stream_mut().next_token();
            }
            node = Some(self.parse_filter_step(node)?);
            start_inline = false;
        }
        Ok(node)
    }

    fn invalid_call(&self, lineno: usize) -> SyntaxError {
        self.fail("invalid syntax for function call expression", lineno)
    }

    /// A single `name(args)` filter applied to `node`
    pub(crate) fn parse_filter_step(&mut self, node: Option<Node>) -> SyntaxResult<Node> {
        let token = self.stream_mut().expect("name")?;
        let name = self.parse_dotted_name(token.value_str())?;
        let call = if self.stream().current().kind == TokenKind::Lparen {
            self.parse_call_args()?
        } else {
            CallArgs::default()
        };
        Ok(Node::new(
            token.lineno,
            NodeKind::Filter {
                node: node.map(Node::boxed),
                name,
                call,
            },
        ))
    }

    fn parse_dotted_name(&mut self, first: &str) -> SyntaxResult<String> {
        let mut name = first.to_string();
        while self.stream_mut().skip_if("dot") {
            name.push('.');
            name.push_str(self.stream_mut().expect("name")?.value_str());
        }
        Ok(name)
    }

    fn parse_test(&mut self, node: Node) -> SyntaxResult<Node> {
        let token = self.stream_mut().next_token();
        let negated = self.stream_mut().skip_if("name:not");
        let name_token = self.stream_mut().expect("name")?;
        let name = self.parse_dotted_name(name_token.value_str())?;

        let current = self.stream().current().clone();
        let takes_bare_argument = matches!(
            current.kind,
            TokenKind::Name
                | TokenKind::String
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::Lparen
                | TokenKind::Lbracket
                | TokenKind::Lbrace
        ) && !current.test_any(&["name:else", "name:or", "name:and"]);

        let call = if current.kind == TokenKind::Lparen {
            self.parse_call_args()?
        } else if takes_bare_argument {
            if current.test("name:is") {
                return Err(self.fail("You cannot chain multiple tests with is", current.lineno));
            }
            let arg = self.parse_primary()?;
            let arg = self.parse_postfix(arg)?;
            CallArgs {
                args: vec![arg],
                ..Default::default()
            }
        } else {
            CallArgs::default()
        };

        let test = Node::new(
            token.lineno,
            NodeKind::Test {
                node: node.boxed(),
                name,
                call,
            },
        );
        if !negated {
            return Ok(test);
        }
        Ok(Node::new(
            token.lineno,
            NodeKind::UnaryExpr {
                op: UnaryOp::Not,
                node: test.boxed(),
            },
        ))
    }

    /// Target of `for`, `set`, `with` and friends, stored in `Store` context
    pub fn parse_assign_target(&mut self, options: AssignTargetOptions<'_>) -> SyntaxResult<Node> {
        let target = if options.with_namespace
            && self.stream_mut().look().kind == TokenKind::Dot
        {
            let token = self.stream_mut().expect("name")?;
            self.stream_mut().next_token();
            let attr = self.stream_mut().expect("name")?;
            Node::new(
                token.lineno,
                NodeKind::NSRef {
                    name: token.value_str().to_string(),
                    attr: attr.value_str().to_string(),
                },
            )
        } else if options.name_only {
            let (name, lineno) = self.parse_assign_name()?;
            Node::name(name, Context::Store, lineno)
        } else {
            let mut target = if options.with_tuple {
                self.parse_tuple(TupleOptions {
                    simplified: true,
                    extra_end_rules: options.extra_end_rules,
                    ..Default::default()
                })?
            } else {
                self.parse_primary()?
            };
            target.set_ctx(Context::Store);
            target
        };

        if !target.can_assign() {
            return Err(self.fail_with(
                codes::syntax::INVALID_ASSIGNMENT,
                format!("can't assign to '{}'", target.type_name().to_lowercase()),
                target.lineno,
            ));
        }
        Ok(target)
    }

    /// A bare assignable name, returned with its line
    pub(crate) fn parse_assign_name(&mut self) -> SyntaxResult<(String, usize)> {
        let token = self.stream_mut().expect("name")?;
        if is_reserved_keyword(token.value_str()) {
            return Err(self.fail_with(
                codes::syntax::INVALID_ASSIGNMENT,
                "can't assign to 'name'",
                token.lineno,
            ));
        }
        Ok((token.value_str().to_string(), token.lineno))
    }
}
