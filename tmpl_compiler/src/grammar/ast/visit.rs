//! Generic traversal over the node tree
//!
//! Every operation here is written once against [`Node::children`] and
//! [`Node::children_mut`], so adding a variant only means extending those
//! two matches.

use super::nodes::{CallArgs, Context, Node, NodeKind};
use std::collections::VecDeque;

fn call_args<'a>(call: &'a CallArgs, out: &mut Vec<&'a Node>) {
    out.extend(call.args.iter());
    out.extend(call.kwargs.iter().map(|keyword| &keyword.value));
    out.extend(call.dyn_args.as_deref());
    out.extend(call.dyn_kwargs.as_deref());
}

fn call_args_mut<'a>(call: &'a mut CallArgs, out: &mut Vec<&'a mut Node>) {
    out.extend(call.args.iter_mut());
    out.extend(call.kwargs.iter_mut().map(|keyword| &mut keyword.value));
    out.extend(call.dyn_args.as_deref_mut());
    out.extend(call.dyn_kwargs.as_deref_mut());
}

impl Node {
    /// Direct children in source order
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::Template { body }
            | NodeKind::Scope { body }
            | NodeKind::Output { nodes: body }
            | NodeKind::Concat { nodes: body }
            | NodeKind::List { items: body }
            | NodeKind::Tuple { items: body, .. } => out.extend(body.iter()),
            NodeKind::Extends { template }
            | NodeKind::Include { template, .. }
            | NodeKind::Import { template, .. }
            | NodeKind::FromImport { template, .. } => out.push(template),
            NodeKind::For {
                target,
                iter,
                body,
                else_,
                test,
                ..
            } => {
                out.push(target);
                out.push(iter);
                out.extend(body.iter());
                out.extend(else_.iter());
                out.extend(test.as_deref());
            }
            NodeKind::If {
                test,
                body,
                elif,
                else_,
            } => {
                out.push(test);
                out.extend(body.iter());
                out.extend(elif.iter());
                out.extend(else_.iter());
            }
            NodeKind::Macro {
                args,
                defaults,
                body,
                ..
            } => {
                out.extend(args.iter());
                out.extend(defaults.iter());
                out.extend(body.iter());
            }
            NodeKind::CallBlock {
                call,
                args,
                defaults,
                body,
            } => {
                out.push(call);
                out.extend(args.iter());
                out.extend(defaults.iter());
                out.extend(body.iter());
            }
            NodeKind::FilterBlock { body, filter } => {
                out.extend(body.iter());
                out.push(filter);
            }
            NodeKind::With {
                targets,
                values,
                body,
            } => {
                out.extend(targets.iter());
                out.extend(values.iter());
                out.extend(body.iter());
            }
            NodeKind::Block { body, .. } => out.extend(body.iter()),
            NodeKind::ExprStmt { node } | NodeKind::UnaryExpr { node, .. } => out.push(node),
            NodeKind::Assign { target, node } => {
                out.push(target);
                out.push(node);
            }
            NodeKind::AssignBlock {
                target,
                filter,
                body,
            } => {
                out.push(target);
                out.extend(filter.as_deref());
                out.extend(body.iter());
            }
            NodeKind::EvalContextModifier { options } => {
                out.extend(options.iter().map(|keyword| &keyword.value));
            }
            NodeKind::ScopedEvalContextModifier { options, body } => {
                out.extend(options.iter().map(|keyword| &keyword.value));
                out.extend(body.iter());
            }
            NodeKind::Dict { items } => {
                for pair in items {
                    out.push(&pair.key);
                    out.push(&pair.value);
                }
            }
            NodeKind::CondExpr { test, expr1, expr2 } => {
                out.push(test);
                out.push(expr1);
                out.extend(expr2.as_deref());
            }
            NodeKind::BinExpr { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Compare { expr, ops } => {
                out.push(expr);
                out.extend(ops.iter().map(|operand| &operand.expr));
            }
            NodeKind::Getattr { node, .. } => out.push(node),
            NodeKind::Getitem { node, arg, .. } => {
                out.push(node);
                out.push(arg);
            }
            NodeKind::Slice { start, stop, step } => {
                out.extend(start.as_deref());
                out.extend(stop.as_deref());
                out.extend(step.as_deref());
            }
            NodeKind::Call { node, call } | NodeKind::Test { node, call, .. } => {
                out.push(node);
                call_args(call, &mut out);
            }
            NodeKind::Filter { node, call, .. } => {
                out.extend(node.as_deref());
                call_args(call, &mut out);
            }
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Name { .. }
            | NodeKind::NSRef { .. }
            | NodeKind::Const { .. }
            | NodeKind::TemplateData { .. } => {}
        }
        out
    }

    /// Mutable counterpart of [`Node::children`], same order
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        let mut out: Vec<&mut Node> = Vec::new();
        match &mut self.kind {
            NodeKind::Template { body }
            | NodeKind::Scope { body }
            | NodeKind::Output { nodes: body }
            | NodeKind::Concat { nodes: body }
            | NodeKind::List { items: body }
            | NodeKind::Tuple { items: body, .. } => out.extend(body.iter_mut()),
            NodeKind::Extends { template }
            | NodeKind::Include { template, .. }
            | NodeKind::Import { template, .. }
            | NodeKind::FromImport { template, .. } => out.push(template),
            NodeKind::For {
                target,
                iter,
                body,
                else_,
                test,
                ..
            } => {
                out.push(target);
                out.push(iter);
                out.extend(body.iter_mut());
                out.extend(else_.iter_mut());
                out.extend(test.as_deref_mut());
            }
            NodeKind::If {
                test,
                body,
                elif,
                else_,
            } => {
                out.push(test);
                out.extend(body.iter_mut());
                out.extend(elif.iter_mut());
                out.extend(else_.iter_mut());
            }
            NodeKind::Macro {
                args,
                defaults,
                body,
                ..
            } => {
                out.extend(args.iter_mut());
                out.extend(defaults.iter_mut());
                out.extend(body.iter_mut());
            }
            NodeKind::CallBlock {
                call,
                args,
                defaults,
                body,
            } => {
                out.push(call);
                out.extend(args.iter_mut());
                out.extend(defaults.iter_mut());
                out.extend(body.iter_mut());
            }
            NodeKind::FilterBlock { body, filter } => {
                out.extend(body.iter_mut());
                out.push(filter);
            }
            NodeKind::With {
                targets,
                values,
                body,
            } => {
                out.extend(targets.iter_mut());
                out.extend(values.iter_mut());
                out.extend(body.iter_mut());
            }
            NodeKind::Block { body, .. } => out.extend(body.iter_mut()),
            NodeKind::ExprStmt { node } | NodeKind::UnaryExpr { node, .. } => out.push(node),
            NodeKind::Assign { target, node } => {
                out.push(target);
                out.push(node);
            }
            NodeKind::AssignBlock {
                target,
                filter,
                body,
            } => {
                out.push(target);
                out.extend(filter.as_deref_mut());
                out.extend(body.iter_mut());
            }
            NodeKind::EvalContextModifier { options } => {
                out.extend(options.iter_mut().map(|keyword| &mut keyword.value));
            }
            NodeKind::ScopedEvalContextModifier { options, body } => {
                out.extend(options.iter_mut().map(|keyword| &mut keyword.value));
                out.extend(body.iter_mut());
            }
            NodeKind::Dict { items } => {
                for pair in items {
                    out.push(&mut pair.key);
                    out.push(&mut pair.value);
                }
            }
            NodeKind::CondExpr { test, expr1, expr2 } => {
                out.push(test);
                out.push(expr1);
                out.extend(expr2.as_deref_mut());
            }
            NodeKind::BinExpr { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Compare { expr, ops } => {
                out.push(expr);
                out.extend(ops.iter_mut().map(|operand| &mut operand.expr));
            }
            NodeKind::Getattr { node, .. } => out.push(node),
            NodeKind::Getitem { node, arg, .. } => {
                out.push(node);
                out.push(arg);
            }
            NodeKind::Slice { start, stop, step } => {
                out.extend(start.as_deref_mut());
                out.extend(stop.as_deref_mut());
                out.extend(step.as_deref_mut());
            }
            NodeKind::Call { node, call } | NodeKind::Test { node, call, .. } => {
                out.push(node);
                call_args_mut(call, &mut out);
            }
            NodeKind::Filter { node, call, .. } => {
                out.extend(node.as_deref_mut());
                call_args_mut(call, &mut out);
            }
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Name { .. }
            | NodeKind::NSRef { .. }
            | NodeKind::Const { .. }
            | NodeKind::TemplateData { .. } => {}
        }
        out
    }

    /// Set the context of every name-like node in this subtree
    pub fn set_ctx(&mut self, new_ctx: Context) -> &mut Self {
        {
            let mut todo: VecDeque<&mut Node> = VecDeque::new();
            todo.push_back(&mut *self);
            while let Some(node) = todo.pop_front() {
                match &mut node.kind {
                    NodeKind::Name { ctx, .. }
                    | NodeKind::Tuple { ctx, .. }
                    | NodeKind::Getattr { ctx, .. }
                    | NodeKind::Getitem { ctx, .. } => *ctx = new_ctx,
                    _ => {}
                }
                todo.extend(node.children_mut());
            }
        }
        self
    }

    /// Visit the subtree in pre-order, this node first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children().into_iter().rev());
        }
    }

    /// Every node below and including this one that satisfies `predicate`
    pub fn find_all(&self, mut predicate: impl FnMut(&Node) -> bool) -> Vec<&Node> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if predicate(node) {
                found.push(node);
            }
        });
        found
    }
}
