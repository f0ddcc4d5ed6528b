//! Expression tree walking utilities.
//!
//! Closure based, no visitor trait. Two orders are offered:
//!
//! - [`walk_expr`] visits a node before its children
//! - [`walk_expr_post`] visits children first, matching evaluation order
//!
//! # Examples
//!
//! ```rust,ignore
//! use wgsl_ast::walk::walk_expr;
//!
//! let mut calls = 0;
//! walk_expr(&expr, &mut |node| {
//!     if matches!(node.kind, ExprKind::Call { .. }) {
//!         calls += 1;
//!     }
//! });
//! ```

use crate::expr::{Expr, ExprKind};
use crate::types::{TemplateArg, TypeExpr};

/// Recursively walk an expression tree in pre-order.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);
    for child in children(expr) {
        walk_expr(child, visitor);
    }
}

/// Recursively walk an expression tree in post-order (left-to-right).
pub fn walk_expr_post<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for child in children(expr) {
        walk_expr_post(child, visitor);
    }
    visitor(expr);
}

/// Direct sub-expressions in evaluation order.
///
/// Template arguments are not included; they are compile-time only.
pub fn children(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) => Vec::new(),
        ExprKind::Call { args, .. } => args.iter().collect(),
        ExprKind::Member { base, .. } => vec![base],
        ExprKind::Index { base, index } => vec![base, index],
        ExprKind::Unary { operand, .. } => vec![operand],
        ExprKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
    }
}

/// Visit every expression nested in a type's template arguments
/// (array counts such as `array<f32, N * 2>`).
pub fn walk_type_exprs<V>(ty: &TypeExpr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for arg in &ty.args {
        match arg {
            TemplateArg::Type(inner) => walk_type_exprs(inner, visitor),
            TemplateArg::Expr(expr) => walk_expr(expr, visitor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ExprId, Literal};
    use crate::ops::BinaryOp;
    use crate::span::Span;

    fn lit(id: u32, v: i64) -> Expr {
        Expr {
            id: ExprId(id),
            kind: ExprKind::Literal(Literal::AbstractInt(v)),
            span: Span::default(),
        }
    }

    fn add(id: u32, lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            id: ExprId(id),
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span: Span::default(),
        }
    }

    #[test]
    fn test_pre_and_post_order() {
        let tree = add(3, lit(1, 1), add(4, lit(2, 2), lit(5, 3)));

        let mut pre = Vec::new();
        walk_expr(&tree, &mut |e| pre.push(e.id.0));
        assert_eq!(pre, vec![3, 1, 4, 2, 5]);

        let mut post = Vec::new();
        walk_expr_post(&tree, &mut |e| post.push(e.id.0));
        assert_eq!(post, vec![1, 2, 5, 4, 3]);
    }
}
