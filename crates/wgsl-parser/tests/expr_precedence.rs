//! Expression precedence and associativity tests.
//!
//! These tests verify the Pratt parser handles WGSL operator precedence,
//! left associativity, and the `<` template/comparison ambiguity.

use wgsl_ast::{BinaryOp, Expr, ExprKind, Literal, TemplateArg, UnaryOp};
use wgsl_parser::parse_expr;

/// Helper to parse an expression from source.
fn parse(source: &str) -> Expr {
    parse_expr(source).expect("Parse failed")
}

/// Helper to get operator and operands of a binary expression.
fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
    match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => (*op, lhs.as_ref(), rhs.as_ref()),
        other => panic!("expected binary expression, got {other:?}"),
    }
}

// =============================================================================
// Binary precedence
// =============================================================================

#[test]
fn test_mul_binds_tighter_than_add() {
    let expr = parse("a + b * c");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Add);
    assert_eq!(left.as_ident(), Some("a"));
    assert_eq!(binary(right).0, BinaryOp::Mul);
}

#[test]
fn test_sub_left_associative() {
    let expr = parse("a - b - c");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Sub);
    assert_eq!(binary(left).0, BinaryOp::Sub);
    assert_eq!(right.as_ident(), Some("c"));
}

#[test]
fn test_logical_or_lowest() {
    let expr = parse("a && b || c == d");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::LogicalOr);
    assert_eq!(binary(left).0, BinaryOp::LogicalAnd);
    assert_eq!(binary(right).0, BinaryOp::Eq);
}

#[test]
fn test_shift_vs_add() {
    let expr = parse("x << y + 1");
    let (op, _, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Shl);
    assert_eq!(binary(right).0, BinaryOp::Add);
}

#[test]
fn test_bitwise_and_vs_comparison() {
    let expr = parse("a == b & c");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::BitAnd);
    assert_eq!(binary(left).0, BinaryOp::Eq);
}

// =============================================================================
// Unary and postfix
// =============================================================================

#[test]
fn test_unary_binds_tighter_than_binary() {
    let expr = parse("-a * b");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(
        left.kind,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
}

#[test]
fn test_deref_member_chain() {
    let expr = parse("(*p).values[2].x");
    match &expr.kind {
        ExprKind::Member { base, member } => {
            assert_eq!(member, "x");
            assert!(matches!(base.kind, ExprKind::Index { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_parenthesized_grouping() {
    let expr = parse("(a + b) * c");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Mul);
    assert_eq!(binary(left).0, BinaryOp::Add);
}

// =============================================================================
// Literals and templates
// =============================================================================

#[test]
fn test_literal_suffixes() {
    assert!(matches!(parse("3").kind, ExprKind::Literal(Literal::AbstractInt(3))));
    assert!(matches!(parse("3u").kind, ExprKind::Literal(Literal::U32(3))));
    assert!(matches!(parse("3i").kind, ExprKind::Literal(Literal::I32(3))));
    assert!(matches!(parse("1.5f").kind, ExprKind::Literal(Literal::F32(v)) if v == 1.5));
}

#[test]
fn test_template_call() {
    let expr = parse("vec3<f32>(1.0, 2.0, 3.0)");
    match &expr.kind {
        ExprKind::Call {
            callee,
            template,
            args,
        } => {
            assert_eq!(callee, "vec3");
            assert_eq!(template.len(), 1);
            assert_eq!(template[0].as_name(), Some("f32"));
            assert_eq!(args.len(), 3);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_nested_template_splits_shift() {
    let expr = parse("array<vec2<f32>>(vec2<f32>(1.0, 2.0))");
    match &expr.kind {
        ExprKind::Call { template, .. } => match &template[0] {
            TemplateArg::Type(ty) => {
                assert_eq!(ty.name, "vec2");
                assert_eq!(ty.args.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_array_count_expression() {
    let expr = parse("array<i32, N * 2>()");
    match &expr.kind {
        ExprKind::Call { template, .. } => {
            assert!(matches!(template[1], TemplateArg::Expr(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_less_than_on_plain_ident() {
    let expr = parse("a < b");
    let (op, _, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Lt);
}

#[test]
fn test_expr_ids_are_unique() {
    let expr = parse("f(a, b) + g(c)");
    let mut ids = Vec::new();
    wgsl_ast::walk::walk_expr(&expr, &mut |e| ids.push(e.id));
    let count = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), count);
}
