//! Integer constant folding for array counts and workgroup sizes.

use crate::error::{ReflectError, Result};
use wgsl_ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};

/// Fold an integer constant expression.
///
/// Identifiers are resolved through `lookup`, which is expected to know the
/// module's `const` declarations and, where relevant, override values.
pub fn eval_const_int(expr: &Expr, lookup: &dyn Fn(&str) -> Option<i64>) -> Result<i64> {
    let not_constant = |reason: String| ReflectError::NotConstant {
        reason,
        line: expr.line(),
    };

    match &expr.kind {
        ExprKind::Literal(Literal::AbstractInt(v)) => Ok(*v),
        ExprKind::Literal(Literal::I32(v)) => Ok(*v as i64),
        ExprKind::Literal(Literal::U32(v)) => Ok(*v as i64),
        ExprKind::Literal(other) => Err(not_constant(format!("{other:?} is not an integer"))),
        ExprKind::Ident(name) => {
            lookup(name).ok_or_else(|| not_constant(format!("'{name}' has no constant value")))
        }
        ExprKind::Call { callee, args, .. }
            if matches!(callee.as_str(), "i32" | "u32") && args.len() == 1 =>
        {
            eval_const_int(&args[0], lookup)
        }
        ExprKind::Unary { op, operand } => {
            let v = eval_const_int(operand, lookup)?;
            match op {
                UnaryOp::Neg => Ok(v.wrapping_neg()),
                UnaryOp::BitNot => Ok(!v),
                other => Err(not_constant(format!("operator '{other}'"))),
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let a = eval_const_int(lhs, lookup)?;
            let b = eval_const_int(rhs, lookup)?;
            Ok(match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b != 0 => a.wrapping_div(b),
                BinaryOp::Rem if b != 0 => a.wrapping_rem(b),
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                BinaryOp::Shl => a.wrapping_shl(b as u32),
                BinaryOp::Shr => a.wrapping_shr(b as u32),
                other => return Err(not_constant(format!("operator '{other}'"))),
            })
        }
        other => Err(not_constant(format!("unsupported expression {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(source: &str) -> Result<i64> {
        let expr = wgsl_parser::parse_expr(source).unwrap();
        eval_const_int(&expr, &|name| match name {
            "N" => Some(8),
            _ => None,
        })
    }

    #[test]
    fn test_fold_arithmetic() {
        assert_eq!(fold("N * 2 + 1").unwrap(), 17);
        assert_eq!(fold("(N - 2) / 3").unwrap(), 2);
        assert_eq!(fold("u32(4) << 2u").unwrap(), 16);
    }

    #[test]
    fn test_unknown_ident_is_error() {
        assert!(matches!(fold("M + 1"), Err(ReflectError::NotConstant { .. })));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        assert!(fold("4 / 0").is_err());
    }
}
