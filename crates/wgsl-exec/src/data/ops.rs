//! Operator semantics on runtime values.
//!
//! Integer arithmetic wraps. Division by zero yields the dividend and the
//! remainder by zero yields zero, so no operator traps. Shift counts use
//! their low five bits. Abstract operands adopt the type of the concrete
//! side; `f16` arithmetic is carried out in `f32` and rounded back.

use super::{Data, Scalar, ScalarKind};
use crate::error::{ExecError, Result};
use std::cmp::Ordering;
use wgsl_ast::{BinaryOp, UnaryOp};

fn op_error(op: impl std::fmt::Display, lhs: &str, rhs: &str) -> ExecError {
    ExecError::type_error(format!("operator '{op}' cannot be applied to {lhs} and {rhs}"))
}

/// Apply a binary operator to two scalars.
pub fn scalar_binary(op: BinaryOp, a: Scalar, b: Scalar) -> Result<Scalar> {
    if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
        return shift(op, a, b);
    }
    let kind = a
        .kind()
        .unify(b.kind())
        .ok_or_else(|| op_error(op, a.kind().name(), b.kind().name()))?;
    let (a, b) = (a.cast(kind), b.cast(kind));

    if op.is_comparison() {
        return compare(op, a, b);
    }

    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => Ok(Scalar::Bool(match op {
            BinaryOp::LogicalAnd | BinaryOp::BitAnd => x && y,
            BinaryOp::LogicalOr | BinaryOp::BitOr => x || y,
            BinaryOp::BitXor => x ^ y,
            _ => return Err(op_error(op, "bool", "bool")),
        })),
        (Scalar::I32(x), Scalar::I32(y)) => Ok(Scalar::I32(int_op(op, x, y)?)),
        (Scalar::U32(x), Scalar::U32(y)) => Ok(Scalar::U32(int_op(op, x, y)?)),
        (Scalar::AbstractInt(x), Scalar::AbstractInt(y)) => Ok(Scalar::AbstractInt(int_op(op, x, y)?)),
        (Scalar::F32(x), Scalar::F32(y)) => Ok(Scalar::F32(float_op(op, x as f64, y as f64)? as f32)),
        (Scalar::F16(x), Scalar::F16(y)) => {
            let value = float_op(op, x as f64, y as f64)? as f32;
            Ok(Scalar::F16(super::f16::quantize(value)))
        }
        (Scalar::AbstractFloat(x), Scalar::AbstractFloat(y)) => {
            Ok(Scalar::AbstractFloat(float_op(op, x, y)?))
        }
        (a, b) => Err(op_error(op, a.kind().name(), b.kind().name())),
    }
}

/// Wrapping integer arithmetic shared by `i32`, `u32` and abstract ints.
trait WrappingInt: Copy + PartialEq + std::ops::BitAnd<Output = Self> + std::ops::BitOr<Output = Self> + std::ops::BitXor<Output = Self> {
    const ZERO: Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_div(self, rhs: Self) -> Self;
    fn wrapping_rem(self, rhs: Self) -> Self;
}

macro_rules! wrapping_int {
    ($($t:ty),*) => {$(
        impl WrappingInt for $t {
            const ZERO: Self = 0;
            fn wrapping_add(self, rhs: Self) -> Self { <$t>::wrapping_add(self, rhs) }
            fn wrapping_sub(self, rhs: Self) -> Self { <$t>::wrapping_sub(self, rhs) }
            fn wrapping_mul(self, rhs: Self) -> Self { <$t>::wrapping_mul(self, rhs) }
            fn wrapping_div(self, rhs: Self) -> Self { <$t>::wrapping_div(self, rhs) }
            fn wrapping_rem(self, rhs: Self) -> Self { <$t>::wrapping_rem(self, rhs) }
        }
    )*};
}

wrapping_int!(i32, u32, i64);

fn int_op<T: WrappingInt>(op: BinaryOp, x: T, y: T) -> Result<T> {
    Ok(match op {
        BinaryOp::Add => x.wrapping_add(y),
        BinaryOp::Sub => x.wrapping_sub(y),
        BinaryOp::Mul => x.wrapping_mul(y),
        BinaryOp::Div if y == T::ZERO => x,
        BinaryOp::Div => x.wrapping_div(y),
        BinaryOp::Rem if y == T::ZERO => T::ZERO,
        BinaryOp::Rem => x.wrapping_rem(y),
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitOr => x | y,
        BinaryOp::BitXor => x ^ y,
        _ => return Err(op_error(op, "integer", "integer")),
    })
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> Result<f64> {
    Ok(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        // Truncated remainder, `x - y * trunc(x / y)`.
        BinaryOp::Rem => x % y,
        _ => return Err(op_error(op, "float", "float")),
    })
}

fn compare(op: BinaryOp, a: Scalar, b: Scalar) -> Result<Scalar> {
    let ordering = match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
            Some(x.cmp(&y))
        }
        (Scalar::Bool(_), _) => return Err(op_error(op, "bool", "bool")),
        (x, y) if x.kind().is_float() => x.as_f64().partial_cmp(&y.as_f64()),
        (x, y) => Some(x.as_i64().cmp(&y.as_i64())),
    };
    // NaN compares unequal to everything.
    let result = match ordering {
        None => op == BinaryOp::Ne,
        Some(ord) => match op {
            BinaryOp::Eq => ord == Ordering::Equal,
            BinaryOp::Ne => ord != Ordering::Equal,
            BinaryOp::Lt => ord == Ordering::Less,
            BinaryOp::Le => ord != Ordering::Greater,
            BinaryOp::Gt => ord == Ordering::Greater,
            BinaryOp::Ge => ord != Ordering::Less,
            _ => return Err(ExecError::internal("non-comparison in compare")),
        },
    };
    Ok(Scalar::Bool(result))
}

fn shift(op: BinaryOp, a: Scalar, b: Scalar) -> Result<Scalar> {
    let count = match b {
        Scalar::I32(_) | Scalar::U32(_) | Scalar::AbstractInt(_) => b.as_i64() as u32,
        other => return Err(op_error(op, a.kind().name(), other.kind().name())),
    };
    let left = op == BinaryOp::Shl;
    Ok(match a {
        Scalar::I32(v) => {
            let n = count & 31;
            Scalar::I32(if left { v.wrapping_shl(n) } else { v >> n })
        }
        Scalar::U32(v) => {
            let n = count & 31;
            Scalar::U32(if left { v.wrapping_shl(n) } else { v >> n })
        }
        Scalar::AbstractInt(v) => {
            let n = count & 63;
            Scalar::AbstractInt(if left { v.wrapping_shl(n) } else { v >> n })
        }
        other => return Err(op_error(op, other.kind().name(), b.kind().name())),
    })
}

fn zip_lanes(op: BinaryOp, a: &[Scalar], b: &[Scalar]) -> Result<Vec<Scalar>> {
    a.iter().zip(b).map(|(x, y)| scalar_binary(op, *x, *y)).collect()
}

fn dot_lanes(a: &[Scalar], b: &[Scalar]) -> Result<Scalar> {
    let mut sum: Option<Scalar> = None;
    for (x, y) in a.iter().zip(b) {
        let product = scalar_binary(BinaryOp::Mul, *x, *y)?;
        sum = Some(match sum {
            Some(acc) => scalar_binary(BinaryOp::Add, acc, product)?,
            None => product,
        });
    }
    sum.ok_or_else(|| ExecError::type_error("empty operand"))
}

/// Apply a binary operator to scalars, vectors and matrices.
///
/// Scalar operands broadcast against vectors. Matrices support `+` and `-`
/// with a matrix of the same shape and `*` with a scalar, a vector or a
/// matrix.
pub fn binary(op: BinaryOp, lhs: &Data, rhs: &Data) -> Result<Data> {
    let mismatch = || op_error(op, &lhs.type_name(), &rhs.type_name());
    match (lhs, rhs) {
        (Data::Scalar(a), Data::Scalar(b)) => Ok(Data::Scalar(scalar_binary(op, *a, *b)?)),
        (Data::Vector(a), Data::Vector(b)) if a.len() == b.len() => {
            Ok(Data::Vector(zip_lanes(op, a, b)?))
        }
        (Data::Vector(a), Data::Scalar(b)) => Ok(Data::Vector(
            a.iter()
                .map(|x| scalar_binary(op, *x, *b))
                .collect::<Result<_>>()?,
        )),
        (Data::Scalar(a), Data::Vector(b)) => Ok(Data::Vector(
            b.iter()
                .map(|y| scalar_binary(op, *a, *y))
                .collect::<Result<_>>()?,
        )),
        (
            Data::Matrix {
                columns,
                rows,
                values: a,
            },
            Data::Matrix {
                columns: c2,
                rows: r2,
                values: b,
            },
        ) => match op {
            BinaryOp::Add | BinaryOp::Sub if columns == c2 && rows == r2 => Ok(Data::Matrix {
                columns: *columns,
                rows: *rows,
                values: zip_lanes(op, a, b)?,
            }),
            // (k x r) * (c x k) = (c x r)
            BinaryOp::Mul if columns == r2 => {
                let (k, r) = (*columns as usize, *rows as usize);
                let mut values = Vec::with_capacity(*c2 as usize * r);
                for c in 0..*c2 as usize {
                    let right_column = &b[c * k..(c + 1) * k];
                    for row in 0..r {
                        let left_row: Vec<Scalar> = (0..k).map(|i| a[i * r + row]).collect();
                        values.push(dot_lanes(&left_row, right_column)?);
                    }
                }
                Ok(Data::Matrix {
                    columns: *c2,
                    rows: *rows,
                    values,
                })
            }
            _ => Err(mismatch()),
        },
        (
            Data::Matrix {
                columns,
                rows,
                values,
            },
            Data::Scalar(s),
        )
        | (
            Data::Scalar(s),
            Data::Matrix {
                columns,
                rows,
                values,
            },
        ) if op == BinaryOp::Mul => Ok(Data::Matrix {
            columns: *columns,
            rows: *rows,
            values: values
                .iter()
                .map(|v| scalar_binary(op, *v, *s))
                .collect::<Result<_>>()?,
        }),
        (
            Data::Matrix {
                columns,
                rows,
                values,
            },
            Data::Vector(v),
        ) if op == BinaryOp::Mul && v.len() == *columns as usize => {
            let r = *rows as usize;
            let out = (0..r)
                .map(|row| {
                    let matrix_row: Vec<Scalar> =
                        (0..v.len()).map(|c| values[c * r + row]).collect();
                    dot_lanes(&matrix_row, v)
                })
                .collect::<Result<_>>()?;
            Ok(Data::Vector(out))
        }
        (
            Data::Vector(v),
            Data::Matrix {
                columns,
                rows,
                values,
            },
        ) if op == BinaryOp::Mul && v.len() == *rows as usize => {
            let r = *rows as usize;
            let out = (0..*columns as usize)
                .map(|c| dot_lanes(v, &values[c * r..(c + 1) * r]))
                .collect::<Result<_>>()?;
            Ok(Data::Vector(out))
        }
        _ => Err(mismatch()),
    }
}

fn scalar_unary(op: UnaryOp, v: Scalar) -> Result<Scalar> {
    let invalid = || {
        ExecError::type_error(format!(
            "operator '{op}' cannot be applied to {}",
            v.kind().name()
        ))
    };
    Ok(match (op, v) {
        (UnaryOp::Neg, Scalar::I32(x)) => Scalar::I32(x.wrapping_neg()),
        (UnaryOp::Neg, Scalar::AbstractInt(x)) => Scalar::AbstractInt(x.wrapping_neg()),
        (UnaryOp::Neg, Scalar::F32(x)) => Scalar::F32(-x),
        (UnaryOp::Neg, Scalar::F16(x)) => Scalar::F16(-x),
        (UnaryOp::Neg, Scalar::AbstractFloat(x)) => Scalar::AbstractFloat(-x),
        (UnaryOp::Not, Scalar::Bool(b)) => Scalar::Bool(!b),
        (UnaryOp::BitNot, Scalar::I32(x)) => Scalar::I32(!x),
        (UnaryOp::BitNot, Scalar::U32(x)) => Scalar::U32(!x),
        (UnaryOp::BitNot, Scalar::AbstractInt(x)) => Scalar::AbstractInt(!x),
        _ => return Err(invalid()),
    })
}

/// `-e`, `!e` and `~e` on scalars, vectors and (negation only) matrices.
pub fn unary(op: UnaryOp, value: &Data) -> Result<Data> {
    match value {
        Data::Scalar(s) => Ok(Data::Scalar(scalar_unary(op, *s)?)),
        Data::Vector(lanes) => Ok(Data::Vector(
            lanes
                .iter()
                .map(|l| scalar_unary(op, *l))
                .collect::<Result<_>>()?,
        )),
        Data::Matrix {
            columns,
            rows,
            values,
        } if op == UnaryOp::Neg => Ok(Data::Matrix {
            columns: *columns,
            rows: *rows,
            values: values
                .iter()
                .map(|v| scalar_unary(op, *v))
                .collect::<Result<_>>()?,
        }),
        other => Err(ExecError::type_error(format!(
            "operator '{op}' cannot be applied to {}",
            other.type_name()
        ))),
    }
}

/// Kind shared by every lane of the operands, unifying abstract lanes.
pub fn common_kind(values: &[&Data]) -> Result<ScalarKind> {
    let mut kind: Option<ScalarKind> = None;
    for value in values {
        let lane_kind = match value {
            Data::Matrix { values, .. } => values.first().map(|s| s.kind()),
            other => other.lanes()?.first().map(|s| s.kind()),
        };
        if let Some(k) = lane_kind {
            kind = Some(match kind {
                Some(prev) => prev.unify(k).ok_or_else(|| {
                    ExecError::type_error(format!(
                        "mismatched argument types {} and {}",
                        prev.name(),
                        k.name()
                    ))
                })?,
                None => k,
            });
        }
    }
    kind.ok_or_else(|| ExecError::type_error("no numeric operands"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(op: BinaryOp, a: Scalar, b: Scalar) -> Scalar {
        scalar_binary(op, a, b).unwrap()
    }

    #[test]
    fn test_integer_division_never_traps() {
        assert_eq!(s(BinaryOp::Div, Scalar::I32(7), Scalar::I32(0)), Scalar::I32(7));
        assert_eq!(s(BinaryOp::Rem, Scalar::U32(7), Scalar::U32(0)), Scalar::U32(0));
        assert_eq!(
            s(BinaryOp::Div, Scalar::I32(i32::MIN), Scalar::I32(-1)),
            Scalar::I32(i32::MIN)
        );
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(s(BinaryOp::Add, Scalar::U32(u32::MAX), Scalar::U32(1)), Scalar::U32(0));
        assert_eq!(
            s(BinaryOp::Mul, Scalar::I32(i32::MAX), Scalar::AbstractInt(2)),
            Scalar::I32(-2)
        );
    }

    #[test]
    fn test_shift_masks_count() {
        assert_eq!(s(BinaryOp::Shl, Scalar::U32(1), Scalar::U32(33)), Scalar::U32(2));
        assert_eq!(s(BinaryOp::Shr, Scalar::I32(-8), Scalar::U32(1)), Scalar::I32(-4));
    }

    #[test]
    fn test_abstract_adopts_concrete_type() {
        assert_eq!(s(BinaryOp::Add, Scalar::AbstractInt(1), Scalar::F32(0.5)), Scalar::F32(1.5));
        assert_eq!(
            s(BinaryOp::Add, Scalar::AbstractInt(1), Scalar::AbstractInt(2)),
            Scalar::AbstractInt(3)
        );
    }

    #[test]
    fn test_mismatched_concrete_types_rejected() {
        let err = scalar_binary(BinaryOp::Add, Scalar::I32(1), Scalar::U32(1)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Type);
    }

    #[test]
    fn test_vector_comparison_yields_bools() {
        let a = Data::Vector(vec![Scalar::F32(1.0), Scalar::F32(3.0)]);
        let b = Data::Scalar(Scalar::AbstractFloat(2.0));
        match binary(BinaryOp::Lt, &a, &b).unwrap() {
            Data::Vector(lanes) => {
                assert_eq!(lanes, vec![Scalar::Bool(true), Scalar::Bool(false)])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_matrix_vector_product() {
        // Columns (1,2) and (3,4): M * (1,1) = (4,6), (1,1) * M = (3,7).
        let m = Data::Matrix {
            columns: 2,
            rows: 2,
            values: [1.0, 2.0, 3.0, 4.0].map(Scalar::F32).to_vec(),
        };
        let v = Data::Vector(vec![Scalar::F32(1.0); 2]);
        match binary(BinaryOp::Mul, &m, &v).unwrap() {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::F32(4.0), Scalar::F32(6.0)]),
            other => panic!("unexpected {other:?}"),
        }
        match binary(BinaryOp::Mul, &v, &m).unwrap() {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::F32(3.0), Scalar::F32(7.0)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_matrix_product() {
        let identity = Data::Matrix {
            columns: 2,
            rows: 2,
            values: [1.0, 0.0, 0.0, 1.0].map(Scalar::F32).to_vec(),
        };
        let m = Data::Matrix {
            columns: 2,
            rows: 2,
            values: [1.0, 2.0, 3.0, 4.0].map(Scalar::F32).to_vec(),
        };
        match binary(BinaryOp::Mul, &identity, &m).unwrap() {
            Data::Matrix { values, .. } => {
                assert_eq!(values, [1.0, 2.0, 3.0, 4.0].map(Scalar::F32).to_vec())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_nan_comparisons() {
        let nan = Scalar::F32(f32::NAN);
        assert_eq!(s(BinaryOp::Eq, nan, nan), Scalar::Bool(false));
        assert_eq!(s(BinaryOp::Ne, nan, nan), Scalar::Bool(true));
    }
}
