//! Numeric builtins.

use super::{arg, expect_args, result_struct, shape_suffix, Builtin, Lanes};
use crate::data::f16::quantize;
use crate::data::ops::scalar_binary;
use crate::data::{Data, Scalar, ScalarKind};
use crate::error::{ExecError, Result};
use wgsl_ast::BinaryOp;

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    use Builtin::*;
    match builtin {
        Abs | Max | Min | Clamp | Sign => {
            expect_args(name, args, arity(builtin))?;
            numeric(builtin, name, args)
        }
        Frexp => frexp(name, args),
        Modf => modf(name, args),
        Ldexp => ldexp(name, args),
        QuantizeToF16 => {
            expect_args(name, args, 1)?;
            let lanes = Lanes::new(args)?.float(name)?;
            lanes.map_f64(|x| Ok(quantize(x[0] as f32) as f64))
        }
        _ => {
            expect_args(name, args, arity(builtin))?;
            let lanes = Lanes::new(args)?.float(name)?;
            lanes.map_f64(|x| float_fn(builtin, name, x))
        }
    }
}

fn arity(builtin: Builtin) -> usize {
    use Builtin::*;
    match builtin {
        Atan2 | Pow | Step | Max | Min => 2,
        Fma | Mix | Smoothstep | Clamp => 3,
        _ => 1,
    }
}

fn float_fn(builtin: Builtin, name: &str, x: &[f64]) -> Result<f64> {
    use Builtin::*;
    let value = match builtin {
        Acos => x[0].acos(),
        Acosh => x[0].acosh(),
        Asin => x[0].asin(),
        Asinh => x[0].asinh(),
        Atan => x[0].atan(),
        Atanh => x[0].atanh(),
        Atan2 => x[0].atan2(x[1]),
        Ceil => x[0].ceil(),
        Cos => x[0].cos(),
        Cosh => x[0].cosh(),
        Degrees => x[0].to_degrees(),
        Exp => x[0].exp(),
        Exp2 => x[0].exp2(),
        Floor => x[0].floor(),
        Fma => x[0] * x[1] + x[2],
        Fract => x[0] - x[0].floor(),
        InverseSqrt => 1.0 / x[0].sqrt(),
        Log => x[0].ln(),
        Log2 => x[0].log2(),
        Mix => x[0] * (1.0 - x[2]) + x[1] * x[2],
        Pow => x[0].powf(x[1]),
        Radians => x[0].to_radians(),
        Round => x[0].round_ties_even(),
        Saturate => x[0].clamp(0.0, 1.0),
        Sin => x[0].sin(),
        Sinh => x[0].sinh(),
        Smoothstep => {
            let t = ((x[2] - x[0]) / (x[1] - x[0])).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        }
        Sqrt => x[0].sqrt(),
        Step => {
            if x[1] >= x[0] {
                1.0
            } else {
                0.0
            }
        }
        Tan => x[0].tan(),
        Tanh => x[0].tanh(),
        Trunc => x[0].trunc(),
        _ => {
            return Err(ExecError::internal(format!(
                "'{name}' is not a float builtin"
            )))
        }
    };
    Ok(value)
}

/// Functions defined on both integers and floats.
fn numeric(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    let lanes = Lanes::new(args)?;
    if lanes.kind == ScalarKind::Bool {
        return Err(ExecError::type_error(format!("'{name}' does not accept bool")));
    }
    let kind = lanes.kind;
    lanes.map(|x| match builtin {
        Builtin::Abs => Ok(match x[0] {
            Scalar::I32(v) => Scalar::I32(v.wrapping_abs()),
            Scalar::AbstractInt(v) => Scalar::AbstractInt(v.wrapping_abs()),
            Scalar::U32(v) => Scalar::U32(v),
            other => Scalar::from_f64(kind, other.as_f64().abs()),
        }),
        Builtin::Max => max(x[0], x[1]),
        Builtin::Min => min(x[0], x[1]),
        Builtin::Clamp => min(max(x[0], x[1])?, x[2]),
        _ => Ok(if kind.is_float() {
            let v = x[0].as_f64();
            let sign = if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            };
            Scalar::from_f64(kind, sign)
        } else {
            Scalar::from_i64(kind, x[0].as_i64().signum())
        }),
    })
}

fn max(a: Scalar, b: Scalar) -> Result<Scalar> {
    Ok(if scalar_binary(BinaryOp::Gt, b, a)?.as_bool()? { b } else { a })
}

fn min(a: Scalar, b: Scalar) -> Result<Scalar> {
    Ok(if scalar_binary(BinaryOp::Lt, b, a)?.as_bool()? { b } else { a })
}

/// Split into a fraction in [0.5, 1) and a power of two.
fn split_exponent(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let mut exp = x.abs().log2().floor() as i32 + 1;
    let mut fract = x / 2f64.powi(exp);
    if fract.abs() >= 1.0 {
        fract /= 2.0;
        exp += 1;
    } else if fract.abs() < 0.5 {
        fract *= 2.0;
        exp -= 1;
    }
    (fract, exp)
}

fn frexp(name: &str, args: &[Data]) -> Result<Data> {
    expect_args(name, args, 1)?;
    let lanes = Lanes::new(args)?.float(name)?;
    let kind = ScalarKind::from(lanes.kind.concretize());
    let parts: Vec<(f64, i32)> = lanes.floats(0).into_iter().map(split_exponent).collect();
    let fract = lanes.wrap(parts.iter().map(|(f, _)| Scalar::from_f64(kind, *f)).collect());
    let exp = lanes.wrap(parts.iter().map(|(_, e)| Scalar::I32(*e)).collect());
    let suffix = shape_suffix(&fract)?;
    result_struct(
        &format!("__frexp_result_{suffix}"),
        vec![("fract", fract), ("exp", exp)],
    )
}

fn modf(name: &str, args: &[Data]) -> Result<Data> {
    expect_args(name, args, 1)?;
    let lanes = Lanes::new(args)?.float(name)?;
    let kind = ScalarKind::from(lanes.kind.concretize());
    let values = lanes.floats(0);
    let fract = lanes.wrap(values.iter().map(|x| Scalar::from_f64(kind, x - x.trunc())).collect());
    let whole = lanes.wrap(values.iter().map(|x| Scalar::from_f64(kind, x.trunc())).collect());
    let suffix = shape_suffix(&fract)?;
    result_struct(
        &format!("__modf_result_{suffix}"),
        vec![("fract", fract), ("whole", whole)],
    )
}

fn ldexp(name: &str, args: &[Data]) -> Result<Data> {
    expect_args(name, args, 2)?;
    let lanes = Lanes::new(&args[..1])?.float(name)?;
    let exponents = arg(name, args, 1)?.lanes()?;
    if !exponents.iter().all(|e| e.kind().is_integer()) {
        return Err(ExecError::type_error("ldexp exponent must be an integer"));
    }
    let values = lanes
        .floats(0)
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            let e = exponents.get(i).or(exponents.first()).map(|e| e.as_i64()).unwrap_or(0);
            x * 2f64.powi(e as i32)
        });
    Ok(lanes.wrap_f64(values))
}
