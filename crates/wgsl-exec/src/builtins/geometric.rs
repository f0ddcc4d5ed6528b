//! Vector geometry and matrix builtins.

use super::{arg, expect_args, Builtin, Lanes};
use crate::data::ops::scalar_binary;
use crate::data::{Data, Scalar};
use crate::error::{ExecError, Result};
use wgsl_ast::BinaryOp;

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    use Builtin::*;
    match builtin {
        Determinant => {
            expect_args(name, args, 1)?;
            determinant(arg(name, args, 0)?)
        }
        Transpose => {
            expect_args(name, args, 1)?;
            transpose(arg(name, args, 0)?)
        }
        Dot => {
            expect_args(name, args, 2)?;
            let lanes = vector_lanes(name, args)?;
            let mut sum = Scalar::zero(lanes.kind);
            for i in 0..lanes.count() {
                let lane = lanes.lane(i);
                sum = scalar_binary(BinaryOp::Add, sum, scalar_binary(BinaryOp::Mul, lane[0], lane[1])?)?;
            }
            Ok(Data::Scalar(sum))
        }
        Cross => {
            expect_args(name, args, 2)?;
            let lanes = vector_lanes(name, args)?.float(name)?;
            if lanes.count() != 3 {
                return Err(ExecError::type_error("cross requires vec3 arguments"));
            }
            let (a, b) = (lanes.floats(0), lanes.floats(1));
            Ok(lanes.wrap_f64([
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ]))
        }
        Length => {
            expect_args(name, args, 1)?;
            let lanes = Lanes::new(args)?.float(name)?;
            let length = norm(&lanes.floats(0));
            Ok(Data::Scalar(Scalar::from_f64(lanes.kind, length)))
        }
        Distance => {
            expect_args(name, args, 2)?;
            let lanes = Lanes::new(args)?.float(name)?;
            let diff: Vec<f64> = lanes
                .floats(0)
                .iter()
                .zip(lanes.floats(1))
                .map(|(a, b)| a - b)
                .collect();
            Ok(Data::Scalar(Scalar::from_f64(lanes.kind, norm(&diff))))
        }
        Normalize => {
            expect_args(name, args, 1)?;
            let lanes = vector_lanes(name, args)?.float(name)?;
            let v = lanes.floats(0);
            let length = norm(&v);
            Ok(lanes.wrap_f64(v.into_iter().map(|x| x / length)))
        }
        FaceForward => {
            expect_args(name, args, 3)?;
            let lanes = vector_lanes(name, args)?.float(name)?;
            let (n, i, nref) = (lanes.floats(0), lanes.floats(1), lanes.floats(2));
            let flip = dot(&nref, &i) >= 0.0;
            Ok(lanes.wrap_f64(n.into_iter().map(|x| if flip { -x } else { x })))
        }
        Reflect => {
            expect_args(name, args, 2)?;
            let lanes = vector_lanes(name, args)?.float(name)?;
            let (e1, e2) = (lanes.floats(0), lanes.floats(1));
            let d = dot(&e2, &e1);
            Ok(lanes.wrap_f64(e1.iter().zip(&e2).map(|(a, b)| a - 2.0 * d * b)))
        }
        Refract => {
            expect_args(name, args, 3)?;
            let lanes = vector_lanes(name, args)?.float(name)?;
            let (e1, e2) = (lanes.floats(0), lanes.floats(1));
            let eta = lanes.floats(2)[0];
            let d = dot(&e2, &e1);
            let k = 1.0 - eta * eta * (1.0 - d * d);
            if k < 0.0 {
                return Ok(lanes.wrap_f64(e1.iter().map(|_| 0.0)));
            }
            let scale = eta * d + k.sqrt();
            Ok(lanes.wrap_f64(e1.iter().zip(&e2).map(|(a, b)| eta * a - scale * b)))
        }
        _ => Err(ExecError::internal(format!("'{name}' is not a geometric builtin"))),
    }
}

/// Lanes of arguments whose first operand must be a vector.
fn vector_lanes(name: &str, args: &[Data]) -> Result<Lanes> {
    match arg(name, args, 0)? {
        Data::Vector(_) => Lanes::new(args),
        other => Err(ExecError::type_error(format!(
            "'{name}' expects vector arguments, found {}",
            other.type_name()
        ))),
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn determinant(value: &Data) -> Result<Data> {
    let Data::Matrix {
        columns,
        rows,
        values,
    } = value
    else {
        return Err(ExecError::type_error(format!(
            "determinant expects a matrix, found {}",
            value.type_name()
        )));
    };
    if columns != rows {
        return Err(ExecError::type_error(format!(
            "determinant requires a square matrix, found mat{columns}x{rows}"
        )));
    }
    let kind = values.first().map(|s| s.kind()).unwrap_or(crate::data::ScalarKind::F32);
    let n = *columns as usize;
    // m[c][r] in column-major order
    let m = |c: usize, r: usize| values[c * n + r].as_f64();
    let det = match n {
        2 => m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1),
        3 => {
            m(0, 0) * (m(1, 1) * m(2, 2) - m(2, 1) * m(1, 2))
                - m(1, 0) * (m(0, 1) * m(2, 2) - m(2, 1) * m(0, 2))
                + m(2, 0) * (m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2))
        }
        4 => {
            let mut det = 0.0;
            for skip in 0..4 {
                let minor = |c: usize, r: usize| {
                    let c = if c >= skip { c + 1 } else { c };
                    m(c, r + 1)
                };
                let sub = minor(0, 0) * (minor(1, 1) * minor(2, 2) - minor(2, 1) * minor(1, 2))
                    - minor(1, 0) * (minor(0, 1) * minor(2, 2) - minor(2, 1) * minor(0, 2))
                    + minor(2, 0) * (minor(0, 1) * minor(1, 2) - minor(1, 1) * minor(0, 2));
                let sign = if skip % 2 == 0 { 1.0 } else { -1.0 };
                det += sign * m(skip, 0) * sub;
            }
            det
        }
        _ => {
            return Err(ExecError::type_error(format!(
                "unsupported matrix size mat{columns}x{rows}"
            )))
        }
    };
    Ok(Data::Scalar(Scalar::from_f64(kind, det)))
}

fn transpose(value: &Data) -> Result<Data> {
    let Data::Matrix {
        columns,
        rows,
        values,
    } = value
    else {
        return Err(ExecError::type_error(format!(
            "transpose expects a matrix, found {}",
            value.type_name()
        )));
    };
    let (c, r) = (*columns as usize, *rows as usize);
    let mut out = Vec::with_capacity(values.len());
    for j in 0..r {
        for i in 0..c {
            out.push(values[i * r + j]);
        }
    }
    Ok(Data::Matrix {
        columns: *rows,
        rows: *columns,
        values: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn vec_f32(values: &[f32]) -> Data {
        Data::Vector(values.iter().map(|v| Scalar::F32(*v)).collect())
    }

    fn mat(columns: u32, rows: u32, values: &[f32]) -> Data {
        Data::Matrix {
            columns,
            rows,
            values: values.iter().map(|v| Scalar::F32(*v)).collect(),
        }
    }

    #[test]
    fn test_cross() {
        let result = call(
            Builtin::Cross,
            "cross",
            &[vec_f32(&[1.0, 0.0, 0.0]), vec_f32(&[0.0, 1.0, 0.0])],
        )
        .unwrap();
        match result {
            Data::Vector(lanes) => {
                assert_eq!(lanes, vec![Scalar::F32(0.0), Scalar::F32(0.0), Scalar::F32(1.0)])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cross_rejects_vec2() {
        let err = call(
            Builtin::Cross,
            "cross",
            &[vec_f32(&[1.0, 0.0]), vec_f32(&[0.0, 1.0])],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_dot_integers() {
        let a = Data::Vector(vec![Scalar::I32(1), Scalar::I32(2), Scalar::I32(3)]);
        let b = Data::Vector(vec![Scalar::I32(4), Scalar::I32(5), Scalar::I32(6)]);
        let result = call(Builtin::Dot, "dot", &[a, b]).unwrap();
        assert_eq!(result.as_scalar().unwrap(), Scalar::I32(32));
    }

    #[test]
    fn test_length_and_normalize() {
        let v = vec_f32(&[3.0, 4.0]);
        let length = call(Builtin::Length, "length", std::slice::from_ref(&v)).unwrap();
        assert_eq!(length.as_scalar().unwrap(), Scalar::F32(5.0));
        let unit = call(Builtin::Normalize, "normalize", &[v]).unwrap();
        match unit {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::F32(0.6), Scalar::F32(0.8)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reflect() {
        let result = call(
            Builtin::Reflect,
            "reflect",
            &[vec_f32(&[1.0, -1.0]), vec_f32(&[0.0, 1.0])],
        )
        .unwrap();
        match result {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::F32(1.0), Scalar::F32(1.0)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_determinants() {
        let m2 = mat(2, 2, &[1.0, 3.0, 2.0, 4.0]);
        let det = call(Builtin::Determinant, "determinant", &[m2]).unwrap();
        assert_eq!(det.as_scalar().unwrap(), Scalar::F32(-2.0));

        let m3 = mat(3, 3, &[2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0]);
        let det = call(Builtin::Determinant, "determinant", &[m3]).unwrap();
        assert_eq!(det.as_scalar().unwrap(), Scalar::F32(24.0));

        let mut identity = vec![0.0; 16];
        for i in 0..4 {
            identity[i * 5] = 2.0;
        }
        let det = call(Builtin::Determinant, "determinant", &[mat(4, 4, &identity)]).unwrap();
        assert_eq!(det.as_scalar().unwrap(), Scalar::F32(16.0));
    }

    #[test]
    fn test_determinant_rejects_non_square() {
        let m = mat(2, 3, &[0.0; 6]);
        let err = call(Builtin::Determinant, "determinant", &[m]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_transpose_non_square() {
        // columns (1,2,3) and (4,5,6)
        let m = mat(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let result = call(Builtin::Transpose, "transpose", &[m]).unwrap();
        match result {
            Data::Matrix {
                columns,
                rows,
                values,
            } => {
                assert_eq!((columns, rows), (3, 2));
                let expected: Vec<Scalar> =
                    [1.0, 4.0, 2.0, 5.0, 3.0, 6.0].iter().map(|v| Scalar::F32(*v)).collect();
                assert_eq!(values, expected);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
