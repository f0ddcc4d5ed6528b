//! Value constructors: `vec3f(..)`, `vec2(..)`, `mat2x2<f32>(..)`,
//! `array<u32, 4>(..)`, `array(..)`, struct names and scalar conversions.

use crate::data::ops::common_kind;
use crate::data::{Data, Place, Scalar, ScalarKind};
use crate::error::{ExecError, Result};
use wgsl_ast::{Span, TemplateArg, TypeExpr};
use wgsl_reflect::{matrix_dims, TypeInfo, TypeKind, TypeRef, TypeTable};

/// Construct a value for a call whose callee names a type.
pub fn construct(
    types: &TypeTable,
    callee: &str,
    template: &[TemplateArg],
    args: Vec<Data>,
    span: Span,
) -> Result<Data> {
    if template.is_empty() {
        if let Some(width) = vector_width(callee) {
            return infer_vector(width, &args);
        }
        if let Some((columns, rows)) = matrix_dims(callee) {
            return infer_matrix(columns, rows, &args);
        }
        if callee == "array" {
            return infer_array(&args);
        }
    }
    let expr = TypeExpr {
        name: callee.to_string(),
        args: template.to_vec(),
        span,
    };
    let ty = types
        .resolve(&expr)
        .map_err(|err| ExecError::binding(format!("unknown function '{callee}': {err}")))?;
    construct_typed(&ty, args)
}

fn vector_width(name: &str) -> Option<usize> {
    match name {
        "vec2" => Some(2),
        "vec3" => Some(3),
        "vec4" => Some(4),
        _ => None,
    }
}

/// Lanes of scalar and vector arguments in order.
fn flatten(args: &[Data]) -> Result<Vec<Scalar>> {
    let mut lanes = Vec::new();
    for value in args {
        match value {
            Data::Matrix { values, .. } => lanes.extend_from_slice(values),
            other => lanes.extend_from_slice(other.lanes()?),
        }
    }
    Ok(lanes)
}

/// Repeat a single lane `count` times, or require exactly `count` lanes.
fn splat(lanes: Vec<Scalar>, count: usize, what: &str) -> Result<Vec<Scalar>> {
    match lanes.len() {
        1 => Ok(vec![lanes[0]; count]),
        n if n == count => Ok(lanes),
        n => Err(ExecError::type_error(format!(
            "{what} needs {count} components, got {n}"
        ))),
    }
}

pub fn construct_typed(ty: &TypeRef, args: Vec<Data>) -> Result<Data> {
    if args.is_empty() {
        return Data::zero(ty);
    }
    match &ty.kind {
        TypeKind::Scalar(scalar) => match args.as_slice() {
            [value] => Ok(Data::Scalar(value.as_scalar()?.convert(*scalar))),
            _ => Err(ExecError::type_error(format!(
                "{} takes one argument, got {}",
                ty.name,
                args.len()
            ))),
        },
        TypeKind::Vector { scalar, count } => {
            let lanes = splat(flatten(&args)?, *count as usize, &ty.name)?;
            Ok(Data::Vector(lanes.into_iter().map(|s| s.convert(*scalar)).collect()))
        }
        TypeKind::Matrix {
            scalar,
            columns,
            rows,
            ..
        } => {
            let lanes = flatten(&args)?;
            let expected = (columns * rows) as usize;
            if lanes.len() != expected {
                return Err(ExecError::type_error(format!(
                    "{} needs {expected} components, got {}",
                    ty.name,
                    lanes.len()
                )));
            }
            Ok(Data::Matrix {
                columns: *columns,
                rows: *rows,
                values: lanes.into_iter().map(|s| s.convert(*scalar)).collect(),
            })
        }
        TypeKind::Array { count, .. } => {
            if let Some(count) = count {
                if *count as usize != args.len() {
                    return Err(ExecError::type_error(format!(
                        "{} needs {count} elements, got {}",
                        ty.name,
                        args.len()
                    )));
                }
            }
            let place = Place::alloc(ty.clone());
            for (i, value) in args.iter().enumerate() {
                place.element(i as i64)?.store(value)?;
            }
            Ok(Data::Typed(place))
        }
        TypeKind::Struct { members } => {
            if members.len() != args.len() {
                return Err(ExecError::type_error(format!(
                    "struct '{}' has {} members, got {} arguments",
                    ty.name,
                    members.len(),
                    args.len()
                )));
            }
            let place = Place::alloc(ty.clone());
            for (member, value) in members.iter().zip(&args) {
                place.member(&member.name)?.store(value)?;
            }
            Ok(Data::Typed(place))
        }
        _ => Err(ExecError::type_error(format!(
            "'{}' cannot be constructed",
            ty.name
        ))),
    }
}

fn infer_vector(width: usize, args: &[Data]) -> Result<Data> {
    if args.is_empty() {
        return Ok(Data::Vector(vec![Scalar::AbstractInt(0); width]));
    }
    let refs: Vec<&Data> = args.iter().collect();
    let kind = common_kind(&refs)?;
    let lanes = splat(flatten(args)?, width, &format!("vec{width}"))?;
    Ok(Data::Vector(lanes.into_iter().map(|s| s.cast(kind)).collect()))
}

fn infer_matrix(columns: u32, rows: u32, args: &[Data]) -> Result<Data> {
    if let [matrix @ Data::Matrix { .. }] = args {
        return Ok(matrix.clone());
    }
    let kind = if args.is_empty() {
        ScalarKind::AbstractFloat
    } else {
        let refs: Vec<&Data> = args.iter().collect();
        match common_kind(&refs)? {
            ScalarKind::AbstractInt => ScalarKind::AbstractFloat,
            kind if kind.is_float() => kind,
            kind => {
                return Err(ExecError::type_error(format!(
                    "matrix components must be floating point, found {}",
                    kind.name()
                )))
            }
        }
    };
    let expected = (columns * rows) as usize;
    let lanes = if args.is_empty() {
        vec![Scalar::zero(kind); expected]
    } else {
        flatten(args)?
    };
    if lanes.len() != expected {
        return Err(ExecError::type_error(format!(
            "mat{columns}x{rows} needs {expected} components, got {}",
            lanes.len()
        )));
    }
    Ok(Data::Matrix {
        columns,
        rows,
        values: lanes.into_iter().map(|s| s.cast(kind)).collect(),
    })
}

fn infer_array(args: &[Data]) -> Result<Data> {
    let first = args
        .first()
        .ok_or_else(|| ExecError::type_error("array() needs at least one element"))?;
    let numeric = args
        .iter()
        .all(|a| matches!(a, Data::Scalar(_) | Data::Vector(_) | Data::Matrix { .. }));
    let element = if numeric {
        let refs: Vec<&Data> = args.iter().collect();
        let scalar = common_kind(&refs)?.concretize();
        match first {
            Data::Vector(lanes) => TypeInfo::vector(scalar, lanes.len() as u32),
            Data::Matrix { columns, rows, .. } => TypeInfo::matrix(scalar, *columns, *rows),
            _ => TypeInfo::scalar(scalar),
        }
    } else {
        first.type_info()?
    };
    let ty = TypeInfo::array(element, Some(args.len() as u32), None);
    construct_typed(&ty, args.to_vec())
}
