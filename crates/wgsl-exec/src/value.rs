//! Host-facing decoded values.

use crate::data::{Data, Place};
use crate::error::{ExecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use wgsl_reflect::TypeKind;

/// A value read back from the engine: a number, or a nested list for
/// vectors, matrix columns, array elements and struct members.
///
/// Booleans decode to `0` or `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Number(f64),
    List(Vec<DecodedValue>),
}

impl DecodedValue {
    pub fn decode(data: &Data) -> Result<Self> {
        match data {
            Data::Scalar(s) => Ok(DecodedValue::Number(s.as_f64())),
            Data::Vector(lanes) => Ok(numbers(lanes.iter().map(|s| s.as_f64()))),
            Data::Matrix { rows, values, .. } => Ok(DecodedValue::List(
                values
                    .chunks(*rows as usize)
                    .map(|column| numbers(column.iter().map(|s| s.as_f64())))
                    .collect(),
            )),
            Data::Typed(place) => decode_place(place),
            Data::Pointer(place) => DecodedValue::decode(&place.load()?),
            Data::Texture(texture) => Ok(numbers(texture.buffer.to_vec().into_iter().map(f64::from))),
            other => Err(ExecError::type_error(format!(
                "{} has no decoded form",
                other.type_name()
            ))),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Number(v) => Some(*v),
            DecodedValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::List(items) => Some(items),
            DecodedValue::Number(_) => None,
        }
    }

    /// Leaf numbers in order.
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            DecodedValue::Number(v) => vec![*v],
            DecodedValue::List(items) => items.iter().flat_map(DecodedValue::flatten).collect(),
        }
    }
}

fn numbers(values: impl Iterator<Item = f64>) -> DecodedValue {
    DecodedValue::List(values.map(DecodedValue::Number).collect())
}

fn decode_place(place: &Place) -> Result<DecodedValue> {
    match &place.ty.kind {
        TypeKind::Struct { members } => Ok(DecodedValue::List(
            members
                .iter()
                .map(|m| DecodedValue::decode(&place.member(&m.name)?.load()?))
                .collect::<Result<_>>()?,
        )),
        TypeKind::Array { .. } => {
            let count = place.element_count()?;
            Ok(DecodedValue::List(
                (0..count as i64)
                    .map(|i| DecodedValue::decode(&place.element(i)?.load()?))
                    .collect::<Result<_>>()?,
            ))
        }
        _ => DecodedValue::decode(&place.load()?),
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Number(v) => write!(f, "{v}"),
            DecodedValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Scalar;

    #[test]
    fn test_matrix_decodes_as_columns() {
        let m = Data::Matrix {
            columns: 2,
            rows: 2,
            values: [1.0, 2.0, 3.0, 4.0].map(Scalar::F32).to_vec(),
        };
        let decoded = DecodedValue::decode(&m).unwrap();
        assert_eq!(decoded.to_string(), "[[1, 2], [3, 4]]");
    }

    #[test]
    fn test_serializes_untagged() {
        let v = DecodedValue::decode(&Data::Vector(vec![Scalar::U32(1), Scalar::Bool(true)])).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,1.0]");
    }

    #[test]
    fn test_flatten() {
        let v = DecodedValue::List(vec![
            DecodedValue::Number(1.0),
            DecodedValue::List(vec![DecodedValue::Number(2.0)]),
        ]);
        assert_eq!(v.flatten(), vec![1.0, 2.0]);
        assert_eq!(v.as_list().map(<[DecodedValue]>::len), Some(2));
    }
}
