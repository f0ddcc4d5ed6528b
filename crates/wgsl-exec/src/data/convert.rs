//! Value conversion and bit reinterpretation.

use super::f16::{f16_to_f32, f32_to_f16, quantize};
use super::{Data, Scalar};
use crate::error::{ExecError, Result};
use wgsl_reflect::{ScalarType, TypeInfo, TypeKind};

impl Scalar {
    /// Value conversion (`f32(x)`, `u32(x)`, ...). Float to integer
    /// saturates; between `i32` and `u32` the bits are kept.
    pub fn convert(self, ty: ScalarType) -> Scalar {
        match ty {
            ScalarType::Bool => Scalar::Bool(match self {
                Scalar::Bool(b) => b,
                Scalar::F32(v) | Scalar::F16(v) => v != 0.0,
                Scalar::AbstractFloat(v) => v != 0.0,
                other => other.as_i64() != 0,
            }),
            ScalarType::I32 => Scalar::I32(match self {
                Scalar::U32(v) => v as i32,
                Scalar::F32(v) | Scalar::F16(v) => v as i32,
                Scalar::AbstractFloat(v) => v as i32,
                other => other.as_i64() as i32,
            }),
            ScalarType::U32 => Scalar::U32(match self {
                Scalar::I32(v) => v as u32,
                Scalar::F32(v) | Scalar::F16(v) => v as u32,
                Scalar::AbstractFloat(v) => v as u32,
                other => other.as_i64() as u32,
            }),
            ScalarType::F32 => Scalar::F32(self.as_f64() as f32),
            ScalarType::F16 => Scalar::F16(quantize(self.as_f64() as f32)),
        }
    }
}

impl Data {
    /// Convert to the declared type of a binding, parameter or return.
    pub fn convert_to(self, ty: &TypeInfo) -> Result<Data> {
        match (&ty.kind, self) {
            (TypeKind::Scalar(s) | TypeKind::Atomic(s), Data::Scalar(v)) => {
                Ok(Data::Scalar(v.convert(*s)))
            }
            (TypeKind::Vector { scalar, count }, Data::Vector(lanes))
                if lanes.len() == *count as usize =>
            {
                Ok(Data::Vector(lanes.into_iter().map(|l| l.convert(*scalar)).collect()))
            }
            (
                TypeKind::Matrix {
                    scalar,
                    columns,
                    rows,
                    ..
                },
                Data::Matrix {
                    columns: c,
                    rows: r,
                    values,
                },
            ) if c == *columns && r == *rows => Ok(Data::Matrix {
                columns: c,
                rows: r,
                values: values.into_iter().map(|v| v.convert(*scalar)).collect(),
            }),
            (TypeKind::Struct { .. } | TypeKind::Array { .. }, value @ Data::Typed(_))
            | (TypeKind::Pointer { .. }, value @ Data::Pointer(_))
            | (TypeKind::Texture(_), value @ Data::Texture(_))
            | (TypeKind::Sampler { .. }, value @ Data::Sampler { .. }) => Ok(value),
            (_, value) => Err(ExecError::type_error(format!(
                "cannot convert {} to '{}'",
                value.type_name(),
                ty.name
            ))),
        }
    }
}

/// Little-endian bytes of each lane: two for `f16`, four otherwise.
fn lane_bytes(lanes: &[Scalar]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(lanes.len() * 4);
    for lane in lanes {
        match *lane {
            Scalar::F16(v) => bytes.extend_from_slice(&f32_to_f16(v).to_le_bytes()),
            Scalar::F32(v) => bytes.extend_from_slice(&v.to_le_bytes()),
            Scalar::AbstractFloat(v) => bytes.extend_from_slice(&(v as f32).to_le_bytes()),
            Scalar::I32(v) => bytes.extend_from_slice(&v.to_le_bytes()),
            Scalar::U32(v) => bytes.extend_from_slice(&v.to_le_bytes()),
            Scalar::AbstractInt(v) => bytes.extend_from_slice(&(v as u32).to_le_bytes()),
            Scalar::Bool(_) => return Err(ExecError::type_error("bitcast of bool")),
        }
    }
    Ok(bytes)
}

fn scalar_from_bytes(ty: ScalarType, bytes: &[u8]) -> Result<Scalar> {
    let word = |b: &[u8]| [b[0], b[1], b[2], b[3]];
    Ok(match ty {
        ScalarType::F16 => Scalar::F16(f16_to_f32(u16::from_le_bytes([bytes[0], bytes[1]]))),
        ScalarType::F32 => Scalar::F32(f32::from_le_bytes(word(bytes))),
        ScalarType::I32 => Scalar::I32(i32::from_le_bytes(word(bytes))),
        ScalarType::U32 => Scalar::U32(u32::from_le_bytes(word(bytes))),
        ScalarType::Bool => return Err(ExecError::type_error("bitcast to bool")),
    })
}

/// `bitcast<T>(e)`: reinterpret the bits of a 32-bit scalar or vector,
/// including the `vec2<f16>` and `vec4<f16>` forms.
pub fn bitcast(value: &Data, target: &TypeInfo) -> Result<Data> {
    let bytes = lane_bytes(value.lanes()?)?;
    let (scalar, count) = match &target.kind {
        TypeKind::Scalar(s) => (*s, None),
        TypeKind::Vector { scalar, count } => (*scalar, Some(*count as usize)),
        _ => {
            return Err(ExecError::type_error(format!(
                "cannot bitcast to '{}'",
                target.name
            )))
        }
    };
    let lane_size = scalar.size() as usize;
    let lanes = count.unwrap_or(1);
    if bytes.len() != lane_size * lanes {
        return Err(ExecError::type_error(format!(
            "bitcast from {} to '{}' changes the bit width",
            value.type_name(),
            target.name
        )));
    }
    let values = bytes
        .chunks_exact(lane_size)
        .map(|chunk| scalar_from_bytes(scalar, chunk))
        .collect::<Result<Vec<_>>>()?;
    Ok(match count {
        Some(_) => Data::Vector(values),
        None => Data::Scalar(values[0]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_to_int_saturates() {
        assert_eq!(Scalar::F32(3.9).convert(ScalarType::I32), Scalar::I32(3));
        assert_eq!(Scalar::F32(-1.0).convert(ScalarType::U32), Scalar::U32(0));
        assert_eq!(Scalar::F32(1e20).convert(ScalarType::I32), Scalar::I32(i32::MAX));
        assert_eq!(Scalar::F32(f32::NAN).convert(ScalarType::U32), Scalar::U32(0));
    }

    #[test]
    fn test_int_reinterpretation() {
        assert_eq!(Scalar::I32(-1).convert(ScalarType::U32), Scalar::U32(u32::MAX));
        assert_eq!(Scalar::U32(0x8000_0000).convert(ScalarType::I32), Scalar::I32(i32::MIN));
    }

    #[test]
    fn test_bitcast_scalar() {
        let one = Data::Scalar(Scalar::F32(1.0));
        let bits = bitcast(&one, &TypeInfo::scalar(ScalarType::U32)).unwrap();
        assert_eq!(bits.as_scalar().unwrap(), Scalar::U32(0x3f80_0000));
    }

    #[test]
    fn test_bitcast_f16_pair() {
        let word = Data::Scalar(Scalar::U32(0x4000_3c00));
        let halves = bitcast(&word, &TypeInfo::vector(ScalarType::F16, 2)).unwrap();
        match halves {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::F16(1.0), Scalar::F16(2.0)]),
            other => panic!("expected vector, got {other:?}"),
        }
    }

    #[test]
    fn test_bitcast_width_mismatch() {
        let word = Data::Scalar(Scalar::U32(1));
        assert!(bitcast(&word, &TypeInfo::vector(ScalarType::U32, 2)).is_err());
    }
}
