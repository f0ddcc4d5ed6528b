//! Data packing builtins.

use super::{arg, expect_args, Builtin};
use crate::data::f16::{f16_to_f32, f32_to_f16};
use crate::data::{Data, Scalar};
use crate::error::{ExecError, Result};

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    use Builtin::*;
    match builtin {
        Dot4U8Packed | Dot4I8Packed => {
            expect_args(name, args, 2)?;
            let a = packed_word(name, arg(name, args, 0)?)?;
            let b = packed_word(name, arg(name, args, 1)?)?;
            Ok(Data::Scalar(if builtin == Dot4U8Packed {
                let sum = (0..4)
                    .map(|i| (byte(a, i) as u32) * (byte(b, i) as u32))
                    .fold(0u32, u32::wrapping_add);
                Scalar::U32(sum)
            } else {
                let sum = (0..4)
                    .map(|i| (byte(a, i) as i8 as i32) * (byte(b, i) as i8 as i32))
                    .fold(0i32, i32::wrapping_add);
                Scalar::I32(sum)
            }))
        }
        Unpack4x8Snorm | Unpack4x8Unorm | Unpack4xI8 | Unpack4xU8 | Unpack2x16Snorm
        | Unpack2x16Unorm | Unpack2x16Float => {
            expect_args(name, args, 1)?;
            let word = packed_word(name, arg(name, args, 0)?)?;
            Ok(Data::Vector(unpack(builtin, word)))
        }
        _ => {
            expect_args(name, args, 1)?;
            let lanes = arg(name, args, 0)?.lanes()?;
            let width = match builtin {
                Pack2x16Snorm | Pack2x16Unorm | Pack2x16Float => 2,
                _ => 4,
            };
            if lanes.len() != width {
                return Err(ExecError::type_error(format!(
                    "'{name}' expects a vec{width}, found {} lanes",
                    lanes.len()
                )));
            }
            Ok(Data::Scalar(Scalar::U32(pack(builtin, lanes))))
        }
    }
}

fn packed_word(name: &str, value: &Data) -> Result<u32> {
    match value.as_scalar()? {
        Scalar::U32(v) => Ok(v),
        Scalar::AbstractInt(v) => Ok(v as u32),
        other => Err(ExecError::type_error(format!(
            "'{name}' expects a u32, found {}",
            other.kind().name()
        ))),
    }
}

fn byte(word: u32, i: u32) -> u8 {
    (word >> (8 * i)) as u8
}

fn pack(builtin: Builtin, lanes: &[Scalar]) -> u32 {
    use Builtin::*;
    let fields: Vec<u32> = lanes
        .iter()
        .map(|s| {
            let x = s.as_f64();
            match builtin {
                Pack4x8Snorm => ((x.clamp(-1.0, 1.0) * 127.0).round_ties_even() as i8) as u8 as u32,
                Pack4x8Unorm => (x.clamp(0.0, 1.0) * 255.0).round_ties_even() as u32,
                Pack4xI8 => s.as_i64() as u8 as u32,
                Pack4xU8 => s.as_i64() as u8 as u32,
                Pack4xI8Clamp => s.as_i64().clamp(-128, 127) as i8 as u8 as u32,
                Pack4xU8Clamp => s.as_i64().clamp(0, 255) as u32,
                Pack2x16Snorm => {
                    ((x.clamp(-1.0, 1.0) * 32767.0).round_ties_even() as i16) as u16 as u32
                }
                Pack2x16Unorm => (x.clamp(0.0, 1.0) * 65535.0).round_ties_even() as u32,
                _ => f32_to_f16(x as f32) as u32,
            }
        })
        .collect();
    let bits = if fields.len() == 2 { 16 } else { 8 };
    fields
        .iter()
        .enumerate()
        .fold(0u32, |word, (i, field)| word | (field << (bits * i as u32)))
}

fn unpack(builtin: Builtin, word: u32) -> Vec<Scalar> {
    use Builtin::*;
    match builtin {
        Unpack4x8Snorm => (0..4)
            .map(|i| Scalar::F32(((byte(word, i) as i8) as f32 / 127.0).max(-1.0)))
            .collect(),
        Unpack4x8Unorm => (0..4)
            .map(|i| Scalar::F32(byte(word, i) as f32 / 255.0))
            .collect(),
        Unpack4xI8 => (0..4).map(|i| Scalar::I32(byte(word, i) as i8 as i32)).collect(),
        Unpack4xU8 => (0..4).map(|i| Scalar::U32(byte(word, i) as u32)).collect(),
        _ => {
            let halves = [word as u16, (word >> 16) as u16];
            halves
                .iter()
                .map(|h| {
                    Scalar::F32(match builtin {
                        Unpack2x16Snorm => ((*h as i16) as f32 / 32767.0).max(-1.0),
                        Unpack2x16Unorm => *h as f32 / 65535.0,
                        _ => f16_to_f32(*h),
                    })
                })
                .collect()
        }
    }
}
