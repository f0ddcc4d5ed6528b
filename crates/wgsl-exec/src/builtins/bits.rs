//! Bit manipulation on 32-bit integers.

use super::{arg, expect_args, Builtin, Lanes};
use crate::data::{Data, Scalar, ScalarKind};
use crate::error::{ExecError, Result};

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    match builtin {
        Builtin::ExtractBits => {
            expect_args(name, args, 3)?;
            let lanes = Lanes::new(&args[..1])?.integer(name)?;
            let offset = field_arg(name, args, 1)?;
            let count = field_arg(name, args, 2)?;
            let signed = lanes.kind == ScalarKind::I32;
            lanes.map(|x| {
                let bits = extract_bits(word(x[0]), offset, count, signed);
                Ok(from_word(lanes.kind, bits))
            })
        }
        Builtin::InsertBits => {
            expect_args(name, args, 4)?;
            let lanes = Lanes::new(&args[..2])?.integer(name)?;
            let offset = field_arg(name, args, 2)?;
            let count = field_arg(name, args, 3)?;
            lanes.map(|x| {
                let bits = insert_bits(word(x[0]), word(x[1]), offset, count);
                Ok(from_word(lanes.kind, bits))
            })
        }
        _ => {
            expect_args(name, args, 1)?;
            let lanes = Lanes::new(args)?.integer(name)?;
            let signed = lanes.kind == ScalarKind::I32;
            lanes.map(|x| {
                let v = word(x[0]);
                let bits = match builtin {
                    Builtin::CountLeadingZeros => v.leading_zeros(),
                    Builtin::CountOneBits => v.count_ones(),
                    Builtin::CountTrailingZeros => v.trailing_zeros(),
                    Builtin::ReverseBits => v.reverse_bits(),
                    Builtin::FirstTrailingBit => {
                        if v == 0 {
                            u32::MAX
                        } else {
                            v.trailing_zeros()
                        }
                    }
                    Builtin::FirstLeadingBit => first_leading_bit(v, signed),
                    _ => {
                        return Err(ExecError::internal(format!(
                            "'{name}' is not a bit builtin"
                        )))
                    }
                };
                Ok(from_word(lanes.kind, bits))
            })
        }
    }
}

fn word(s: Scalar) -> u32 {
    match s {
        Scalar::U32(v) => v,
        other => other.as_i64() as u32,
    }
}

fn from_word(kind: ScalarKind, bits: u32) -> Scalar {
    match kind {
        ScalarKind::U32 => Scalar::U32(bits),
        _ => Scalar::I32(bits as i32),
    }
}

fn field_arg(name: &str, args: &[Data], index: usize) -> Result<u32> {
    Ok(arg(name, args, index)?.as_scalar()?.as_index()? as u32)
}

/// Offset and count clamped as `min(offset, 32)` and `min(count, 32 - o)`.
fn clamp_field(offset: u32, count: u32) -> (u32, u32) {
    let o = offset.min(32);
    (o, count.min(32 - o))
}

fn mask(count: u32) -> u32 {
    if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}

fn extract_bits(e: u32, offset: u32, count: u32, signed: bool) -> u32 {
    let (o, c) = clamp_field(offset, count);
    if c == 0 {
        return 0;
    }
    let field = (e.checked_shr(o).unwrap_or(0)) & mask(c);
    if signed && c < 32 && field & (1 << (c - 1)) != 0 {
        field | !mask(c)
    } else {
        field
    }
}

fn insert_bits(e: u32, newbits: u32, offset: u32, count: u32) -> u32 {
    let (o, c) = clamp_field(offset, count);
    if c == 0 {
        return e;
    }
    let field = mask(c).checked_shl(o).unwrap_or(0);
    (e & !field) | (newbits.checked_shl(o).unwrap_or(0) & field)
}

fn first_leading_bit(v: u32, signed: bool) -> u32 {
    if signed {
        let s = v as i32;
        if s == 0 || s == -1 {
            return u32::MAX;
        }
        let magnitude = if s < 0 { !v } else { v };
        31 - magnitude.leading_zeros()
    } else if v == 0 {
        u32::MAX
    } else {
        31 - v.leading_zeros()
    }
}
