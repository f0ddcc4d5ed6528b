//! Atomic builtins.
//!
//! Invocations run one after another, so every read-modify-write is
//! trivially atomic. Each returns the value held before the operation.

use super::{arg, expect_args, result_struct, Builtin};
use crate::data::ops::scalar_binary;
use crate::data::{Data, Place, Scalar};
use crate::error::{ExecError, Result};
use wgsl_ast::BinaryOp;
use wgsl_reflect::TypeKind;

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    let place = atomic_place(name, arg(name, args, 0)?)?;
    let old = place.load()?.as_scalar()?;
    match builtin {
        Builtin::AtomicLoad => {
            expect_args(name, args, 1)?;
            Ok(Data::Scalar(old))
        }
        Builtin::AtomicStore => {
            expect_args(name, args, 2)?;
            place.store(arg(name, args, 1)?)?;
            Ok(Data::Void)
        }
        Builtin::AtomicCompareExchangeWeak => {
            expect_args(name, args, 3)?;
            let compare = arg(name, args, 1)?.as_scalar()?.cast(old.kind());
            let exchanged = old == compare;
            if exchanged {
                place.store(arg(name, args, 2)?)?;
            }
            let suffix = old.kind().name();
            result_struct(
                &format!("__atomic_compare_exchange_result_{suffix}"),
                vec![
                    ("old_value", Data::Scalar(old)),
                    ("exchanged", Data::Scalar(Scalar::Bool(exchanged))),
                ],
            )
        }
        _ => {
            expect_args(name, args, 2)?;
            let operand = arg(name, args, 1)?.as_scalar()?.cast(old.kind());
            let new = match builtin {
                Builtin::AtomicAdd => scalar_binary(BinaryOp::Add, old, operand)?,
                Builtin::AtomicSub => scalar_binary(BinaryOp::Sub, old, operand)?,
                Builtin::AtomicAnd => scalar_binary(BinaryOp::BitAnd, old, operand)?,
                Builtin::AtomicOr => scalar_binary(BinaryOp::BitOr, old, operand)?,
                Builtin::AtomicXor => scalar_binary(BinaryOp::BitXor, old, operand)?,
                Builtin::AtomicMax => {
                    if scalar_binary(BinaryOp::Gt, operand, old)?.as_bool()? {
                        operand
                    } else {
                        old
                    }
                }
                Builtin::AtomicMin => {
                    if scalar_binary(BinaryOp::Lt, operand, old)?.as_bool()? {
                        operand
                    } else {
                        old
                    }
                }
                Builtin::AtomicExchange => operand,
                _ => return Err(ExecError::internal(format!("'{name}' is not an atomic builtin"))),
            };
            place.store(&Data::Scalar(new))?;
            Ok(Data::Scalar(old))
        }
    }
}

fn atomic_place<'a>(name: &str, value: &'a Data) -> Result<&'a Place> {
    let place = value.as_place()?;
    match &place.ty.kind {
        TypeKind::Atomic(_) => Ok(place),
        _ => Err(ExecError::type_error(format!(
            "'{name}' expects a pointer to an atomic, found ptr<{}>",
            place.ty.name
        ))),
    }
}
