//! Builtin function library
//!
//! Every WGSL builtin the engine knows is a [`Builtin`] variant, resolved
//! from its name once and dispatched with a `match`. Constructors (`vec3f`,
//! `array<T, N>`, struct names) are handled by [`construct`].
//!
//! Componentwise functions accept scalars or vectors; scalar operands are
//! broadcast to the width of the vector operands and results keep the
//! operands' element type.

pub mod atomic;
pub mod bits;
pub mod construct;
pub mod geometric;
pub mod math;
pub mod pack;
pub mod texture;

use crate::data::convert::bitcast;
use crate::data::ops::common_kind;
use crate::data::{Data, Place, Scalar, ScalarKind};
use crate::error::{ExecError, Result};
use wgsl_reflect::{TypeInfo, TypeKind, TypeRef};

/// Closed set of builtin functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // === Numeric ===
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Atan2,
    Ceil,
    Clamp,
    Cos,
    Cosh,
    Degrees,
    Exp,
    Exp2,
    Floor,
    Fma,
    Fract,
    Frexp,
    InverseSqrt,
    Ldexp,
    Log,
    Log2,
    Max,
    Min,
    Mix,
    Modf,
    Pow,
    QuantizeToF16,
    Radians,
    Round,
    Saturate,
    Sign,
    Sin,
    Sinh,
    Smoothstep,
    Sqrt,
    Step,
    Tan,
    Tanh,
    Trunc,

    // === Geometric and matrix ===
    Cross,
    Determinant,
    Distance,
    Dot,
    FaceForward,
    Length,
    Normalize,
    Reflect,
    Refract,
    Transpose,

    // === Logical and array ===
    All,
    Any,
    Select,
    ArrayLength,

    // === Bit manipulation ===
    CountLeadingZeros,
    CountOneBits,
    CountTrailingZeros,
    ExtractBits,
    FirstLeadingBit,
    FirstTrailingBit,
    InsertBits,
    ReverseBits,
    Bitcast,

    // === Packing ===
    Pack4x8Snorm,
    Pack4x8Unorm,
    Pack4xI8,
    Pack4xU8,
    Pack4xI8Clamp,
    Pack4xU8Clamp,
    Pack2x16Snorm,
    Pack2x16Unorm,
    Pack2x16Float,
    Unpack4x8Snorm,
    Unpack4x8Unorm,
    Unpack4xI8,
    Unpack4xU8,
    Unpack2x16Snorm,
    Unpack2x16Unorm,
    Unpack2x16Float,
    Dot4U8Packed,
    Dot4I8Packed,

    // === Atomics and synchronization ===
    AtomicLoad,
    AtomicStore,
    AtomicAdd,
    AtomicSub,
    AtomicMax,
    AtomicMin,
    AtomicAnd,
    AtomicOr,
    AtomicXor,
    AtomicExchange,
    AtomicCompareExchangeWeak,
    StorageBarrier,
    TextureBarrier,
    WorkgroupBarrier,
    WorkgroupUniformLoad,

    // === Textures ===
    TextureDimensions,
    TextureLoad,
    TextureStore,
    TextureNumLayers,
    TextureNumLevels,
    TextureNumSamples,
    TextureSampleLevel,
    TextureSampleBaseClampToEdge,

    /// Recognized but not emulated: derivatives, most sampling variants,
    /// gathers, subgroup and quad operations.
    Unimplemented,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        use Builtin::*;
        Some(match name {
            "abs" => Abs,
            "acos" => Acos,
            "acosh" => Acosh,
            "asin" => Asin,
            "asinh" => Asinh,
            "atan" => Atan,
            "atanh" => Atanh,
            "atan2" => Atan2,
            "ceil" => Ceil,
            "clamp" => Clamp,
            "cos" => Cos,
            "cosh" => Cosh,
            "degrees" => Degrees,
            "exp" => Exp,
            "exp2" => Exp2,
            "floor" => Floor,
            "fma" => Fma,
            "fract" => Fract,
            "frexp" => Frexp,
            "inverseSqrt" => InverseSqrt,
            "ldexp" => Ldexp,
            "log" => Log,
            "log2" => Log2,
            "max" => Max,
            "min" => Min,
            "mix" => Mix,
            "modf" => Modf,
            "pow" => Pow,
            "quantizeToF16" => QuantizeToF16,
            "radians" => Radians,
            "round" => Round,
            "saturate" => Saturate,
            "sign" => Sign,
            "sin" => Sin,
            "sinh" => Sinh,
            "smoothstep" => Smoothstep,
            "sqrt" => Sqrt,
            "step" => Step,
            "tan" => Tan,
            "tanh" => Tanh,
            "trunc" => Trunc,
            "cross" => Cross,
            "determinant" => Determinant,
            "distance" => Distance,
            "dot" => Dot,
            "faceForward" => FaceForward,
            "length" => Length,
            "normalize" => Normalize,
            "reflect" => Reflect,
            "refract" => Refract,
            "transpose" => Transpose,
            "all" => All,
            "any" => Any,
            "select" => Select,
            "arrayLength" => ArrayLength,
            "countLeadingZeros" => CountLeadingZeros,
            "countOneBits" => CountOneBits,
            "countTrailingZeros" => CountTrailingZeros,
            "extractBits" => ExtractBits,
            "firstLeadingBit" => FirstLeadingBit,
            "firstTrailingBit" => FirstTrailingBit,
            "insertBits" => InsertBits,
            "reverseBits" => ReverseBits,
            "bitcast" => Bitcast,
            "pack4x8snorm" => Pack4x8Snorm,
            "pack4x8unorm" => Pack4x8Unorm,
            "pack4xI8" => Pack4xI8,
            "pack4xU8" => Pack4xU8,
            "pack4xI8Clamp" => Pack4xI8Clamp,
            "pack4xU8Clamp" => Pack4xU8Clamp,
            "pack2x16snorm" => Pack2x16Snorm,
            "pack2x16unorm" => Pack2x16Unorm,
            "pack2x16float" => Pack2x16Float,
            "unpack4x8snorm" => Unpack4x8Snorm,
            "unpack4x8unorm" => Unpack4x8Unorm,
            "unpack4xI8" => Unpack4xI8,
            "unpack4xU8" => Unpack4xU8,
            "unpack2x16snorm" => Unpack2x16Snorm,
            "unpack2x16unorm" => Unpack2x16Unorm,
            "unpack2x16float" => Unpack2x16Float,
            "dot4U8Packed" => Dot4U8Packed,
            "dot4I8Packed" => Dot4I8Packed,
            "atomicLoad" => AtomicLoad,
            "atomicStore" => AtomicStore,
            "atomicAdd" => AtomicAdd,
            "atomicSub" => AtomicSub,
            "atomicMax" => AtomicMax,
            "atomicMin" => AtomicMin,
            "atomicAnd" => AtomicAnd,
            "atomicOr" => AtomicOr,
            "atomicXor" => AtomicXor,
            "atomicExchange" => AtomicExchange,
            "atomicCompareExchangeWeak" => AtomicCompareExchangeWeak,
            "storageBarrier" => StorageBarrier,
            "textureBarrier" => TextureBarrier,
            "workgroupBarrier" => WorkgroupBarrier,
            "workgroupUniformLoad" => WorkgroupUniformLoad,
            "textureDimensions" => TextureDimensions,
            "textureLoad" => TextureLoad,
            "textureStore" => TextureStore,
            "textureNumLayers" => TextureNumLayers,
            "textureNumLevels" => TextureNumLevels,
            "textureNumSamples" => TextureNumSamples,
            "textureSampleLevel" => TextureSampleLevel,
            "textureSampleBaseClampToEdge" => TextureSampleBaseClampToEdge,
            "textureSample" | "textureSampleBias" | "textureSampleGrad" | "textureSampleCompare"
            | "textureSampleCompareLevel" | "textureGather" | "textureGatherCompare" | "dpdx"
            | "dpdxCoarse" | "dpdxFine" | "dpdy" | "dpdyCoarse" | "dpdyFine" | "fwidth"
            | "fwidthCoarse" | "fwidthFine" => Unimplemented,
            other if other.starts_with("subgroup") || other.starts_with("quad") => Unimplemented,
            _ => return None,
        })
    }
}

/// Evaluate a builtin on already evaluated arguments. Pointer arguments
/// (`&counter`) arrive as [`Data::Pointer`].
pub fn call(builtin: Builtin, name: &str, template: Option<&TypeRef>, args: &[Data]) -> Result<Data> {
    use Builtin::*;
    match builtin {
        Cross | Determinant | Distance | Dot | FaceForward | Length | Normalize | Reflect
        | Refract | Transpose => geometric::call(builtin, name, args),
        All | Any => {
            let lanes = arg(name, args, 0)?.lanes()?;
            let values = lanes.iter().map(|s| s.as_bool()).collect::<Result<Vec<_>>>()?;
            let result = match builtin {
                All => values.iter().all(|b| *b),
                _ => values.iter().any(|b| *b),
            };
            Ok(Data::Scalar(Scalar::Bool(result)))
        }
        Select => select(name, args),
        ArrayLength => {
            let place = arg(name, args, 0)?.as_place()?;
            match &place.ty.kind {
                TypeKind::Array { .. } => Ok(Data::Scalar(Scalar::U32(place.element_count()?))),
                _ => Err(ExecError::type_error("arrayLength expects a pointer to an array")),
            }
        }
        CountLeadingZeros | CountOneBits | CountTrailingZeros | ExtractBits | FirstLeadingBit
        | FirstTrailingBit | InsertBits | ReverseBits => bits::call(builtin, name, args),
        Bitcast => {
            let target =
                template.ok_or_else(|| ExecError::type_error("bitcast requires a target type"))?;
            bitcast(arg(name, args, 0)?, target)
        }
        Pack4x8Snorm | Pack4x8Unorm | Pack4xI8 | Pack4xU8 | Pack4xI8Clamp | Pack4xU8Clamp
        | Pack2x16Snorm | Pack2x16Unorm | Pack2x16Float | Unpack4x8Snorm | Unpack4x8Unorm
        | Unpack4xI8 | Unpack4xU8 | Unpack2x16Snorm | Unpack2x16Unorm | Unpack2x16Float
        | Dot4U8Packed | Dot4I8Packed => pack::call(builtin, name, args),
        AtomicLoad | AtomicStore | AtomicAdd | AtomicSub | AtomicMax | AtomicMin | AtomicAnd
        | AtomicOr | AtomicXor | AtomicExchange | AtomicCompareExchangeWeak => {
            atomic::call(builtin, name, args)
        }
        // Invocations run one at a time, so barriers have nothing to wait for.
        StorageBarrier | TextureBarrier | WorkgroupBarrier => Ok(Data::Void),
        WorkgroupUniformLoad => arg(name, args, 0)?.as_place()?.load(),
        TextureDimensions | TextureLoad | TextureStore | TextureNumLayers | TextureNumLevels
        | TextureNumSamples | TextureSampleLevel | TextureSampleBaseClampToEdge => {
            texture::call(builtin, name, args)
        }
        Unimplemented => Err(ExecError::unimplemented(format!(
            "builtin '{name}' is not supported"
        ))),
        _ => math::call(builtin, name, args),
    }
}

/// Argument `index`, or a type error naming the function.
pub(crate) fn arg<'a>(name: &str, args: &'a [Data], index: usize) -> Result<&'a Data> {
    args.get(index).ok_or_else(|| {
        ExecError::type_error(format!(
            "'{name}' expects at least {} arguments, got {}",
            index + 1,
            args.len()
        ))
    })
}

pub(crate) fn expect_args(name: &str, args: &[Data], count: usize) -> Result<()> {
    if args.len() != count {
        return Err(ExecError::type_error(format!(
            "'{name}' expects {count} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

fn select(name: &str, args: &[Data]) -> Result<Data> {
    expect_args(name, args, 3)?;
    let (f, t, condition) = (&args[0], &args[1], &args[2]);
    match condition {
        Data::Scalar(c) => Ok(if c.as_bool()? { t.clone() } else { f.clone() }),
        Data::Vector(conditions) => {
            let lanes = Lanes::new(&args[..2])?;
            let picked = conditions
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let lane = lanes.lane(i);
                    Ok(if c.as_bool()? { lane[1] } else { lane[0] })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Data::Vector(picked))
        }
        other => Err(ExecError::type_error(format!(
            "select condition must be bool, found {}",
            other.type_name()
        ))),
    }
}

/// Arguments split into lanes with a common element kind.
///
/// Scalars are broadcast to the width of the vector arguments.
#[derive(Debug, Clone)]
pub(crate) struct Lanes {
    pub kind: ScalarKind,
    pub width: Option<usize>,
    pub args: Vec<Vec<Scalar>>,
}

impl Lanes {
    pub fn new(args: &[Data]) -> Result<Self> {
        let mut width = None;
        for value in args {
            match value {
                Data::Vector(lanes) => match width {
                    None => width = Some(lanes.len()),
                    Some(w) if w != lanes.len() => {
                        return Err(ExecError::type_error(format!(
                            "mismatched vector widths {w} and {}",
                            lanes.len()
                        )))
                    }
                    Some(_) => {}
                },
                Data::Scalar(_) => {}
                other => {
                    return Err(ExecError::type_error(format!(
                        "expected a scalar or vector, found {}",
                        other.type_name()
                    )))
                }
            }
        }
        let refs: Vec<&Data> = args.iter().collect();
        let kind = common_kind(&refs)?;
        let count = width.unwrap_or(1);
        let args = args
            .iter()
            .map(|value| {
                let lanes = value.lanes()?;
                Ok(if lanes.len() == count {
                    lanes.iter().map(|s| s.cast(kind)).collect()
                } else {
                    vec![lanes[0].cast(kind); count]
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { kind, width, args })
    }

    /// Require floating-point lanes; abstract integers become abstract
    /// floats.
    pub fn float(mut self, name: &str) -> Result<Self> {
        match self.kind {
            ScalarKind::AbstractInt => {
                self.kind = ScalarKind::AbstractFloat;
                for arg in &mut self.args {
                    for lane in arg.iter_mut() {
                        *lane = lane.cast(ScalarKind::AbstractFloat);
                    }
                }
                Ok(self)
            }
            kind if kind.is_float() => Ok(self),
            kind => Err(ExecError::type_error(format!(
                "'{name}' expects floating-point arguments, found {}",
                kind.name()
            ))),
        }
    }

    /// Require integer lanes; abstract integers become `i32`.
    pub fn integer(mut self, name: &str) -> Result<Self> {
        match self.kind {
            ScalarKind::AbstractInt => {
                self.kind = ScalarKind::I32;
                for arg in &mut self.args {
                    for lane in arg.iter_mut() {
                        *lane = lane.cast(ScalarKind::I32);
                    }
                }
                Ok(self)
            }
            ScalarKind::I32 | ScalarKind::U32 => Ok(self),
            kind => Err(ExecError::type_error(format!(
                "'{name}' expects integer arguments, found {}",
                kind.name()
            ))),
        }
    }

    pub fn count(&self) -> usize {
        self.width.unwrap_or(1)
    }

    /// Lane `i` of every argument.
    pub fn lane(&self, i: usize) -> Vec<Scalar> {
        self.args.iter().map(|arg| arg[i]).collect()
    }

    /// Argument `index` as floats.
    pub fn floats(&self, index: usize) -> Vec<f64> {
        self.args[index].iter().map(|s| s.as_f64()).collect()
    }

    pub fn map(&self, f: impl Fn(&[Scalar]) -> Result<Scalar>) -> Result<Data> {
        let values = (0..self.count())
            .map(|i| f(&self.lane(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.wrap(values))
    }

    pub fn map_f64(&self, f: impl Fn(&[f64]) -> Result<f64>) -> Result<Data> {
        self.map(|lane| {
            let values: Vec<f64> = lane.iter().map(|s| s.as_f64()).collect();
            Ok(Scalar::from_f64(self.kind, f(&values)?))
        })
    }

    /// Shape results like the arguments: a scalar or a vector.
    pub fn wrap(&self, values: Vec<Scalar>) -> Data {
        match (self.width, values.first()) {
            (None, Some(first)) => Data::Scalar(*first),
            _ => Data::Vector(values),
        }
    }

    pub fn wrap_f64(&self, values: impl IntoIterator<Item = f64>) -> Data {
        self.wrap(values.into_iter().map(|v| Scalar::from_f64(self.kind, v)).collect())
    }
}

/// Allocate a result struct such as `__frexp_result_f32`.
pub(crate) fn result_struct(name: &str, members: Vec<(&str, Data)>) -> Result<Data> {
    let fields = members
        .iter()
        .map(|(member, value)| Ok((member.to_string(), value.type_info()?, None, None)))
        .collect::<Result<Vec<_>>>()?;
    let place = Place::alloc(TypeInfo::structure(name, fields));
    for (member, value) in &members {
        place.member(member)?.store(value)?;
    }
    Ok(Data::Typed(place))
}

/// Type suffix used in result struct names: `f32` or `vec3_f32`.
pub(crate) fn shape_suffix(value: &Data) -> Result<String> {
    let ty = value.type_info()?;
    Ok(match &ty.kind {
        TypeKind::Vector { scalar, count } => format!("vec{count}_{scalar}"),
        _ => ty.name.clone(),
    })
}
