//! Runtime values.
//!
//! Every value the interpreter produces is a [`Data`]. Scalars, vectors and
//! matrices are held by value; structs and arrays live in a [`ByteBuffer`]
//! and are addressed through a [`Place`] so member and element access view
//! the same bytes instead of copying them. Pointers hold a place, never a
//! copy, so every alias observes the latest write.

pub mod buffer;
pub mod convert;
pub mod f16;
pub mod ops;
pub mod texel;

pub use buffer::{ByteBuffer, Place};
pub use texel::{TextureData, TextureDescriptor};

use crate::error::{ExecError, Result};
use std::fmt;
use wgsl_ast::Literal;
use wgsl_reflect::{ScalarType, TypeInfo, TypeKind, TypeRef};

/// Scalar type including the abstract numeric types of unsuffixed literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I32,
    U32,
    F32,
    F16,
    AbstractInt,
    AbstractFloat,
}

impl ScalarKind {
    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F16 | ScalarKind::AbstractFloat)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ScalarKind::I32 | ScalarKind::U32 | ScalarKind::AbstractInt)
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, ScalarKind::AbstractInt | ScalarKind::AbstractFloat)
    }

    pub fn concrete(self) -> Option<ScalarType> {
        Some(match self {
            ScalarKind::Bool => ScalarType::Bool,
            ScalarKind::I32 => ScalarType::I32,
            ScalarKind::U32 => ScalarType::U32,
            ScalarKind::F32 => ScalarType::F32,
            ScalarKind::F16 => ScalarType::F16,
            ScalarKind::AbstractInt | ScalarKind::AbstractFloat => return None,
        })
    }

    /// The type an abstract value takes when bound without a declared type.
    pub fn concretize(self) -> ScalarType {
        match self {
            ScalarKind::AbstractInt => ScalarType::I32,
            ScalarKind::AbstractFloat => ScalarType::F32,
            other => other.concrete().unwrap_or(ScalarType::F32),
        }
    }

    /// Common type of two operands: equal kinds agree, abstract kinds adopt
    /// the other operand's type. `None` for mismatched concrete types.
    pub fn unify(self, other: ScalarKind) -> Option<ScalarKind> {
        use ScalarKind::*;
        match (self, other) {
            (a, b) if a == b => Some(a),
            (AbstractInt, AbstractFloat) | (AbstractFloat, AbstractInt) => Some(AbstractFloat),
            (AbstractInt | AbstractFloat, concrete) | (concrete, AbstractInt | AbstractFloat) => {
                Some(concrete)
            }
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::AbstractInt => "abstract-int",
            ScalarKind::AbstractFloat => "abstract-float",
            other => other.concretize().name(),
        }
    }
}

impl From<ScalarType> for ScalarKind {
    fn from(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => ScalarKind::Bool,
            ScalarType::I32 => ScalarKind::I32,
            ScalarType::U32 => ScalarKind::U32,
            ScalarType::F32 => ScalarKind::F32,
            ScalarType::F16 => ScalarKind::F16,
        }
    }
}

/// One scalar value. `F16` keeps its value as an `f32` already rounded to
/// half precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(f32),
    F16(f32),
    AbstractInt(i64),
    AbstractFloat(f64),
}

impl Scalar {
    pub fn from_literal(literal: &Literal) -> Self {
        match *literal {
            Literal::Bool(b) => Scalar::Bool(b),
            Literal::AbstractInt(v) => Scalar::AbstractInt(v),
            Literal::I32(v) => Scalar::I32(v),
            Literal::U32(v) => Scalar::U32(v),
            Literal::AbstractFloat(v) => Scalar::AbstractFloat(v),
            Literal::F32(v) => Scalar::F32(v),
            Literal::F16(v) => Scalar::F16(f16::quantize(v)),
        }
    }

    pub fn zero(kind: ScalarKind) -> Self {
        Scalar::from_i64(kind, 0)
    }

    pub fn kind(self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F16(_) => ScalarKind::F16,
            Scalar::AbstractInt(_) => ScalarKind::AbstractInt,
            Scalar::AbstractFloat(_) => ScalarKind::AbstractFloat,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => b as u8 as f64,
            Scalar::I32(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::F32(v) | Scalar::F16(v) => v as f64,
            Scalar::AbstractInt(v) => v as f64,
            Scalar::AbstractFloat(v) => v,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Scalar::Bool(b) => b as i64,
            Scalar::I32(v) => v as i64,
            Scalar::U32(v) => v as i64,
            Scalar::F32(v) | Scalar::F16(v) => v as i64,
            Scalar::AbstractInt(v) => v,
            Scalar::AbstractFloat(v) => v as i64,
        }
    }

    /// Build a value of `kind` from a float result.
    pub fn from_f64(kind: ScalarKind, value: f64) -> Self {
        match kind {
            ScalarKind::Bool => Scalar::Bool(value != 0.0),
            ScalarKind::I32 => Scalar::I32(value as i32),
            ScalarKind::U32 => Scalar::U32(value as u32),
            ScalarKind::F32 => Scalar::F32(value as f32),
            ScalarKind::F16 => Scalar::F16(f16::quantize(value as f32)),
            ScalarKind::AbstractInt => Scalar::AbstractInt(value as i64),
            ScalarKind::AbstractFloat => Scalar::AbstractFloat(value),
        }
    }

    /// Build a value of `kind` from an integer result, wrapping to 32 bits.
    pub fn from_i64(kind: ScalarKind, value: i64) -> Self {
        match kind {
            ScalarKind::Bool => Scalar::Bool(value != 0),
            ScalarKind::I32 => Scalar::I32(value as i32),
            ScalarKind::U32 => Scalar::U32(value as u32),
            ScalarKind::F32 => Scalar::F32(value as f32),
            ScalarKind::F16 => Scalar::F16(f16::quantize(value as f32)),
            ScalarKind::AbstractInt => Scalar::AbstractInt(value),
            ScalarKind::AbstractFloat => Scalar::AbstractFloat(value as f64),
        }
    }

    pub fn as_bool(self) -> Result<bool> {
        match self {
            Scalar::Bool(b) => Ok(b),
            other => Err(ExecError::type_error(format!(
                "expected bool, found {}",
                other.kind().name()
            ))),
        }
    }

    /// Integer value usable as an index or count.
    pub fn as_index(self) -> Result<i64> {
        match self {
            Scalar::I32(_) | Scalar::U32(_) | Scalar::AbstractInt(_) => Ok(self.as_i64()),
            other => Err(ExecError::type_error(format!(
                "index must be an integer, found {}",
                other.kind().name()
            ))),
        }
    }

    pub fn concretize(self) -> Self {
        match self {
            Scalar::AbstractInt(_) | Scalar::AbstractFloat(_) => {
                self.convert(self.kind().concretize())
            }
            other => other,
        }
    }

    /// Convert to `kind`, keeping abstract targets abstract.
    pub fn cast(self, kind: ScalarKind) -> Self {
        match kind.concrete() {
            Some(ty) => self.convert(ty),
            None if kind == ScalarKind::AbstractFloat => Scalar::AbstractFloat(self.as_f64()),
            None => Scalar::AbstractInt(self.as_i64()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::I32(v) => write!(f, "{v}i"),
            Scalar::U32(v) => write!(f, "{v}u"),
            Scalar::F32(v) => write!(f, "{v}f"),
            Scalar::F16(v) => write!(f, "{v}h"),
            Scalar::AbstractInt(v) => write!(f, "{v}"),
            Scalar::AbstractFloat(v) => write!(f, "{v:?}"),
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Data {
    /// Result of a call that returns nothing.
    Void,
    Scalar(Scalar),
    /// 2 to 4 lanes of one scalar kind.
    Vector(Vec<Scalar>),
    /// Column-major values of a `matCxR`.
    Matrix {
        columns: u32,
        rows: u32,
        values: Vec<Scalar>,
    },
    /// Struct or array viewed in place.
    Typed(Place),
    Pointer(Place),
    Texture(TextureData),
    Sampler {
        comparison: bool,
    },
}

impl Data {
    pub fn type_name(&self) -> String {
        match self {
            Data::Void => "void".to_string(),
            Data::Scalar(s) => s.kind().name().to_string(),
            Data::Vector(lanes) => format!(
                "vec{}<{}>",
                lanes.len(),
                lanes.first().map(|s| s.kind().name()).unwrap_or("?")
            ),
            Data::Matrix { columns, rows, .. } => format!("mat{columns}x{rows}"),
            Data::Typed(place) => place.ty.name.clone(),
            Data::Pointer(place) => format!("ptr<{}>", place.ty.name),
            Data::Texture(_) => "texture".to_string(),
            Data::Sampler { .. } => "sampler".to_string(),
        }
    }

    pub fn as_scalar(&self) -> Result<Scalar> {
        match self {
            Data::Scalar(s) => Ok(*s),
            other => Err(ExecError::type_error(format!(
                "expected a scalar, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.as_scalar()?.as_bool()
    }

    pub fn as_place(&self) -> Result<&Place> {
        match self {
            Data::Pointer(place) => Ok(place),
            other => Err(ExecError::type_error(format!(
                "expected a pointer, found {}",
                other.type_name()
            ))),
        }
    }

    /// Lanes of a scalar (one lane) or vector.
    pub fn lanes(&self) -> Result<&[Scalar]> {
        match self {
            Data::Scalar(s) => Ok(std::slice::from_ref(s)),
            Data::Vector(lanes) => Ok(lanes),
            other => Err(ExecError::type_error(format!(
                "expected a scalar or vector, found {}",
                other.type_name()
            ))),
        }
    }

    /// Concretize abstract scalars, as happens when a value is bound.
    pub fn concretize(self) -> Data {
        match self {
            Data::Scalar(s) => Data::Scalar(s.concretize()),
            Data::Vector(lanes) => Data::Vector(lanes.into_iter().map(Scalar::concretize).collect()),
            Data::Matrix {
                columns,
                rows,
                values,
            } => Data::Matrix {
                columns,
                rows,
                values: values.into_iter().map(Scalar::concretize).collect(),
            },
            other => other,
        }
    }

    /// Copy a struct or array out of its buffer so later writes to the
    /// source are not observed.
    pub fn detach(self) -> Result<Data> {
        match self {
            Data::Typed(place) => Ok(Data::Typed(place.copy_to_new()?)),
            other => Ok(other),
        }
    }

    /// Layout of this value, for declarations without an explicit type.
    pub fn type_info(&self) -> Result<TypeRef> {
        match self {
            Data::Scalar(s) => Ok(TypeInfo::scalar(s.kind().concretize())),
            Data::Vector(lanes) => {
                let kind = lanes.first().map(|s| s.kind()).unwrap_or(ScalarKind::F32);
                Ok(TypeInfo::vector(kind.concretize(), lanes.len() as u32))
            }
            Data::Matrix {
                columns,
                rows,
                values,
            } => {
                let kind = values.first().map(|s| s.kind()).unwrap_or(ScalarKind::F32);
                Ok(TypeInfo::matrix(kind.concretize(), *columns, *rows))
            }
            Data::Typed(place) => Ok(place.ty.clone()),
            other => Err(ExecError::type_error(format!(
                "cannot infer a storable type for {}",
                other.type_name()
            ))),
        }
    }

    /// Zero value of a type.
    pub fn zero(ty: &TypeRef) -> Result<Data> {
        match &ty.kind {
            TypeKind::Struct { .. } | TypeKind::Array { .. } => Ok(Data::Typed(Place::alloc(ty.clone()))),
            _ => Place::alloc(ty.clone()).load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_abstract_adopts_concrete() {
        assert_eq!(ScalarKind::AbstractInt.unify(ScalarKind::U32), Some(ScalarKind::U32));
        assert_eq!(ScalarKind::F32.unify(ScalarKind::AbstractFloat), Some(ScalarKind::F32));
        assert_eq!(
            ScalarKind::AbstractInt.unify(ScalarKind::AbstractFloat),
            Some(ScalarKind::AbstractFloat)
        );
        assert_eq!(ScalarKind::I32.unify(ScalarKind::U32), None);
    }

    #[test]
    fn test_concretize() {
        assert_eq!(Scalar::AbstractInt(3).concretize(), Scalar::I32(3));
        assert_eq!(Scalar::AbstractFloat(0.5).concretize(), Scalar::F32(0.5));
        assert_eq!(Scalar::U32(7).concretize(), Scalar::U32(7));
    }

    #[test]
    fn test_from_i64_wraps() {
        assert_eq!(Scalar::from_i64(ScalarKind::I32, 1 << 31), Scalar::I32(i32::MIN));
        assert_eq!(Scalar::from_i64(ScalarKind::U32, -1), Scalar::U32(u32::MAX));
    }

    #[test]
    fn test_type_info_of_vector() {
        let v = Data::Vector(vec![Scalar::AbstractFloat(1.0); 3]);
        let ty = v.type_info().unwrap();
        assert_eq!(ty.name, "vec3<f32>");
        assert_eq!(ty.size, 12);
    }
}
