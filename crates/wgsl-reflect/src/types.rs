//! Resolved type descriptions with host-shareable layout.
//!
//! A [`TypeInfo`] is immutable once built and shared as [`TypeRef`]. Sizes,
//! alignments, member offsets and array strides are computed here and only
//! here; the execution engine reads them back instead of re-deriving them.

use crate::formats::TexelFormat;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a resolved type.
pub type TypeRef = Rc<TypeInfo>;

/// Concrete scalar element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    I32,
    U32,
    F32,
    F16,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => ScalarType::Bool,
            "i32" => ScalarType::I32,
            "u32" => ScalarType::U32,
            "f32" => ScalarType::F32,
            "f16" => ScalarType::F16,
            _ => return None,
        })
    }

    /// Host-shareable byte size. `bool` is stored as a 32-bit word.
    pub fn size(self) -> u32 {
        match self {
            ScalarType::F16 => 2,
            _ => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I32 => "i32",
            ScalarType::U32 => "u32",
            ScalarType::F32 => "f32",
            ScalarType::F16 => "f16",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F16)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ScalarType::I32 | ScalarType::U32)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    Function,
    Private,
    Workgroup,
    Uniform,
    Storage,
    Handle,
}

impl AddressSpace {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "function" => AddressSpace::Function,
            "private" => AddressSpace::Private,
            "workgroup" => AddressSpace::Workgroup,
            "uniform" => AddressSpace::Uniform,
            "storage" => AddressSpace::Storage,
            "handle" => AddressSpace::Handle,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            AddressSpace::Function => "function",
            AddressSpace::Private => "private",
            AddressSpace::Workgroup => "workgroup",
            AddressSpace::Uniform => "uniform",
            AddressSpace::Storage => "storage",
            AddressSpace::Handle => "handle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "read" => AccessMode::Read,
            "write" => AccessMode::Write,
            "read_write" => AccessMode::ReadWrite,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
    CubeArray,
}

impl TextureDimension {
    /// Number of coordinates used to address a texel (array layer excluded).
    pub fn coordinate_count(self) -> usize {
        match self {
            TextureDimension::D1 => 1,
            TextureDimension::D2 | TextureDimension::D2Array => 2,
            TextureDimension::D3 | TextureDimension::Cube | TextureDimension::CubeArray => 3,
        }
    }

    pub fn is_arrayed(self) -> bool {
        matches!(self, TextureDimension::D2Array | TextureDimension::CubeArray)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureClass {
    Sampled(ScalarType),
    Multisampled(ScalarType),
    Depth { multisampled: bool },
    Storage { format: TexelFormat, access: AccessMode },
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureType {
    pub dimension: TextureDimension,
    pub class: TextureClass,
}

/// Struct member with its resolved placement.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub ty: TypeRef,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Scalar(ScalarType),
    Vector {
        scalar: ScalarType,
        count: u32,
    },
    Matrix {
        scalar: ScalarType,
        columns: u32,
        rows: u32,
        column_stride: u32,
    },
    Array {
        element: TypeRef,
        /// `None` for runtime-sized arrays.
        count: Option<u32>,
        stride: u32,
    },
    Struct {
        members: Vec<MemberInfo>,
    },
    Atomic(ScalarType),
    Pointer {
        space: AddressSpace,
        pointee: TypeRef,
    },
    Texture(TextureType),
    Sampler {
        comparison: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub size: u32,
    pub align: u32,
    pub kind: TypeKind,
}

pub(crate) fn round_up(align: u32, value: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

impl TypeInfo {
    pub fn scalar(scalar: ScalarType) -> TypeRef {
        Rc::new(TypeInfo {
            name: scalar.name().to_string(),
            size: scalar.size(),
            align: scalar.size(),
            kind: TypeKind::Scalar(scalar),
        })
    }

    pub fn vector(scalar: ScalarType, count: u32) -> TypeRef {
        let size = scalar.size() * count;
        let align = scalar.size() * if count == 2 { 2 } else { 4 };
        Rc::new(TypeInfo {
            name: format!("vec{count}<{scalar}>"),
            size,
            align,
            kind: TypeKind::Vector { scalar, count },
        })
    }

    pub fn matrix(scalar: ScalarType, columns: u32, rows: u32) -> TypeRef {
        let column = TypeInfo::vector(scalar, rows);
        let column_stride = round_up(column.align, column.size);
        Rc::new(TypeInfo {
            name: format!("mat{columns}x{rows}<{scalar}>"),
            size: column_stride * columns,
            align: column.align,
            kind: TypeKind::Matrix {
                scalar,
                columns,
                rows,
                column_stride,
            },
        })
    }

    pub fn array(element: TypeRef, count: Option<u32>, stride: Option<u32>) -> TypeRef {
        let stride = stride.unwrap_or_else(|| round_up(element.align, element.size));
        let name = match count {
            Some(n) => format!("array<{}, {n}>", element.name),
            None => format!("array<{}>", element.name),
        };
        Rc::new(TypeInfo {
            name,
            size: count.map(|n| n * stride).unwrap_or(0),
            align: element.align,
            kind: TypeKind::Array {
                element,
                count,
                stride,
            },
        })
    }

    pub fn atomic(scalar: ScalarType) -> TypeRef {
        Rc::new(TypeInfo {
            name: format!("atomic<{scalar}>"),
            size: 4,
            align: 4,
            kind: TypeKind::Atomic(scalar),
        })
    }

    pub fn pointer(space: AddressSpace, pointee: TypeRef) -> TypeRef {
        Rc::new(TypeInfo {
            name: format!("ptr<{}, {}>", space.name(), pointee.name),
            size: 0,
            align: 1,
            kind: TypeKind::Pointer { space, pointee },
        })
    }

    /// Lay out a struct from `(name, type, @align, @size)` members.
    pub fn structure(name: &str, members: Vec<(String, TypeRef, Option<u32>, Option<u32>)>) -> TypeRef {
        let mut offset = 0;
        let mut struct_align = 1;
        let mut infos = Vec::with_capacity(members.len());
        for (member_name, ty, align_attr, size_attr) in members {
            let align = align_attr.unwrap_or(ty.align);
            let size = size_attr.unwrap_or(ty.size);
            offset = round_up(align, offset);
            infos.push(MemberInfo {
                name: member_name,
                ty,
                offset,
                size,
                align,
            });
            offset += size;
            struct_align = struct_align.max(align);
        }
        Rc::new(TypeInfo {
            name: name.to_string(),
            size: round_up(struct_align, offset),
            align: struct_align,
            kind: TypeKind::Struct { members: infos },
        })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// Element scalar of a scalar, vector, matrix or atomic type.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match &self.kind {
            TypeKind::Scalar(s) | TypeKind::Atomic(s) => Some(*s),
            TypeKind::Vector { scalar, .. } | TypeKind::Matrix { scalar, .. } => Some(*scalar),
            _ => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        match &self.kind {
            TypeKind::Struct { members } => members.iter().find(|m| m.name == name),
            _ => None,
        }
    }

    /// Structural equality ignoring the cached name.
    pub fn same_layout(&self, other: &TypeInfo) -> bool {
        self.size == other.size && self.align == other.align && self.kind == other.kind
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_alignment() {
        let v2 = TypeInfo::vector(ScalarType::F32, 2);
        let v3 = TypeInfo::vector(ScalarType::F32, 3);
        let v3h = TypeInfo::vector(ScalarType::F16, 3);
        assert_eq!((v2.size, v2.align), (8, 8));
        assert_eq!((v3.size, v3.align), (12, 16));
        assert_eq!((v3h.size, v3h.align), (6, 8));
    }

    #[test]
    fn test_matrix_column_stride() {
        let m = TypeInfo::matrix(ScalarType::F32, 3, 3);
        assert_eq!(m.size, 48);
        assert_eq!(m.align, 16);
        let m = TypeInfo::matrix(ScalarType::F32, 4, 2);
        assert_eq!(m.size, 32);
        assert_eq!(m.align, 8);
    }

    #[test]
    fn test_array_stride_rounds_to_alignment() {
        let arr = TypeInfo::array(TypeInfo::vector(ScalarType::F32, 3), Some(4), None);
        match &arr.kind {
            TypeKind::Array { stride, .. } => assert_eq!(*stride, 16),
            _ => unreachable!(),
        }
        assert_eq!(arr.size, 64);
    }

    #[test]
    fn test_struct_member_offsets() {
        let s = TypeInfo::structure(
            "S",
            vec![
                ("a".into(), TypeInfo::scalar(ScalarType::F32), None, None),
                ("b".into(), TypeInfo::vector(ScalarType::F32, 3), None, None),
                ("c".into(), TypeInfo::scalar(ScalarType::U32), None, None),
                ("d".into(), TypeInfo::scalar(ScalarType::F32), Some(16), None),
            ],
        );
        let offsets: Vec<u32> = match &s.kind {
            TypeKind::Struct { members } => members.iter().map(|m| m.offset).collect(),
            _ => unreachable!(),
        };
        assert_eq!(offsets, vec![0, 16, 28, 32]);
        assert_eq!(s.size, 48);
        assert_eq!(s.align, 16);
    }
}
