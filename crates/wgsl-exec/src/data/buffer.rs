//! Shared byte buffers and typed places within them.

use super::f16::{f16_to_f32, f32_to_f16};
use super::{Data, Scalar};
use crate::error::{ExecError, Result};
use bytemuck::Pod;
use std::cell::RefCell;
use std::rc::Rc;
use wgsl_reflect::{ScalarType, TypeInfo, TypeKind, TypeRef};

/// Raw memory shared by every view of one variable or resource.
///
/// Cloning the handle shares the bytes; hosts keep a clone of a bound
/// buffer to read results back after a dispatch.
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer(Rc<RefCell<Vec<u8>>>);

impl ByteBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes)))
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Buffer holding the bytes of `values`.
    pub fn from_slice<T: Pod>(values: &[T]) -> Self {
        Self::new(bytemuck::cast_slice(values).to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    /// Reinterpret the contents as `T`s (trailing partial elements dropped).
    pub fn read_as<T: Pod>(&self) -> Vec<T> {
        let bytes = self.0.borrow();
        let whole = bytes.len() - bytes.len() % std::mem::size_of::<T>();
        bytemuck::pod_collect_to_vec(&bytes[..whole])
    }

    /// Same underlying memory.
    pub fn ptr_eq(&self, other: &ByteBuffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let bytes = self.0.borrow();
        bytes
            .get(offset..offset + len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| out_of_range(offset, len, bytes.len()))
    }

    pub fn write_bytes(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self.0.borrow_mut();
        let total = bytes.len();
        let target = bytes
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| out_of_range(offset, data.len(), total))?;
        target.copy_from_slice(data);
        Ok(())
    }

    pub fn read<T: Pod>(&self, offset: usize) -> Result<T> {
        let bytes = self.read_bytes(offset, std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    pub fn write<T: Pod>(&self, offset: usize, value: T) -> Result<()> {
        self.write_bytes(offset, bytemuck::bytes_of(&value))
    }
}

fn out_of_range(offset: usize, len: usize, total: usize) -> ExecError {
    ExecError::bounds(format!(
        "access of {len} bytes at offset {offset} exceeds buffer of {total} bytes"
    ))
}

/// A typed location: `ty` at byte `offset` of `buffer`.
#[derive(Debug, Clone)]
pub struct Place {
    pub buffer: ByteBuffer,
    pub offset: u32,
    pub ty: TypeRef,
}

impl Place {
    pub fn new(buffer: ByteBuffer, offset: u32, ty: TypeRef) -> Self {
        Self { buffer, offset, ty }
    }

    /// Fresh zero-initialized storage for `ty`.
    pub fn alloc(ty: TypeRef) -> Self {
        let buffer = ByteBuffer::zeroed(ty.size as usize);
        Self::new(buffer, 0, ty)
    }

    /// Copy the bytes of this place into a buffer of its own.
    pub fn copy_to_new(&self) -> Result<Place> {
        let len = self.byte_len()?;
        let bytes = self.buffer.read_bytes(self.offset as usize, len)?;
        Ok(Place::new(ByteBuffer::new(bytes), 0, self.ty.clone()))
    }

    /// Bytes covered by this place; runtime-sized arrays extend to the end
    /// of the buffer.
    pub fn byte_len(&self) -> Result<usize> {
        match &self.ty.kind {
            TypeKind::Array { count: None, .. } => {
                Ok(self.buffer.len().saturating_sub(self.offset as usize))
            }
            _ => Ok(self.ty.size as usize),
        }
    }

    fn at(&self, delta: u32, ty: TypeRef) -> Place {
        Place::new(self.buffer.clone(), self.offset + delta, ty)
    }

    /// Number of elements of an array, vector or matrix (columns).
    pub fn element_count(&self) -> Result<u32> {
        match &self.ty.kind {
            TypeKind::Array {
                count: Some(n), ..
            } => Ok(*n),
            TypeKind::Array {
                count: None,
                stride,
                ..
            } => Ok((self.byte_len()? as u32) / (*stride).max(1)),
            TypeKind::Vector { count, .. } => Ok(*count),
            TypeKind::Matrix { columns, .. } => Ok(*columns),
            _ => Err(ExecError::type_error(format!(
                "'{}' cannot be indexed",
                self.ty.name
            ))),
        }
    }

    pub fn member(&self, name: &str) -> Result<Place> {
        let member = self.ty.member(name).ok_or_else(|| {
            ExecError::binding(format!("'{}' has no member '{name}'", self.ty.name))
        })?;
        Ok(self.at(member.offset, member.ty.clone()))
    }

    pub fn element(&self, index: i64) -> Result<Place> {
        let count = self.element_count()?;
        if index < 0 || index >= count as i64 {
            return Err(ExecError::bounds(format!(
                "index {index} out of bounds for '{}' with {count} elements",
                self.ty.name
            )));
        }
        let index = index as u32;
        match &self.ty.kind {
            TypeKind::Array {
                element, stride, ..
            } => Ok(self.at(index * stride, element.clone())),
            TypeKind::Vector { scalar, .. } => {
                Ok(self.at(index * scalar.size(), TypeInfo::scalar(*scalar)))
            }
            TypeKind::Matrix {
                scalar,
                rows,
                column_stride,
                ..
            } => Ok(self.at(index * column_stride, TypeInfo::vector(*scalar, *rows))),
            _ => Err(ExecError::internal("indexed place has no elements")),
        }
    }

    fn read_scalar(&self, delta: u32, ty: ScalarType) -> Result<Scalar> {
        let offset = (self.offset + delta) as usize;
        Ok(match ty {
            ScalarType::Bool => Scalar::Bool(self.buffer.read::<u32>(offset)? != 0),
            ScalarType::I32 => Scalar::I32(self.buffer.read(offset)?),
            ScalarType::U32 => Scalar::U32(self.buffer.read(offset)?),
            ScalarType::F32 => Scalar::F32(self.buffer.read(offset)?),
            ScalarType::F16 => Scalar::F16(f16_to_f32(self.buffer.read(offset)?)),
        })
    }

    fn write_scalar(&self, delta: u32, ty: ScalarType, value: Scalar) -> Result<()> {
        let offset = (self.offset + delta) as usize;
        match value.convert(ty) {
            Scalar::Bool(b) => self.buffer.write(offset, b as u32),
            Scalar::I32(v) => self.buffer.write(offset, v),
            Scalar::U32(v) => self.buffer.write(offset, v),
            Scalar::F32(v) => self.buffer.write(offset, v),
            Scalar::F16(v) => self.buffer.write(offset, f32_to_f16(v)),
            Scalar::AbstractInt(_) | Scalar::AbstractFloat(_) => {
                Err(ExecError::internal("abstract value reached memory"))
            }
        }
    }

    /// Read the value stored here. Structs and arrays come back as a view
    /// of this place rather than a copy.
    pub fn load(&self) -> Result<Data> {
        match &self.ty.kind {
            TypeKind::Scalar(s) | TypeKind::Atomic(s) => Ok(Data::Scalar(self.read_scalar(0, *s)?)),
            TypeKind::Vector { scalar, count } => {
                let lanes = (0..*count)
                    .map(|i| self.read_scalar(i * scalar.size(), *scalar))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Data::Vector(lanes))
            }
            TypeKind::Matrix {
                scalar,
                columns,
                rows,
                column_stride,
            } => {
                let mut values = Vec::with_capacity((columns * rows) as usize);
                for c in 0..*columns {
                    for r in 0..*rows {
                        values.push(self.read_scalar(c * column_stride + r * scalar.size(), *scalar)?);
                    }
                }
                Ok(Data::Matrix {
                    columns: *columns,
                    rows: *rows,
                    values,
                })
            }
            TypeKind::Struct { .. } | TypeKind::Array { .. } => Ok(Data::Typed(self.clone())),
            _ => Err(ExecError::type_error(format!(
                "'{}' is not stored in memory",
                self.ty.name
            ))),
        }
    }

    /// Write `value` here, converting scalars to the stored type.
    pub fn store(&self, value: &Data) -> Result<()> {
        let mismatch = || {
            ExecError::type_error(format!(
                "cannot store {} into '{}'",
                value.type_name(),
                self.ty.name
            ))
        };
        match (&self.ty.kind, value) {
            (TypeKind::Scalar(s) | TypeKind::Atomic(s), Data::Scalar(v)) => {
                self.write_scalar(0, *s, *v)
            }
            (TypeKind::Vector { scalar, count }, Data::Vector(lanes)) if lanes.len() == *count as usize => {
                for (i, lane) in lanes.iter().enumerate() {
                    self.write_scalar(i as u32 * scalar.size(), *scalar, *lane)?;
                }
                Ok(())
            }
            (
                TypeKind::Matrix {
                    scalar,
                    columns,
                    rows,
                    column_stride,
                },
                Data::Matrix {
                    columns: c,
                    rows: r,
                    values,
                },
            ) if c == columns && r == rows => {
                for col in 0..*columns {
                    for row in 0..*rows {
                        let value = values[(col * rows + row) as usize];
                        self.write_scalar(col * column_stride + row * scalar.size(), *scalar, value)?;
                    }
                }
                Ok(())
            }
            (TypeKind::Struct { .. } | TypeKind::Array { .. }, Data::Typed(source)) => {
                let len = self.byte_len()?;
                if !same_type(&self.ty, &source.ty) || source.byte_len()? != len {
                    return Err(mismatch());
                }
                let bytes = source.buffer.read_bytes(source.offset as usize, len)?;
                self.buffer.write_bytes(self.offset as usize, &bytes)
            }
            _ => Err(mismatch()),
        }
    }
}

/// Whether values of `a` and `b` share one layout and element types, so a
/// byte copy between them keeps every value.
fn same_type(a: &TypeInfo, b: &TypeInfo) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    match (&a.kind, &b.kind) {
        (
            TypeKind::Array {
                element: x,
                count: m,
                stride: s,
            },
            TypeKind::Array {
                element: y,
                count: n,
                stride: t,
            },
        ) => m == n && s == t && same_type(x, y),
        (TypeKind::Struct { members: x }, TypeKind::Struct { members: y }) => {
            a.name == b.name
                && x.len() == y.len()
                && x.iter().zip(y).all(|(p, q)| {
                    p.name == q.name && p.offset == q.offset && same_type(&p.ty, &q.ty)
                })
        }
        (TypeKind::Matrix { .. }, TypeKind::Matrix { .. })
        | (TypeKind::Vector { .. }, TypeKind::Vector { .. })
        | (TypeKind::Scalar(_), TypeKind::Scalar(_))
        | (TypeKind::Atomic(_), TypeKind::Atomic(_)) => a.kind == b.kind,
        _ => false,
    }
}
