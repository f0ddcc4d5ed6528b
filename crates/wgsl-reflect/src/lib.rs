//! Type layout and resource reflection for WGSL modules
//!
//! Resolves every type a module names into a [`TypeInfo`] carrying
//! host-shareable size, alignment, member offsets and array strides, and
//! lists the resources, overrides and entry points a host has to provide
//! for. The execution engine reads layouts from here and never computes
//! them itself.
//!
//! ```
//! let reflection = wgsl_reflect::Reflection::from_source(
//!     "struct S { a: f32, b: vec3<f32> }
//!      @group(0) @binding(0) var<uniform> u: S;",
//! ).unwrap();
//! let s = reflection.types.get_struct("S").unwrap();
//! assert_eq!(s.size, 32);
//! assert_eq!(reflection.uniforms[0].name, "u");
//! ```

pub mod consts;
pub mod error;
pub mod formats;
pub mod layout;
pub mod reflection;
pub mod types;

pub use consts::eval_const_int;
pub use error::{ReflectError, Result};
pub use formats::{SampleKind, TexelFormat};
pub use layout::{matrix_dims, predeclared_alias, TypeTable};
pub use reflection::{
    BuiltinInput, EntryPoint, OverrideInfo, Reflection, ResourceInfo, ResourceKind, Stage,
    WorkgroupDim,
};
pub use types::{
    AccessMode, AddressSpace, MemberInfo, ScalarType, TextureClass, TextureDimension,
    TextureType, TypeInfo, TypeKind, TypeRef,
};
