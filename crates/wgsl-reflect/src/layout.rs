//! Type resolution: syntactic [`TypeExpr`] to laid-out [`TypeInfo`].
//!
//! [`TypeTable`] is built once per module. Struct and alias declarations may
//! appear in any order; they are resolved on demand while building, with
//! self-containing structs rejected.

use crate::consts::eval_const_int;
use crate::error::{ReflectError, Result};
use crate::formats::TexelFormat;
use crate::types::{
    AccessMode, AddressSpace, ScalarType, TextureClass, TextureDimension, TextureType, TypeInfo,
    TypeKind, TypeRef,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;
use wgsl_ast::{AliasDecl, Attribute, Item, Module, StructDecl, TemplateArg, TypeExpr};

/// Source of user-declared names during resolution.
trait TypeScope {
    fn named_type(&mut self, name: &str, line: u32) -> Result<Option<TypeRef>>;
    fn const_int(&self, name: &str) -> Option<i64>;
}

/// Resolved user types and integer constants of one module.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: IndexMap<String, TypeRef>,
    struct_names: Vec<String>,
    consts: HashMap<String, i64>,
}

impl TypeTable {
    pub fn from_module(module: &Module) -> Result<Self> {
        Self::build(module, &HashMap::new())
    }

    /// Build with override values taking precedence over declared defaults.
    pub fn build(module: &Module, overrides: &HashMap<String, i64>) -> Result<Self> {
        let consts = fold_module_consts(module, overrides);

        let mut builder = Builder {
            structs: HashMap::new(),
            aliases: HashMap::new(),
            table: TypeTable {
                consts,
                ..Default::default()
            },
            in_progress: Vec::new(),
        };
        for item in &module.items {
            match item {
                Item::Struct(decl) => {
                    builder.structs.insert(decl.name.as_str(), decl);
                }
                Item::Alias(decl) => {
                    builder.aliases.insert(decl.name.as_str(), decl);
                }
                _ => {}
            }
        }

        for item in &module.items {
            match item {
                Item::Struct(decl) => {
                    builder.named_type(&decl.name, decl.span.line)?;
                    builder.table.struct_names.push(decl.name.clone());
                }
                Item::Alias(decl) => {
                    builder.named_type(&decl.name, decl.span.line)?;
                }
                _ => {}
            }
        }

        Ok(builder.table)
    }

    /// Resolve a type expression against this module.
    pub fn resolve(&self, ty: &TypeExpr) -> Result<TypeRef> {
        resolve_type(&mut Lookup(self), ty)
    }

    /// Resolve a bare type name (`f32`, `vec3f`, a struct or alias).
    pub fn resolve_name(&self, name: &str) -> Option<TypeRef> {
        if let Some(scalar) = ScalarType::from_name(name) {
            return Some(TypeInfo::scalar(scalar));
        }
        predeclared_alias(name).or_else(|| self.types.get(name).cloned())
    }

    pub fn get_struct(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name).filter(|t| t.is_struct())
    }

    /// Structs in declaration order.
    pub fn structs(&self) -> impl Iterator<Item = &TypeRef> {
        self.struct_names.iter().filter_map(|n| self.types.get(n))
    }

    pub fn const_int(&self, name: &str) -> Option<i64> {
        self.consts.get(name).copied()
    }
}

struct Lookup<'a>(&'a TypeTable);

impl TypeScope for Lookup<'_> {
    fn named_type(&mut self, name: &str, _line: u32) -> Result<Option<TypeRef>> {
        Ok(self.0.types.get(name).cloned())
    }

    fn const_int(&self, name: &str) -> Option<i64> {
        self.0.const_int(name)
    }
}

struct Builder<'m> {
    structs: HashMap<&'m str, &'m StructDecl>,
    aliases: HashMap<&'m str, &'m AliasDecl>,
    table: TypeTable,
    in_progress: Vec<String>,
}

impl TypeScope for Builder<'_> {
    fn named_type(&mut self, name: &str, _line: u32) -> Result<Option<TypeRef>> {
        if let Some(ty) = self.table.types.get(name) {
            return Ok(Some(ty.clone()));
        }
        if self.in_progress.iter().any(|n| n == name) {
            return Err(ReflectError::RecursiveStruct(name.to_string()));
        }

        let resolved = if let Some(decl) = self.structs.get(name).copied() {
            self.in_progress.push(name.to_string());
            let ty = self.build_struct(decl);
            self.in_progress.pop();
            ty?
        } else if let Some(decl) = self.aliases.get(name).copied() {
            self.in_progress.push(name.to_string());
            let ty = resolve_type(self, &decl.ty);
            self.in_progress.pop();
            ty?
        } else {
            return Ok(None);
        };

        self.table.types.insert(name.to_string(), resolved.clone());
        Ok(Some(resolved))
    }

    fn const_int(&self, name: &str) -> Option<i64> {
        self.table.const_int(name)
    }
}

impl Builder<'_> {
    fn build_struct(&mut self, decl: &StructDecl) -> Result<TypeRef> {
        let mut members = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            let ty = resolve_type(self, &member.ty)?;
            let align = self.attribute_int(&member.attributes, "align")?;
            let size = self.attribute_int(&member.attributes, "size")?;
            members.push((member.name.clone(), ty, align, size));
        }
        Ok(TypeInfo::structure(&decl.name, members))
    }

    fn attribute_int(&self, attributes: &[Attribute], name: &str) -> Result<Option<u32>> {
        match Attribute::find(attributes, name).and_then(|a| a.args.first()) {
            Some(expr) => {
                let v = eval_const_int(expr, &|n| self.table.const_int(n))?;
                Ok(Some(v as u32))
            }
            None => Ok(None),
        }
    }
}

/// Fold integer `const` and `override` declarations.
///
/// Declarations may reference later ones, so passes repeat until nothing
/// new folds. Non-integer constants are simply absent.
fn fold_module_consts(module: &Module, overrides: &HashMap<String, i64>) -> HashMap<String, i64> {
    let mut values: HashMap<String, i64> = overrides.clone();
    loop {
        let mut progressed = false;
        for item in &module.items {
            let (name, init) = match item {
                Item::Const(decl) => (&decl.name, Some(&decl.init)),
                Item::Override(decl) => (&decl.name, decl.init.as_ref()),
                _ => continue,
            };
            if values.contains_key(name) {
                continue;
            }
            let Some(init) = init else { continue };
            let folded = eval_const_int(init, &|n| values.get(n).copied());
            if let Ok(v) = folded {
                values.insert(name.clone(), v);
                progressed = true;
            }
        }
        if !progressed {
            return values;
        }
    }
}

/// `vec3f`, `vec2i`, `mat4x4f`, `mat2x2h` and friends.
pub fn predeclared_alias(name: &str) -> Option<TypeRef> {
    let split = name.len().checked_sub(1)?;
    let (base, suffix) = name.split_at(split);
    let scalar = match suffix {
        "f" => ScalarType::F32,
        "h" => ScalarType::F16,
        "i" => ScalarType::I32,
        "u" => ScalarType::U32,
        _ => return None,
    };
    if let Some(count) = base.strip_prefix("vec").and_then(vector_width) {
        return Some(TypeInfo::vector(scalar, count));
    }
    if scalar.is_float() {
        if let Some((columns, rows)) = matrix_dims(base) {
            return Some(TypeInfo::matrix(scalar, columns, rows));
        }
    }
    None
}

fn vector_width(text: &str) -> Option<u32> {
    match text {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// `mat3x2` -> `(3, 2)`.
pub fn matrix_dims(name: &str) -> Option<(u32, u32)> {
    let dims = name.strip_prefix("mat")?;
    let (c, r) = dims.split_once('x')?;
    Some((vector_width(c)?, vector_width(r)?))
}

fn invalid(ty: &TypeExpr, reason: impl Into<String>) -> ReflectError {
    ReflectError::InvalidType {
        name: ty.to_string(),
        reason: reason.into(),
        line: ty.span.line,
    }
}

fn resolve_type<S: TypeScope>(scope: &mut S, ty: &TypeExpr) -> Result<TypeRef> {
    let name = ty.name.as_str();
    if let Some(scalar) = ScalarType::from_name(name) {
        return Ok(TypeInfo::scalar(scalar));
    }
    if let Some(alias) = predeclared_alias(name) {
        return Ok(alias);
    }
    if let Some(count) = name.strip_prefix("vec").and_then(vector_width) {
        let scalar = scalar_arg(scope, ty)?;
        return Ok(TypeInfo::vector(scalar, count));
    }
    if let Some((columns, rows)) = matrix_dims(name) {
        let scalar = scalar_arg(scope, ty)?;
        return Ok(TypeInfo::matrix(scalar, columns, rows));
    }

    match name {
        "array" => {
            let element = match ty.arg_type(0) {
                Some(inner) => resolve_type(scope, inner)?,
                None => return Err(invalid(ty, "missing element type")),
            };
            let count = match ty.args.get(1) {
                Some(arg) => Some(array_count(scope, ty, arg)?),
                None => None,
            };
            Ok(TypeInfo::array(element, count, None))
        }
        "atomic" => Ok(TypeInfo::atomic(scalar_arg(scope, ty)?)),
        "ptr" => {
            let space = ty
                .args
                .first()
                .and_then(|a| a.as_name())
                .and_then(AddressSpace::from_name)
                .ok_or_else(|| invalid(ty, "missing address space"))?;
            let pointee = match ty.arg_type(1) {
                Some(inner) => resolve_type(scope, inner)?,
                None => return Err(invalid(ty, "missing pointee type")),
            };
            Ok(TypeInfo::pointer(space, pointee))
        }
        "sampler" | "sampler_comparison" => Ok(Rc::new(TypeInfo {
            name: name.to_string(),
            size: 0,
            align: 1,
            kind: TypeKind::Sampler {
                comparison: name == "sampler_comparison",
            },
        })),
        _ if name.starts_with("texture_") => texture_type(scope, ty),
        _ => scope
            .named_type(name, ty.span.line)?
            .ok_or_else(|| ReflectError::UnknownType {
                name: name.to_string(),
                line: ty.span.line,
            }),
    }
}

fn scalar_arg<S: TypeScope>(scope: &mut S, ty: &TypeExpr) -> Result<ScalarType> {
    let inner = ty
        .arg_type(0)
        .ok_or_else(|| invalid(ty, "missing element type"))?;
    match resolve_type(scope, inner)?.kind {
        TypeKind::Scalar(scalar) => Ok(scalar),
        _ => Err(invalid(ty, "element type must be a scalar")),
    }
}

fn array_count<S: TypeScope>(scope: &mut S, ty: &TypeExpr, arg: &TemplateArg) -> Result<u32> {
    let value = match arg {
        TemplateArg::Type(name) if name.args.is_empty() => {
            scope
                .const_int(&name.name)
                .ok_or_else(|| ReflectError::NotConstant {
                    reason: format!("'{}' has no constant value", name.name),
                    line: name.span.line,
                })?
        }
        TemplateArg::Type(_) => return Err(invalid(ty, "array count must be a constant")),
        TemplateArg::Expr(expr) => {
            let scope: &S = scope;
            eval_const_int(expr, &|n| scope.const_int(n))?
        }
    };
    if value <= 0 || value > u32::MAX as i64 {
        return Err(invalid(ty, format!("array count {value} out of range")));
    }
    Ok(value as u32)
}

fn texture_type<S: TypeScope>(scope: &mut S, ty: &TypeExpr) -> Result<TypeRef> {
    use TextureDimension::*;
    let name = ty.name.as_str();
    let rest = &name["texture_".len()..];

    let (dimension, class) = if let Some(dim) = rest.strip_prefix("storage_") {
        let format = ty
            .args
            .first()
            .and_then(|a| a.as_name())
            .and_then(TexelFormat::from_name)
            .ok_or_else(|| invalid(ty, "unknown texel format"))?;
        let access = ty
            .args
            .get(1)
            .and_then(|a| a.as_name())
            .and_then(AccessMode::from_name)
            .unwrap_or(AccessMode::Write);
        (
            parse_dimension(dim).ok_or_else(|| invalid(ty, "unknown dimension"))?,
            TextureClass::Storage { format, access },
        )
    } else if let Some(dim) = rest.strip_prefix("depth_") {
        match dim {
            "multisampled_2d" => (D2, TextureClass::Depth { multisampled: true }),
            other => (
                parse_dimension(other).ok_or_else(|| invalid(ty, "unknown dimension"))?,
                TextureClass::Depth {
                    multisampled: false,
                },
            ),
        }
    } else if rest == "multisampled_2d" {
        (D2, TextureClass::Multisampled(scalar_arg(scope, ty)?))
    } else if rest == "external" {
        (D2, TextureClass::External)
    } else {
        (
            parse_dimension(rest).ok_or_else(|| invalid(ty, "unknown dimension"))?,
            TextureClass::Sampled(scalar_arg(scope, ty)?),
        )
    };

    Ok(Rc::new(TypeInfo {
        name: ty.to_string(),
        size: 0,
        align: 1,
        kind: TypeKind::Texture(TextureType { dimension, class }),
    }))
}

fn parse_dimension(text: &str) -> Option<TextureDimension> {
    Some(match text {
        "1d" => TextureDimension::D1,
        "2d" => TextureDimension::D2,
        "2d_array" => TextureDimension::D2Array,
        "3d" => TextureDimension::D3,
        "cube" => TextureDimension::Cube,
        "cube_array" => TextureDimension::CubeArray,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(source: &str) -> TypeTable {
        let module = wgsl_parser::parse_module(source).unwrap();
        TypeTable::from_module(&module).unwrap()
    }

    #[test]
    fn test_predeclared_aliases() {
        assert_eq!(predeclared_alias("vec3f").unwrap().name, "vec3<f32>");
        assert_eq!(predeclared_alias("mat2x4h").unwrap().name, "mat2x4<f16>");
        assert!(predeclared_alias("mat2x2i").is_none());
        assert!(predeclared_alias("vec3").is_none());
    }

    #[test]
    fn test_out_of_order_structs() {
        let types = table("struct A { b: B, x: f32 }\nstruct B { v: vec3f }");
        let a = types.get_struct("A").unwrap();
        assert_eq!(a.size, 32);
        assert_eq!(a.member("x").unwrap().offset, 16);
        let names: Vec<&str> = types.structs().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_recursive_struct_rejected() {
        let module = wgsl_parser::parse_module("struct A { a: array<A, 2> }").unwrap();
        assert!(matches!(
            TypeTable::from_module(&module),
            Err(ReflectError::RecursiveStruct(_))
        ));
    }

    #[test]
    fn test_array_count_from_const() {
        let types = table("const N = 3;\nconst M = N * 2u;\nalias Arr = array<f32, M>;");
        let arr = types.resolve_name("Arr").unwrap();
        assert_eq!(arr.size, 24);
    }

    #[test]
    fn test_override_value_sizes_workgroup_array() {
        let module =
            wgsl_parser::parse_module("override WG = 4;\nalias Tile = array<u32, WG>;").unwrap();
        let mut values = HashMap::new();
        values.insert("WG".to_string(), 16);
        let types = TypeTable::build(&module, &values).unwrap();
        assert_eq!(types.resolve_name("Tile").unwrap().size, 64);
    }

    #[test]
    fn test_size_and_align_attributes() {
        let types = table("struct S { @size(16) a: f32, @align(32) b: u32 }");
        let s = types.get_struct("S").unwrap();
        assert_eq!(s.member("b").unwrap().offset, 32);
        assert_eq!(s.size, 64);
    }

    #[test]
    fn test_texture_types() {
        let module = wgsl_parser::parse_module(
            "@group(0) @binding(0) var t: texture_storage_2d<rgba8unorm, write>;",
        )
        .unwrap();
        let types = TypeTable::from_module(&module).unwrap();
        let Item::Var(var) = &module.items[0] else {
            unreachable!()
        };
        let ty = types.resolve(var.ty.as_ref().unwrap()).unwrap();
        match &ty.kind {
            TypeKind::Texture(tex) => {
                assert_eq!(tex.dimension, TextureDimension::D2);
                assert!(matches!(
                    tex.class,
                    TextureClass::Storage {
                        format: TexelFormat::Rgba8Unorm,
                        access: AccessMode::Write
                    }
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
