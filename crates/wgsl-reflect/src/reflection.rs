//! Module reflection: resource bindings, overrides and entry points.

use crate::consts::eval_const_int;
use crate::error::{ReflectError, Result};
use crate::layout::TypeTable;
use crate::types::{AccessMode, AddressSpace, TextureClass, TypeKind, TypeRef};
use tracing::debug;
use wgsl_ast::walk::walk_expr;
use wgsl_ast::{Attribute, Expr, FunctionDecl, GlobalVar, Item, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Uniform,
    Storage,
    Texture,
    StorageTexture,
    Sampler,
}

/// One `@group(g) @binding(b)` variable.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
    pub ty: TypeRef,
    pub access: AccessMode,
}

#[derive(Debug, Clone)]
pub struct OverrideInfo {
    pub name: String,
    pub id: Option<u32>,
    pub ty: Option<TypeRef>,
    pub has_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compute,
    Vertex,
    Fragment,
}

/// One `@workgroup_size` dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkgroupDim {
    Fixed(u32),
    /// Names a pipeline override.
    Override(String),
    /// Expression over overrides, folded at dispatch time.
    Expr(Expr),
}

/// Entry-point parameter bound to a builtin value.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinInput {
    /// Parameter name, or `param.member` for struct inputs.
    pub name: String,
    pub builtin: String,
}

#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub name: String,
    pub stage: Stage,
    pub workgroup_size: Option<[WorkgroupDim; 3]>,
    pub builtins: Vec<BuiltinInput>,
}

/// Everything a host needs to bind resources and launch a module.
#[derive(Debug, Clone, Default)]
pub struct Reflection {
    pub types: TypeTable,
    pub uniforms: Vec<ResourceInfo>,
    pub storage: Vec<ResourceInfo>,
    pub textures: Vec<ResourceInfo>,
    pub storage_textures: Vec<ResourceInfo>,
    pub samplers: Vec<ResourceInfo>,
    pub overrides: Vec<OverrideInfo>,
    pub entry_points: Vec<EntryPoint>,
    /// `@builtin` members per struct, for struct-typed entry inputs.
    struct_builtins: Vec<(String, Vec<(String, String)>)>,
}

impl Reflection {
    pub fn from_source(source: &str) -> Result<Self> {
        let module = wgsl_parser::parse_module(source)?;
        Self::new(&module)
    }

    pub fn new(module: &Module) -> Result<Self> {
        let types = TypeTable::from_module(module)?;
        let mut reflection = Reflection {
            types,
            ..Default::default()
        };

        for item in &module.items {
            match item {
                Item::Var(var) => reflection.add_resource(var)?,
                Item::Override(decl) => {
                    let id = match Attribute::find(&decl.attributes, "id").and_then(|a| a.args.first()) {
                        Some(expr) => Some(reflection.const_u32(expr)?),
                        None => None,
                    };
                    let ty = match &decl.ty {
                        Some(ty) => Some(reflection.types.resolve(ty)?),
                        None => None,
                    };
                    reflection.overrides.push(OverrideInfo {
                        name: decl.name.clone(),
                        id,
                        ty,
                        has_default: decl.init.is_some(),
                    });
                }
                Item::Struct(decl) => {
                    let members: Vec<(String, String)> = decl
                        .members
                        .iter()
                        .filter_map(|m| {
                            Attribute::find(&m.attributes, "builtin")
                                .and_then(|a| a.ident_arg())
                                .map(|b| (m.name.clone(), b.to_string()))
                        })
                        .collect();
                    if !members.is_empty() {
                        reflection.struct_builtins.push((decl.name.clone(), members));
                    }
                }
                _ => {}
            }
        }

        // Entry points last so workgroup sizes can see every override.
        for func in module.functions() {
            if let Some(entry) = reflection.entry_point_of(func)? {
                reflection.entry_points.push(entry);
            }
        }

        debug!(
            structs = reflection.types.structs().count(),
            resources = reflection.resources().count(),
            entry_points = reflection.entry_points.len(),
            "module reflected"
        );
        Ok(reflection)
    }

    fn const_u32(&self, expr: &Expr) -> Result<u32> {
        let v = eval_const_int(expr, &|n| self.types.const_int(n))?;
        u32::try_from(v).map_err(|_| ReflectError::NotConstant {
            reason: format!("{v} is not a valid u32"),
            line: expr.line(),
        })
    }

    fn add_resource(&mut self, var: &GlobalVar) -> Result<()> {
        let (Some(group), Some(binding)) = (var.group(), var.binding()) else {
            return Ok(());
        };
        let group = self.const_u32(group)?;
        let binding = self.const_u32(binding)?;
        let Some(ty) = &var.ty else {
            return Ok(());
        };
        let ty = self.types.resolve(ty)?;
        let space = var.address_space.as_deref().and_then(AddressSpace::from_name);

        let (kind, access) = match (&ty.kind, space) {
            (_, Some(AddressSpace::Uniform)) => (ResourceKind::Uniform, AccessMode::Read),
            (_, Some(AddressSpace::Storage)) => (
                ResourceKind::Storage,
                var.access
                    .as_deref()
                    .and_then(AccessMode::from_name)
                    .unwrap_or(AccessMode::Read),
            ),
            (TypeKind::Texture(tex), _) => match &tex.class {
                TextureClass::Storage { access, .. } => (ResourceKind::StorageTexture, *access),
                _ => (ResourceKind::Texture, AccessMode::Read),
            },
            (TypeKind::Sampler { .. }, _) => (ResourceKind::Sampler, AccessMode::Read),
            _ => return Ok(()),
        };

        let info = ResourceInfo {
            name: var.name.clone(),
            group,
            binding,
            kind,
            ty,
            access,
        };
        match kind {
            ResourceKind::Uniform => self.uniforms.push(info),
            ResourceKind::Storage => self.storage.push(info),
            ResourceKind::Texture => self.textures.push(info),
            ResourceKind::StorageTexture => self.storage_textures.push(info),
            ResourceKind::Sampler => self.samplers.push(info),
        }
        Ok(())
    }

    fn entry_point_of(&self, func: &FunctionDecl) -> Result<Option<EntryPoint>> {
        let stage = match func.stage() {
            Some("compute") => Stage::Compute,
            Some("vertex") => Stage::Vertex,
            Some("fragment") => Stage::Fragment,
            _ => return Ok(None),
        };

        let workgroup_size = Attribute::find(&func.attributes, "workgroup_size").map(|attr| {
            let dim = |i: usize| match attr.args.get(i) {
                None => WorkgroupDim::Fixed(1),
                Some(expr) => self.workgroup_dim(expr),
            };
            [dim(0), dim(1), dim(2)]
        });

        let mut builtins = Vec::new();
        for param in &func.params {
            if let Some(builtin) = Attribute::find(&param.attributes, "builtin").and_then(|a| a.ident_arg()) {
                builtins.push(BuiltinInput {
                    name: param.name.clone(),
                    builtin: builtin.to_string(),
                });
                continue;
            }
            let ty = self.types.resolve(&param.ty)?;
            if let TypeKind::Struct { .. } = ty.kind {
                let Some(decl) = self.struct_decl_builtins(&param.ty.name) else {
                    continue;
                };
                for (member, builtin) in decl {
                    builtins.push(BuiltinInput {
                        name: format!("{}.{}", param.name, member),
                        builtin,
                    });
                }
            }
        }

        Ok(Some(EntryPoint {
            name: func.name.clone(),
            stage,
            workgroup_size,
            builtins,
        }))
    }

    fn workgroup_dim(&self, expr: &Expr) -> WorkgroupDim {
        let is_override = |name: &str| self.overrides.iter().any(|o| o.name == name);
        if let Some(name) = expr.as_ident().filter(|&n| is_override(n)) {
            return WorkgroupDim::Override(name.to_string());
        }
        let mut uses_override = false;
        walk_expr(expr, &mut |e| {
            if e.as_ident().is_some_and(is_override) {
                uses_override = true;
            }
        });
        if uses_override {
            return WorkgroupDim::Expr(expr.clone());
        }
        match self.const_u32(expr) {
            Ok(v) => WorkgroupDim::Fixed(v),
            Err(_) => WorkgroupDim::Expr(expr.clone()),
        }
    }

    fn struct_decl_builtins(&self, name: &str) -> Option<Vec<(String, String)>> {
        self.struct_builtins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, members)| members.clone())
    }

    /// All bound resources regardless of kind.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceInfo> {
        self.uniforms
            .iter()
            .chain(&self.storage)
            .chain(&self.textures)
            .chain(&self.storage_textures)
            .chain(&self.samplers)
    }

    pub fn resource(&self, group: u32, binding: u32) -> Option<&ResourceInfo> {
        self.resources()
            .find(|r| r.group == group && r.binding == binding)
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|e| e.name == name)
    }

    pub fn structs(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.structs()
    }
}
