//! Workgroup dispatch simulator
//!
//! Runs a compute entry point once per invocation of the dispatch grid, one
//! invocation at a time. Bound buffers are shared by every invocation;
//! `var<workgroup>` storage is fresh per workgroup and `var<private>` plus
//! function locals are fresh per invocation.

use crate::config::{BindGroups, ExecConfig};
use crate::data::{Data, Place, Scalar};
use crate::error::{ExecError, Result};
use crate::executor::WgslExec;
use tracing::{debug, instrument, trace};
use wgsl_ast::{Attribute, GlobalVar, Item, Param};
use wgsl_reflect::{Stage, TypeKind};

/// Builtin input values of one compute invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationIds {
    pub workgroup_id: [u32; 3],
    pub local_invocation_id: [u32; 3],
    pub workgroup_size: [u32; 3],
    pub num_workgroups: [u32; 3],
}

impl InvocationIds {
    /// Row-major flattening of the local id within the workgroup.
    pub fn local_invocation_index(&self) -> u32 {
        let [x, y, z] = self.local_invocation_id;
        let [sx, sy, _] = self.workgroup_size;
        x + y * sx + z * sx * sy
    }

    pub fn global_invocation_id(&self) -> [u32; 3] {
        let mut id = [0; 3];
        for axis in 0..3 {
            id[axis] = self.workgroup_id[axis] * self.workgroup_size[axis]
                + self.local_invocation_id[axis];
        }
        id
    }

    /// Row-major flattening of the global id over the whole dispatch.
    pub fn global_invocation_index(&self) -> u32 {
        let [x, y, z] = self.global_invocation_id();
        let width = self.num_workgroups[0] * self.workgroup_size[0];
        let height = self.num_workgroups[1] * self.workgroup_size[1];
        x + y * width + z * width * height
    }

    /// Value of a `@builtin(name)` input.
    pub fn builtin(&self, name: &str) -> Option<Data> {
        let vec3 = |v: [u32; 3]| Data::Vector(v.iter().map(|c| Scalar::U32(*c)).collect());
        Some(match name {
            "local_invocation_id" => vec3(self.local_invocation_id),
            "local_invocation_index" => Data::Scalar(Scalar::U32(self.local_invocation_index())),
            "global_invocation_id" => vec3(self.global_invocation_id()),
            "global_invocation_index" => Data::Scalar(Scalar::U32(self.global_invocation_index())),
            "workgroup_id" => vec3(self.workgroup_id),
            "num_workgroups" => vec3(self.num_workgroups),
            _ => return None,
        })
    }
}

/// Order in which a dispatch enumerates workgroups and invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchOrder {
    /// Workgroup id major, local id minor, x fastest.
    #[default]
    Forward,
    /// The same grid walked from the last invocation to the first.
    Reverse,
}

/// Ids of `[0, n)` over a 3D extent with x fastest.
fn grid(extent: [u32; 3]) -> impl DoubleEndedIterator<Item = [u32; 3]> {
    let [w, h, d] = extent;
    (0..d).flat_map(move |z| (0..h).flat_map(move |y| (0..w).map(move |x| [x, y, z])))
}

fn ordered(extent: [u32; 3], order: DispatchOrder) -> Vec<[u32; 3]> {
    match order {
        DispatchOrder::Forward => grid(extent).collect(),
        DispatchOrder::Reverse => grid(extent).rev().collect(),
    }
}

impl WgslExec {
    /// Run compute entry point `entry` over a grid of `workgroups`.
    ///
    /// Every `@group/@binding` resource must be present in `bind_groups`.
    /// Buffers are shared with the caller, so results are read back from
    /// the same handles after the call.
    pub fn dispatch_workgroups(
        &mut self,
        entry: &str,
        workgroups: [u32; 3],
        bind_groups: &BindGroups,
        config: &ExecConfig,
    ) -> Result<()> {
        self.dispatch_workgroups_ordered(entry, workgroups, bind_groups, config, DispatchOrder::Forward)
    }

    #[instrument(skip(self, bind_groups, config), fields(entry = %entry))]
    pub fn dispatch_workgroups_ordered(
        &mut self,
        entry: &str,
        workgroups: [u32; 3],
        bind_groups: &BindGroups,
        config: &ExecConfig,
        order: DispatchOrder,
    ) -> Result<()> {
        self.prepare_dispatch(entry, bind_groups, config)?;
        let size = self.workgroup_size(entry)?;
        let workgroup_vars = self.module_vars("workgroup");
        let private_vars = self.module_vars("private");
        debug!(?workgroups, ?size, "dispatch");

        for workgroup_id in ordered(workgroups, order) {
            for var in &workgroup_vars {
                self.declare_global_var(var)?;
            }
            for local_invocation_id in ordered(size, order) {
                for var in &private_vars {
                    self.declare_global_var(var)?;
                }
                let ids = InvocationIds {
                    workgroup_id,
                    local_invocation_id,
                    workgroup_size: size,
                    num_workgroups: workgroups,
                };
                trace!(?workgroup_id, ?local_invocation_id, "invocation");
                self.push_entry(entry, &ids)?;
                self.run_to_end()?;
            }
        }
        debug!("dispatch complete");
        Ok(())
    }

    /// Prepare a single invocation of a dispatch for stepping: module-scope
    /// declarations run to completion and the entry frame is pushed.
    pub fn start_invocation(
        &mut self,
        entry: &str,
        global_id: [u32; 3],
        workgroups: [u32; 3],
        bind_groups: &BindGroups,
        config: &ExecConfig,
    ) -> Result<InvocationIds> {
        self.prepare_dispatch(entry, bind_groups, config)?;
        let size = self.workgroup_size(entry)?;
        let mut workgroup_id = [0; 3];
        let mut local_invocation_id = [0; 3];
        for axis in 0..3 {
            let extent = size[axis].max(1);
            workgroup_id[axis] = global_id[axis] / extent;
            local_invocation_id[axis] = global_id[axis] % extent;
            if workgroup_id[axis] >= workgroups[axis] {
                return Err(ExecError::bounds(format!(
                    "invocation {global_id:?} lies outside a dispatch of {workgroups:?} workgroups of {size:?}"
                )));
            }
        }
        let ids = InvocationIds {
            workgroup_id,
            local_invocation_id,
            workgroup_size: size,
            num_workgroups: workgroups,
        };
        self.push_entry(entry, &ids)?;
        Ok(ids)
    }

    fn prepare_dispatch(&mut self, entry: &str, bind_groups: &BindGroups, config: &ExecConfig) -> Result<()> {
        let info = self
            .reflection
            .entry_point(entry)
            .ok_or_else(|| ExecError::binding(format!("entry point '{entry}' is not declared")))?;
        if info.stage != Stage::Compute {
            return Err(ExecError::type_error(format!(
                "'{entry}' is a {:?} entry point, not compute",
                info.stage
            )));
        }
        self.prepare(config, bind_groups.clone(), true)?;
        self.push_module_frame();
        self.run_to_end()
    }

    /// `@workgroup_size` of `entry`, evaluated against the bound overrides.
    fn workgroup_size(&mut self, entry: &str) -> Result<[u32; 3]> {
        let function = self.function(entry)?;
        let Some(attr) = Attribute::find(&function.decl.attributes, "workgroup_size") else {
            return Err(ExecError::type_error(format!(
                "compute entry point '{entry}' has no @workgroup_size"
            )));
        };
        let mut size = [1; 3];
        for (axis, expr) in attr.args.iter().take(3).enumerate() {
            let value = self.eval_expr(expr)?.as_scalar()?.as_index()?;
            if value < 1 {
                return Err(ExecError::type_error(format!(
                    "workgroup size {value} must be at least 1"
                )));
            }
            size[axis] = value as u32;
        }
        Ok(size)
    }

    fn module_vars(&self, space: &str) -> Vec<GlobalVar> {
        self.module
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Var(var) if var.address_space.as_deref() == Some(space) => Some(var.clone()),
                _ => None,
            })
            .collect()
    }

    fn push_entry(&mut self, entry: &str, ids: &InvocationIds) -> Result<()> {
        let function = self.function(entry)?;
        let mut args = Vec::with_capacity(function.decl.params.len());
        for param in &function.decl.params {
            args.push(self.entry_argument(param, ids)?);
        }
        self.push_function(&function, args, None)
    }

    /// Value of an entry-point parameter: a `@builtin` input, or a struct
    /// whose members are all `@builtin` inputs.
    fn entry_argument(&self, param: &Param, ids: &InvocationIds) -> Result<Data> {
        if let Some(attr) = Attribute::find(&param.attributes, "builtin") {
            return builtin_value(attr, ids);
        }
        let ty = self.resolve_type(&param.ty)?;
        let decl = self.module.structs().find(|s| s.name == param.ty.name);
        match (&ty.kind, decl) {
            (TypeKind::Struct { .. }, Some(decl)) => {
                let place = Place::alloc(ty.clone());
                for member in &decl.members {
                    let attr = Attribute::find(&member.attributes, "builtin").ok_or_else(|| {
                        ExecError::binding(format!(
                            "member '{}.{}' of an entry-point input has no @builtin",
                            decl.name, member.name
                        ))
                    })?;
                    place.member(&member.name)?.store(&builtin_value(attr, ids)?)?;
                }
                Ok(Data::Typed(place))
            }
            _ => Err(ExecError::binding(format!(
                "entry-point parameter '{}' has no @builtin",
                param.name
            ))),
        }
    }
}

fn builtin_value(attr: &Attribute, ids: &InvocationIds) -> Result<Data> {
    let name = attr
        .ident_arg()
        .ok_or_else(|| ExecError::type_error("@builtin needs a name"))?;
    ids.builtin(name).ok_or_else(|| {
        ExecError::unimplemented(format!("builtin input '{name}' is not available in compute dispatch"))
    })
}
