//! Stepping executor
//!
//! [`WgslExec`] owns a parsed module and runs it one command at a time over
//! a stack of [`Frame`]s. Nothing is kept on the host call stack between
//! steps, so a debugger can stop after any command, inspect variables and
//! resume. Running to completion is just stepping until the stack is empty.

use crate::command::{Command, CommandBlock, LabelId};
use crate::compiler::{compile_module, CompiledFunction, HIDDEN_PREFIX};
use crate::config::{BindGroups, BindingResource, ExecConfig};
use crate::context::{Binding, Context, ScopeId};
use crate::data::{Data, Place, Scalar, TextureData};
use crate::error::{ExecError, Result};
use crate::frame::{Frame, FrameKind};
use crate::value::DecodedValue;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};
use wgsl_ast::{ExprId, ExprKind, GlobalVar, Item, Module, OverrideDecl, TypeExpr};
use wgsl_reflect::{Reflection, TexelFormat, TextureClass, TypeKind, TypeRef, TypeTable};

/// One entry of [`WgslExec::call_stack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    /// Function name, or `<module>` for module-scope declarations.
    pub name: String,
    pub line: Option<u32>,
}

/// The next command to run: frame depth, the block it belongs to and its
/// index there. Equal positions run the same command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecPosition {
    pub depth: usize,
    block: usize,
    pub pc: usize,
}

#[derive(Debug, Clone, Copy)]
enum Jump {
    Break,
    Continue,
}

/// A WGSL module ready to execute or step through.
#[derive(Debug)]
pub struct WgslExec {
    pub(crate) module: Module,
    pub(crate) reflection: Reflection,
    /// Layouts with integral override values folded in.
    pub(crate) types: TypeTable,
    pub(crate) module_block: Rc<CommandBlock>,
    pub(crate) context: Context,
    pub(crate) frames: Vec<Frame>,
    pub(crate) config: ExecConfig,
    pub(crate) bind_groups: BindGroups,
    /// Fail on resources the host did not bind instead of zero-filling.
    pub(crate) strict_bindings: bool,
}

impl WgslExec {
    /// Parse, reflect and compile `source`.
    pub fn new(source: &str) -> Result<Self> {
        let module = wgsl_parser::parse_module(source)?;
        let reflection = Reflection::new(&module)?;
        let (module_block, functions) = compile_module(&module)?;
        let mut context = Context::new();
        for function in functions {
            context.register_function(Rc::new(function));
        }
        debug!(
            functions = module.functions().count(),
            entry_points = reflection.entry_points.len(),
            "compiled module"
        );
        Ok(Self {
            types: reflection.types.clone(),
            module,
            reflection,
            module_block,
            context,
            frames: Vec::new(),
            config: ExecConfig::default(),
            bind_groups: BindGroups::new(),
            strict_bindings: false,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }

    /// Run every module-scope declaration to completion.
    ///
    /// Resources are not required: unbound buffers read as zero and unbound
    /// textures are empty.
    pub fn execute(&mut self, config: &ExecConfig) -> Result<()> {
        self.start(config)?;
        self.run_to_end()
    }

    /// Prepare to step through module-scope declarations.
    pub fn start(&mut self, config: &ExecConfig) -> Result<()> {
        self.prepare(config, BindGroups::new(), false)?;
        self.push_module_frame();
        Ok(())
    }

    pub(crate) fn prepare(
        &mut self,
        config: &ExecConfig,
        bind_groups: BindGroups,
        strict_bindings: bool,
    ) -> Result<()> {
        self.config = config.clone();
        self.bind_groups = bind_groups;
        self.strict_bindings = strict_bindings;
        self.types = self.override_types()?;
        self.reset();
        Ok(())
    }

    pub(crate) fn push_module_frame(&mut self) {
        self.frames.push(Frame::new(
            self.module_block.clone(),
            ScopeId::ROOT,
            FrameKind::Module,
        ));
    }

    /// Drop all frames and module-scope state.
    pub fn reset(&mut self) {
        self.clear_frames();
        self.context.reset();
    }

    fn clear_frames(&mut self) {
        while let Some(frame) = self.frames.pop() {
            self.context.release(frame.scope);
        }
    }

    /// Layout table with integral override values applied, so array counts
    /// naming overrides resolve to the supplied values.
    fn override_types(&self) -> Result<TypeTable> {
        let mut values = HashMap::new();
        for info in &self.reflection.overrides {
            if let Some(value) = self.supplied_constant(&info.name, info.id) {
                if value.fract() == 0.0 {
                    values.insert(info.name.clone(), value as i64);
                }
            }
        }
        Ok(TypeTable::build(&self.module, &values)?)
    }

    fn supplied_constant(&self, name: &str, id: Option<u32>) -> Option<f64> {
        self.config
            .constants
            .get(name)
            .or_else(|| id.and_then(|id| self.config.constants.get(&id.to_string())))
            .copied()
    }

    // === Stepping ===

    pub fn is_running(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Execute one command. Returns `false` once nothing is left to run.
    pub fn step_next(&mut self) -> Result<bool> {
        self.settle()?;
        let Some(frame) = self.frames.last_mut() else {
            return Ok(false);
        };
        let block = frame.block.clone();
        let pc = frame.pc;
        frame.pc += 1;
        let command = block
            .get(pc)
            .ok_or_else(|| ExecError::internal(format!("no command at {pc}")))?;
        trace!(pc, line = ?command.line(), depth = self.frames.len(), "step");
        if let Err(err) = self.exec_command(command) {
            let line = command.line().or_else(|| self.current_line()).unwrap_or(0);
            return Err(err.at(line));
        }
        self.settle()?;
        Ok(self.is_running())
    }

    pub fn run_to_end(&mut self) -> Result<()> {
        while self.step_next()? {}
        Ok(())
    }

    /// Pop frames that ran off their end.
    fn settle(&mut self) -> Result<()> {
        while self.frames.last().is_some_and(Frame::is_exhausted) {
            self.pop_frame(Data::Void)?;
        }
        Ok(())
    }

    /// Pop the top frame. A function frame hands `result` to its caller.
    fn pop_frame(&mut self, result: Data) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| ExecError::internal("frame stack underflow"))?;
        self.context.release(frame.scope);
        if let FrameKind::Function { name, call } = frame.kind {
            trace!(function = %name, "return");
            if let (Some(id), Some(caller)) = (call, self.frames.last_mut()) {
                caller.calls.insert(id, result);
            }
        }
        Ok(())
    }

    fn exec_command(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Statement(stmt) => self.exec_statement(stmt),
            Command::Global(item) => self.declare_global(item),
            Command::CallExpr { expr, .. } => {
                let ExprKind::Call { callee, args, .. } = &expr.kind else {
                    return Err(ExecError::internal("call command without a call"));
                };
                let function = self.function(callee)?;
                let values = self.eval_args(args)?;
                self.push_function(&function, values, Some(expr.id))
            }
            Command::Goto {
                condition,
                jump_if,
                target,
                ..
            } => {
                let jump = match condition {
                    None => true,
                    Some(condition) => self.eval_expr(condition)?.as_bool()? == *jump_if,
                };
                if jump {
                    self.top_mut()?.pc = *target;
                }
                Ok(())
            }
            Command::Block(block) => {
                let scope = self.context.push_scope(self.current_scope());
                self.frames
                    .push(Frame::new(block.clone(), scope, FrameKind::Block));
                Ok(())
            }
            Command::BreakTarget(_) | Command::ContinueTarget(_) => Ok(()),
            Command::Break { id, condition, .. } => {
                let taken = match condition {
                    None => true,
                    Some(condition) => self.eval_expr(condition)?.as_bool()?,
                };
                if taken {
                    self.unwind_to(*id, Jump::Break)?;
                }
                Ok(())
            }
            Command::Continue { id, .. } => self.unwind_to(*id, Jump::Continue),
            Command::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?.detach()?,
                    None => Data::Void,
                };
                self.exec_return(value)
            }
            Command::Discard { .. } => {
                debug!("invocation discarded");
                self.clear_frames();
                Ok(())
            }
        }
    }

    fn top_mut(&mut self) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| ExecError::internal("no active frame"))
    }

    /// Pop block frames until one holds the target label, then jump to it.
    fn unwind_to(&mut self, id: LabelId, jump: Jump) -> Result<()> {
        loop {
            let top = self
                .frames
                .last()
                .ok_or_else(|| ExecError::internal("no active frame"))?;
            let target = match jump {
                Jump::Break => top.block.break_target(id),
                Jump::Continue => top.block.continue_target(id),
            };
            if let Some(index) = target {
                self.top_mut()?.pc = index;
                return Ok(());
            }
            if top.is_boundary() {
                return Err(ExecError::internal(format!("{jump:?} target not found")));
            }
            self.pop_frame(Data::Void)?;
        }
    }

    fn exec_return(&mut self, value: Data) -> Result<()> {
        loop {
            let top = self
                .frames
                .last()
                .ok_or_else(|| ExecError::internal("return with no active frame"))?;
            match &top.kind {
                FrameKind::Function { name, .. } => {
                    let function = self.function(name)?;
                    let value = match &function.decl.return_type {
                        Some(ty) => value.convert_to(&*self.resolve_type(ty)?)?,
                        None => value,
                    };
                    return self.pop_frame(value);
                }
                FrameKind::Module => {
                    return Err(ExecError::type_error("return outside of a function"))
                }
                FrameKind::Block => self.pop_frame(Data::Void)?,
            }
        }
    }

    // === Calls ===

    pub(crate) fn function(&self, name: &str) -> Result<Rc<CompiledFunction>> {
        self.context
            .function(name)
            .ok_or_else(|| ExecError::binding(format!("function '{name}' is not declared")))
    }

    /// Bind arguments to parameters and push the callee's frame.
    pub(crate) fn push_function(
        &mut self,
        function: &CompiledFunction,
        args: Vec<Data>,
        call: Option<ExprId>,
    ) -> Result<()> {
        let decl = &function.decl;
        if args.len() != decl.params.len() {
            return Err(ExecError::type_error(format!(
                "'{}' expects {} arguments, got {}",
                decl.name,
                decl.params.len(),
                args.len()
            )));
        }
        let mut bound = Vec::with_capacity(args.len());
        for (param, value) in decl.params.iter().zip(args) {
            let ty = self.resolve_type(&param.ty)?;
            bound.push((param.name.as_str(), value.convert_to(&ty)?.detach()?));
        }
        let scope = self.context.push_scope(ScopeId::ROOT);
        for (name, value) in bound {
            self.context
                .create_variable(scope, name, Binding::Value(value))?;
        }
        trace!(function = %decl.name, "call");
        self.frames.push(Frame::new(
            function.body.clone(),
            scope,
            FrameKind::Function {
                name: decl.name.clone(),
                call,
            },
        ));
        Ok(())
    }

    // === Module-scope declarations ===

    pub(crate) fn resolve_type(&self, ty: &TypeExpr) -> Result<TypeRef> {
        Ok(self.types.resolve(ty)?)
    }

    fn declare_global(&mut self, item: &Item) -> Result<()> {
        match item {
            Item::Var(var) => self.declare_global_var(var),
            Item::Override(decl) => self.declare_override(decl),
            _ => Err(ExecError::internal("unexpected module-scope command")),
        }
    }

    pub(crate) fn declare_global_var(&mut self, var: &GlobalVar) -> Result<()> {
        let ty = var.ty.as_ref().map(|ty| self.resolve_type(ty)).transpose()?;
        let binding = match (var.group(), var.binding()) {
            (Some(group), Some(binding)) => {
                let ty = ty.ok_or_else(|| {
                    ExecError::binding(format!("resource '{}' has no type", var.name))
                })?;
                let group = self.eval_u32(group)?;
                let binding = self.eval_u32(binding)?;
                self.bind_resource(&var.name, group, binding, ty)?
            }
            _ => {
                let init = var
                    .init
                    .as_ref()
                    .map(|e| self.eval_init(e, ty.as_ref()))
                    .transpose()?;
                let ty = match (ty, &init) {
                    (Some(ty), _) => ty,
                    (None, Some(value)) => value.type_info()?,
                    (None, None) => {
                        return Err(ExecError::type_error(format!(
                            "'{}' needs a type or an initializer",
                            var.name
                        )))
                    }
                };
                let place = Place::alloc(ty);
                if let Some(value) = init {
                    place.store(&value)?;
                }
                Binding::Memory(place)
            }
        };
        trace!(name = %var.name, "declare global");
        self.context
            .create_variable(ScopeId::ROOT, &var.name, binding)
    }

    fn eval_u32(&mut self, expr: &wgsl_ast::Expr) -> Result<u32> {
        Ok(self.eval_expr(expr)?.as_scalar()?.as_index()? as u32)
    }

    fn bind_resource(&self, name: &str, group: u32, binding: u32, ty: TypeRef) -> Result<Binding> {
        let resource = self
            .bind_groups
            .get(&group)
            .and_then(|entries| entries.get(&binding))
            .cloned();
        let mismatch = |found: &str| {
            ExecError::binding(format!(
                "@group({group}) @binding({binding}) '{name}' of type {} is bound to a {found}",
                ty.name
            ))
        };
        match (&ty.kind, resource) {
            (TypeKind::Texture(view), Some(BindingResource::Texture { buffer, descriptor })) => Ok(
                Binding::Value(Data::Texture(TextureData::new(buffer, descriptor).with_view(view.clone()))),
            ),
            (TypeKind::Sampler { comparison }, Some(BindingResource::Sampler)) => {
                Ok(Binding::Value(Data::Sampler {
                    comparison: *comparison,
                }))
            }
            (TypeKind::Texture(_) | TypeKind::Sampler { .. }, Some(_)) => Err(mismatch("buffer")),
            (_, Some(BindingResource::Buffer(buffer) | BindingResource::Uniform(buffer))) => {
                let needed = match &ty.kind {
                    TypeKind::Struct { members } => members.last().map_or(0, |m| match &m.ty.kind {
                        TypeKind::Array { count: None, .. } => m.offset as usize,
                        _ => ty.size as usize,
                    }),
                    _ => ty.size as usize,
                };
                if buffer.len() < needed {
                    return Err(ExecError::binding(format!(
                        "buffer for '{name}' holds {} bytes, its type needs {needed}",
                        buffer.len()
                    )));
                }
                Ok(Binding::Memory(Place::new(buffer, 0, ty)))
            }
            (_, Some(BindingResource::Texture { .. })) => Err(mismatch("texture")),
            (_, Some(BindingResource::Sampler)) => Err(mismatch("sampler")),
            (_, None) if self.strict_bindings => Err(ExecError::binding(format!(
                "no resource bound at @group({group}) @binding({binding}) for '{name}'"
            ))),
            (TypeKind::Texture(view), None) => {
                let format = match &view.class {
                    TextureClass::Storage { format, .. } => *format,
                    TextureClass::Depth { .. } => TexelFormat::Depth32Float,
                    _ => TexelFormat::Rgba8Unorm,
                };
                Ok(Binding::Value(Data::Texture(
                    TextureData::empty(format).with_view(view.clone()),
                )))
            }
            (TypeKind::Sampler { comparison }, None) => Ok(Binding::Value(Data::Sampler {
                comparison: *comparison,
            })),
            (_, None) => Ok(Binding::Memory(Place::alloc(ty))),
        }
    }

    fn declare_override(&mut self, decl: &OverrideDecl) -> Result<()> {
        let id = self
            .reflection
            .overrides
            .iter()
            .find(|info| info.name == decl.name)
            .and_then(|info| info.id);
        let supplied = self.supplied_constant(&decl.name, id);
        let init = decl.init.as_ref().map(|e| self.eval_expr(e)).transpose()?;
        let ty = match (&decl.ty, &init) {
            (Some(ty), _) => self.resolve_type(ty)?,
            (None, Some(value)) => value.clone().concretize().type_info()?,
            (None, None) => {
                return Err(ExecError::type_error(format!(
                    "override '{}' needs a type or an initializer",
                    decl.name
                )))
            }
        };
        let value = match (supplied, init) {
            (Some(value), _) => Data::Scalar(Scalar::AbstractFloat(value)),
            (None, Some(value)) => value,
            (None, None) => {
                return Err(ExecError::binding(format!(
                    "override '{}' has no default and no value was supplied",
                    decl.name
                )))
            }
        };
        let value = value.convert_to(&ty)?;
        debug!(name = %decl.name, ?value, "override");
        self.context
            .create_variable(ScopeId::ROOT, &decl.name, Binding::Value(value))
    }

    // === Inspection ===

    pub(crate) fn current_scope(&self) -> ScopeId {
        self.frames
            .last()
            .map(|frame| frame.scope)
            .unwrap_or(ScopeId::ROOT)
    }

    /// The command the next step will execute.
    pub fn current_command(&self) -> Option<&Command> {
        self.frames.last()?.next_command()
    }

    pub fn current_line(&self) -> Option<u32> {
        self.current_command()?.line()
    }

    pub fn position(&self) -> Option<ExecPosition> {
        let frame = self.frames.last()?;
        Some(ExecPosition {
            depth: self.frames.len(),
            block: Rc::as_ptr(&frame.block) as usize,
            pc: frame.pc,
        })
    }

    /// Number of active frames, blocks included.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of active function frames.
    pub fn function_depth(&self) -> usize {
        self.frames.iter().filter(|f| f.is_function()).count()
    }

    /// Function frames, innermost first, each with the line it is at.
    pub fn call_stack(&self) -> Vec<StackEntry> {
        let mut entries: Vec<StackEntry> = Vec::new();
        let top = self.frames.len().saturating_sub(1);
        for (i, frame) in self.frames.iter().enumerate() {
            let command = if i == top {
                frame.next_command()
            } else {
                frame.previous_command()
            };
            let line = command.and_then(Command::line);
            match &frame.kind {
                FrameKind::Module => entries.push(StackEntry {
                    name: "<module>".to_string(),
                    line,
                }),
                FrameKind::Function { name, .. } => entries.push(StackEntry {
                    name: name.clone(),
                    line,
                }),
                FrameKind::Block => {
                    if let (Some(entry), Some(line)) = (entries.last_mut(), line) {
                        entry.line = Some(line);
                    }
                }
            }
        }
        entries.reverse();
        entries
    }

    /// Decoded value of `name` as seen from the current position.
    pub fn get_variable_value(&self, name: &str) -> Option<DecodedValue> {
        let binding = self.context.lookup(self.current_scope(), name)?;
        DecodedValue::decode(&binding.read().ok()?).ok()
    }

    /// Raw value of `name` as seen from the current position.
    pub fn get_variable(&self, name: &str) -> Option<Data> {
        self.context
            .lookup(self.current_scope(), name)?
            .read()
            .ok()
    }

    /// Variables of the current function, innermost declarations first.
    /// Shadowed and compiler-introduced names are skipped.
    pub fn local_variables(&self) -> Vec<(String, DecodedValue)> {
        let mut seen = std::collections::HashSet::new();
        let mut vars = Vec::new();
        for scope in self.context.chain(self.current_scope()) {
            if scope == ScopeId::ROOT {
                break;
            }
            for (name, binding) in self.context.variables(scope) {
                if name.starts_with(HIDDEN_PREFIX) || !seen.insert(name.to_string()) {
                    continue;
                }
                if let Some(value) = binding.read().ok().and_then(|d| DecodedValue::decode(&d).ok()) {
                    vars.push((name.to_string(), value));
                }
            }
        }
        vars
    }

    /// Module-scope variables, constants and overrides in declaration order.
    pub fn global_variables(&self) -> Vec<(String, DecodedValue)> {
        self.context
            .variables(ScopeId::ROOT)
            .filter(|(name, _)| !name.starts_with(HIDDEN_PREFIX))
            .filter_map(|(name, binding)| {
                let value = DecodedValue::decode(&binding.read().ok()?).ok()?;
                Some((name.to_string(), value))
            })
            .collect()
    }
}
