//! Lexical scopes and function bindings.
//!
//! Scopes live in an arena indexed by [`ScopeId`]. Each scope records its
//! parent, so lookups walk outward through the chain. Released scopes are
//! recycled. The root scope holds module-scope declarations and is never
//! released.

use crate::compiler::CompiledFunction;
use crate::data::{Data, Place};
use crate::error::{ExecError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

/// What a name is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// `var` storage; assignment writes through the place.
    Memory(Place),
    /// `let`, `const`, override or parameter value.
    Value(Data),
}

impl Binding {
    pub fn read(&self) -> Result<Data> {
        match self {
            Binding::Memory(place) => place.load(),
            Binding::Value(data) => Ok(data.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    vars: IndexMap<String, Binding>,
}

#[derive(Debug)]
pub struct Context {
    scopes: Vec<Option<Scope>>,
    free: Vec<u32>,
    functions: HashMap<String, Rc<CompiledFunction>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            scopes: vec![Some(Scope::default())],
            free: Vec::new(),
            functions: HashMap::new(),
        }
    }

    /// Open a scope whose lookups fall back to `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let scope = Scope {
            parent: Some(parent),
            vars: IndexMap::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.scopes[index as usize] = Some(scope);
                ScopeId(index)
            }
            None => {
                self.scopes.push(Some(scope));
                ScopeId(self.scopes.len() as u32 - 1)
            }
        }
    }

    pub fn release(&mut self, scope: ScopeId) {
        if scope == ScopeId::ROOT {
            return;
        }
        if let Some(slot) = self.scopes.get_mut(scope.0 as usize) {
            if slot.take().is_some() {
                self.free.push(scope.0);
            }
        }
    }

    /// Drop every scope and module-scope binding, keeping functions.
    pub fn reset(&mut self) {
        self.scopes.truncate(1);
        self.scopes[0] = Some(Scope::default());
        self.free.clear();
    }

    fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Bind `name` in `scope`, shadowing any outer binding.
    pub fn create_variable(&mut self, scope: ScopeId, name: &str, binding: Binding) -> Result<()> {
        let slot = self
            .scopes
            .get_mut(scope.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| ExecError::internal(format!("scope {} is not live", scope.0)))?;
        slot.vars.insert(name.to_string(), binding);
        Ok(())
    }

    /// Write to an existing variable in place so aliases observe the change.
    pub fn set_variable(&self, scope: ScopeId, name: &str, value: &Data) -> Result<()> {
        match self.lookup(scope, name) {
            Some(Binding::Memory(place)) => place.store(value),
            Some(Binding::Value(_)) => Err(ExecError::type_error(format!(
                "cannot assign to immutable '{name}'"
            ))),
            None => Err(ExecError::binding(format!("'{name}' is not declared"))),
        }
    }

    /// Find the innermost binding of `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id)?;
            if let Some(binding) = scope.vars.get(name) {
                return Some(binding);
            }
            current = scope.parent;
        }
        None
    }

    /// Bindings declared directly in `scope`, in declaration order.
    pub fn variables(&self, scope: ScopeId) -> impl Iterator<Item = (&str, &Binding)> {
        self.scope(scope)
            .into_iter()
            .flat_map(|s| s.vars.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// `scope` and its ancestors, innermost first.
    pub fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(s) = self.scope(id) else { break };
            chain.push(id);
            current = s.parent;
        }
        chain
    }

    pub fn register_function(&mut self, function: Rc<CompiledFunction>) {
        self.functions.insert(function.decl.name.clone(), function);
    }

    pub fn function(&self, name: &str) -> Option<Rc<CompiledFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Live scopes other than the root, for leak checks.
    pub fn live_scopes(&self) -> usize {
        self.scopes.iter().skip(1).filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Scalar;
    use wgsl_reflect::{ScalarType, TypeInfo};

    fn int(v: i32) -> Data {
        Data::Scalar(Scalar::I32(v))
    }

    #[test]
    fn test_lookup_walks_parents_and_shadows() {
        let mut ctx = Context::new();
        ctx.create_variable(ScopeId::ROOT, "x", Binding::Value(int(1))).unwrap();
        let inner = ctx.push_scope(ScopeId::ROOT);
        assert!(ctx.lookup(inner, "x").is_some());

        ctx.create_variable(inner, "x", Binding::Value(int(2))).unwrap();
        let read = ctx.lookup(inner, "x").unwrap().read().unwrap();
        assert_eq!(read.as_scalar().unwrap(), Scalar::I32(2));
        let outer = ctx.lookup(ScopeId::ROOT, "x").unwrap().read().unwrap();
        assert_eq!(outer.as_scalar().unwrap(), Scalar::I32(1));
        assert!(ctx.lookup(inner, "missing").is_none());
    }

    #[test]
    fn test_set_variable_mutates_in_place() {
        let mut ctx = Context::new();
        let place = Place::alloc(TypeInfo::scalar(ScalarType::I32));
        ctx.create_variable(ScopeId::ROOT, "v", Binding::Memory(place.clone()))
            .unwrap();
        let inner = ctx.push_scope(ScopeId::ROOT);
        ctx.set_variable(inner, "v", &int(9)).unwrap();
        assert_eq!(place.load().unwrap().as_scalar().unwrap(), Scalar::I32(9));
    }

    #[test]
    fn test_immutable_and_undeclared() {
        let mut ctx = Context::new();
        ctx.create_variable(ScopeId::ROOT, "k", Binding::Value(int(1))).unwrap();
        assert!(ctx.set_variable(ScopeId::ROOT, "k", &int(2)).is_err());
        let err = ctx.set_variable(ScopeId::ROOT, "nope", &int(2)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Binding);
    }

    #[test]
    fn test_released_scopes_are_recycled() {
        let mut ctx = Context::new();
        let a = ctx.push_scope(ScopeId::ROOT);
        ctx.release(a);
        assert_eq!(ctx.live_scopes(), 0);
        let b = ctx.push_scope(ScopeId::ROOT);
        assert_eq!(a, b);
        ctx.release(ScopeId::ROOT);
        assert_eq!(ctx.chain(b), vec![b, ScopeId::ROOT]);
    }
}
