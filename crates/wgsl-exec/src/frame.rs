//! Execution frames.

use crate::command::{Command, CommandBlock};
use crate::context::ScopeId;
use crate::data::Data;
use std::collections::HashMap;
use std::rc::Rc;
use wgsl_ast::ExprId;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    /// Module-scope declarations, run in the root scope.
    Module,
    /// Body of a user function. `call` is the expression awaiting the
    /// result, or `None` for entry points.
    Function { name: String, call: Option<ExprId> },
    /// Nested block, loop iteration or switch case.
    Block,
}

/// One command list being executed.
#[derive(Debug)]
pub struct Frame {
    pub block: Rc<CommandBlock>,
    /// Index of the next command.
    pub pc: usize,
    pub scope: ScopeId,
    pub kind: FrameKind,
    /// Results of calls that returned to this frame, keyed by call site.
    pub calls: HashMap<ExprId, Data>,
}

impl Frame {
    pub fn new(block: Rc<CommandBlock>, scope: ScopeId, kind: FrameKind) -> Self {
        Self {
            block,
            pc: 0,
            scope,
            kind,
            calls: HashMap::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pc >= self.block.len()
    }

    pub fn next_command(&self) -> Option<&Command> {
        self.block.get(self.pc)
    }

    /// Command that pushed the frame above this one.
    pub fn previous_command(&self) -> Option<&Command> {
        self.pc.checked_sub(1).and_then(|pc| self.block.get(pc))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, FrameKind::Function { .. })
    }

    /// Function and module frames stop `break`/`continue` unwinding.
    pub fn is_boundary(&self) -> bool {
        !matches!(self.kind, FrameKind::Block)
    }
}
