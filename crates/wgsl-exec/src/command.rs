//! Flat command streams.
//!
//! Function bodies and blocks are lowered into a [`CommandBlock`]: a list of
//! commands where structured control flow has become jumps to indices and
//! labelled targets. A frame executes one command per step, which is what
//! lets the debugger suspend anywhere without holding host stack frames.

use std::rc::Rc;
use wgsl_ast::{Expr, Item, Stmt};

/// Identity of a loop or switch for `break`/`continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone)]
pub enum Command {
    /// Declaration, assignment or expression statement.
    Statement(Stmt),
    /// Module-scope `var` or `override`.
    Global(Box<Item>),
    /// Call of a user function: evaluates the arguments and pushes the
    /// callee's frame. The result is delivered to the calling frame under
    /// the call's expression id.
    CallExpr { expr: Expr, line: u32 },
    /// Jump to `target` unconditionally, or when `condition` evaluates to
    /// `jump_if`.
    Goto {
        condition: Option<Expr>,
        jump_if: bool,
        target: usize,
        line: Option<u32>,
    },
    /// Nested list run in its own frame and scope.
    Block(Rc<CommandBlock>),
    BreakTarget(LabelId),
    ContinueTarget(LabelId),
    /// `break`, or `break if` when a condition is present.
    Break {
        id: LabelId,
        condition: Option<Expr>,
        line: u32,
    },
    Continue { id: LabelId, line: u32 },
    Return { value: Option<Expr>, line: u32 },
    Discard { line: u32 },
}

impl Command {
    /// Source line a debugger stops on; `None` for bookkeeping commands.
    pub fn line(&self) -> Option<u32> {
        match self {
            Command::Statement(stmt) => Some(stmt.line()),
            Command::Global(item) => match item.as_ref() {
                Item::Var(var) => Some(var.span.line),
                Item::Override(decl) => Some(decl.span.line),
                _ => None,
            },
            Command::CallExpr { line, .. }
            | Command::Break { line, .. }
            | Command::Continue { line, .. }
            | Command::Return { line, .. }
            | Command::Discard { line } => Some(*line),
            Command::Goto { line, .. } => *line,
            Command::Block(_) | Command::BreakTarget(_) | Command::ContinueTarget(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandBlock {
    pub commands: Vec<Command>,
}

impl CommandBlock {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn break_target(&self, id: LabelId) -> Option<usize> {
        self.commands
            .iter()
            .position(|c| matches!(c, Command::BreakTarget(l) if *l == id))
    }

    pub fn continue_target(&self, id: LabelId) -> Option<usize> {
        self.commands
            .iter()
            .position(|c| matches!(c, Command::ContinueTarget(l) if *l == id))
    }

    // === Building ===

    /// Append a command, returning its index.
    pub fn emit(&mut self, command: Command) -> usize {
        self.commands.push(command);
        self.commands.len() - 1
    }

    /// Index the next emitted command will get.
    pub fn offset(&self) -> usize {
        self.commands.len()
    }

    /// Point the jump at `at` to `target`.
    pub fn patch_jump(&mut self, at: usize, target: usize) {
        if let Some(Command::Goto { target: t, .. }) = self.commands.get_mut(at) {
            *t = target;
        }
    }
}
