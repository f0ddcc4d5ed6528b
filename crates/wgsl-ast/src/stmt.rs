//! Statement nodes.

use crate::expr::Expr;
use crate::ops::BinaryOp;
use crate::span::Span;
use crate::types::TypeExpr;

/// Braced statement list.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    Var,
    Let,
    Const,
}

/// `var`, `let` or `const` inside a function body.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub kind: LocalKind,
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseSelector {
    Expr(Expr),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub selectors: Vec<CaseSelector>,
    pub body: Block,
    pub span: Span,
}

/// `continuing { ... break if cond; }`
#[derive(Debug, Clone, PartialEq)]
pub struct Continuing {
    pub body: Block,
    pub break_if: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Decl(LocalDecl),
    /// `target = value` or compound `target op= value`.
    Assign {
        target: Expr,
        op: Option<BinaryOp>,
        value: Expr,
    },
    Increment(Expr),
    Decrement(Expr),
    /// Call evaluated for its side effects.
    Call(Expr),
    /// `_ = expr`
    Phony(Expr),
    If {
        condition: Expr,
        body: Block,
        else_ifs: Vec<(Expr, Block)>,
        else_body: Option<Block>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Block,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Loop {
        body: Block,
        continuing: Option<Continuing>,
    },
    Break,
    /// `break if cond;` outside the tail of a continuing block.
    BreakIf(Expr),
    Continue,
    Return(Option<Expr>),
    Discard,
    Block(Block),
    ConstAssert(Expr),
}

impl Stmt {
    pub fn line(&self) -> u32 {
        self.span.line
    }
}
