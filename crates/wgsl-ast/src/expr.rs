//! Expression nodes.

use crate::ops::{BinaryOp, UnaryOp};
use crate::span::Span;
use crate::types::TemplateArg;

/// Stable identity of an expression within one parsed module.
///
/// Assigned sequentially by the parser. The executor keys pending call
/// results by this id, so two textually identical calls stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Literal value with its suffix already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    /// Unsuffixed integer
    AbstractInt(i64),
    I32(i32),
    U32(u32),
    /// Unsuffixed float
    AbstractFloat(f64),
    F32(f32),
    F16(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    /// Function call, type constructor or struct constructor.
    ///
    /// `vec3<f32>(1.0)` has callee `vec3` with one template argument.
    Call {
        callee: String,
        template: Vec<TemplateArg>,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Identifier name when this expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}
