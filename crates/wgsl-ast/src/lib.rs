// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for WGSL
//!
//! This crate contains the syntax tree produced by `wgsl-parser` and consumed
//! by the reflection and execution crates. Nodes carry a [`Span`] with a
//! cached 1-based line number so runtime errors and debugger stops can point
//! at source lines without a separate lookup.

pub mod decl;
pub mod expr;
pub mod ops;
pub mod span;
pub mod stmt;
pub mod types;
pub mod walk;

pub use decl::{
    AliasDecl, Attribute, ConstDecl, Directive, FunctionDecl, GlobalVar, Item, Module,
    OverrideDecl, Param, StructDecl, StructMember,
};
pub use expr::{Expr, ExprId, ExprKind, Literal};
pub use ops::{BinaryOp, UnaryOp};
pub use span::{LineIndex, Span};
pub use stmt::{Block, CaseSelector, Continuing, LocalDecl, LocalKind, Stmt, StmtKind, SwitchCase};
pub use types::{TemplateArg, TypeExpr};
