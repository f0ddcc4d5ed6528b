//! Module-scope declarations.

use crate::expr::Expr;
use crate::span::Span;
use crate::stmt::Block;
use crate::types::TypeExpr;

/// `@name` or `@name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

impl Attribute {
    /// Find an attribute by name in a list.
    pub fn find<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
        attributes.iter().find(|a| a.name == name)
    }

    /// First argument as a bare identifier (`@builtin(global_invocation_id)`).
    pub fn ident_arg(&self) -> Option<&str> {
        self.args.first().and_then(|e| e.as_ident())
    }
}

/// `var<space, access> name: T = init;` at module scope.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVar {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub address_space: Option<String>,
    pub access: Option<String>,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

impl GlobalVar {
    pub fn group(&self) -> Option<&Expr> {
        Attribute::find(&self.attributes, "group").and_then(|a| a.args.first())
    }

    pub fn binding(&self) -> Option<&Expr> {
        Attribute::find(&self.attributes, "binding").and_then(|a| a.args.first())
    }
}

/// Module-scope `const` (also the shape of a module-scope `let`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Expr,
    pub span: Span,
}

/// Pipeline-overridable constant.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideDecl {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<StructMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub return_attributes: Vec<Attribute>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    /// Pipeline stage for entry points (`compute`, `vertex`, `fragment`).
    pub fn stage(&self) -> Option<&str> {
        ["compute", "vertex", "fragment"]
            .into_iter()
            .find(|stage| Attribute::find(&self.attributes, stage).is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Enable(Vec<String>),
    Requires(Vec<String>),
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FunctionDecl),
    Struct(StructDecl),
    Alias(AliasDecl),
    Var(GlobalVar),
    Const(ConstDecl),
    /// Module-scope `let`, evaluated once when the module runs.
    Let(ConstDecl),
    Override(OverrideDecl),
    ConstAssert(Expr),
    Directive(Directive),
}

/// Parsed shader module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub items: Vec<Item>,
}

impl Module {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions().find(|f| f.name == name)
    }
}
