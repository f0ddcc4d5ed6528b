//! Type expressions as written in source.
//!
//! Types are kept syntactic (`vec3<f32>`, `array<Light, 4>`, `ptr<function, i32>`).
//! Resolution into sizes and layouts happens in `wgsl-reflect`.

use crate::expr::Expr;
use crate::span::Span;

/// A (possibly templated) type name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub args: Vec<TemplateArg>,
    pub span: Span,
}

/// One argument inside `<...>`.
///
/// A bare identifier parses as [`TemplateArg::Type`] even when it names a
/// constant (`array<f32, N>`); consumers decide what it means.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Type(TypeExpr),
    Expr(Expr),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            span,
        }
    }

    /// First template argument as a type, if present.
    pub fn arg_type(&self, index: usize) -> Option<&TypeExpr> {
        match self.args.get(index) {
            Some(TemplateArg::Type(ty)) => Some(ty),
            _ => None,
        }
    }
}

impl TemplateArg {
    /// Bare identifier text (`read_write`, `storage`, `N`).
    pub fn as_name(&self) -> Option<&str> {
        match self {
            TemplateArg::Type(ty) if ty.args.is_empty() => Some(ty.name.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                match arg {
                    TemplateArg::Type(ty) => write!(f, "{ty}")?,
                    TemplateArg::Expr(_) => write!(f, "_")?,
                }
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
