//! Expression evaluation and simple statements.

use crate::builtins::construct::{construct, construct_typed};
use crate::builtins::{self, Builtin};
use crate::context::Binding;
use crate::data::ops;
use crate::data::{Data, Place, Scalar};
use crate::error::{ExecError, Result};
use crate::executor::WgslExec;
use wgsl_ast::{
    BinaryOp, Expr, ExprKind, LocalDecl, LocalKind, Stmt, StmtKind, TemplateArg, UnaryOp,
};
use wgsl_reflect::{TypeKind, TypeRef};

impl WgslExec {
    pub(crate) fn exec_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.declare_local(decl),
            StmtKind::Assign { target, op, value } => {
                let place = self.eval_place(target)?;
                let value = self.eval_expr(value)?;
                let value = match op {
                    Some(op) => ops::binary(*op, &place.load()?, &value)?,
                    None => value,
                };
                place.store(&value)
            }
            StmtKind::Increment(target) | StmtKind::Decrement(target) => {
                let op = match stmt.kind {
                    StmtKind::Increment(_) => BinaryOp::Add,
                    _ => BinaryOp::Sub,
                };
                let place = self.eval_place(target)?;
                let one = Data::Scalar(Scalar::AbstractInt(1));
                place.store(&ops::binary(op, &place.load()?, &one)?)
            }
            StmtKind::Call(expr) | StmtKind::Phony(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            StmtKind::ConstAssert(expr) => {
                if self.eval_expr(expr)?.as_bool()? {
                    Ok(())
                } else {
                    Err(ExecError::type_error("const_assert failed"))
                }
            }
            _ => Err(ExecError::internal(
                "control flow statement reached the evaluator",
            )),
        }
    }

    fn declare_local(&mut self, decl: &LocalDecl) -> Result<()> {
        let scope = self.current_scope();
        let ty = decl.ty.as_ref().map(|ty| self.resolve_type(ty)).transpose()?;
        let init = decl
            .init
            .as_ref()
            .map(|e| self.eval_init(e, ty.as_ref()))
            .transpose()?;
        let binding = match decl.kind {
            LocalKind::Var => {
                let ty = match (ty, &init) {
                    (Some(ty), _) => ty,
                    (None, Some(value)) => value.type_info()?,
                    (None, None) => {
                        return Err(ExecError::type_error(format!(
                            "'{}' needs a type or an initializer",
                            decl.name
                        )))
                    }
                };
                let place = Place::alloc(ty);
                if let Some(value) = init {
                    place.store(&value)?;
                }
                Binding::Memory(place)
            }
            LocalKind::Let | LocalKind::Const => {
                let value = init.ok_or_else(|| {
                    ExecError::type_error(format!("'{}' needs an initializer", decl.name))
                })?;
                let value = match (ty, decl.kind) {
                    (Some(ty), _) => value.convert_to(&ty)?,
                    (None, LocalKind::Let) => value.concretize(),
                    // const keeps abstract precision
                    (None, _) => value,
                };
                Binding::Value(value.detach()?)
            }
        };
        self.context.create_variable(scope, &decl.name, binding)
    }

    /// Evaluate an initializer against the declared type, so `array(1, 2)`
    /// takes its element type from the declaration.
    pub(crate) fn eval_init(&mut self, init: &Expr, ty: Option<&TypeRef>) -> Result<Data> {
        match (ty, &init.kind) {
            (Some(ty), ExprKind::Call { callee, template, args })
                if ty.is_array() && callee == "array" && template.is_empty() =>
            {
                let values = self.eval_args(args)?;
                construct_typed(ty, values)
            }
            _ => self.eval_expr(init),
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<&Binding> {
        self.context
            .lookup(self.current_scope(), name)
            .ok_or_else(|| ExecError::binding(format!("'{name}' is not declared")))
    }

    pub(crate) fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Data>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Data> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Data::Scalar(Scalar::from_literal(literal))),
            ExprKind::Ident(name) => self.lookup(name)?.read(),
            ExprKind::Member { base, member } => {
                let base = self.eval_expr(base)?;
                member_of(base, member)
            }
            ExprKind::Index { base, index } => {
                let base = self.eval_expr(base)?;
                let index = self.eval_expr(index)?.as_scalar()?.as_index()?;
                index_of(base, index)
            }
            ExprKind::Unary {
                op: UnaryOp::AddressOf,
                operand,
            } => Ok(Data::Pointer(self.eval_place(operand)?)),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => self.eval_expr(operand)?.as_place()?.load(),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, &value)
            }
            ExprKind::Binary {
                op: op @ (BinaryOp::LogicalAnd | BinaryOp::LogicalOr),
                lhs,
                rhs,
            } => {
                let left = self.eval_expr(lhs)?.as_bool()?;
                let decided = match op {
                    BinaryOp::LogicalAnd => !left,
                    _ => left,
                };
                if decided {
                    return Ok(Data::Scalar(Scalar::Bool(left)));
                }
                let right = self.eval_expr(rhs)?.as_bool()?;
                Ok(Data::Scalar(Scalar::Bool(right)))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.eval_expr(lhs)?;
                let right = self.eval_expr(rhs)?;
                ops::binary(*op, &left, &right)
            }
            ExprKind::Call {
                callee,
                template,
                args,
            } => self.eval_call(expr, callee, template, args),
        }
    }

    fn eval_call(
        &mut self,
        expr: &Expr,
        callee: &str,
        template: &[TemplateArg],
        args: &[Expr],
    ) -> Result<Data> {
        if self.context.has_function(callee) {
            // User calls already ran in their own frame.
            return self
                .frames
                .last_mut()
                .and_then(|frame| frame.calls.remove(&expr.id))
                .ok_or_else(|| {
                    ExecError::internal(format!("result of call to '{callee}' is missing"))
                });
        }
        if let Some(builtin) = Builtin::from_name(callee) {
            let target = self.template_type(template)?;
            let values = self.eval_args(args)?;
            return builtins::call(builtin, callee, target.as_ref(), &values);
        }
        let values = self.eval_args(args)?;
        construct(&self.types, callee, template, values, expr.span)
    }

    fn template_type(&self, template: &[TemplateArg]) -> Result<Option<TypeRef>> {
        match template.first() {
            Some(TemplateArg::Type(ty)) => Ok(Some(self.resolve_type(ty)?)),
            _ => Ok(None),
        }
    }

    /// Evaluate a reference expression to the memory it names.
    pub(crate) fn eval_place(&mut self, expr: &Expr) -> Result<Place> {
        match &expr.kind {
            ExprKind::Ident(name) => match self.lookup(name)? {
                Binding::Memory(place) => Ok(place.clone()),
                Binding::Value(Data::Pointer(place)) => Ok(place.clone()),
                Binding::Value(_) => Err(ExecError::type_error(format!(
                    "'{name}' is immutable"
                ))),
            },
            ExprKind::Member { base, member } => {
                let place = self.eval_place(base)?;
                match &place.ty.kind {
                    TypeKind::Vector { .. } => {
                        let mut chars = member.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => place.element(swizzle_index(c)? as i64),
                            _ => Err(ExecError::type_error(format!(
                                "cannot assign to swizzle '.{member}'"
                            ))),
                        }
                    }
                    _ => place.member(member),
                }
            }
            ExprKind::Index { base, index } => {
                let place = self.eval_place(base)?;
                let index = self.eval_expr(index)?.as_scalar()?.as_index()?;
                place.element(index)
            }
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => Ok(self.eval_expr(operand)?.as_place()?.clone()),
            _ => Err(ExecError::type_error("expression is not a reference")),
        }
    }
}

fn swizzle_index(c: char) -> Result<usize> {
    match c {
        'x' | 'r' => Ok(0),
        'y' | 'g' => Ok(1),
        'z' | 'b' => Ok(2),
        'w' | 'a' => Ok(3),
        other => Err(ExecError::type_error(format!(
            "'{other}' is not a vector component"
        ))),
    }
}

fn swizzle(lanes: &[Scalar], member: &str) -> Result<Data> {
    let picked = member
        .chars()
        .map(|c| {
            let index = swizzle_index(c)?;
            lanes.get(index).copied().ok_or_else(|| {
                ExecError::type_error(format!(
                    "component '{c}' out of range for vec{}",
                    lanes.len()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    match picked.as_slice() {
        [single] => Ok(Data::Scalar(*single)),
        _ if picked.len() <= 4 => Ok(Data::Vector(picked)),
        _ => Err(ExecError::type_error(format!("swizzle '.{member}' is too long"))),
    }
}

/// `.member` on a value: swizzles on vectors, member loads on structs.
/// Pointers are dereferenced implicitly.
fn member_of(base: Data, member: &str) -> Result<Data> {
    match base {
        Data::Vector(lanes) => swizzle(&lanes, member),
        Data::Typed(place) | Data::Pointer(place) => match &place.ty.kind {
            TypeKind::Struct { .. } => place.member(member)?.load(),
            _ => member_of(place.load()?, member),
        },
        other => Err(ExecError::type_error(format!(
            "{} has no member '{member}'",
            other.type_name()
        ))),
    }
}

/// `[index]` on a value. Pointers are dereferenced implicitly.
fn index_of(base: Data, index: i64) -> Result<Data> {
    match base {
        Data::Typed(place) | Data::Pointer(place) => place.element(index)?.load(),
        Data::Vector(lanes) => usize::try_from(index)
            .ok()
            .and_then(|i| lanes.get(i).copied())
            .map(Data::Scalar)
            .ok_or_else(|| {
                ExecError::bounds(format!(
                    "index {index} out of bounds for vec{}",
                    lanes.len()
                ))
            }),
        Data::Matrix {
            columns,
            rows,
            values,
        } => {
            if index < 0 || index >= columns as i64 {
                return Err(ExecError::bounds(format!(
                    "column {index} out of bounds for mat{columns}x{rows}"
                )));
            }
            let start = index as usize * rows as usize;
            Ok(Data::Vector(values[start..start + rows as usize].to_vec()))
        }
        other => Err(ExecError::type_error(format!(
            "{} cannot be indexed",
            other.type_name()
        ))),
    }
}
