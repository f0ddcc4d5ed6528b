//! Control-flow compiler
//!
//! Lowers structured statements into [`CommandBlock`]s:
//!
//! - `if`/`else` becomes conditional gotos around nested blocks
//! - loops become a block per iteration plus a goto back to the head
//! - `switch` becomes one conditional goto per case
//! - calls to user functions become [`Command::CallExpr`] ahead of the
//!   statement that uses their value, so every call runs in its own frame
//!
//! Values a statement reads before one of its calls are spilled into hidden
//! bindings, and a call on the right of `&&`/`||` sits behind a conditional
//! jump. Evaluation order is therefore the source order.

use crate::command::{Command, CommandBlock, LabelId};
use crate::error::{ErrorKind, ExecError, Result};
use std::collections::HashSet;
use std::rc::Rc;
use wgsl_ast::walk::{children, walk_expr};
use wgsl_ast::{
    BinaryOp, CaseSelector, Expr, ExprId, ExprKind, FunctionDecl, Item, LocalDecl, LocalKind,
    Module, Span, Stmt, StmtKind, SwitchCase, UnaryOp,
};

/// Id given to expressions synthesized during lowering.
const SYNTHETIC: ExprId = ExprId(u32::MAX);

/// Name prefix of bindings introduced during lowering.
pub(crate) const HIDDEN_PREFIX: &str = "__";

/// A user function ready to run.
#[derive(Debug)]
pub struct CompiledFunction {
    pub decl: Rc<FunctionDecl>,
    pub body: Rc<CommandBlock>,
}

#[derive(Debug, Clone, Copy)]
struct Breakable {
    id: LabelId,
    is_loop: bool,
}

struct Compiler<'a> {
    user_functions: &'a HashSet<String>,
    next_label: u32,
    next_hidden: u32,
    breakables: Vec<Breakable>,
}

/// Compile module-scope declarations and every function body.
///
/// The returned block runs module-scope `const`, `let`, `var`, `override`
/// and `const_assert` declarations in source order.
pub fn compile_module(module: &Module) -> Result<(Rc<CommandBlock>, Vec<CompiledFunction>)> {
    let user_functions: HashSet<String> = module.functions().map(|f| f.name.clone()).collect();
    let mut compiler = Compiler::new(&user_functions);
    let mut block = CommandBlock::default();

    for item in &module.items {
        match item {
            Item::Const(decl) | Item::Let(decl) => {
                let kind = match item {
                    Item::Const(_) => LocalKind::Const,
                    _ => LocalKind::Let,
                };
                let init = compiler.lower(&decl.init, &mut block);
                block.emit(Command::Statement(Stmt {
                    kind: StmtKind::Decl(LocalDecl {
                        kind,
                        name: decl.name.clone(),
                        ty: decl.ty.clone(),
                        init: Some(init),
                    }),
                    span: decl.span,
                }));
            }
            Item::Var(var) => {
                let mut var = var.clone();
                var.init = var.init.map(|init| compiler.lower(&init, &mut block));
                block.emit(Command::Global(Box::new(Item::Var(var))));
            }
            Item::Override(decl) => {
                let mut decl = decl.clone();
                decl.init = decl.init.map(|init| compiler.lower(&init, &mut block));
                block.emit(Command::Global(Box::new(Item::Override(decl))));
            }
            Item::ConstAssert(expr) => {
                let expr = compiler.lower(expr, &mut block);
                let span = expr.span;
                block.emit(Command::Statement(Stmt {
                    kind: StmtKind::ConstAssert(expr),
                    span,
                }));
            }
            Item::Function(_) | Item::Struct(_) | Item::Alias(_) | Item::Directive(_) => {}
        }
    }

    let functions = module
        .functions()
        .map(|decl| compile_function(decl, &user_functions))
        .collect::<Result<Vec<_>>>()?;
    Ok((Rc::new(block), functions))
}

/// Compile one function body.
pub fn compile_function(decl: &FunctionDecl, user_functions: &HashSet<String>) -> Result<CompiledFunction> {
    let mut compiler = Compiler::new(user_functions);
    let body = compiler.compile_block(&decl.body)?;
    Ok(CompiledFunction {
        decl: Rc::new(decl.clone()),
        body: Rc::new(body),
    })
}

fn compile_error(message: &str, line: u32) -> ExecError {
    ExecError::new(ErrorKind::Parse, message).at(line)
}

impl<'a> Compiler<'a> {
    fn new(user_functions: &'a HashSet<String>) -> Self {
        Self {
            user_functions,
            next_label: 0,
            next_hidden: 0,
            breakables: Vec::new(),
        }
    }

    fn new_label(&mut self) -> LabelId {
        let id = LabelId(self.next_label);
        self.next_label += 1;
        id
    }

    fn innermost_loop(&self, line: u32, what: &str) -> Result<LabelId> {
        self.breakables
            .iter()
            .rev()
            .find(|b| b.is_loop)
            .map(|b| b.id)
            .ok_or_else(|| compile_error(&format!("'{what}' outside of a loop"), line))
    }

    fn compile_block(&mut self, stmts: &[Stmt]) -> Result<CommandBlock> {
        let mut block = CommandBlock::default();
        for stmt in stmts {
            self.compile_stmt(stmt, &mut block)?;
        }
        Ok(block)
    }

    fn compile_nested(&mut self, stmts: &[Stmt], block: &mut CommandBlock) -> Result<()> {
        let nested = self.compile_block(stmts)?;
        block.emit(Command::Block(Rc::new(nested)));
        Ok(())
    }

    /// Rewrite `expr` so every user call it makes runs as a
    /// [`Command::CallExpr`] emitted ahead of the command that uses it.
    ///
    /// Operands evaluated before a call are spilled into hidden bindings
    /// first, keeping left-to-right order when the callee has side
    /// effects. A call on the right of `&&`/`||` runs behind a conditional
    /// jump, so short-circuiting still decides whether it happens.
    fn lower(&mut self, expr: &Expr, block: &mut CommandBlock) -> Expr {
        if !self.has_user_call(expr) {
            return expr.clone();
        }
        let kind = match &expr.kind {
            ExprKind::Binary {
                op: op @ (BinaryOp::LogicalAnd | BinaryOp::LogicalOr),
                lhs,
                rhs,
            } => {
                if self.has_user_call(rhs) {
                    return self.lower_short_circuit(*op, lhs, rhs, block);
                }
                ExprKind::Binary {
                    op: *op,
                    lhs: Box::new(self.lower(lhs, block)),
                    rhs: rhs.clone(),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower(lhs, block);
                let lhs = self.spill_before_call(lhs, rhs, block);
                ExprKind::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(self.lower(rhs, block)),
                }
            }
            ExprKind::Call {
                callee,
                template,
                args,
            } => {
                let last_call = args.iter().rposition(|arg| self.has_user_call(arg));
                let mut lowered = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    let arg = self.lower(arg, block);
                    lowered.push(match last_call {
                        Some(last) if index < last => self.spill(arg, block),
                        _ => arg,
                    });
                }
                let call = Expr {
                    id: expr.id,
                    kind: ExprKind::Call {
                        callee: callee.clone(),
                        template: template.clone(),
                        args: lowered,
                    },
                    span: expr.span,
                };
                if self.user_functions.contains(callee) {
                    block.emit(Command::CallExpr {
                        expr: call.clone(),
                        line: expr.line(),
                    });
                }
                return call;
            }
            // Bases name memory, so they are never spilled.
            ExprKind::Member { base, member } => ExprKind::Member {
                base: Box::new(self.lower(base, block)),
                member: member.clone(),
            },
            ExprKind::Index { base, index } => ExprKind::Index {
                base: Box::new(self.lower(base, block)),
                index: Box::new(self.lower(index, block)),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: Box::new(self.lower(operand, block)),
            },
            ExprKind::Literal(_) | ExprKind::Ident(_) => return expr.clone(),
        };
        Expr {
            id: expr.id,
            kind,
            span: expr.span,
        }
    }

    /// `lhs && rhs` as `var t = lhs; if t { t = rhs; }`, reading `t`.
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        block: &mut CommandBlock,
    ) -> Expr {
        let lhs = self.lower(lhs, block);
        let name = self.hidden_name();
        block.emit(hidden_decl(LocalKind::Var, &name, lhs));
        let flag = synthetic(ExprKind::Ident(name), rhs.span);
        let skip = block.emit(Command::Goto {
            condition: Some(flag.clone()),
            jump_if: op == BinaryOp::LogicalOr,
            target: 0,
            line: None,
        });
        let rhs = self.lower(rhs, block);
        block.emit(Command::Statement(Stmt {
            span: rhs.span,
            kind: StmtKind::Assign {
                target: flag.clone(),
                op: None,
                value: rhs,
            },
        }));
        block.patch_jump(skip, block.offset());
        flag
    }

    fn spill_before_call(&mut self, expr: Expr, later: &Expr, block: &mut CommandBlock) -> Expr {
        if self.has_user_call(later) {
            self.spill(expr, block)
        } else {
            expr
        }
    }

    /// Evaluate `expr` now into a hidden binding, unless no call can change
    /// its value.
    fn spill(&mut self, expr: Expr, block: &mut CommandBlock) -> Expr {
        if self.is_stable(&expr) {
            return expr;
        }
        let name = self.hidden_name();
        let span = expr.span;
        // const keeps abstract numerics abstract
        block.emit(hidden_decl(LocalKind::Const, &name, expr));
        synthetic(ExprKind::Ident(name), span)
    }

    /// Whether evaluating `expr` later gives the same value as now: it reads
    /// no user-visible variable, only literals, addresses, hidden bindings
    /// and results of calls that already ran.
    fn is_stable(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Literal(_) => true,
            ExprKind::Ident(name) => name.starts_with(HIDDEN_PREFIX),
            ExprKind::Unary {
                op: UnaryOp::AddressOf,
                ..
            } => true,
            ExprKind::Call { callee, .. } if self.user_functions.contains(callee) => true,
            _ => children(expr).into_iter().all(|child| self.is_stable(child)),
        }
    }

    fn has_user_call(&self, expr: &Expr) -> bool {
        let mut found = false;
        walk_expr(expr, &mut |node| {
            if self.is_user_call(node) {
                found = true;
            }
        });
        found
    }

    fn hidden_name(&mut self) -> String {
        let name = format!("{HIDDEN_PREFIX}tmp{}", self.next_hidden);
        self.next_hidden += 1;
        name
    }

    fn is_user_call(&self, expr: &Expr) -> bool {
        matches!(&expr.kind, ExprKind::Call { callee, .. } if self.user_functions.contains(callee))
    }

    fn compile_stmt(&mut self, stmt: &Stmt, block: &mut CommandBlock) -> Result<()> {
        let line = stmt.line();
        match &stmt.kind {
            StmtKind::Decl(decl) => {
                let mut decl = decl.clone();
                decl.init = decl.init.map(|init| self.lower(&init, block));
                block.emit(statement(StmtKind::Decl(decl), stmt.span));
            }
            StmtKind::Assign { target, op, value } => {
                let target = self.lower(target, block);
                let value = self.lower(value, block);
                block.emit(statement(
                    StmtKind::Assign {
                        target,
                        op: *op,
                        value,
                    },
                    stmt.span,
                ));
            }
            StmtKind::Increment(expr) => {
                let expr = self.lower(expr, block);
                block.emit(statement(StmtKind::Increment(expr), stmt.span));
            }
            StmtKind::Decrement(expr) => {
                let expr = self.lower(expr, block);
                block.emit(statement(StmtKind::Decrement(expr), stmt.span));
            }
            StmtKind::Phony(expr) => {
                let expr = self.lower(expr, block);
                block.emit(statement(StmtKind::Phony(expr), stmt.span));
            }
            StmtKind::ConstAssert(expr) => {
                let expr = self.lower(expr, block);
                block.emit(statement(StmtKind::ConstAssert(expr), stmt.span));
            }
            StmtKind::Call(expr) => {
                let lowered = self.lower(expr, block);
                // A user call already ran as its own command.
                if !self.is_user_call(expr) {
                    block.emit(statement(StmtKind::Call(lowered), stmt.span));
                }
            }
            StmtKind::If {
                condition,
                body,
                else_ifs,
                else_body,
            } => {
                let mut end_jumps = Vec::new();
                let branches = std::iter::once((condition, body))
                    .chain(else_ifs.iter().map(|(c, b)| (c, b)));
                for (condition, body) in branches {
                    let line = condition.line();
                    let condition = self.lower(condition, block);
                    let skip = block.emit(Command::Goto {
                        condition: Some(condition),
                        jump_if: false,
                        target: 0,
                        line: Some(line),
                    });
                    self.compile_nested(body, block)?;
                    end_jumps.push(block.emit(Command::Goto {
                        condition: None,
                        jump_if: true,
                        target: 0,
                        line: None,
                    }));
                    block.patch_jump(skip, block.offset());
                }
                if let Some(else_body) = else_body {
                    self.compile_nested(else_body, block)?;
                }
                let end = block.offset();
                for jump in end_jumps {
                    block.patch_jump(jump, end);
                }
            }
            StmtKind::While { condition, body } => {
                let id = self.new_label();
                let head = block.emit(Command::ContinueTarget(id));
                let condition = self.lower(condition, block);
                let exit = block.emit(Command::Goto {
                    condition: Some(condition),
                    jump_if: false,
                    target: 0,
                    line: Some(line),
                });
                self.breakables.push(Breakable { id, is_loop: true });
                let body = self.compile_block(body);
                self.breakables.pop();
                block.emit(Command::Block(Rc::new(body?)));
                block.emit(goto(head));
                let exit_target = block.emit(Command::BreakTarget(id));
                block.patch_jump(exit, exit_target);
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let id = self.new_label();
                let mut outer = CommandBlock::default();
                if let Some(init) = init {
                    self.compile_stmt(init, &mut outer)?;
                }
                let head = outer.offset();
                let exit = match condition {
                    Some(condition) => {
                        let condition = self.lower(condition, &mut outer);
                        Some(outer.emit(Command::Goto {
                            condition: Some(condition),
                            jump_if: false,
                            target: 0,
                            line: Some(line),
                        }))
                    }
                    None => None,
                };
                self.breakables.push(Breakable { id, is_loop: true });
                let body = self.compile_block(body);
                self.breakables.pop();
                outer.emit(Command::Block(Rc::new(body?)));
                outer.emit(Command::ContinueTarget(id));
                if let Some(update) = update {
                    self.compile_stmt(update, &mut outer)?;
                }
                outer.emit(goto(head));
                let exit_target = outer.emit(Command::BreakTarget(id));
                if let Some(exit) = exit {
                    outer.patch_jump(exit, exit_target);
                }
                block.emit(Command::Block(Rc::new(outer)));
            }
            StmtKind::Loop { body, continuing } => {
                let id = self.new_label();
                let head = block.offset();
                self.breakables.push(Breakable { id, is_loop: true });
                let iteration = self.compile_loop_iteration(id, body, continuing.as_ref());
                self.breakables.pop();
                block.emit(Command::Block(Rc::new(iteration?)));
                block.emit(goto(head));
                block.emit(Command::BreakTarget(id));
            }
            StmtKind::Switch { selector, cases } => {
                self.compile_switch(selector, cases, stmt.span, block)?;
            }
            StmtKind::Break => {
                let target = self
                    .breakables
                    .last()
                    .ok_or_else(|| compile_error("'break' outside of a loop or switch", line))?;
                block.emit(Command::Break {
                    id: target.id,
                    condition: None,
                    line,
                });
            }
            StmtKind::BreakIf(condition) => {
                let id = self.innermost_loop(line, "break if")?;
                let condition = self.lower(condition, block);
                block.emit(Command::Break {
                    id,
                    condition: Some(condition),
                    line,
                });
            }
            StmtKind::Continue => {
                let id = self.innermost_loop(line, "continue")?;
                block.emit(Command::Continue { id, line });
            }
            StmtKind::Return(value) => {
                let value = value.as_ref().map(|value| self.lower(value, block));
                block.emit(Command::Return { value, line });
            }
            StmtKind::Discard => {
                block.emit(Command::Discard { line });
            }
            StmtKind::Block(stmts) => self.compile_nested(stmts, block)?,
        }
        Ok(())
    }

    /// Body of one `loop` iteration: the body, the continue target, the
    /// continuing statements and the trailing `break if`.
    fn compile_loop_iteration(
        &mut self,
        id: LabelId,
        body: &[Stmt],
        continuing: Option<&wgsl_ast::Continuing>,
    ) -> Result<CommandBlock> {
        let mut iteration = CommandBlock::default();
        for stmt in body {
            self.compile_stmt(stmt, &mut iteration)?;
        }
        iteration.emit(Command::ContinueTarget(id));
        if let Some(continuing) = continuing {
            for stmt in &continuing.body {
                self.compile_stmt(stmt, &mut iteration)?;
            }
            if let Some(condition) = &continuing.break_if {
                let line = condition.line();
                let condition = self.lower(condition, &mut iteration);
                iteration.emit(Command::Break {
                    id,
                    condition: Some(condition),
                    line,
                });
            }
        }
        Ok(iteration)
    }

    fn compile_switch(
        &mut self,
        selector: &Expr,
        cases: &[SwitchCase],
        span: Span,
        block: &mut CommandBlock,
    ) -> Result<()> {
        let id = self.new_label();
        // Evaluate the selector once into a hidden binding.
        let hidden = format!("{HIDDEN_PREFIX}switch{}", id.0);
        let lowered = self.lower(selector, block);
        block.emit(statement(
            StmtKind::Decl(LocalDecl {
                kind: LocalKind::Let,
                name: hidden.clone(),
                ty: None,
                init: Some(lowered),
            }),
            span,
        ));
        let selector_ref = synthetic(ExprKind::Ident(hidden), selector.span);

        let mut case_jumps: Vec<(usize, usize)> = Vec::new();
        let mut default_case = None;
        for (index, case) in cases.iter().enumerate() {
            let mut condition: Option<Expr> = None;
            for sel in &case.selectors {
                match sel {
                    CaseSelector::Default => default_case = Some(index),
                    CaseSelector::Expr(value) => {
                        let test = synthetic(
                            ExprKind::Binary {
                                op: BinaryOp::Eq,
                                lhs: Box::new(selector_ref.clone()),
                                rhs: Box::new(value.clone()),
                            },
                            value.span,
                        );
                        condition = Some(match condition {
                            Some(prev) => synthetic(
                                ExprKind::Binary {
                                    op: BinaryOp::LogicalOr,
                                    lhs: Box::new(prev),
                                    rhs: Box::new(test),
                                },
                                value.span,
                            ),
                            None => test,
                        });
                    }
                }
            }
            if let Some(condition) = condition {
                let jump = block.emit(Command::Goto {
                    condition: Some(condition),
                    jump_if: true,
                    target: 0,
                    line: Some(case.span.line),
                });
                case_jumps.push((jump, index));
            }
        }
        let fallback = block.emit(goto(0));

        self.breakables.push(Breakable { id, is_loop: false });
        let mut case_starts = Vec::with_capacity(cases.len());
        let mut end_jumps = Vec::with_capacity(cases.len());
        let mut result = Ok(());
        for case in cases {
            case_starts.push(block.offset());
            if let Err(err) = self.compile_nested(&case.body, block) {
                result = Err(err);
                break;
            }
            end_jumps.push(block.emit(goto(0)));
        }
        self.breakables.pop();
        result?;

        let end = block.emit(Command::BreakTarget(id));
        for (jump, index) in case_jumps {
            block.patch_jump(jump, case_starts[index]);
        }
        block.patch_jump(fallback, default_case.map_or(end, |i| case_starts[i]));
        for jump in end_jumps {
            block.patch_jump(jump, end);
        }
        Ok(())
    }
}

fn goto(target: usize) -> Command {
    Command::Goto {
        condition: None,
        jump_if: true,
        target,
        line: None,
    }
}

fn statement(kind: StmtKind, span: Span) -> Command {
    Command::Statement(Stmt { kind, span })
}

fn hidden_decl(kind: LocalKind, name: &str, init: Expr) -> Command {
    let span = init.span;
    statement(
        StmtKind::Decl(LocalDecl {
            kind,
            name: name.to_string(),
            ty: None,
            init: Some(init),
        }),
        span,
    )
}

fn synthetic(kind: ExprKind, span: Span) -> Expr {
    Expr {
        id: SYNTHETIC,
        kind,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(body: &str) -> CompiledFunction {
        let source = format!("fn helper() -> i32 {{ return 1; }}\nfn f() {{\n{body}\n}}");
        let module = wgsl_parser::parse_module(&source).unwrap();
        let names = module.functions().map(|f| f.name.clone()).collect();
        compile_function(module.function("f").unwrap(), &names).unwrap()
    }

    fn kinds(block: &CommandBlock) -> Vec<&'static str> {
        block
            .commands
            .iter()
            .map(|c| match c {
                Command::Statement(_) => "stmt",
                Command::Global(_) => "global",
                Command::CallExpr { .. } => "call",
                Command::Goto {
                    condition: Some(_), ..
                } => "goto?",
                Command::Goto { .. } => "goto",
                Command::Block(_) => "block",
                Command::BreakTarget(_) => "break_target",
                Command::ContinueTarget(_) => "continue_target",
                Command::Break { .. } => "break",
                Command::Continue { .. } => "continue",
                Command::Return { .. } => "return",
                Command::Discard { .. } => "discard",
            })
            .collect()
    }

    #[test]
    fn test_if_else_layout() {
        let f = compile("var x = 0;\nif x > 0 { x = 1; } else { x = 2; }");
        assert_eq!(
            kinds(&f.body),
            vec!["stmt", "goto?", "block", "goto", "block"]
        );
        match &f.body.commands[1] {
            Command::Goto { target, .. } => assert_eq!(*target, 4),
            other => panic!("unexpected {other:?}"),
        }
        match &f.body.commands[3] {
            Command::Goto { target, .. } => assert_eq!(*target, 5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_while_layout() {
        let f = compile("var i = 0;\nwhile i < 4 { i++; }");
        assert_eq!(
            kinds(&f.body),
            vec!["stmt", "continue_target", "goto?", "block", "goto", "break_target"]
        );
        match &f.body.commands[4] {
            Command::Goto { target, .. } => assert_eq!(*target, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_loop_places_continuing_after_continue_target() {
        let f = compile("var i = 0;\nloop {\n i++;\n continuing { i += 2; break if i > 5; }\n}");
        assert_eq!(kinds(&f.body), vec!["stmt", "block", "goto", "break_target"]);
        let Command::Block(iteration) = &f.body.commands[1] else {
            panic!("expected block");
        };
        assert_eq!(
            kinds(iteration),
            vec!["stmt", "continue_target", "stmt", "break"]
        );
    }

    #[test]
    fn test_user_calls_run_ahead_of_statement() {
        let f = compile("let a = helper() + helper();\nhelper();");
        assert_eq!(kinds(&f.body), vec!["call", "call", "stmt", "call"]);
    }

    #[test]
    fn test_short_circuit_call_sits_behind_jump() {
        let f = compile("let ok = false && helper() > 0;");
        assert_eq!(kinds(&f.body), vec!["stmt", "goto?", "call", "stmt", "stmt"]);
        match &f.body.commands[1] {
            Command::Goto {
                target, jump_if, ..
            } => {
                assert_eq!(*target, 4);
                assert!(!jump_if);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_left_operand_spilled_before_call() {
        let f = compile("var x = 1;\nlet a = x + helper();\nlet b = 2 + helper();");
        assert_eq!(
            kinds(&f.body),
            vec!["stmt", "stmt", "call", "stmt", "call", "stmt"]
        );
    }

    #[test]
    fn test_switch_layout() {
        let f = compile("switch 2 {\n case 1, 2: { }\n default: { }\n}");
        assert_eq!(
            kinds(&f.body),
            vec!["stmt", "goto?", "goto", "block", "goto", "block", "goto", "break_target"]
        );
        match &f.body.commands[2] {
            Command::Goto { target, .. } => assert_eq!(*target, 5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_break_outside_loop_is_rejected() {
        let module = wgsl_parser::parse_module("fn f() {\n  break;\n}").unwrap();
        let names = HashSet::new();
        let err = compile_function(module.function("f").unwrap(), &names).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_module_declarations_in_source_order() {
        let module = wgsl_parser::parse_module(
            "const a = 1;\nvar<private> b: i32;\noverride c = 2;\nlet d = a + 1;",
        )
        .unwrap();
        let (block, functions) = compile_module(&module).unwrap();
        assert!(functions.is_empty());
        assert_eq!(kinds(&block), vec!["stmt", "global", "global", "stmt"]);
    }
}
