use crate::func::FuncBuilder;
use cminus_syntax::{CompoundStmt, Expr, IfStmt, ReturnStmt, Statement, WhileStmt};
use mips_helper::{Instr, Reg};
use std::io::Write;

impl<'b, 'ctx, W: Write + ?Sized> FuncBuilder<'b, 'ctx, W> {
    // Locals were already given their slots when the frame was built, so a
    // block only emits its statements.
    pub(crate) fn build_compound(&mut self, block: &CompoundStmt<'ctx>) -> std::io::Result<()> {
        for stmt in block.statements {
            self.build_statement(stmt)?;
        }
        Ok(())
    }

    fn build_statement(&mut self, stmt: &Statement<'ctx>) -> std::io::Result<()> {
        match stmt {
            Statement::Expr(stmt) => match stmt.expr {
                Some(expr) => self.build_expr(expr),
                None => Ok(()),
            },
            Statement::Compound(block) => self.build_compound(block),
            Statement::If(stmt) => self.build_if(stmt),
            Statement::While(stmt) => self.build_while(stmt),
            Statement::Return(stmt) => self.build_return(stmt),
        }
    }

    fn build_expr(&mut self, expr: &Expr<'ctx>) -> std::io::Result<()> {
        let instrs = self.expr_builder().build(expr);
        self.ctx.emit_all(instrs)
    }

    /// The else branch is laid out first, falling through to a jump over
    /// the then branch.
    fn build_if(&mut self, stmt: &IfStmt<'ctx>) -> std::io::Result<()> {
        let id = self.ctx.next_label();
        let true_label = format!("true_{id}");
        let end_label = format!("end_if_{id}");

        self.build_expr(stmt.cond)?;
        self.ctx.emit(Instr::Bne(Reg::T0, Reg::Zero, true_label.clone()))?;
        if let Some(else_branch) = stmt.else_branch {
            self.build_statement(else_branch)?;
        }
        self.ctx.emit(Instr::J(end_label.clone()))?;
        self.ctx.label(true_label)?;
        self.build_statement(stmt.then_branch)?;
        self.ctx.label(end_label)
    }

    fn build_while(&mut self, stmt: &WhileStmt<'ctx>) -> std::io::Result<()> {
        let id = self.ctx.next_label();
        let loop_label = format!("while_{id}");
        let end_label = format!("end_while_{id}");

        self.ctx.label(loop_label.clone())?;
        self.build_expr(stmt.cond)?;
        self.ctx.emit(Instr::Beq(Reg::T0, Reg::Zero, end_label.clone()))?;
        self.build_statement(stmt.body)?;
        self.ctx.emit(Instr::J(loop_label))?;
        self.ctx.label(end_label)
    }

    fn build_return(&mut self, stmt: &ReturnStmt<'ctx>) -> std::io::Result<()> {
        if let Some(value) = stmt.value {
            self.build_expr(value)?;
            self.ctx.emit(Instr::Move(Reg::V0, Reg::T0))?;
        }
        let exit = self.exit_label();
        self.ctx.emit(Instr::J(exit))
    }
}
