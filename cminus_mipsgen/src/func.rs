use crate::context::Context;
use crate::expr::ExprBuilder;
use crate::var::FrameManager;
use cminus_syntax::FunDecl;
use cminus_typecheck::ScopeId;
use mips_helper::{Instr, Reg};
use std::io::Write;
use tracing::debug;

pub(crate) const MAIN: &str = "main";

pub(crate) fn entry_label(name: &str) -> String {
    format!("{name}_entry")
}

fn exit_label(name: &str) -> String {
    format!("{name}_exit")
}

pub(crate) struct FuncBuilder<'b, 'ctx, W: ?Sized> {
    pub(crate) ctx: &'b mut Context<'ctx, W>,
    pub(crate) fun: &'ctx FunDecl<'ctx>,
    pub(crate) scope: ScopeId,
    pub(crate) frame: FrameManager<'ctx>,
}

impl<'b, 'ctx, W: Write + ?Sized> FuncBuilder<'b, 'ctx, W> {
    pub(crate) fn new(ctx: &'b mut Context<'ctx, W>, fun: &'ctx FunDecl<'ctx>) -> Self {
        let Some(scope) = ctx.table.function_scope(fun.name) else {
            panic!("function '{}' has no scope", fun.name);
        };
        Self {
            ctx,
            fun,
            scope,
            frame: FrameManager::build(fun),
        }
    }

    pub(crate) fn build(mut self) -> std::io::Result<()> {
        let fun = self.fun;
        self.ctx.label(entry_label(fun.name))?;
        self.build_prologue()?;
        self.build_compound(&fun.body)?;
        self.ctx.label(exit_label(fun.name))?;
        self.build_epilogue()?;

        debug!(
            function = fun.name,
            frame_size = self.frame.frame_size(),
            "generated function"
        );
        Ok(())
    }

    fn build_prologue(&mut self) -> std::io::Result<()> {
        let mut result = vec![
            Instr::Addiu(Reg::Sp, Reg::Sp, -8),
            Instr::Sw(Reg::Ra, 4, Reg::Sp),
            Instr::Sw(Reg::Fp, 0, Reg::Sp),
            Instr::Move(Reg::Fp, Reg::Sp),
        ];
        let frame_size = self.frame.frame_size();
        if frame_size > 0 {
            result.push(Instr::Addiu(Reg::Sp, Reg::Sp, -frame_size));
        }
        self.ctx.emit_all(result)
    }

    fn build_epilogue(&mut self) -> std::io::Result<()> {
        if self.fun.name == MAIN {
            return self.ctx.emit_all(vec![Instr::Li(Reg::V0, 10), Instr::Syscall]);
        }
        self.ctx.emit_all(vec![
            Instr::Move(Reg::Sp, Reg::Fp),
            Instr::Lw(Reg::Fp, 0, Reg::Sp),
            Instr::Lw(Reg::Ra, 4, Reg::Sp),
            Instr::Addiu(Reg::Sp, Reg::Sp, 8),
            Instr::Jr(Reg::Ra),
        ])
    }

    pub(crate) fn exit_label(&self) -> String {
        exit_label(self.fun.name)
    }

    pub(crate) fn expr_builder(&self) -> ExprBuilder<'_, 'ctx> {
        ExprBuilder {
            table: self.ctx.table,
            scope: self.scope,
            frame: &self.frame,
            data: &self.ctx.data,
        }
    }
}
