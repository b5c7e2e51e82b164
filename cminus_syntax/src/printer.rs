use crate::ast::{CompoundStmt, Declaration, Expr, ExprKind, FunDecl, Program, Statement, VarDecl, VarRef};
use std::fmt::{Display, Formatter, Result};

const INDENT: usize = 2;

/// Indented tree rendering, one node per line. Expressions the type checker
/// already visited carry a `: <type>` suffix.
impl<'a> Display for Program<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Program")?;
        for decl in self.declarations {
            match decl {
                Declaration::Var(var) => write_var_decl(f, INDENT, var)?,
                Declaration::Fun(fun) => write_fun_decl(f, INDENT, fun)?,
            }
        }
        Ok(())
    }
}

fn write_var_decl(f: &mut Formatter<'_>, depth: usize, var: &VarDecl) -> Result {
    write!(f, "{:depth$}VarDecl {}: {}", "", var.name, var.ty)?;
    if let Some(size) = var.array_size {
        write!(f, " [{size}]")?;
    }
    writeln!(f)
}

fn write_fun_decl(f: &mut Formatter<'_>, depth: usize, fun: &FunDecl) -> Result {
    writeln!(f, "{:depth$}FunDecl {}: {}", "", fun.name, fun.return_type)?;
    for param in fun.params {
        writeln!(f, "{:width$}Param {}: {}", "", param.name, param.ty, width = depth + INDENT)?;
    }
    write_compound(f, depth + INDENT, &fun.body)
}

fn write_compound(f: &mut Formatter<'_>, depth: usize, block: &CompoundStmt) -> Result {
    writeln!(f, "{:depth$}Compound", "")?;
    for var in block.locals {
        write_var_decl(f, depth + INDENT, var)?;
    }
    for stmt in block.statements {
        write_statement(f, depth + INDENT, stmt)?;
    }
    Ok(())
}

fn write_statement(f: &mut Formatter<'_>, depth: usize, stmt: &Statement) -> Result {
    let inner = depth + INDENT;
    match stmt {
        Statement::Expr(stmt) => {
            writeln!(f, "{:depth$}ExprStmt", "")?;
            if let Some(expr) = stmt.expr {
                write_expr(f, inner, expr)?;
            }
        }
        Statement::Compound(block) => write_compound(f, depth, block)?,
        Statement::If(stmt) => {
            writeln!(f, "{:depth$}If", "")?;
            write_expr(f, inner, stmt.cond)?;
            write_statement(f, inner, stmt.then_branch)?;
            if let Some(else_branch) = stmt.else_branch {
                writeln!(f, "{:depth$}Else", "")?;
                write_statement(f, inner, else_branch)?;
            }
        }
        Statement::While(stmt) => {
            writeln!(f, "{:depth$}While", "")?;
            write_expr(f, inner, stmt.cond)?;
            write_statement(f, inner, stmt.body)?;
        }
        Statement::Return(stmt) => {
            writeln!(f, "{:depth$}Return", "")?;
            if let Some(value) = stmt.value {
                write_expr(f, inner, value)?;
            }
        }
    }
    Ok(())
}

fn write_expr(f: &mut Formatter<'_>, depth: usize, expr: &Expr) -> Result {
    write!(f, "{:depth$}", "")?;
    match &expr.kind {
        ExprKind::Assign { .. } => write!(f, "Assign")?,
        ExprKind::Binary { op, .. } => write!(f, "Binary {op}")?,
        ExprKind::Call { name, .. } => write!(f, "Call {name}")?,
        ExprKind::Var(var) => write!(f, "Var {}", var.name)?,
        ExprKind::Literal(value) => write!(f, "Literal {value}")?,
    }
    if let Some(ty) = expr.ty() {
        write!(f, ": {ty}")?;
    }
    writeln!(f)?;

    let inner = depth + INDENT;
    match &expr.kind {
        ExprKind::Assign { target, value } => {
            write_target(f, inner, target)?;
            write_expr(f, inner, value)
        }
        ExprKind::Binary { left, right, .. } => {
            write_expr(f, inner, left)?;
            write_expr(f, inner, right)
        }
        ExprKind::Call { args, .. } => args.iter().try_for_each(|arg| write_expr(f, inner, arg)),
        ExprKind::Var(var) => write_index(f, inner, var),
        ExprKind::Literal(..) => Ok(()),
    }
}

fn write_target(f: &mut Formatter<'_>, depth: usize, target: &VarRef) -> Result {
    writeln!(f, "{:depth$}Var {}", "", target.name)?;
    write_index(f, depth + INDENT, target)
}

fn write_index(f: &mut Formatter<'_>, depth: usize, var: &VarRef) -> Result {
    match var.index {
        Some(index) => write_expr(f, depth, index),
        None => Ok(()),
    }
}
