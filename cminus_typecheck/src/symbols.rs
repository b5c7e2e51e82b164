use crate::errors::{
    array_too_large, main_with_params, missing_main, non_positive_array_size, redeclared_symbol, undeclared_identifier,
    void_variable, SemanticError,
};
use crate::scope::{ScopeId, SymbolInfo, SymbolKind, SymbolTable, SymbolType};
use cminus_syntax::{
    CompoundStmt, Declaration, Expr, ExprKind, FunDecl, Param, Pos, Program, SourceFile, Statement, Type, VarDecl,
    VarRef,
};
use tracing::debug;

const WORD_BYTES: u32 = 4;

/// First semantic pass: declares every name in its scope and records the
/// line of every reference against the declaration it resolves to.
pub fn build_symbol_table(file: &SourceFile, program: &Program) -> Result<SymbolTable, SemanticError> {
    let mut builder = SymbolTableBuilder::new(file);
    for decl in program.declarations {
        match decl {
            Declaration::Var(var) => builder.declare_var(var)?,
            Declaration::Fun(fun) => builder.declare_fun(fun)?,
        }
    }
    builder.check_main(program)?;

    debug!(scopes = builder.table.scopes().count(), "built symbol table");
    Ok(builder.table)
}

struct SymbolTableBuilder<'f> {
    file: &'f SourceFile,
    table: SymbolTable,
    current: ScopeId,
    // bytes of locals reserved so far in the function being walked
    frame_bytes: Option<i32>,
}

impl<'f> SymbolTableBuilder<'f> {
    fn new(file: &'f SourceFile) -> Self {
        let table = SymbolTable::default();
        let current = table.global();
        Self {
            file,
            table,
            current,
            frame_bytes: None,
        }
    }

    fn declare(&mut self, pos: Pos, name: &str, info: SymbolInfo) -> Result<(), SemanticError> {
        self.table
            .declare(self.current, name, info)
            .map_err(|existing| redeclared_symbol(self.file, pos, name, existing.declared_line))
    }

    fn declare_var(&mut self, var: &VarDecl) -> Result<(), SemanticError> {
        if var.ty == Type::Void {
            return Err(void_variable(self.file, var.pos, var.name));
        }
        let kind = match var.array_size {
            Some(0) => return Err(non_positive_array_size(self.file, var.pos, var.name)),
            Some(size) => SymbolKind::Array { size },
            None => SymbolKind::Scalar,
        };
        self.reserve_storage(var)?;
        self.declare(var.pos, var.name, SymbolInfo::new(var.ty.into(), kind, var.pos.line))
    }

    // Globals must fit a `.space` directive, locals the signed frame offsets.
    fn reserve_storage(&mut self, var: &VarDecl) -> Result<(), SemanticError> {
        let file = self.file;
        let too_large = || array_too_large(file, var.pos, var.name);
        let bytes = var
            .array_size
            .unwrap_or(1)
            .checked_mul(WORD_BYTES)
            .ok_or_else(too_large)?;
        if let Some(frame_bytes) = self.frame_bytes.as_mut() {
            *frame_bytes = i32::try_from(bytes)
                .ok()
                .and_then(|bytes| frame_bytes.checked_add(bytes))
                .ok_or_else(too_large)?;
        }
        Ok(())
    }

    fn declare_param(&mut self, index: usize, param: &Param) -> Result<(), SemanticError> {
        if param.ty == Type::Void {
            return Err(void_variable(self.file, param.pos, param.name));
        }
        let info = SymbolInfo::new(SymbolType::Int, SymbolKind::Param { index }, param.pos.line);
        self.declare(param.pos, param.name, info)
    }

    fn declare_fun(&mut self, fun: &FunDecl) -> Result<(), SemanticError> {
        let params = fun.params.iter().map(|param| param.ty).collect();
        let info = SymbolInfo::new(fun.return_type.into(), SymbolKind::Function { params }, fun.pos.line);
        self.declare(fun.pos, fun.name, info)?;

        let scope = self.table.create_scope(fun.name, self.current);
        let enclosing = std::mem::replace(&mut self.current, scope);
        self.frame_bytes = Some(0);
        let result = self.walk_fun(fun);
        self.frame_bytes = None;
        self.current = enclosing;
        result
    }

    fn walk_fun(&mut self, fun: &FunDecl) -> Result<(), SemanticError> {
        for (index, param) in fun.params.iter().enumerate() {
            self.declare_param(index, param)?;
        }
        self.walk_compound(&fun.body)
    }

    fn walk_compound(&mut self, block: &CompoundStmt) -> Result<(), SemanticError> {
        for var in block.locals {
            self.declare_var(var)?;
        }
        for stmt in block.statements {
            self.walk_statement(stmt)?;
        }
        Ok(())
    }

    fn walk_statement(&mut self, stmt: &Statement) -> Result<(), SemanticError> {
        match stmt {
            Statement::Expr(stmt) => match stmt.expr {
                Some(expr) => self.walk_expr(expr),
                None => Ok(()),
            },
            Statement::Compound(block) => self.walk_compound(block),
            Statement::If(stmt) => {
                self.walk_expr(stmt.cond)?;
                self.walk_statement(stmt.then_branch)?;
                match stmt.else_branch {
                    Some(else_branch) => self.walk_statement(else_branch),
                    None => Ok(()),
                }
            }
            Statement::While(stmt) => {
                self.walk_expr(stmt.cond)?;
                self.walk_statement(stmt.body)
            }
            Statement::Return(stmt) => match stmt.value {
                Some(value) => self.walk_expr(value),
                None => Ok(()),
            },
        }
    }

    fn walk_expr(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                self.walk_var(target)?;
                self.walk_expr(value)
            }
            ExprKind::Binary { left, right, .. } => {
                self.walk_expr(left)?;
                self.walk_expr(right)
            }
            ExprKind::Call { name, args } => {
                self.reference(expr.pos, name)?;
                for arg in args.iter() {
                    self.walk_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::Var(var) => self.walk_var(var),
            ExprKind::Literal(..) => Ok(()),
        }
    }

    fn walk_var(&mut self, var: &VarRef) -> Result<(), SemanticError> {
        self.reference(var.pos, var.name)?;
        match var.index {
            Some(index) => self.walk_expr(index),
            None => Ok(()),
        }
    }

    fn reference(&mut self, pos: Pos, name: &str) -> Result<(), SemanticError> {
        if self.table.add_reference(self.current, name, pos.line) {
            Ok(())
        } else {
            Err(undeclared_identifier(self.file, pos, name))
        }
    }

    fn check_main(&self, program: &Program) -> Result<(), SemanticError> {
        let Some(main) = program.functions().find(|fun| fun.name == "main") else {
            let end = program.declarations.last().map(|decl| decl.pos()).unwrap_or(program.pos);
            return Err(missing_main(self.file, end));
        };
        if !main.params.is_empty() {
            return Err(main_with_params(self.file, main.pos));
        }
        Ok(())
    }
}
