use crate::errors::{
    argument_count, argument_not_int, array_without_index, condition_not_int, function_as_variable,
    incompatible_assignment, incompatible_types, index_not_int, indexing_scalar, not_a_function, return_mismatch,
    undeclared_identifier, SemanticError,
};
use crate::scope::{ScopeId, SymbolInfo, SymbolTable};
use cminus_syntax::{
    CompoundStmt, Declaration, Expr, ExprKind, FunDecl, Pos, Program, ReturnStmt, SourceFile, Statement, Type, VarRef,
};
use tracing::debug;

/// Second semantic pass. Annotates every expression with its type and
/// validates how declarations are used. Expects a table produced by
/// [`crate::build_symbol_table`] for the same program.
pub fn type_check(file: &SourceFile, program: &Program, table: &SymbolTable) -> Result<(), SemanticError> {
    let mut checker = TypeChecker {
        file,
        table,
        scope: table.global(),
        function: "",
        return_type: Type::Void,
    };
    for decl in program.declarations {
        if let Declaration::Fun(fun) = decl {
            checker.check_fun(fun)?;
        }
    }
    debug!("type checked program");
    Ok(())
}

struct TypeChecker<'f, 't, 'a> {
    file: &'f SourceFile,
    table: &'t SymbolTable,
    scope: ScopeId,
    function: &'a str,
    return_type: Type,
}

impl<'f, 't, 'a> TypeChecker<'f, 't, 'a> {
    fn check_fun(&mut self, fun: &FunDecl<'a>) -> Result<(), SemanticError> {
        let Some(scope) = self.table.function_scope(fun.name) else {
            return Err(undeclared_identifier(self.file, fun.pos, fun.name));
        };
        self.scope = scope;
        self.function = fun.name;
        self.return_type = fun.return_type;
        let result = self.check_compound(&fun.body);
        self.scope = self.table.global();
        result
    }

    fn check_compound(&mut self, block: &CompoundStmt) -> Result<(), SemanticError> {
        for stmt in block.statements {
            self.check_statement(stmt)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, stmt: &Statement) -> Result<(), SemanticError> {
        match stmt {
            Statement::Expr(stmt) => {
                if let Some(expr) = stmt.expr {
                    self.check_expr(expr)?;
                }
                Ok(())
            }
            Statement::Compound(block) => self.check_compound(block),
            Statement::If(stmt) => {
                self.check_condition(stmt.cond)?;
                self.check_statement(stmt.then_branch)?;
                match stmt.else_branch {
                    Some(else_branch) => self.check_statement(else_branch),
                    None => Ok(()),
                }
            }
            Statement::While(stmt) => {
                self.check_condition(stmt.cond)?;
                self.check_statement(stmt.body)
            }
            Statement::Return(stmt) => self.check_return(stmt),
        }
    }

    fn check_condition(&mut self, cond: &Expr) -> Result<(), SemanticError> {
        let ty = self.check_expr(cond)?;
        if ty != Type::Int {
            return Err(condition_not_int(self.file, cond.pos, ty));
        }
        Ok(())
    }

    fn check_return(&mut self, stmt: &ReturnStmt) -> Result<(), SemanticError> {
        let (pos, found) = match stmt.value {
            Some(value) => (value.pos, self.check_expr(value)?),
            None => (stmt.pos, Type::Void),
        };
        let mismatched = match stmt.value {
            Some(..) => self.return_type == Type::Void || found != self.return_type,
            None => self.return_type != Type::Void,
        };
        if mismatched {
            return Err(return_mismatch(self.file, pos, self.function, self.return_type, found));
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<Type, SemanticError> {
        let ty = match &expr.kind {
            ExprKind::Literal(..) => Type::Int,
            ExprKind::Var(var) => self.check_var(var)?,
            ExprKind::Assign { target, value } => {
                let target_ty = self.check_var(target)?;
                let value_ty = self.check_expr(value)?;
                if value_ty != target_ty {
                    return Err(incompatible_assignment(
                        self.file,
                        value.pos,
                        target.name,
                        target_ty,
                        value_ty,
                    ));
                }
                target_ty
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                if left_ty != right_ty || left_ty == Type::Void {
                    return Err(incompatible_types(self.file, expr.pos, *op, left_ty, right_ty));
                }
                Type::Int
            }
            ExprKind::Call { name, args } => self.check_call(expr.pos, name, args)?,
        };
        expr.annotate(ty);
        Ok(ty)
    }

    fn check_var(&mut self, var: &VarRef) -> Result<Type, SemanticError> {
        let info = self.resolve(var.pos, var.name)?;
        if info.is_callable() {
            return Err(function_as_variable(self.file, var.pos, var.name));
        }
        let ty = info.value_type();

        match (var.index, info.is_array()) {
            (Some(index), true) => {
                let index_ty = self.check_expr(index)?;
                if index_ty != Type::Int {
                    return Err(index_not_int(self.file, index.pos, index_ty));
                }
            }
            (None, true) => return Err(array_without_index(self.file, var.pos, var.name)),
            (Some(..), false) => return Err(indexing_scalar(self.file, var.pos, var.name)),
            (None, false) => (),
        }
        Ok(ty)
    }

    fn check_call(&mut self, pos: Pos, name: &str, args: &[Expr]) -> Result<Type, SemanticError> {
        let info = self.resolve(pos, name)?;
        let Some(params) = info.params() else {
            return Err(not_a_function(self.file, pos, name));
        };
        if params.len() != args.len() {
            return Err(argument_count(self.file, pos, name, params.len(), args.len()));
        }
        let returns = info.value_type();

        for (position, arg) in args.iter().enumerate() {
            let ty = self.check_expr(arg)?;
            if ty != Type::Int {
                return Err(argument_not_int(self.file, arg.pos, name, position + 1, ty));
            }
        }
        Ok(returns)
    }

    fn resolve(&self, pos: Pos, name: &str) -> Result<&'t SymbolInfo, SemanticError> {
        match self.table.lookup(self.scope, name) {
            Some((_, info)) => Ok(info),
            None => Err(undeclared_identifier(self.file, pos, name)),
        }
    }
}
