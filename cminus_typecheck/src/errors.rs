use cminus_syntax::{BinaryOp, Diagnostic, Pos, SourceFile, Type};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SemanticError(pub Diagnostic);

impl SemanticError {
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.0
    }
}

fn error(file: &SourceFile, pos: Pos, message: String) -> SemanticError {
    SemanticError(file.diagnostic(pos, message))
}

pub(crate) fn void_variable(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("cannot declare void variable '{name}'"))
}

pub(crate) fn non_positive_array_size(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("array size must be positive for '{name}'"))
}

pub(crate) fn array_too_large(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("array '{name}' is too large"))
}

pub(crate) fn redeclared_symbol(file: &SourceFile, pos: Pos, name: &str, declared_line: usize) -> SemanticError {
    let message = if declared_line == 0 {
        format!("redeclaration of builtin '{name}'")
    } else {
        format!("redeclaration of '{name}' in the same scope, first declared on line {declared_line}")
    };
    error(file, pos, message)
}

pub(crate) fn undeclared_identifier(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("undeclared identifier '{name}'"))
}

pub(crate) fn missing_main(file: &SourceFile, pos: Pos) -> SemanticError {
    error(file, pos, String::from("program has no main function"))
}

pub(crate) fn main_with_params(file: &SourceFile, pos: Pos) -> SemanticError {
    error(file, pos, String::from("main must not take parameters"))
}

pub(crate) fn incompatible_types(file: &SourceFile, pos: Pos, op: BinaryOp, left: Type, right: Type) -> SemanticError {
    error(
        file,
        pos,
        format!("incompatible types: cannot apply '{op}' to {left} and {right}"),
    )
}

pub(crate) fn incompatible_assignment(file: &SourceFile, pos: Pos, name: &str, target: Type, value: Type) -> SemanticError {
    error(
        file,
        pos,
        format!("incompatible types: cannot assign {value} to '{name}' of type {target}"),
    )
}

pub(crate) fn return_mismatch(file: &SourceFile, pos: Pos, function: &str, expected: Type, found: Type) -> SemanticError {
    error(
        file,
        pos,
        format!("return type mismatch: '{function}' returns {expected}, but this returns {found}"),
    )
}

pub(crate) fn condition_not_int(file: &SourceFile, pos: Pos, found: Type) -> SemanticError {
    error(file, pos, format!("condition must be int, but found {found}"))
}

pub(crate) fn not_a_function(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("'{name}' is not a function"))
}

pub(crate) fn argument_count(file: &SourceFile, pos: Pos, name: &str, expected: usize, found: usize) -> SemanticError {
    error(
        file,
        pos,
        format!("function '{name}' expects {expected} argument(s), but found {found}"),
    )
}

pub(crate) fn argument_not_int(file: &SourceFile, pos: Pos, name: &str, position: usize, found: Type) -> SemanticError {
    error(
        file,
        pos,
        format!("argument {position} of '{name}' must be int, but found {found}"),
    )
}

pub(crate) fn function_as_variable(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("'{name}' is a function and cannot be used as a variable"))
}

pub(crate) fn array_without_index(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("array '{name}' must be indexed"))
}

pub(crate) fn indexing_scalar(file: &SourceFile, pos: Pos, name: &str) -> SemanticError {
    error(file, pos, format!("'{name}' is not an array"))
}

pub(crate) fn index_not_int(file: &SourceFile, pos: Pos, found: Type) -> SemanticError {
    error(file, pos, format!("array index must be int, but found {found}"))
}
