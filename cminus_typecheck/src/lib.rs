mod checker;
mod dump;
mod errors;
mod scope;
mod symbols;

pub use checker::type_check;
pub use errors::SemanticError;
pub use scope::{Scope, ScopeId, SymbolInfo, SymbolKind, SymbolTable, SymbolType, GLOBAL_SCOPE, INPUT, OUTPUT};
pub use symbols::build_symbol_table;

use cminus_syntax::{Program, SourceFile};

/// Runs both semantic passes: builds the symbol table, then type checks the
/// program against it. The returned table is what code generation reads.
pub fn analyze(file: &SourceFile, program: &Program) -> Result<SymbolTable, SemanticError> {
    let table = build_symbol_table(file, program)?;
    type_check(file, program, &table)?;
    Ok(table)
}
