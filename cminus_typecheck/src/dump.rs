use crate::scope::{SymbolTable, SymbolType};
use std::fmt::{Display, Formatter};

impl Display for SymbolType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Void => write!(f, "void"),
            Self::Builtin => write!(f, "builtin"),
        }
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, scope) in self.scopes().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "Scope: {}", scope.name())?;
            writeln!(f, "{:<12} {:<8} {:<14} {:<5} References", "Symbol", "Type", "Kind", "Line")?;
            for (name, info) in scope.symbols() {
                let declared = if info.declared_line == 0 {
                    String::from("-")
                } else {
                    info.declared_line.to_string()
                };
                let references = info
                    .reference_lines
                    .iter()
                    .map(|line| line.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let row = format!(
                    "{:<12} {:<8} {:<14} {:<5} {}",
                    name,
                    info.ty.to_string(),
                    info.kind.describe(),
                    declared,
                    references
                );
                writeln!(f, "{}", row.trim_end())?;
            }
        }
        Ok(())
    }
}
