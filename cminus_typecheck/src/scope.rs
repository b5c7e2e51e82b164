use cminus_syntax::Type;
use indexmap::IndexMap;

pub const GLOBAL_SCOPE: &str = "__global";
pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// The type column of a symbol. Builtins are kept apart from user
/// functions so the dump can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    Int,
    Void,
    Builtin,
}

impl From<Type> for SymbolType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => Self::Int,
            Type::Void => Self::Void,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Scalar,
    Array { size: u32 },
    Param { index: usize },
    Function { params: Vec<Type> },
    Builtin { params: Vec<Type>, returns: Type },
}

impl SymbolKind {
    /// Short label used by the symbol table dump.
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar => String::from("variable"),
            Self::Array { size } => format!("array[{size}]"),
            Self::Param { index } => format!("parameter #{}", index + 1),
            Self::Function { .. } => String::from("function"),
            Self::Builtin { .. } => String::from("function"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub ty: SymbolType,
    pub kind: SymbolKind,
    pub declared_line: usize,
    pub reference_lines: Vec<usize>,
}

impl SymbolInfo {
    pub fn new(ty: SymbolType, kind: SymbolKind, declared_line: usize) -> Self {
        Self {
            ty,
            kind,
            declared_line,
            reference_lines: Vec::default(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SymbolKind::Array { .. })
    }

    pub fn array_size(&self) -> u32 {
        match self.kind {
            SymbolKind::Array { size } => size,
            _ => 0,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. } | SymbolKind::Builtin { .. })
    }

    /// Parameter types if the symbol can be called.
    pub fn params(&self) -> Option<&[Type]> {
        match &self.kind {
            SymbolKind::Function { params } | SymbolKind::Builtin { params, .. } => Some(params.as_slice()),
            _ => None,
        }
    }

    /// The type of the value this symbol produces when read or called.
    pub fn value_type(&self) -> Type {
        match (&self.kind, self.ty) {
            (SymbolKind::Builtin { returns, .. }, _) => *returns,
            (_, SymbolType::Void) => Type::Void,
            _ => Type::Int,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    parent: Option<ScopeId>,
    symbols: IndexMap<String, SymbolInfo>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, &SymbolInfo)> {
        self.symbols.iter().map(|(name, info)| (name.as_str(), info))
    }
}

/// Every scope of a program, kept in a flat list for the whole compilation.
/// Scope 0 is the global scope and comes seeded with the builtins.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let mut symbols = IndexMap::new();
        symbols.insert(
            String::from(INPUT),
            SymbolInfo::new(
                SymbolType::Builtin,
                SymbolKind::Builtin {
                    params: vec![],
                    returns: Type::Int,
                },
                0,
            ),
        );
        symbols.insert(
            String::from(OUTPUT),
            SymbolInfo::new(
                SymbolType::Builtin,
                SymbolKind::Builtin {
                    params: vec![Type::Int],
                    returns: Type::Void,
                },
                0,
            ),
        );

        Self {
            scopes: vec![Scope {
                name: String::from(GLOBAL_SCOPE),
                parent: None,
                symbols,
            }],
        }
    }
}

impl SymbolTable {
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn function_scope(&self, name: &str) -> Option<ScopeId> {
        self.scopes
            .iter()
            .skip(1)
            .position(|scope| scope.name == name)
            .map(|i| ScopeId(i + 1))
    }

    /// Walks from `scope` up to the global scope and stops at the first
    /// scope that binds `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &SymbolInfo)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(info) = scope.get(name) {
                return Some((id, info));
            }
            current = scope.parent;
        }
        None
    }

    pub fn is_global(&self, scope: ScopeId) -> bool {
        scope == self.global()
    }

    pub(crate) fn create_scope(&mut self, name: &str, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            name: name.to_string(),
            parent: Some(parent),
            symbols: IndexMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Binds `name` in `scope` unless the scope already binds it, in which
    /// case the existing declaration is returned.
    pub(crate) fn declare(&mut self, scope: ScopeId, name: &str, info: SymbolInfo) -> Result<(), &SymbolInfo> {
        let symbols = &mut self.scopes[scope.0].symbols;
        if symbols.contains_key(name) {
            return Err(&symbols[name]);
        }
        symbols.insert(name.to_string(), info);
        Ok(())
    }

    pub(crate) fn add_reference(&mut self, scope: ScopeId, name: &str, line: usize) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &mut self.scopes[id.0];
            if let Some(info) = scope.symbols.get_mut(name) {
                info.reference_lines.push(line);
                return true;
            }
            current = scope.parent;
        }
        false
    }
}
