use crate::token::Pos;
use std::cell::OnceCell;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Void,
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Void => write!(f, "void"),
        }
    }
}

#[derive(Debug)]
pub struct Program<'a> {
    pub pos: Pos,
    pub declarations: &'a [Declaration<'a>],
}

impl<'a> Program<'a> {
    pub fn functions(&self) -> impl Iterator<Item = &'a FunDecl<'a>> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Fun(fun) => Some(fun),
            Declaration::Var(..) => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &'a VarDecl<'a>> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Var(var) => Some(var),
            Declaration::Fun(..) => None,
        })
    }
}

#[derive(Debug)]
pub enum Declaration<'a> {
    Var(VarDecl<'a>),
    Fun(FunDecl<'a>),
}

impl<'a> Declaration<'a> {
    pub fn pos(&self) -> Pos {
        match self {
            Self::Var(decl) => decl.pos,
            Self::Fun(decl) => decl.pos,
        }
    }
}

#[derive(Debug)]
pub struct VarDecl<'a> {
    pub pos: Pos,
    pub name: &'a str,
    pub ty: Type,
    pub array_size: Option<u32>,
}

#[derive(Debug)]
pub struct FunDecl<'a> {
    pub pos: Pos,
    pub name: &'a str,
    pub return_type: Type,
    pub params: &'a [Param<'a>],
    pub body: CompoundStmt<'a>,
}

#[derive(Debug)]
pub struct Param<'a> {
    pub pos: Pos,
    pub name: &'a str,
    pub ty: Type,
}

#[derive(Debug)]
pub enum Statement<'a> {
    Expr(ExprStmt<'a>),
    Compound(CompoundStmt<'a>),
    If(IfStmt<'a>),
    While(WhileStmt<'a>),
    Return(ReturnStmt<'a>),
}

#[derive(Debug)]
pub struct ExprStmt<'a> {
    pub pos: Pos,
    pub expr: Option<&'a Expr<'a>>,
}

#[derive(Debug)]
pub struct CompoundStmt<'a> {
    pub pos: Pos,
    pub locals: &'a [VarDecl<'a>],
    pub statements: &'a [Statement<'a>],
}

impl<'a> CompoundStmt<'a> {
    /// Every local declared in this block and in the blocks nested inside
    /// it, in source order.
    pub fn all_locals(&self) -> Vec<&VarDecl<'a>> {
        let mut locals = Vec::default();
        collect_locals(self, &mut locals);
        locals
    }
}

fn collect_locals<'a, 'b>(block: &'b CompoundStmt<'a>, locals: &mut Vec<&'b VarDecl<'a>>) {
    locals.extend(block.locals.iter());
    for stmt in block.statements {
        collect_statement_locals(stmt, locals);
    }
}

fn collect_statement_locals<'a, 'b>(stmt: &'b Statement<'a>, locals: &mut Vec<&'b VarDecl<'a>>) {
    match stmt {
        Statement::Compound(block) => collect_locals(block, locals),
        Statement::If(stmt) => {
            collect_statement_locals(stmt.then_branch, locals);
            if let Some(else_branch) = stmt.else_branch {
                collect_statement_locals(else_branch, locals);
            }
        }
        Statement::While(stmt) => collect_statement_locals(stmt.body, locals),
        Statement::Expr(..) | Statement::Return(..) => (),
    }
}

#[derive(Debug)]
pub struct IfStmt<'a> {
    pub pos: Pos,
    pub cond: &'a Expr<'a>,
    pub then_branch: &'a Statement<'a>,
    pub else_branch: Option<&'a Statement<'a>>,
}

#[derive(Debug)]
pub struct WhileStmt<'a> {
    pub pos: Pos,
    pub cond: &'a Expr<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug)]
pub struct ReturnStmt<'a> {
    pub pos: Pos,
    pub value: Option<&'a Expr<'a>>,
}

/// An expression node. The type slot starts empty and is filled in exactly
/// once by the type checker.
#[derive(Debug)]
pub struct Expr<'a> {
    pub pos: Pos,
    pub kind: ExprKind<'a>,
    ty: OnceCell<Type>,
}

impl<'a> Expr<'a> {
    pub fn new(pos: Pos, kind: ExprKind<'a>) -> Self {
        Self {
            pos,
            kind,
            ty: OnceCell::new(),
        }
    }

    pub fn ty(&self) -> Option<Type> {
        self.ty.get().copied()
    }

    pub fn annotate(&self, ty: Type) {
        let annotated_twice = self.ty.set(ty).is_err();
        debug_assert!(!annotated_twice, "expression at {} annotated twice", self.pos);
    }
}

#[derive(Debug)]
pub enum ExprKind<'a> {
    Assign {
        target: VarRef<'a>,
        value: &'a Expr<'a>,
    },
    Binary {
        op: BinaryOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Call {
        name: &'a str,
        args: &'a [Expr<'a>],
    },
    Var(VarRef<'a>),
    Literal(i32),
}

#[derive(Debug, Clone, Copy)]
pub struct VarRef<'a> {
    pub pos: Pos,
    pub name: &'a str,
    pub index: Option<&'a Expr<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LEq,
    Gt,
    GEq,
    Eq,
    NEq,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::LEq => "<=",
            Self::Gt => ">",
            Self::GEq => ">=",
            Self::Eq => "==",
            Self::NEq => "!=",
        };
        write!(f, "{symbol}")
    }
}
