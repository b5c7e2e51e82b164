use crate::ast::{
    BinaryOp, CompoundStmt, Declaration, Expr, ExprKind, ExprStmt, FunDecl, IfStmt, Param, Program, ReturnStmt,
    Statement, Type, VarDecl, VarRef, WhileStmt,
};
use crate::error::{integer_out_of_range, invalid_assignment_target, unexpected_token, SyntaxError};
use crate::scanner::Scanner;
use crate::token::{Pos, SourceFile, Token, TokenKind};
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use tracing::{debug, trace};

/// Parses a whole compilation unit. Nodes are allocated in `arena`, and the
/// first lexical or syntax error aborts parsing.
pub fn parse<'a>(arena: &'a Bump, file: &SourceFile) -> Result<Program<'a>, SyntaxError> {
    let mut parser = FileParser::new(arena, file)?;
    let program = parser.parse_program()?;
    debug!(declarations = program.declarations.len(), "parsed program");
    Ok(program)
}

struct FileParser<'a, 'f> {
    arena: &'a Bump,
    file: &'f SourceFile,
    scanner: Scanner<'f>,
    current: Token,
}

impl<'a, 'f> FileParser<'a, 'f> {
    fn new(arena: &'a Bump, file: &'f SourceFile) -> Result<Self, SyntaxError> {
        let mut scanner = Scanner::new(file);
        let current = scanner.next_token()?;
        Ok(Self {
            arena,
            file,
            scanner,
            current,
        })
    }

    fn parse_program(&mut self) -> Result<Program<'a>, SyntaxError> {
        let pos = Pos::new(1, 1);
        let mut declarations = BumpVec::new_in(self.arena);
        while self.kind() != TokenKind::Eof {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Program {
            pos,
            declarations: declarations.into_bump_slice(),
        })
    }

    fn parse_declaration(&mut self) -> Result<Declaration<'a>, SyntaxError> {
        let (pos, ty) = self.parse_type_specifier()?;
        let name = self.take(TokenKind::Ident)?;
        let name = self.arena.alloc_str(&name.value);

        if self.kind() == TokenKind::OpenBrac {
            self.parse_fun_declaration(pos, ty, name).map(Declaration::Fun)
        } else {
            self.parse_var_declaration(pos, ty, name).map(Declaration::Var)
        }
    }

    fn parse_type_specifier(&mut self) -> Result<(Pos, Type), SyntaxError> {
        let ty = match self.kind() {
            TokenKind::Int => Type::Int,
            TokenKind::Void => Type::Void,
            _ => return Err(unexpected_token(self.file, "type specifier", self.token()).into()),
        };
        let token = self.advance()?;
        Ok((token.pos, ty))
    }

    fn parse_var_declaration(&mut self, pos: Pos, ty: Type, name: &'a str) -> Result<VarDecl<'a>, SyntaxError> {
        let mut array_size = None;
        if self.take_if(TokenKind::OpenSquare)?.is_some() {
            let size = self.take(TokenKind::NumberLit)?;
            let value = self.parse_int(&size)?;
            array_size = Some(value as u32);
            self.take(TokenKind::CloseSquare)?;
        }
        self.take(TokenKind::SemiColon)?;

        Ok(VarDecl {
            pos,
            name,
            ty,
            array_size,
        })
    }

    fn parse_fun_declaration(
        &mut self,
        pos: Pos,
        return_type: Type,
        name: &'a str,
    ) -> Result<FunDecl<'a>, SyntaxError> {
        self.take(TokenKind::OpenBrac)?;
        let params = self.parse_params()?;
        self.take(TokenKind::CloseBrac)?;
        let body = self.parse_compound_statement()?;

        Ok(FunDecl {
            pos,
            name,
            return_type,
            params,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<&'a [Param<'a>], SyntaxError> {
        let mut params = BumpVec::new_in(self.arena);

        if self.kind() == TokenKind::Void {
            let void = self.advance()?;
            if self.kind() == TokenKind::CloseBrac {
                return Ok(params.into_bump_slice());
            }
            params.push(self.parse_param_name(void.pos, Type::Void)?);
        } else {
            params.push(self.parse_param()?);
        }

        while self.take_if(TokenKind::Comma)?.is_some() {
            params.push(self.parse_param()?);
        }

        Ok(params.into_bump_slice())
    }

    fn parse_param(&mut self) -> Result<Param<'a>, SyntaxError> {
        let (pos, ty) = self.parse_type_specifier()?;
        self.parse_param_name(pos, ty)
    }

    fn parse_param_name(&mut self, pos: Pos, ty: Type) -> Result<Param<'a>, SyntaxError> {
        let name = self.take(TokenKind::Ident)?;
        Ok(Param {
            pos,
            name: self.arena.alloc_str(&name.value),
            ty,
        })
    }

    fn parse_compound_statement(&mut self) -> Result<CompoundStmt<'a>, SyntaxError> {
        let open = self.take(TokenKind::OpenBlock)?;

        let mut locals = BumpVec::new_in(self.arena);
        while matches!(self.kind(), TokenKind::Int | TokenKind::Void) {
            let (pos, ty) = self.parse_type_specifier()?;
            let name = self.take(TokenKind::Ident)?;
            let name = self.arena.alloc_str(&name.value);
            locals.push(self.parse_var_declaration(pos, ty, name)?);
        }

        let mut statements = BumpVec::new_in(self.arena);
        while self.kind() != TokenKind::CloseBlock {
            statements.push(self.parse_statement()?);
        }
        self.take(TokenKind::CloseBlock)?;

        Ok(CompoundStmt {
            pos: open.pos,
            locals: locals.into_bump_slice(),
            statements: statements.into_bump_slice(),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement<'a>, SyntaxError> {
        match self.kind() {
            TokenKind::If => self.parse_selection_statement().map(Statement::If),
            TokenKind::While => self.parse_iteration_statement().map(Statement::While),
            TokenKind::Return => self.parse_return_statement().map(Statement::Return),
            TokenKind::OpenBlock => self.parse_compound_statement().map(Statement::Compound),
            _ => self.parse_expression_statement().map(Statement::Expr),
        }
    }

    fn parse_selection_statement(&mut self) -> Result<IfStmt<'a>, SyntaxError> {
        let if_tok = self.take(TokenKind::If)?;
        self.take(TokenKind::OpenBrac)?;
        let cond = self.parse_expression()?;
        self.take(TokenKind::CloseBrac)?;
        let then_branch = self.parse_statement()?;

        let mut else_branch = None;
        if self.take_if(TokenKind::Else)?.is_some() {
            let stmt = self.parse_statement()?;
            else_branch = Some(&*self.arena.alloc(stmt));
        }

        Ok(IfStmt {
            pos: if_tok.pos,
            cond: self.arena.alloc(cond),
            then_branch: self.arena.alloc(then_branch),
            else_branch,
        })
    }

    fn parse_iteration_statement(&mut self) -> Result<WhileStmt<'a>, SyntaxError> {
        let while_tok = self.take(TokenKind::While)?;
        self.take(TokenKind::OpenBrac)?;
        let cond = self.parse_expression()?;
        self.take(TokenKind::CloseBrac)?;
        let body = self.parse_statement()?;

        Ok(WhileStmt {
            pos: while_tok.pos,
            cond: self.arena.alloc(cond),
            body: self.arena.alloc(body),
        })
    }

    fn parse_return_statement(&mut self) -> Result<ReturnStmt<'a>, SyntaxError> {
        let return_tok = self.take(TokenKind::Return)?;
        let mut value = None;
        if self.kind() != TokenKind::SemiColon {
            let expr = self.parse_expression()?;
            value = Some(&*self.arena.alloc(expr));
        }
        self.take(TokenKind::SemiColon)?;

        Ok(ReturnStmt {
            pos: return_tok.pos,
            value,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<ExprStmt<'a>, SyntaxError> {
        let pos = self.token().pos;
        let mut expr = None;
        if self.kind() != TokenKind::SemiColon {
            let parsed = self.parse_expression()?;
            expr = Some(&*self.arena.alloc(parsed));
        }
        self.take(TokenKind::SemiColon)?;
        Ok(ExprStmt { pos, expr })
    }

    // An assignment is only known to be one once the `=` shows up after what
    // was parsed as the left operand of a simple expression.
    // A parenthesized variable is a value, never a target.
    fn parse_expression(&mut self) -> Result<Expr<'a>, SyntaxError> {
        let parenthesized = self.kind() == TokenKind::OpenBrac;
        let left = self.parse_additive_expression()?;
        if self.kind() == TokenKind::Equal {
            return self.parse_assignment(left, parenthesized);
        }
        self.parse_simple_expression(left)
    }

    fn parse_assignment(&mut self, left: Expr<'a>, parenthesized: bool) -> Result<Expr<'a>, SyntaxError> {
        let ExprKind::Var(target) = &left.kind else {
            return Err(invalid_assignment_target(self.file, self.token()).into());
        };
        if parenthesized {
            return Err(invalid_assignment_target(self.file, self.token()).into());
        }
        let target = *target;
        self.take(TokenKind::Equal)?;
        let value = self.parse_expression()?;
        Ok(Expr::new(
            left.pos,
            ExprKind::Assign {
                target,
                value: self.arena.alloc(value),
            },
        ))
    }

    fn parse_simple_expression(&mut self, left: Expr<'a>) -> Result<Expr<'a>, SyntaxError> {
        let op = match self.kind() {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LEq => BinaryOp::LEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GEq => BinaryOp::GEq,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NEq => BinaryOp::NEq,
            _ => return Ok(left),
        };
        let op_tok = self.advance()?;
        let right = self.parse_additive_expression()?;
        Ok(self.binary(op_tok.pos, op, left, right))
    }

    // Right-recursive: `a - b - c` groups as `a - (b - c)`.
    fn parse_additive_expression(&mut self) -> Result<Expr<'a>, SyntaxError> {
        let left = self.parse_term()?;
        let op = match self.kind() {
            TokenKind::Add => BinaryOp::Add,
            TokenKind::Sub => BinaryOp::Sub,
            _ => return Ok(left),
        };
        let op_tok = self.advance()?;
        let right = self.parse_additive_expression()?;
        Ok(self.binary(op_tok.pos, op, left, right))
    }

    fn parse_term(&mut self) -> Result<Expr<'a>, SyntaxError> {
        let left = self.parse_factor()?;
        let op = match self.kind() {
            TokenKind::Mul => BinaryOp::Mul,
            TokenKind::Div => BinaryOp::Div,
            _ => return Ok(left),
        };
        let op_tok = self.advance()?;
        let right = self.parse_term()?;
        Ok(self.binary(op_tok.pos, op, left, right))
    }

    fn parse_factor(&mut self) -> Result<Expr<'a>, SyntaxError> {
        match self.kind() {
            TokenKind::OpenBrac => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.take(TokenKind::CloseBrac)?;
                Ok(expr)
            }
            TokenKind::Ident => {
                let ident = self.advance()?;
                let name = self.arena.alloc_str(&ident.value);
                if self.kind() == TokenKind::OpenBrac {
                    self.parse_call(ident.pos, name)
                } else {
                    let var = self.parse_var(ident.pos, name)?;
                    Ok(Expr::new(ident.pos, ExprKind::Var(var)))
                }
            }
            TokenKind::NumberLit => {
                let literal = self.advance()?;
                let value = self.parse_int(&literal)?;
                Ok(Expr::new(literal.pos, ExprKind::Literal(value)))
            }
            _ => Err(unexpected_token(self.file, "expression", self.token()).into()),
        }
    }

    fn parse_call(&mut self, pos: Pos, name: &'a str) -> Result<Expr<'a>, SyntaxError> {
        self.take(TokenKind::OpenBrac)?;
        let args = self.parse_args()?;
        self.take(TokenKind::CloseBrac)?;
        Ok(Expr::new(pos, ExprKind::Call { name, args }))
    }

    fn parse_args(&mut self) -> Result<&'a [Expr<'a>], SyntaxError> {
        let mut args = BumpVec::new_in(self.arena);
        if self.kind() != TokenKind::CloseBrac {
            args.push(self.parse_expression()?);
            while self.take_if(TokenKind::Comma)?.is_some() {
                args.push(self.parse_expression()?);
            }
        }
        Ok(args.into_bump_slice())
    }

    fn parse_var(&mut self, pos: Pos, name: &'a str) -> Result<VarRef<'a>, SyntaxError> {
        let mut index = None;
        if self.take_if(TokenKind::OpenSquare)?.is_some() {
            let expr = self.parse_expression()?;
            self.take(TokenKind::CloseSquare)?;
            index = Some(&*self.arena.alloc(expr));
        }
        Ok(VarRef { pos, name, index })
    }

    fn binary(&self, pos: Pos, op: BinaryOp, left: Expr<'a>, right: Expr<'a>) -> Expr<'a> {
        Expr::new(
            pos,
            ExprKind::Binary {
                op,
                left: self.arena.alloc(left),
                right: self.arena.alloc(right),
            },
        )
    }

    fn parse_int(&self, token: &Token) -> Result<i32, SyntaxError> {
        token
            .value
            .parse::<i32>()
            .map_err(|_| integer_out_of_range(self.file, token).into())
    }

    fn take(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        trace!(expected = %kind, found = %self.kind(), "matching");
        if self.kind() == kind {
            self.advance()
        } else {
            Err(unexpected_token(self.file, kind, self.token()).into())
        }
    }

    fn take_if(&mut self, kind: TokenKind) -> Result<Option<Token>, SyntaxError> {
        if self.kind() == kind {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let next = self.scanner.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn kind(&self) -> TokenKind {
        self.current.kind
    }

    fn token(&self) -> &Token {
        &self.current
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn source(text: &str) -> SourceFile {
        SourceFile::new(PathBuf::from("test.cm"), text.to_string())
    }

    fn only_function<'a>(program: &Program<'a>) -> &'a FunDecl<'a> {
        program.functions().next().expect("a function")
    }

    fn expr_statement<'a>(stmt: &Statement<'a>) -> &'a Expr<'a> {
        let Statement::Expr(ExprStmt { expr: Some(expr), .. }) = stmt else {
            panic!("expected expression statement, found {stmt:?}");
        };
        expr
    }

    #[test]
    fn declarations_are_dispatched_on_parenthesis() {
        let arena = Bump::new();
        let file = source("int x; int a[10]; void f(void) { } int g(int p, int q) { return p; }");
        let program = parse(&arena, &file).unwrap();

        assert_eq!(program.declarations.len(), 4);
        let Declaration::Var(x) = &program.declarations[0] else { panic!() };
        assert_eq!((x.name, x.ty, x.array_size), ("x", Type::Int, None));
        let Declaration::Var(a) = &program.declarations[1] else { panic!() };
        assert_eq!(a.array_size, Some(10));
        let Declaration::Fun(f) = &program.declarations[2] else { panic!() };
        assert_eq!((f.name, f.return_type, f.params.len()), ("f", Type::Void, 0));
        let Declaration::Fun(g) = &program.declarations[3] else { panic!() };
        assert_eq!(g.params.len(), 2);
        assert_eq!(g.params[0].name, "p");
        assert_eq!(g.params[1].name, "q");
        assert_eq!(g.pos, Pos::new(1, 36));
    }

    #[test]
    fn additive_is_right_associative() {
        let arena = Bump::new();
        let file = source("void main(void) { 10 - 4 - 3; }");
        let program = parse(&arena, &file).unwrap();
        let expr = expr_statement(&only_function(&program).body.statements[0]);

        let ExprKind::Binary { op, left, right } = &expr.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Sub);
        assert!(matches!(left.kind, ExprKind::Literal(10)));
        let ExprKind::Binary { op, left, right } = &right.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Sub);
        assert!(matches!(left.kind, ExprKind::Literal(4)));
        assert!(matches!(right.kind, ExprKind::Literal(3)));
    }

    #[test]
    fn multiplicative_binds_tighter() {
        let arena = Bump::new();
        let file = source("void main(void) { 1 + 2 * 3 < 4; }");
        let program = parse(&arena, &file).unwrap();
        let expr = expr_statement(&only_function(&program).body.statements[0]);

        let ExprKind::Binary { op, left, .. } = &expr.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Lt);
        let ExprKind::Binary { op, right, .. } = &left.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Add);
        let ExprKind::Binary { op, .. } = &right.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Mul);
    }

    #[test]
    fn assignment_is_detected_after_left_operand() {
        let arena = Bump::new();
        let file = source("void main(void) { int a[3]; a[1] = b = input(); }");
        let program = parse(&arena, &file).unwrap();
        let body = &only_function(&program).body;
        assert_eq!(body.locals.len(), 1);

        let expr = expr_statement(&body.statements[0]);
        let ExprKind::Assign { target, value } = &expr.kind else { panic!() };
        assert_eq!(target.name, "a");
        assert!(matches!(target.index.map(|index| &index.kind), Some(ExprKind::Literal(1))));
        let ExprKind::Assign { target, value } = &value.kind else { panic!() };
        assert_eq!(target.name, "b");
        assert!(matches!(value.kind, ExprKind::Call { name: "input", args: [] }));
    }

    #[test]
    fn parenthesis_returns_inner_expression() {
        let arena = Bump::new();
        let file = source("void main(void) { (1 + 2) * 3; }");
        let program = parse(&arena, &file).unwrap();
        let expr = expr_statement(&only_function(&program).body.statements[0]);

        let ExprKind::Binary { op, left, .. } = &expr.kind else { panic!() };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let arena = Bump::new();
        let file = source("void main(void) { if (a) if (b) x = 1; else x = 2; }");
        let program = parse(&arena, &file).unwrap();
        let Statement::If(outer) = &only_function(&program).body.statements[0] else { panic!() };
        assert!(outer.else_branch.is_none());
        let Statement::If(inner) = outer.then_branch else { panic!() };
        assert!(inner.else_branch.is_some());
    }

    #[test]
    fn invalid_assignment_target() {
        let arena = Bump::new();
        let file = source("void main(void) {\n  f() = 1;\n}");
        let err = parse(&arena, &file).unwrap_err();
        let SyntaxError::Parse(err) = err else { panic!() };
        assert_eq!(err.diagnostic.message, "invalid assignment target");
        assert_eq!((err.diagnostic.line, err.diagnostic.col), (2, 7));

        let file = source("int x;\nvoid main(void) {\n  (x) = 1;\n}");
        let err = parse(&arena, &file).unwrap_err();
        let SyntaxError::Parse(err) = err else { panic!() };
        assert_eq!(err.diagnostic.message, "invalid assignment target");
        assert_eq!((err.diagnostic.line, err.diagnostic.col), (3, 7));
    }

    #[test]
    fn first_error_aborts() {
        let arena = Bump::new();
        let file = source("int x\nint y;");
        let err = parse(&arena, &file).unwrap_err();
        let SyntaxError::Parse(err) = err else { panic!() };
        assert_eq!(err.expected, "';'");
        assert_eq!(err.found, "'int'");
        assert_eq!(err.diagnostic.message, "expected ';', but found 'int'");
        assert_eq!(err.diagnostic.line, 2);
    }

    #[test]
    fn lexical_error_surfaces_through_parser() {
        let arena = Bump::new();
        let file = source("int x1;");
        let err = parse(&arena, &file).unwrap_err();
        assert!(matches!(err, SyntaxError::Lex(..)));
        assert_eq!(err.diagnostic().message, "mixed alnum token 'x1'");
    }

    #[test]
    fn literal_out_of_range() {
        let arena = Bump::new();
        let file = source("void main(void) { output(2147483648); }");
        let err = parse(&arena, &file).unwrap_err();
        assert_eq!(
            err.diagnostic().message,
            "integer literal out of range: 2147483648"
        );
    }
}
