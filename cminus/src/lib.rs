use bumpalo::Bump;
use cminus_mipsgen::generate;
use cminus_syntax::{parse, Diagnostic, LexError, ParseError, SourceFile, SyntaxError};
use cminus_typecheck::{analyze, SemanticError};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<SyntaxError> for CompileError {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::Lex(err) => Self::Lex(err),
            SyntaxError::Parse(err) => Self::Parse(err),
        }
    }
}

impl CompileError {
    /// The source diagnostic behind the error. I/O failures have none.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Lex(err) => Some(err.diagnostic()),
            Self::Parse(err) => Some(err.diagnostic()),
            Self::Semantic(err) => Some(err.diagnostic()),
            Self::Io(..) => None,
        }
    }
}

/// Runs every stage on `file` and streams the assembly listing to `writer`.
/// Nothing is written unless scanning, parsing and analysis all succeed.
pub fn compile_to<W>(file: &SourceFile, writer: &mut W) -> Result<(), CompileError>
where
    W: Write + ?Sized,
{
    let arena = Bump::new();
    let program = parse(&arena, file)?;
    let table = analyze(file, &program)?;
    generate(&program, &table, writer)?;
    Ok(())
}

pub fn compile(file: &SourceFile) -> Result<String, CompileError> {
    let mut buff = Vec::<u8>::default();
    compile_to(file, &mut buff)?;
    String::from_utf8(buff).map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err).into())
}
