use crate::token::{Pos, SourceFile, Token, TokenKind};
use std::fmt::Display;
use thiserror::Error;

/// The data every compiler diagnostic carries, independent of the stage
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub source_line: String,
}

impl Diagnostic {
    /// Renders the diagnostic in its multi-line form: message, location,
    /// the offending source line and a caret under the column.
    pub fn render(&self) -> String {
        let padding = " ".repeat(self.col.saturating_sub(1));
        format!(
            "error: {}\n  --> {}:{}:{}\n   | {}\n   | {}^",
            self.message, self.file, self.line, self.col, self.source_line, padding,
        )
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.col, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LexError(pub Diagnostic);

impl LexError {
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{diagnostic}")]
pub struct ParseError {
    pub diagnostic: Diagnostic,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

/// Anything that stops the parser: a malformed token coming out of the
/// scanner or a well-formed token in the wrong place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            Self::Lex(err) => err.diagnostic(),
            Self::Parse(err) => err.diagnostic(),
        }
    }
}

pub(crate) fn mixed_alnum_token(file: &SourceFile, pos: Pos, lexeme: &str) -> LexError {
    LexError(file.diagnostic(pos, format!("mixed alnum token '{lexeme}'")))
}

pub(crate) fn unexpected_char(file: &SourceFile, pos: Pos, ch: char) -> LexError {
    LexError(file.diagnostic(pos, format!("unexpected character '{}'", ch.escape_default())))
}

pub(crate) fn bare_exclamation(file: &SourceFile, pos: Pos) -> LexError {
    LexError(file.diagnostic(pos, "'!' must be followed by '='"))
}

pub(crate) fn unexpected_sentinel(file: &SourceFile, pos: Pos) -> LexError {
    LexError(file.diagnostic(pos, "'$' is not allowed before the end of input"))
}

pub(crate) fn unexpected_token(file: &SourceFile, expected: impl Display, found: &Token) -> ParseError {
    let expected = expected.to_string();
    let found_text = describe_token(found);
    ParseError {
        diagnostic: file.diagnostic(
            found.pos,
            format!("expected {expected}, but found {found_text}"),
        ),
        expected,
        found: found_text,
    }
}

pub(crate) fn invalid_assignment_target(file: &SourceFile, equal: &Token) -> ParseError {
    ParseError {
        diagnostic: file.diagnostic(equal.pos, "invalid assignment target"),
        expected: String::from("a variable before '='"),
        found: describe_token(equal),
    }
}

pub(crate) fn integer_out_of_range(file: &SourceFile, literal: &Token) -> ParseError {
    ParseError {
        diagnostic: file.diagnostic(
            literal.pos,
            format!("integer literal out of range: {}", literal.value),
        ),
        expected: String::from("an integer that fits in 32 bits"),
        found: describe_token(literal),
    }
}

fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Ident | TokenKind::NumberLit => format!("{} '{}'", token.kind, token.value),
        kind => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diagnostic {
        Diagnostic {
            message: String::from("undeclared identifier 'y'"),
            file: String::from("main.cm"),
            line: 3,
            col: 5,
            source_line: String::from("    y = 1;"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "main.cm:3:5: undeclared identifier 'y'");
    }

    #[test]
    fn test_render_caret_aligned() {
        let rendered = sample().render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "error: undeclared identifier 'y'");
        assert_eq!(lines[1], "  --> main.cm:3:5");
        assert_eq!(lines[2], "   |     y = 1;");
        assert_eq!(lines[3], "   |     ^");
    }
}
