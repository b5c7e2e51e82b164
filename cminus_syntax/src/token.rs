use crate::error::Diagnostic;
use std::borrow::Cow;
use std::fmt::Display;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// A 1-based line/column pair. Tabs count as a single column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

pub struct Location<'a> {
    path: &'a Path,
    pos: Pos,
}

impl<'a> Display for Location<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", relative_path(self.path), self.pos)
    }
}

/// One compilation unit: the text plus the offsets where each line starts.
pub struct SourceFile {
    path: PathBuf,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn open(path: PathBuf) -> Result<Self, std::io::Error> {
        let text = read_to_string(&path)?;
        Ok(Self::new(path, text))
    }

    pub fn new(path: PathBuf, text: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            path,
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn location(&self, pos: Pos) -> Location {
        Location {
            path: &self.path,
            pos,
        }
    }

    /// Text of the given 1-based line without its line terminator. Lines past
    /// the end of the file are empty.
    pub fn line_text(&self, line: usize) -> &str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.line_starts.get(i)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches('\r')
    }

    pub fn diagnostic(&self, pos: Pos, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            message: message.into(),
            file: relative_path(&self.path).into_owned(),
            line: pos.line,
            col: pos.col,
            source_line: self.line_text(pos.line).to_string(),
        }
    }
}

fn relative_path(path: &Path) -> Cow<'_, str> {
    let stripped = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    match stripped {
        Some(relative) => Cow::Owned(relative.to_string_lossy().into_owned()),
        None => path.to_string_lossy(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: Pos,
}

impl Token {
    pub fn line(&self) -> usize {
        self.pos.line
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Else,
    If,
    Int,
    Return,
    Void,
    While,
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
    Equal,
    SemiColon,
    Comma,
    OpenBrac,
    CloseBrac,
    OpenSquare,
    CloseSquare,
    OpenBlock,
    CloseBlock,
    Ident,
    NumberLit,
    Eof,
    Error,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<Self> {
        match word {
            "else" => Some(Self::Else),
            "if" => Some(Self::If),
            "int" => Some(Self::Int),
            "return" => Some(Self::Return),
            "void" => Some(Self::Void),
            "while" => Some(Self::While),
            _ => None,
        }
    }

    /// Upper-case name used by the token dump.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Else => "ELSE",
            Self::If => "IF",
            Self::Int => "INT",
            Self::Return => "RETURN",
            Self::Void => "VOID",
            Self::While => "WHILE",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "TIMES",
            Self::Div => "DIV",
            Self::Lt => "LT",
            Self::LEq => "LTE",
            Self::Gt => "GT",
            Self::GEq => "GTE",
            Self::Eq => "EQ",
            Self::NEq => "NOT_EQ",
            Self::Equal => "ASSIGN",
            Self::SemiColon => "SEMI",
            Self::Comma => "COMMA",
            Self::OpenBrac => "O_PAREN",
            Self::CloseBrac => "C_PAREN",
            Self::OpenSquare => "O_BRACKET",
            Self::CloseSquare => "C_BRACKET",
            Self::OpenBlock => "O_BRACE",
            Self::CloseBlock => "C_BRACE",
            Self::Ident => "ID",
            Self::NumberLit => "NUM",
            Self::Eof => "ENDFILE",
            Self::Error => "ERROR",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Else => write!(f, "'else'"),
            Self::If => write!(f, "'if'"),
            Self::Int => write!(f, "'int'"),
            Self::Return => write!(f, "'return'"),
            Self::Void => write!(f, "'void'"),
            Self::While => write!(f, "'while'"),
            Self::Add => write!(f, "'+'"),
            Self::Sub => write!(f, "'-'"),
            Self::Mul => write!(f, "'*'"),
            Self::Div => write!(f, "'/'"),
            Self::Lt => write!(f, "'<'"),
            Self::LEq => write!(f, "'<='"),
            Self::Gt => write!(f, "'>'"),
            Self::GEq => write!(f, "'>='"),
            Self::Eq => write!(f, "'=='"),
            Self::NEq => write!(f, "'!='"),
            Self::Equal => write!(f, "'='"),
            Self::SemiColon => write!(f, "';'"),
            Self::Comma => write!(f, "','"),
            Self::OpenBrac => write!(f, "'('"),
            Self::CloseBrac => write!(f, "')'"),
            Self::OpenSquare => write!(f, "'['"),
            Self::CloseSquare => write!(f, "']'"),
            Self::OpenBlock => write!(f, "'{{'"),
            Self::CloseBlock => write!(f, "'}}'"),
            Self::Ident => write!(f, "IDENT"),
            Self::NumberLit => write!(f, "NUMBER"),
            Self::Eof => write!(f, "EOF"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_text() {
        let file = SourceFile::new(
            PathBuf::from("some_dummy_file"),
            String::from("aaa\nbbb\r\n\nccc"),
        );

        assert_eq!(file.line_text(1), "aaa");
        assert_eq!(file.line_text(2), "bbb");
        assert_eq!(file.line_text(3), "");
        assert_eq!(file.line_text(4), "ccc");
        assert_eq!(file.line_text(5), "");
        assert_eq!(file.line_text(0), "");
    }

    #[test]
    fn test_get_location() {
        let file = SourceFile::new(PathBuf::from("some_dummy_file"), String::from("a\nb"));
        let loc = file.location(Pos::new(2, 1));
        assert_eq!(format!("{loc}"), "some_dummy_file:2:1");
    }

    #[test]
    fn test_diagnostic_captures_source_line() {
        let file = SourceFile::new(
            PathBuf::from("dummy.cm"),
            String::from("int x;\nint y$;\n"),
        );
        let diagnostic = file.diagnostic(Pos::new(2, 6), "boom");
        assert_eq!(diagnostic.file, "dummy.cm");
        assert_eq!(diagnostic.line, 2);
        assert_eq!(diagnostic.col, 6);
        assert_eq!(diagnostic.source_line, "int y$;");
        assert_eq!(diagnostic.message, "boom");
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("while"), Some(TokenKind::While));
        assert_eq!(TokenKind::keyword("int"), Some(TokenKind::Int));
        assert_eq!(TokenKind::keyword("integer"), None);
        assert_eq!(TokenKind::keyword("If"), None);
    }
}
