use crate::error::{bare_exclamation, mixed_alnum_token, unexpected_char, unexpected_sentinel, LexError};
use crate::token::{Pos, SourceFile, Token, TokenKind};
use tracing::{trace, warn};

const SENTINEL: char = '$';

/// Scans the whole file, carrying on past lexical errors. Every error also
/// shows up in the token list as a [`TokenKind::Error`] token holding the
/// skipped lexeme. The last token is always [`TokenKind::Eof`].
pub fn tokenize(file: &SourceFile) -> (Vec<Token>, Vec<LexError>) {
    let mut scanner = Scanner::new(file);
    let mut tokens = Vec::default();
    let mut errors = Vec::default();
    loop {
        let (token, error) = scanner.scan();
        if let Some(error) = error {
            errors.push(error);
        }
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    (tokens, errors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InIdentifier,
    InNumber,
    InEquals,
    InLess,
    InGreater,
    InNot,
    InSlash,
    InComment,
    InCommentStar,
    InError,
    Done,
}

enum Fault {
    MixedAlnum,
    UnexpectedChar(Pos, char),
    BareExclamation,
    Sentinel(Pos),
}

/// Finite-state scanner producing one token per call. The source text gets
/// a `$` sentinel appended, so reaching the final character is how the
/// scanner knows the input is over.
pub struct Scanner<'a> {
    file: &'a SourceFile,
    text: String,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        let mut text = String::with_capacity(file.text().len() + 1);
        text.push_str(file.text());
        text.push(SENTINEL);
        Self {
            file,
            text,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    /// Produces the next token. Once the input is exhausted every further
    /// call yields [`TokenKind::Eof`]. After an error the offending run of
    /// letters and digits has already been consumed, so calling again
    /// resumes with the following token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.scan() {
            (_, Some(error)) => Err(error),
            (token, None) => Ok(token),
        }
    }

    fn scan(&mut self) -> (Token, Option<LexError>) {
        let mut state = State::Start;
        let mut kind = TokenKind::Eof;
        let mut lexeme = String::new();
        let mut start = self.get_pos();
        let mut fault = None;

        while state != State::Done {
            let Some((c, pos)) = self.peek() else {
                // only reachable if the sentinel itself was consumed
                kind = TokenKind::Eof;
                break;
            };
            let at_end = self.is_final_sentinel();

            match state {
                State::Start => {
                    start = pos;
                    if at_end {
                        kind = TokenKind::Eof;
                        state = State::Done;
                        continue;
                    }
                    self.next();
                    if c.is_ascii_whitespace() {
                        continue;
                    }
                    lexeme.push(c);
                    state = match c {
                        c if c.is_ascii_alphabetic() => State::InIdentifier,
                        c if c.is_ascii_digit() => State::InNumber,
                        '=' => State::InEquals,
                        '<' => State::InLess,
                        '>' => State::InGreater,
                        '!' => State::InNot,
                        '/' => State::InSlash,
                        SENTINEL => {
                            fault = Some(Fault::Sentinel(pos));
                            State::InError
                        }
                        c => match Self::single_char_kind(c) {
                            Some(single) => {
                                kind = single;
                                State::Done
                            }
                            None => {
                                fault = Some(Fault::UnexpectedChar(pos, c));
                                State::InError
                            }
                        },
                    };
                }
                State::InIdentifier | State::InNumber => {
                    let in_identifier = state == State::InIdentifier;
                    let (same, other) = if in_identifier {
                        (c.is_ascii_alphabetic(), c.is_ascii_digit())
                    } else {
                        (c.is_ascii_digit(), c.is_ascii_alphabetic())
                    };
                    if same {
                        self.next();
                        lexeme.push(c);
                    } else if other {
                        self.next();
                        lexeme.push(c);
                        fault = Some(Fault::MixedAlnum);
                        state = State::InError;
                    } else {
                        kind = if in_identifier {
                            TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Ident)
                        } else {
                            TokenKind::NumberLit
                        };
                        state = State::Done;
                    }
                }
                State::InEquals | State::InLess | State::InGreater => {
                    let followed_by_equal = c == '=';
                    if followed_by_equal {
                        self.next();
                        lexeme.push(c);
                    }
                    kind = match (state, followed_by_equal) {
                        (State::InEquals, true) => TokenKind::Eq,
                        (State::InEquals, false) => TokenKind::Equal,
                        (State::InLess, true) => TokenKind::LEq,
                        (State::InLess, false) => TokenKind::Lt,
                        (_, true) => TokenKind::GEq,
                        (_, false) => TokenKind::Gt,
                    };
                    state = State::Done;
                }
                State::InNot => {
                    if c == '=' {
                        self.next();
                        lexeme.push(c);
                        kind = TokenKind::NEq;
                        state = State::Done;
                    } else {
                        fault = Some(Fault::BareExclamation);
                        state = State::InError;
                    }
                }
                State::InSlash => {
                    if c == '*' {
                        self.next();
                        lexeme.clear();
                        state = State::InComment;
                    } else {
                        kind = TokenKind::Div;
                        state = State::Done;
                    }
                }
                State::InComment | State::InCommentStar => {
                    if at_end {
                        warn!(line = start.line, col = start.col, "unterminated comment");
                        start = pos;
                        kind = TokenKind::Eof;
                        state = State::Done;
                        continue;
                    }
                    self.next();
                    state = match (state, c) {
                        (State::InCommentStar, '/') => State::Start,
                        (_, '*') => State::InCommentStar,
                        _ => State::InComment,
                    };
                }
                State::InError => {
                    if c.is_ascii_alphanumeric() {
                        self.next();
                        lexeme.push(c);
                    } else {
                        kind = TokenKind::Error;
                        state = State::Done;
                    }
                }
                State::Done => unreachable!(),
            }
        }

        let error = fault.map(|fault| match fault {
            Fault::MixedAlnum => mixed_alnum_token(self.file, start, &lexeme),
            Fault::UnexpectedChar(pos, c) => unexpected_char(self.file, pos, c),
            Fault::BareExclamation => bare_exclamation(self.file, start),
            Fault::Sentinel(pos) => unexpected_sentinel(self.file, pos),
        });
        if error.is_some() {
            kind = TokenKind::Error;
        }

        let token = Token {
            kind,
            value: lexeme,
            pos: start,
        };
        trace!(line = token.pos.line, kind = token.kind.name(), lexeme = %token.value, "token");
        (token, error)
    }

    fn single_char_kind(c: char) -> Option<TokenKind> {
        let kind = match c {
            '+' => TokenKind::Add,
            '-' => TokenKind::Sub,
            '*' => TokenKind::Mul,
            ';' => TokenKind::SemiColon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::OpenBrac,
            ')' => TokenKind::CloseBrac,
            '[' => TokenKind::OpenSquare,
            ']' => TokenKind::CloseSquare,
            '{' => TokenKind::OpenBlock,
            '}' => TokenKind::CloseBlock,
            _ => return None,
        };
        Some(kind)
    }

    fn is_final_sentinel(&self) -> bool {
        self.offset + SENTINEL.len_utf8() == self.text.len()
    }

    fn next(&mut self) -> Option<(char, Pos)> {
        let (c, pos) = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some((c, pos))
    }

    fn get_pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn peek(&self) -> Option<(char, Pos)> {
        let c = self.text[self.offset..].chars().next()?;
        Some((c, self.get_pos()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn source(text: &str) -> SourceFile {
        SourceFile::new(PathBuf::from("dummy.cm"), text.to_string())
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|token| token.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let file = source("else if int return void while iffy While x");
        let (tokens, errors) = tokenize(&file);
        assert!(errors.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Else,
                TokenKind::If,
                TokenKind::Int,
                TokenKind::Return,
                TokenKind::Void,
                TokenKind::While,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[6].value, "iffy");
        assert_eq!(tokens[7].value, "While");
    }

    #[test]
    fn symbols() {
        let file = source("+ - * / < <= > >= == != = ; , ( ) [ ] { }\n<<=>>===");
        let (tokens, errors) = tokenize(&file);
        assert!(errors.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Add,
                TokenKind::Sub,
                TokenKind::Mul,
                TokenKind::Div,
                TokenKind::Lt,
                TokenKind::LEq,
                TokenKind::Gt,
                TokenKind::GEq,
                TokenKind::Eq,
                TokenKind::NEq,
                TokenKind::Equal,
                TokenKind::SemiColon,
                TokenKind::Comma,
                TokenKind::OpenBrac,
                TokenKind::CloseBrac,
                TokenKind::OpenSquare,
                TokenKind::CloseSquare,
                TokenKind::OpenBlock,
                TokenKind::CloseBlock,
                TokenKind::Lt,
                TokenKind::LEq,
                TokenKind::Gt,
                TokenKind::GEq,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions_follow_lines_and_comments() {
        let file = source("int x;\n/* a\n comment */ x = 10;\n\tvoid");
        let (tokens, errors) = tokenize(&file);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].pos, Pos::new(1, 1));
        assert_eq!(tokens[1].pos, Pos::new(1, 5));
        assert_eq!(tokens[3].kind, TokenKind::Ident);
        assert_eq!(tokens[3].pos, Pos::new(3, 13));
        assert_eq!(tokens[5].value, "10");
        assert_eq!(tokens[5].pos, Pos::new(3, 17));
        assert_eq!(tokens[7].kind, TokenKind::Void);
        assert_eq!(tokens[7].pos, Pos::new(4, 2));
    }

    #[test]
    fn comment_with_stars() {
        let file = source("a /*** x ** / ***/ b");
        let (tokens, errors) = tokenize(&file);
        assert!(errors.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_comment_ends_input() {
        let file = source("int x; /* never closed\n int y;");
        let mut scanner = Scanner::new(&file);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Int);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Ident);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::SemiColon);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn mixed_alnum_is_an_error() {
        let file = source("int abc1d = 12ab;");
        let (tokens, errors) = tokenize(&file);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0.message, "mixed alnum token 'abc1d'");
        assert_eq!((errors[0].0.line, errors[0].0.col), (1, 5));
        assert_eq!(errors[1].0.message, "mixed alnum token '12ab'");
        assert_eq!(errors[1].0.source_line, "int abc1d = 12ab;");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Int,
                TokenKind::Error,
                TokenKind::Equal,
                TokenKind::Error,
                TokenKind::SemiColon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bare_exclamation_is_an_error() {
        let file = source("a ! b");
        let mut scanner = Scanner::new(&file);
        assert_eq!(scanner.next_token().unwrap().value, "a");
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.0.message, "'!' must be followed by '='");
        assert_eq!(err.0.col, 3);
        assert_eq!(scanner.next_token().unwrap().value, "b");
    }

    #[test]
    fn sentinel_before_end_is_an_error() {
        let file = source("int x$y;");
        let (tokens, errors) = tokenize(&file);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0.message, "'$' is not allowed before the end of input");
        assert_eq!(errors[0].0.col, 6);
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].value, "$y");
        assert_eq!(tokens[3].kind, TokenKind::SemiColon);
    }

    #[test]
    fn trailing_sentinel_in_source_is_still_an_error() {
        let file = source("x$");
        let (tokens, errors) = tokenize(&file);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Ident, TokenKind::Error, TokenKind::Eof]
        );
    }

    #[test]
    fn unexpected_character() {
        let file = source("x = y # 2;\n_z");
        let (tokens, errors) = tokenize(&file);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].0.message, "unexpected character '#'");
        assert_eq!((errors[0].0.line, errors[0].0.col), (1, 7));
        assert_eq!(errors[1].0.message, "unexpected character '_'");
        assert_eq!(tokens[5].kind, TokenKind::SemiColon);
        assert_eq!(tokens[6].value, "_z");
    }

    #[test]
    fn lexemes_reproduce_source_content() {
        let text = "int main(void) {\n  int a[10];\n  a[1] = input() * (2 + 3);\n  /* ignored */ if (a[1] >= 5) output(a[1]); else ;\n}\n";
        let file = source(text);
        let (tokens, errors) = tokenize(&file);
        assert!(errors.is_empty());

        let scanned: String = tokens.iter().map(|token| token.value.as_str()).collect();
        let without_comment = text.replace("/* ignored */", "");
        let expected: String = without_comment.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(scanned, expected);
    }
}
