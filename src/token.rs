//! Token shapes. See spec.md §3 "Token".

use crate::lexicon::Keyword;
use serde::Serialize;

/// 1-based line/column, 0-based byte offset, as spec.md requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Position {
    pub fn start() -> Self {
        Self { line: 1, column: 1, byte_offset: 0 }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// Joins a regex literal's body and its trailing flag letters inside one
/// `RegexBody` token's lexeme (`lex_regex_body`/`parse_primary`'s `Regula`
/// arm split on it) since `Token` carries a single lexeme string.
pub const REGEX_BODY_FLAG_SEP: char = '\u{0}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    BigInt,
    String,
    Template,
    RegexBody,
    Keyword(Keyword),
    Punctuation(Punctuation),
    Comment(CommentKind),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuation {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    DotDot,
    Arrow,       // ->
    FatArrow,    // =>
    At,          // @ (annotation sigil)
    Question,    // ?
    QuestionDot, // ?.
    Bang,        // !
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Shl,
    Shr,
    PipeGt, // |> DSL pipeline separator
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self { kind, lexeme: lexeme.into(), position }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn as_punct(&self) -> Option<Punctuation> {
        match self.kind {
            TokenKind::Punctuation(p) => Some(p),
            _ => None,
        }
    }
}
