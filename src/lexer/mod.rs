//! Source text -> token stream. See spec.md §4.1.

use std::{iter::Peekable, str::Chars};

use crate::diagnostics::{Diagnostic, Phase};
use crate::lexicon::{lookup_keyword, Keyword};
use crate::token::{CommentKind, Position, Punctuation, Token, TokenKind, REGEX_BODY_FLAG_SEP};

pub struct Lexer<'a> {
    iterator: Peekable<Chars<'a>>,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
    line: usize,
    column: usize,
    byte_offset: usize,
}

/// Tokenize `source`, always returning a token list terminated by `eof` and
/// never panicking — spec.md §8 "Totality of tokenization".
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    log::debug!("tokenize: {} bytes of source", source.len());
    let mut lexer = Lexer::new(source);
    lexer.run();
    log::debug!("tokenize: produced {} token(s), {} error(s)", lexer.tokens.len(), lexer.errors.len());
    (lexer.tokens, lexer.errors)
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            iterator: source.chars().peekable(),
            tokens: vec![],
            errors: vec![],
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }

    fn pos(&self) -> Position {
        Position { line: self.line, column: self.column, byte_offset: self.byte_offset }
    }

    fn peek(&mut self) -> Option<char> {
        self.iterator.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        self.iterator.clone().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.iterator.next()?;
        self.byte_offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, lexeme: String, start: Position) {
        log::trace!("lex {start}: {kind:?} {lexeme:?}");
        self.tokens.push(Token::new(kind, lexeme, start));
    }

    fn error(&mut self, message: impl Into<String>, at: Position) {
        self.errors.push(Diagnostic::new(Phase::Lexical, message, at));
    }

    /// Error recovery: resume scanning at the next whitespace or punctuation
    /// character, per spec.md §4.1 "Error model".
    fn resync(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || is_punct_start(c) {
                break;
            }
            self.bump();
        }
    }

    fn run(&mut self) {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };
            let start = self.pos();
            match c {
                'a'..='z' | 'A'..='Z' | '_' => self.lex_word(start),
                '0'..='9' => self.lex_number(start),
                '"' => self.lex_string(start),
                '`' => self.lex_template(start),
                '/' if self.peek2() == Some('/') => self.lex_line_comment(start),
                '/' if self.peek2() == Some('*') => self.lex_block_comment(start),
                _ => self.lex_punct(start),
            }
        }
        let eof_pos = self.pos();
        self.push(TokenKind::Eof, String::new(), eof_pos);
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_word(&mut self, start: Position) {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match lookup_keyword(&word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        let is_regula = matches!(kind, TokenKind::Keyword(Keyword::Regula));
        self.push(kind, word, start);
        if is_regula && self.peek() == Some('/') {
            let body_start = self.pos();
            self.lex_regex_body(body_start);
        }
    }

    /// `regula/pattern/flags` — the keyword sigil already consumed by
    /// `lex_word`; this scans the delimited body and trailing flag letters
    /// into one `RegexBody` token (spec.md §4.1 "Regex literals are
    /// introduced by a keyword, not a slash").
    fn lex_regex_body(&mut self, start: Position) {
        self.bump(); // opening '/'
        let mut body = String::new();
        loop {
            match self.peek() {
                None => {
                    self.error("unterminated regex literal", start);
                    return;
                }
                Some('/') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    body.push(self.bump().unwrap());
                    if let Some(escaped) = self.bump() {
                        body.push(escaped);
                    }
                }
                Some(c) => {
                    body.push(c);
                    self.bump();
                }
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                flags.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.push(TokenKind::RegexBody, format!("{body}{REGEX_BODY_FLAG_SEP}{flags}"), start);
    }

    fn lex_number(&mut self, start: Position) {
        let mut raw = String::new();

        if self.peek() == Some('0') && self.peek2() == Some('x') {
            raw.push(self.bump().unwrap());
            raw.push(self.bump().unwrap());
            let mut saw_digit = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    raw.push(c);
                    self.bump();
                    saw_digit = true;
                } else {
                    break;
                }
            }
            if !saw_digit {
                self.error("malformed hex literal: no digits after '0x'", start);
                self.resync();
                return;
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    raw.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            if self.peek() == Some('.') && self.peek2().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                raw.push(self.bump().unwrap());
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        raw.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        if self.peek() == Some('n') {
            raw.push(self.bump().unwrap());
            self.push(TokenKind::BigInt, raw, start);
            return;
        }

        // An identifier character glued directly onto a number (`12abc`) is malformed.
        if let Some(c) = self.peek() {
            if c.is_alphabetic() || c == '_' {
                self.error(format!("malformed number literal '{raw}{c}'"), start);
                self.resync();
                return;
            }
        }

        self.push(TokenKind::Number, raw, start);
    }

    fn lex_string(&mut self, start: Position) {
        self.bump(); // opening quote
        let mut raw = String::new();
        loop {
            match self.peek() {
                None => {
                    self.error("unterminated string literal", start);
                    return;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    raw.push(self.bump().unwrap());
                    if let Some(escaped) = self.bump() {
                        raw.push(escaped);
                    }
                }
                Some(c) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::String, raw, start);
    }

    /// Backtick templates are kept as their raw body; splitting embedded
    /// expressions is left to targets that support it natively (spec.md §4.1).
    fn lex_template(&mut self, start: Position) {
        self.bump();
        let mut raw = String::new();
        loop {
            match self.peek() {
                None => {
                    self.error("unterminated template literal", start);
                    return;
                }
                Some('`') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::Template, raw, start);
    }

    fn lex_line_comment(&mut self, start: Position) {
        self.bump();
        self.bump();
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            raw.push(c);
            self.bump();
        }
        self.push(TokenKind::Comment(CommentKind::Line), raw, start);
    }

    fn lex_block_comment(&mut self, start: Position) {
        self.bump();
        self.bump();
        let mut raw = String::new();
        loop {
            match (self.peek(), self.peek2()) {
                (Some('*'), Some('/')) => {
                    self.bump();
                    self.bump();
                    break;
                }
                (None, _) => {
                    self.error("unterminated block comment", start);
                    break;
                }
                (Some(c), _) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::Comment(CommentKind::Block), raw, start);
    }

    fn lex_punct(&mut self, start: Position) {
        use Punctuation::*;
        let c = self.bump().unwrap();
        let (punct, lexeme): (Punctuation, &str) = match c {
            '(' => (LParen, "("),
            ')' => (RParen, ")"),
            '{' => (LBrace, "{"),
            '}' => (RBrace, "}"),
            '[' => (LBracket, "["),
            ']' => (RBracket, "]"),
            ',' => (Comma, ","),
            ':' => (Colon, ":"),
            ';' => (Semicolon, ";"),
            '@' => (At, "@"),
            '+' => (Plus, "+"),
            '-' if self.peek() == Some('>') => {
                self.bump();
                (Arrow, "->")
            }
            '-' => (Minus, "-"),
            '*' => (Star, "*"),
            '/' => (Slash, "/"),
            '%' => (Percent, "%"),
            '^' => (Caret, "^"),
            '.' if self.peek() == Some('.') => {
                self.bump();
                (DotDot, "..")
            }
            '.' => (Dot, "."),
            '?' if self.peek() == Some('.') => {
                self.bump();
                (QuestionDot, "?.")
            }
            '?' => (Question, "?"),
            '!' if self.peek() == Some('=') => {
                self.bump();
                (NotEq, "!=")
            }
            '!' => (Bang, "!"),
            '=' if self.peek() == Some('=') => {
                self.bump();
                (EqEq, "==")
            }
            '=' if self.peek() == Some('>') => {
                self.bump();
                (FatArrow, "=>")
            }
            '=' => (Eq, "="),
            '<' if self.peek() == Some('=') => {
                self.bump();
                (LtEq, "<=")
            }
            '<' if self.peek() == Some('<') => {
                self.bump();
                (Shl, "<<")
            }
            '<' => (Lt, "<"),
            '>' if self.peek() == Some('=') => {
                self.bump();
                (GtEq, ">=")
            }
            '>' if self.peek() == Some('>') => {
                self.bump();
                (Shr, ">>")
            }
            '>' => (Gt, ">"),
            '&' if self.peek() == Some('&') => {
                self.bump();
                (AmpAmp, "&&")
            }
            '&' => (Amp, "&"),
            '|' if self.peek() == Some('|') => {
                self.bump();
                (PipePipe, "||")
            }
            '|' if self.peek() == Some('>') => {
                self.bump();
                (PipeGt, "|>")
            }
            '|' => (Pipe, "|"),
            other => {
                self.error(format!("unexpected character '{other}'"), start);
                self.resync();
                return;
            }
        };
        self.push(TokenKind::Punctuation(punct), lexeme.to_string(), start);
    }
}

fn is_punct_start(c: char) -> bool {
    "(){}[],:;@+-*/%^.?!=<>&|\"`".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_only_eof() {
        let (tokens, errors) = tokenize("");
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn positions_are_monotonic() {
        let (tokens, _) = tokenize("fixum x = 1;\nscribe x");
        for w in tokens.windows(2) {
            assert!(w[0].position <= w[1].position);
        }
    }

    #[test]
    fn keyword_vs_identifier() {
        let (tokens, _) = tokenize("fixum xs");
        assert!(matches!(tokens[0].kind, TokenKind::Keyword(_)));
        assert!(matches!(tokens[1].kind, TokenKind::Identifier));
    }

    #[test]
    fn hex_and_bigint_literals() {
        let (tokens, errors) = tokenize("0xFF 42n");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "0xFF");
        assert_eq!(tokens[1].kind, TokenKind::BigInt);
    }

    #[test]
    fn unterminated_string_errors_but_does_not_panic() {
        let (_, errors) = tokenize("\"never closed");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase, Phase::Lexical);
    }

    #[test]
    fn malformed_number_resyncs() {
        let (tokens, errors) = tokenize("12abc;");
        assert_eq!(errors.len(), 1);
        // resync lands on ';' — it is still tokenized afterwards.
        assert!(tokens.iter().any(|t| t.as_punct() == Some(Punctuation::Semicolon)));
    }

    #[test]
    fn trailing_comment_is_a_token_not_an_error() {
        let (tokens, errors) = tokenize("fixum x = 1; // trailing");
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Comment(CommentKind::Line))));
    }
}
