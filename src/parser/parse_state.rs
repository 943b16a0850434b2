//! Parser state threaded explicitly through every parsing function, rather
//! than closed over — see spec.md §9 "Parser context as explicit state".

use crate::ast::Comment;
use crate::diagnostics::{Diagnostic, Phase};
use crate::token::{CommentKind, Position, Punctuation, Token, TokenKind};

pub struct ParseState {
    tokens: Vec<Token>,
    index: usize,
    pub errors: Vec<Diagnostic>,
    next_id: u64,
}

impl ParseState {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0, errors: vec![], next_id: 0 }
    }

    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drains any comment tokens sitting at the cursor into a pending buffer so
    /// the caller can attach them to the next AST node (spec.md §4.1 "Comments").
    pub fn take_leading_comments(&mut self) -> Vec<Comment> {
        let mut comments = vec![];
        while let Some(tok) = self.tokens.get(self.index) {
            if let TokenKind::Comment(kind) = &tok.kind {
                comments.push(Comment { kind: *kind, text: tok.lexeme.clone() });
                self.index += 1;
            } else {
                break;
            }
        }
        comments
    }

    /// Trailing comment: only attaches if it starts on the same line as `line`.
    pub fn take_trailing_comment(&mut self, line: usize) -> Vec<Comment> {
        let mut comments = vec![];
        if let Some(tok) = self.tokens.get(self.index) {
            if let TokenKind::Comment(kind) = &tok.kind {
                if tok.position.line == line {
                    comments.push(Comment { kind: *kind, text: tok.lexeme.clone() });
                    self.index += 1;
                }
            }
        }
        comments
    }

    fn skip_comments_for_peek(&self, mut i: usize) -> usize {
        while let Some(tok) = self.tokens.get(i) {
            if matches!(tok.kind, TokenKind::Comment(_)) {
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    pub fn peek(&self) -> &Token {
        let i = self.skip_comments_for_peek(self.index);
        &self.tokens[i.min(self.tokens.len() - 1)]
    }

    pub fn peek_n(&self, n: usize) -> &Token {
        let mut i = self.skip_comments_for_peek(self.index);
        for _ in 0..n {
            i = self.skip_comments_for_peek(i + 1);
        }
        &self.tokens[i.min(self.tokens.len() - 1)]
    }

    pub fn position(&self) -> Position {
        self.peek().position
    }

    pub fn is_eof(&self) -> bool {
        self.peek().is_eof()
    }

    /// Advances past any pending comments and returns the next real token.
    pub fn bump(&mut self) -> Token {
        self.take_leading_comments();
        let tok = self.tokens[self.index.min(self.tokens.len() - 1)].clone();
        if !tok.is_eof() {
            self.index += 1;
        }
        tok
    }

    pub fn check_punct(&self, p: Punctuation) -> bool {
        self.peek().as_punct() == Some(p)
    }

    pub fn eat_punct(&mut self, p: Punctuation) -> bool {
        if self.check_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect_punct(&mut self, p: Punctuation) -> Result<Token, Diagnostic> {
        if self.check_punct(p) {
            Ok(self.bump())
        } else {
            let pos = self.position();
            Err(Diagnostic::new(
                Phase::Syntactic,
                format!("expected {p:?}, found {:?}", self.peek().kind),
                pos,
            ))
        }
    }

    pub fn check_keyword(&self, kw: crate::lexicon::Keyword) -> bool {
        self.peek().as_keyword() == Some(kw)
    }

    pub fn eat_keyword(&mut self, kw: crate::lexicon::Keyword) -> bool {
        if self.check_keyword(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, kw: crate::lexicon::Keyword) -> Result<Token, Diagnostic> {
        if self.check_keyword(kw) {
            Ok(self.bump())
        } else {
            let pos = self.position();
            Err(Diagnostic::new(
                Phase::Syntactic,
                format!("expected keyword {kw:?}, found {:?}", self.peek().kind),
                pos,
            ))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<String, Diagnostic> {
        let tok = self.peek().clone();
        if matches!(tok.kind, TokenKind::Identifier) {
            self.bump();
            Ok(tok.lexeme)
        } else {
            Err(Diagnostic::new(
                Phase::Syntactic,
                format!("expected identifier, found {:?}", tok.kind),
                tok.position,
            ))
        }
    }

    pub fn push_error(&mut self, diag: Diagnostic) {
        self.errors.push(diag);
    }

    /// True if the token at the cursor sits on the same source line as `line`.
    pub fn peek_is_same_line(&self, line: usize) -> bool {
        self.peek().position.line == line
    }

    pub fn line_of(&self, offset: usize) -> Option<usize> {
        self.tokens.get(offset).map(|t| t.position.line)
    }

    pub fn current_line(&self) -> usize {
        self.peek().position.line
    }

    /// Statement-level recovery: advance until a statement-starting keyword or
    /// a line-start brace (spec.md §4.3 "Error recovery").
    pub fn synchronize_statement(&mut self) {
        while !self.is_eof() {
            if self.check_punct(Punctuation::Semicolon) {
                self.bump();
                return;
            }
            if self.check_punct(Punctuation::RBrace) {
                return;
            }
            if is_statement_starter(self.peek()) {
                return;
            }
            self.bump();
        }
    }

    /// Member-level recovery inside a struct body: advance until a
    /// type-starter, `functio`, a visibility modifier, or a closing brace.
    pub fn synchronize_member(&mut self) {
        use crate::lexicon::Keyword::*;
        while !self.is_eof() {
            if self.check_punct(Punctuation::RBrace) {
                return;
            }
            if self.check_keyword(Functio)
                || self.check_keyword(Publicum)
                || self.check_keyword(Privatum)
                || self.check_keyword(Protectum)
                || matches!(self.peek().kind, TokenKind::Identifier)
            {
                return;
            }
            self.bump();
        }
    }
}

fn is_statement_starter(tok: &Token) -> bool {
    use crate::lexicon::Keyword::*;
    matches!(
        tok.as_keyword(),
        Some(
            Fixum | Variabile | Functio | Genus | Pactum | Ordo | Discretio | Typus | Importa
                | Si | Dum | Fac | Ex | De | Cum | Discerne | Tutare | Cura | Dispatch | Tenta
                | Iacit | Moritor | Scribe | Vide | Mone | Incipit | Incipiet | Probatio | Casus
                | Praepara | Purga | Reddit | Ergo
        )
    )
}

#[allow(dead_code)]
pub(crate) fn comment_kind_is_line(k: &CommentKind) -> bool {
    matches!(k, CommentKind::Line)
}
