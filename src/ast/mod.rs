//! The AST. A single closed, tagged-union tree — see spec.md §3 and §4.2.

pub mod expression;
pub mod pattern;
pub mod statement;
pub mod types;

pub use expression::*;
pub use pattern::*;
pub use statement::*;
pub use types::*;

use crate::token::{CommentKind, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
}

/// A statement wrapped with the comments hoisted onto it from the token
/// stream (spec.md §3 "Lifecycle": comments attach to the nearest following
/// node; unattached end-of-file comments are dropped).
#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub leading: Vec<Comment>,
    pub trailing: Vec<Comment>,
    pub stmt: Statement,
}

impl StmtNode {
    pub fn bare(stmt: Statement) -> Self {
        Self { leading: vec![], trailing: vec![], stmt }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<StmtNode>,
    pub position: Position,
}

impl Block {
    /// Wraps a single statement as a synthetic block, per spec.md invariant
    /// (i): a block body is a list of statements, never a bare statement.
    pub fn synthetic(stmt: Statement, position: Position) -> Self {
        Self { statements: vec![StmtNode::bare(stmt)], position }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<StmtNode>,
}
