//! Type syntax. See spec.md §3 "Types".

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipPrefix {
    /// `per T` — borrowed.
    Per,
    /// `ex T` — owned / moved from.
    Ex,
    /// `de T` — shared.
    De,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Named {
        name: String,
        params: Vec<TypeRef>,
        nullable: bool,
        position: Position,
    },
    Function {
        params: Vec<TypeRef>,
        ret: Box<TypeRef>,
        position: Position,
    },
    /// `discretio`-style union built from a type constructor list, e.g. `discretio<A, B>`.
    Union {
        members: Vec<TypeRef>,
        position: Position,
    },
    /// `T[]` shorthand for `lista<T>`.
    Array {
        element: Box<TypeRef>,
        position: Position,
    },
    NumericLiteral {
        value: i64,
        position: Position,
    },
    Owned {
        prefix: OwnershipPrefix,
        inner: Box<TypeRef>,
        position: Position,
    },
}

impl TypeRef {
    pub fn position(&self) -> Position {
        match self {
            TypeRef::Named { position, .. }
            | TypeRef::Function { position, .. }
            | TypeRef::Union { position, .. }
            | TypeRef::Array { position, .. }
            | TypeRef::NumericLiteral { position, .. }
            | TypeRef::Owned { position, .. } => *position,
        }
    }

    pub fn simple(name: impl Into<String>, position: Position) -> Self {
        TypeRef::Named { name: name.into(), params: vec![], nullable: false, position }
    }
}
