//! Destructuring and match patterns. See spec.md §3 "Patterns".

use crate::token::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Object {
        fields: Vec<(String, Option<Pattern>)>,
        position: Position,
    },
    Array {
        elements: Vec<Option<Pattern>>,
        rest: Option<String>,
        position: Position,
    },
    Variant(VariantPattern),
    Binding {
        name: String,
        position: Position,
    },
}

/// A `discerne`/`casu` case pattern. See spec.md glossary: "discerne / casu / ut / pro".
#[derive(Debug, Clone, PartialEq)]
pub enum VariantPattern {
    Wildcard { position: Position },
    /// `casu Click ut e` — whole-value alias.
    Alias {
        variant: String,
        binding: String,
        position: Position,
    },
    /// `casu Click pro x, y` — positional field bindings.
    Positional {
        variant: String,
        bindings: Vec<String>,
        position: Position,
    },
}

impl VariantPattern {
    pub fn position(&self) -> Position {
        match self {
            VariantPattern::Wildcard { position }
            | VariantPattern::Alias { position, .. }
            | VariantPattern::Positional { position, .. } => *position,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            VariantPattern::Wildcard { .. } => 0,
            VariantPattern::Alias { .. } => 1,
            VariantPattern::Positional { bindings, .. } => bindings.len(),
        }
    }
}
