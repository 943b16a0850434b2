//! Shared diagnostic type for every phase. See spec.md §7 "Error Handling Design".

use crate::token::Position;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    Lexical,
    Syntactic,
    Morphological,
    Semantic,
    Emission,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>, position: Position) -> Self {
        Self { phase, message: message.into(), position }
    }

    /// `<file>:<line>:<col> - <message>`, the format spec.md assigns to the
    /// (out-of-scope) driver. Kept here as a pure function so every driver gets
    /// it for free instead of re-deriving the position math.
    pub fn render(&self, file: &str) -> String {
        format!("{file}:{} - {}", self.position, self.message)
    }
}

/// Sort diagnostics in source order, stable across phases, matching the
/// ordering guarantee in spec.md §5.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.position.cmp(&b.position).then(a.phase.cmp(&b.phase)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_format() {
        let d = Diagnostic::new(Phase::Syntactic, "unexpected token", Position { line: 3, column: 5, byte_offset: 40 });
        assert_eq!(d.render("main.fab"), "main.fab:3:5 - unexpected token");
    }

    #[test]
    fn sorts_by_position_then_phase() {
        let mut ds = vec![
            Diagnostic::new(Phase::Semantic, "b", Position { line: 2, column: 1, byte_offset: 0 }),
            Diagnostic::new(Phase::Lexical, "a", Position { line: 1, column: 1, byte_offset: 0 }),
        ];
        sort_diagnostics(&mut ds);
        assert_eq!(ds[0].message, "a");
    }
}
