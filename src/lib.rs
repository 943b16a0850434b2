//! Compiler core for the faber language: tokenizer, parser, norma stdlib
//! registry, semantic context and multi-target code generator. See spec.md
//! §1 for the scope this crate does and does not cover — no execution, no
//! type inference beyond declared-annotation propagation, no optimization
//! beyond the trivial folding norma templates already encode.
//!
//! The four stages in spec.md §6 are exposed as free functions, each a pure
//! mapping from its input to `(output, diagnostics)`:
//!
//! ```ignore
//! let (tokens, lex_errors) = faber::lexer::tokenize(source);
//! let (program, parse_errors) = faber::parser::parse(tokens);
//! let (annotated, sem_errors) = faber::semantic::resolve(&mut ctx, program, path, &mut loader);
//! let (output, features, emit_errors) = faber::codegen::generate(target, &annotated, 4, path);
//! ```
//!
//! Nothing here touches a filesystem or a clock; a driver (see `bin/faberc.rs`)
//! supplies source text and renders diagnostics.

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod lexicon;
pub mod norma;
pub mod parser;
pub mod semantic;
pub mod token;

pub use codegen::generate;
pub use diagnostics::Diagnostic;
pub use lexer::tokenize;
pub use norma::Target;
pub use parser::parse;
pub use semantic::{resolve, AnnotatedProgram, ModuleLoader, SemanticContext};
