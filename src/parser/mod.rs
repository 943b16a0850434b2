//! Recursive-descent parser. Hand-written, not generated from a grammar —
//! see spec.md §4.3. Entry point: [`parse`].

pub mod annotations;
pub mod expr;
pub mod parse_state;
pub mod stmt;
pub mod types;

use crate::ast::Program;
use crate::diagnostics::{sort_diagnostics, Diagnostic};
use crate::token::Token;

use parse_state::ParseState;

/// Parses a token stream into a program. Never panics: malformed input comes
/// back as a best-effort partial tree plus diagnostics (spec.md §8 "Totality
/// of parse").
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    log::debug!("parse: {} token(s)", tokens.len());
    let mut state = ParseState::new(tokens);
    let program = stmt::parse_program(&mut state);
    let mut errors = state.errors;
    sort_diagnostics(&mut errors);
    log::debug!("parse: produced {} top-level statement(s), {} error(s)", program.body.len(), errors.len());
    (program, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Statement};
    use crate::lexer::tokenize;

    #[test]
    fn parse_is_total_over_garbage_input() {
        let (tokens, _) = tokenize("@ @ @ functio ( { } } } ;;; genus");
        let (_program, _errors) = parse(tokens);
    }

    #[test]
    fn recovers_past_a_malformed_statement() {
        let (tokens, _) = tokenize("fixum x = ; fixum y = 1;");
        let (program, errors) = parse(tokens);
        assert!(!errors.is_empty());
        assert!(program.body.iter().any(|n| matches!(&n.stmt, Statement::VarDecl { name, .. } if name == "y")));
    }

    #[test]
    fn full_entry_point_program() {
        let src = r#"
            functio saluta(nomen: textus): textus {
                reddit nomen;
            }

            incipit {
                fixum n = saluta("mundus");
                scribe n;
            }
        "#;
        let (tokens, lex_errors) = tokenize(src);
        assert!(lex_errors.is_empty());
        let (program, errors) = parse(tokens);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0].stmt, Statement::FnDecl { .. }));
        assert!(matches!(program.body[1].stmt, Statement::EntryPoint { .. }));
    }

    #[test]
    fn regex_literal_parses_body_and_flags() {
        let (tokens, lex_errors) = tokenize(r#"fixum pattern = regula/a\/b+/gi;"#);
        assert!(lex_errors.is_empty(), "{lex_errors:?}");
        let (program, errors) = parse(tokens);
        assert!(errors.is_empty(), "{errors:?}");
        let Statement::VarDecl { value: Some(Expression::Regex { body, flags, .. }), .. } = &program.body[0].stmt else {
            panic!("expected a regex-initialized VarDecl, got {:?}", program.body[0].stmt);
        };
        assert_eq!(body, r"a\/b+");
        assert_eq!(flags, "gi");
    }

    #[test]
    fn compile_time_block_parses_into_its_own_ast_node() {
        let src = r#"
            incipit {
                fixum n = mox { scribe "folded at compile time"; };
            }
        "#;
        let (tokens, lex_errors) = tokenize(src);
        assert!(lex_errors.is_empty(), "{lex_errors:?}");
        let (program, errors) = parse(tokens);
        assert!(errors.is_empty(), "{errors:?}");
        let Statement::EntryPoint { body, .. } = &program.body[0].stmt else {
            panic!("expected an entry point, got {:?}", program.body[0].stmt);
        };
        let Statement::VarDecl { value: Some(Expression::CompileTimeBlock { .. }), .. } = &body.statements[0].stmt else {
            panic!("expected a compile-time-block-initialized VarDecl, got {:?}", body.statements[0].stmt);
        };
    }
}
