//! `@ name [args]` annotation parsing. See spec.md §4.3 "Annotations" and §6
//! "Annotations that affect emission".

use crate::ast::{Annotation, CliOperand, CliOption, Expression, Visibility};
use crate::diagnostics::Diagnostic;
use crate::token::{Punctuation, TokenKind};

use super::expr::parse_expression;
use super::parse_state::ParseState;
use super::types::parse_type;

pub fn parse_annotations(state: &mut ParseState) -> Result<Vec<Annotation>, Diagnostic> {
    let mut annotations = vec![];
    while state.check_punct(Punctuation::At) {
        annotations.push(parse_annotation(state)?);
    }
    Ok(annotations)
}

fn parse_annotation(state: &mut ParseState) -> Result<Annotation, Diagnostic> {
    state.expect_punct(Punctuation::At)?;
    let name = state.expect_identifier()?;
    match name.as_str() {
        "publicum" => Ok(Annotation::Visibility(Visibility::Public)),
        "privatum" => Ok(Annotation::Visibility(Visibility::Private)),
        "protectum" => Ok(Annotation::Visibility(Visibility::Protected)),
        "abstracta" => Ok(Annotation::Abstract),
        "statica" => Ok(Annotation::Static),
        "cli" => Ok(Annotation::Cli),
        "innatum" => Ok(Annotation::NativeName(parse_target_string_pairs(state)?)),
        "subsidia" => Ok(Annotation::HalImpl(parse_target_string_pairs(state)?)),
        "radix" => parse_radix(state),
        "verte" => parse_verte(state),
        "optio" => parse_optio(state).map(Annotation::CliOption),
        "operandus" => parse_operandus(state).map(Annotation::CliOperand),
        _ => {
            let raw_args = capture_raw_line(state);
            Ok(Annotation::Unknown { name, raw_args })
        }
    }
}

/// `<t> "X", <t> "Y", ...` — used by `@ innatum` and `@ subsidia`.
fn parse_target_string_pairs(state: &mut ParseState) -> Result<Vec<(String, String)>, Diagnostic> {
    let mut pairs = vec![];
    loop {
        let target = state.expect_identifier()?;
        let value = expect_string_literal(state)?;
        pairs.push((target, value));
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    Ok(pairs)
}

fn parse_radix(state: &mut ParseState) -> Result<Annotation, Diagnostic> {
    let stem = state.expect_identifier()?;
    let mut forms = vec![];
    while state.eat_punct(Punctuation::Comma) {
        forms.push(state.expect_identifier()?);
    }
    Ok(Annotation::Radix { stem, forms })
}

fn parse_verte(state: &mut ParseState) -> Result<Annotation, Diagnostic> {
    use crate::ast::VerteEntry;
    let mut entries = vec![];
    loop {
        let target = state.expect_identifier()?;
        if state.check_punct(Punctuation::LParen) {
            state.bump();
            let mut template_params = vec![];
            while !state.check_punct(Punctuation::RParen) {
                template_params.push(state.expect_identifier()?);
                if !state.eat_punct(Punctuation::Comma) {
                    break;
                }
            }
            state.expect_punct(Punctuation::RParen)?;
            state.expect_punct(Punctuation::Arrow)?;
            let template = expect_string_literal(state)?;
            entries.push(VerteEntry { target, rename: None, template_params, template: Some(template) });
        } else {
            let rename = expect_string_literal(state)?;
            entries.push(VerteEntry { target, rename: Some(rename), template_params: vec![], template: None });
        }
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    Ok(Annotation::Verte(entries))
}

fn parse_optio(state: &mut ParseState) -> Result<CliOption, Diagnostic> {
    let ty = parse_type(state)?;
    let binding = state.expect_identifier()?;
    let mut short = None;
    let mut long = None;
    let mut description = None;
    loop {
        match state.expect_identifier()?.as_str() {
            "brevis" => short = Some(expect_string_literal(state)?),
            "longum" => long = Some(expect_string_literal(state)?),
            "descriptio" => description = Some(expect_string_literal(state)?),
            other => {
                return Err(crate::diagnostics::Diagnostic::new(
                    crate::diagnostics::Phase::Syntactic,
                    format!("unknown @ optio clause '{other}'"),
                    state.position(),
                ))
            }
        }
        if state.is_eof() || state.check_punct(Punctuation::Semicolon) || !matches!(state.peek().kind, TokenKind::Identifier) {
            break;
        }
    }
    Ok(CliOption { ty, binding, short, long, description })
}

fn parse_operandus(state: &mut ParseState) -> Result<CliOperand, Diagnostic> {
    let variadic = state.eat_identifier_if("ceteri");
    let ty = parse_type(state)?;
    let name = state.expect_identifier()?;
    let mut default: Option<Expression> = None;
    let mut description = None;
    if state.check_keyword(crate::lexicon::Keyword::Vel) {
        state.bump();
        default = Some(parse_expression(state)?);
    }
    if matches!(state.peek().kind, TokenKind::Identifier) {
        let tag = state.expect_identifier()?;
        if tag == "descriptio" {
            description = Some(expect_string_literal(state)?);
        }
    }
    Ok(CliOperand { variadic, ty, name, default, description })
}

fn expect_string_literal(state: &mut ParseState) -> Result<String, Diagnostic> {
    let tok = state.peek().clone();
    if matches!(tok.kind, TokenKind::String) {
        state.bump();
        Ok(tok.lexeme)
    } else {
        Err(crate::diagnostics::Diagnostic::new(
            crate::diagnostics::Phase::Syntactic,
            format!("expected string literal, found {:?}", tok.kind),
            tok.position,
        ))
    }
}

/// Unknown annotations are preserved but ignored semantically; capture the
/// remainder of the line as opaque text.
fn capture_raw_line(state: &mut ParseState) -> String {
    let line = state.current_line();
    let mut raw = String::new();
    while state.peek_is_same_line(line) && !state.is_eof() {
        raw.push_str(&state.bump().lexeme);
        raw.push(' ');
    }
    raw.trim().to_string()
}

impl ParseState {
    fn eat_identifier_if(&mut self, word: &str) -> bool {
        if matches!(self.peek().kind, TokenKind::Identifier) && self.peek().lexeme == word {
            self.bump();
            true
        } else {
            false
        }
    }
}
