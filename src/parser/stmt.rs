//! Statement parsing. See spec.md §4.3 "Body forms", "Pattern matching",
//! "State machine for iteration", and "Error recovery".

use crate::ast::*;
use crate::ast::statement::Param;
use crate::diagnostics::{Diagnostic, Phase};
use crate::lexicon::Keyword;
use crate::token::{Punctuation, TokenKind};

use super::annotations::parse_annotations;
use super::expr::parse_expression;
use super::parse_state::ParseState;
use super::types::parse_type;

pub fn parse_program(state: &mut ParseState) -> Program {
    let mut body = vec![];
    while !state.is_eof() {
        let at = state.position();
        match parse_top_level(state) {
            Ok(node) => {
                log::trace!("parsed top-level statement at {at}");
                body.push(node);
            }
            Err(diag) => {
                log::trace!("top-level statement at {at} failed to parse: {}", diag.message);
                state.push_error(diag);
                state.synchronize_statement();
            }
        }
    }
    Program { body }
}

fn parse_top_level(state: &mut ParseState) -> Result<StmtNode, Diagnostic> {
    let leading = state.take_leading_comments();
    let line = state.current_line();
    let stmt = parse_statement(state)?;
    let trailing = state.take_trailing_comment(line);
    Ok(StmtNode { leading, trailing, stmt })
}

/// Parses a block, also accepting the single-statement body forms `ergo`,
/// `reddit`, `iacit`, `moritor` wherever a block is expected (spec.md §4.3).
pub fn parse_block(state: &mut ParseState) -> Result<Block, Diagnostic> {
    let position = state.position();

    if state.eat_keyword(Keyword::Ergo) {
        let stmt = parse_statement(state)?;
        return Ok(Block::synthetic(stmt, position));
    }
    if state.eat_keyword(Keyword::Reddit) {
        let expr = parse_expression(state)?;
        eat_terminator(state);
        return Ok(Block::synthetic(Statement::Return { expr: Some(expr), position }, position));
    }
    if state.eat_keyword(Keyword::Iacit) {
        let expr = parse_expression(state)?;
        eat_terminator(state);
        return Ok(Block::synthetic(Statement::Throw { expr, position }, position));
    }
    if state.eat_keyword(Keyword::Moritor) {
        let expr = parse_expression(state)?;
        eat_terminator(state);
        return Ok(Block::synthetic(Statement::Panic { expr, position }, position));
    }

    state.expect_punct(Punctuation::LBrace)?;
    let mut statements = vec![];
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        match parse_top_level(state) {
            Ok(node) => statements.push(node),
            Err(diag) => {
                state.push_error(diag);
                state.synchronize_statement();
            }
        }
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Block { statements, position })
}

fn eat_terminator(state: &mut ParseState) {
    state.eat_punct(Punctuation::Semicolon);
}

fn parse_statement(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();

    if state.check_punct(Punctuation::At) {
        return parse_annotated_declaration(state);
    }

    if state.check_keyword(Keyword::Importa) {
        return parse_import(state);
    }
    if state.check_keyword(Keyword::Fixum) || state.check_keyword(Keyword::Variabile) {
        return parse_var_decl(state);
    }
    if state.check_keyword(Keyword::Functio) {
        return parse_fn_decl(state, vec![], false);
    }
    if state.check_keyword(Keyword::Genus) {
        return parse_struct_decl(state, vec![]);
    }
    if state.check_keyword(Keyword::Pactum) {
        return parse_interface_decl(state);
    }
    if state.check_keyword(Keyword::Ordo) {
        return parse_enum_decl(state);
    }
    if state.check_keyword(Keyword::Discretio) {
        return parse_union_decl(state);
    }
    if state.check_keyword(Keyword::Typus) {
        return parse_type_alias(state);
    }
    if state.check_keyword(Keyword::Si) {
        return parse_if(state);
    }
    if state.check_keyword(Keyword::Dum) {
        return parse_while(state);
    }
    if state.check_keyword(Keyword::Fac) {
        return parse_do_while(state);
    }
    if state.check_keyword(Keyword::Cum) {
        return parse_switch(state);
    }
    if state.check_keyword(Keyword::Discerne) {
        return parse_match(state);
    }
    if state.check_keyword(Keyword::Ex) {
        return parse_for_of_or_range(state, false);
    }
    if state.check_keyword(Keyword::De) {
        return parse_for_in(state, false);
    }
    if state.check_keyword(Keyword::Figendum) && state.peek_n(1).as_keyword() == Some(Keyword::Ex) {
        state.bump();
        return parse_for_of_or_range(state, true);
    }
    if state.check_keyword(Keyword::Variandum) && state.peek_n(1).as_keyword() == Some(Keyword::De) {
        state.bump();
        return parse_for_in(state, true);
    }
    if state.check_keyword(Keyword::Cura) {
        return parse_resource_scope(state);
    }
    if state.check_keyword(Keyword::Tenta) {
        return parse_try_catch(state);
    }
    if state.check_keyword(Keyword::Iacit) {
        state.bump();
        let expr = parse_expression(state)?;
        eat_terminator(state);
        return Ok(Statement::Throw { expr, position });
    }
    if state.check_keyword(Keyword::Moritor) {
        state.bump();
        let expr = parse_expression(state)?;
        eat_terminator(state);
        return Ok(Statement::Panic { expr, position });
    }
    if state.check_keyword(Keyword::Reddit) {
        state.bump();
        let expr = if state.check_punct(Punctuation::Semicolon) { None } else { Some(parse_expression(state)?) };
        eat_terminator(state);
        return Ok(Statement::Return { expr, position });
    }
    if state.check_keyword(Keyword::Tutare) {
        return parse_guard(state);
    }
    if state.check_keyword(Keyword::Scribe) || state.check_keyword(Keyword::Vide) || state.check_keyword(Keyword::Mone) {
        return parse_output(state);
    }
    if state.check_keyword(Keyword::Incipit) || state.check_keyword(Keyword::Incipiet) {
        return parse_entry_point(state);
    }
    if state.check_keyword(Keyword::Probatio) {
        return parse_test_suite(state);
    }
    if state.check_keyword(Keyword::Casus) {
        return parse_test_case(state);
    }
    if state.check_keyword(Keyword::Praepara) {
        state.bump();
        let body = parse_block(state)?;
        return Ok(Statement::Setup { body, position });
    }
    if state.check_keyword(Keyword::Purga) {
        state.bump();
        let body = parse_block(state)?;
        return Ok(Statement::Teardown { body, position });
    }
    if state.check_keyword(Keyword::Dispatch) {
        state.bump();
        let target = super::expr::parse_expression(state)?;
        let mut args = vec![];
        if state.eat_punct(Punctuation::LParen) {
            while !state.check_punct(Punctuation::RParen) {
                args.push(parse_expression(state)?);
                if !state.eat_punct(Punctuation::Comma) {
                    break;
                }
            }
            state.expect_punct(Punctuation::RParen)?;
        }
        eat_terminator(state);
        return Ok(Statement::Dispatch { target, args, position });
    }

    // `break`/`continue` are plain identifiers in this lexicon's reserved set
    // only by word; treat them contextually via identifier text, matching the
    // "keyword followed by '(' is a call" rule's sibling: a bare word with no
    // further tokens on its statement is control flow, not an expression.
    if matches!(state.peek().kind, TokenKind::Identifier) && state.peek().lexeme == "discede" {
        state.bump();
        eat_terminator(state);
        return Ok(Statement::Break { position });
    }
    if matches!(state.peek().kind, TokenKind::Identifier) && state.peek().lexeme == "perge" {
        state.bump();
        eat_terminator(state);
        return Ok(Statement::Continue { position });
    }

    if state.check_punct(Punctuation::LBrace) {
        return Ok(Statement::Block(parse_block(state)?));
    }

    // assertion: `assere <expr> [, <message>];`
    if matches!(state.peek().kind, TokenKind::Identifier) && state.peek().lexeme == "assere" {
        state.bump();
        let expr = parse_expression(state)?;
        let message = if state.eat_punct(Punctuation::Comma) { Some(parse_expression(state)?) } else { None };
        eat_terminator(state);
        return Ok(Statement::Assertion { expr, message, position });
    }

    let expr = parse_expression(state)?;
    eat_terminator(state);
    Ok(Statement::Expression { expr, position })
}

fn parse_annotated_declaration(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let annotations = parse_annotations(state)?;
    let position = state.position();
    if state.check_keyword(Keyword::Functio) {
        return parse_fn_decl(state, annotations, false);
    }
    if state.check_keyword(Keyword::Incipit) || state.check_keyword(Keyword::Incipiet) {
        return parse_entry_point_with_annotations(state, annotations);
    }
    if state.check_keyword(Keyword::Genus) {
        return parse_struct_decl(state, annotations);
    }
    Err(Diagnostic::new(
        Phase::Syntactic,
        "annotation on a declaration that does not accept it".to_string(),
        position,
    ))
}

fn parse_import(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Importa)?;
    let spec = if state.eat_punct(Punctuation::Star) {
        let alias = if matches!(state.peek().kind, TokenKind::Identifier) && state.peek().lexeme == "ut" {
            state.bump();
            Some(state.expect_identifier()?)
        } else {
            None
        };
        ImportSpec::Wildcard(alias)
    } else {
        state.expect_punct(Punctuation::LBrace)?;
        let mut names = vec![];
        while !state.check_punct(Punctuation::RBrace) {
            let name = state.expect_identifier()?;
            let alias = if state.check_keyword(Keyword::Ut) {
                state.bump();
                Some(state.expect_identifier()?)
            } else {
                None
            };
            names.push((name, alias));
            if !state.eat_punct(Punctuation::Comma) {
                break;
            }
        }
        state.expect_punct(Punctuation::RBrace)?;
        ImportSpec::List(names)
    };
    // `ex "source"`
    state.expect_keyword(Keyword::Ex)?;
    let source_tok = state.peek().clone();
    let source = if matches!(source_tok.kind, TokenKind::String) {
        state.bump();
        source_tok.lexeme
    } else {
        state.expect_identifier()?
    };
    eat_terminator(state);
    Ok(Statement::Import { spec, source, position })
}

fn parse_var_decl(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    let mutable = state.check_keyword(Keyword::Variabile);
    state.bump();
    let name = state.expect_identifier()?;
    let ty = if state.eat_punct(Punctuation::Colon) { Some(parse_type(state)?) } else { None };
    let value = if state.eat_punct(Punctuation::Eq) { Some(parse_expression(state)?) } else { None };
    eat_terminator(state);
    Ok(Statement::VarDecl { mutable, name, ty, value, position })
}

fn parse_params(state: &mut ParseState) -> Result<Vec<Param>, Diagnostic> {
    state.expect_punct(Punctuation::LParen)?;
    let mut params = vec![];
    while !state.check_punct(Punctuation::RParen) {
        let position = state.position();
        let name = state.expect_identifier()?;
        state.expect_punct(Punctuation::Colon)?;
        let ty = parse_type(state)?;
        params.push(Param { name, ty, position });
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    state.expect_punct(Punctuation::RParen)?;
    Ok(params)
}

fn parse_fn_decl(state: &mut ParseState, annotations: Vec<Annotation>, is_async: bool) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Functio)?;
    let name = state.expect_identifier()?;
    let params = parse_params(state)?;
    let ret = if state.eat_punct(Punctuation::Arrow) { Some(parse_type(state)?) } else { None };
    let body = parse_block(state)?;
    Ok(Statement::FnDecl { name, params, ret, body, is_async, annotations, position })
}

fn parse_struct_decl(state: &mut ParseState, annotations: Vec<Annotation>) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Genus)?;
    let name = state.expect_identifier()?;
    state.expect_punct(Punctuation::LBrace)?;
    let mut fields = vec![];
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        match parse_field(state) {
            Ok(field) => fields.push(field),
            Err(diag) => {
                state.push_error(diag);
                state.synchronize_member();
            }
        }
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::StructDecl { name, fields, annotations, position })
}

fn parse_field(state: &mut ParseState) -> Result<Field, Diagnostic> {
    let position = state.position();
    let ty = parse_type(state)?;
    let name = state.expect_identifier()?;
    state.eat_punct(Punctuation::Comma);
    state.eat_punct(Punctuation::Semicolon);
    Ok(Field { name, ty, position })
}

fn parse_interface_decl(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Pactum)?;
    let name = state.expect_identifier()?;
    state.expect_punct(Punctuation::LBrace)?;
    let mut methods = vec![];
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        let mpos = state.position();
        state.eat_keyword(Keyword::Functio);
        let mname = state.expect_identifier()?;
        let params = parse_params(state)?;
        let ret = if state.eat_punct(Punctuation::Arrow) { Some(parse_type(state)?) } else { None };
        state.eat_punct(Punctuation::Semicolon);
        methods.push(MethodSig { name: mname, params, ret, position: mpos });
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::InterfaceDecl { name, methods, position })
}

fn parse_enum_decl(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Ordo)?;
    let name = state.expect_identifier()?;
    state.expect_punct(Punctuation::LBrace)?;
    let mut variants = vec![];
    while !state.check_punct(Punctuation::RBrace) {
        variants.push(state.expect_identifier()?);
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::EnumDecl { name, variants, position })
}

fn parse_union_decl(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Discretio)?;
    let name = state.expect_identifier()?;
    state.expect_punct(Punctuation::LBrace)?;
    let mut variants = vec![];
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        let vname = state.expect_identifier()?;
        let mut fields = vec![];
        if state.eat_punct(Punctuation::LBrace) {
            while !state.check_punct(Punctuation::RBrace) {
                fields.push(parse_field(state)?);
            }
            state.expect_punct(Punctuation::RBrace)?;
        }
        variants.push(VariantDef { name: vname, fields });
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::UnionDecl { name, variants, position })
}

fn parse_type_alias(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Typus)?;
    let name = state.expect_identifier()?;
    state.expect_punct(Punctuation::Eq)?;
    let ty = parse_type(state)?;
    eat_terminator(state);
    Ok(Statement::TypeAlias { name, ty, position })
}

fn parse_if(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Si)?;
    let condition = parse_expression(state)?;
    let then_block = parse_block(state)?;
    let else_branch = if state.eat_keyword(Keyword::Aliter) {
        if state.check_keyword(Keyword::Si) {
            Some(ElseBranch::If(Box::new(parse_if(state)?)))
        } else {
            Some(ElseBranch::Block(parse_block(state)?))
        }
    } else {
        None
    };
    Ok(Statement::If { condition, then_block, else_branch, position })
}

fn parse_while(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Dum)?;
    let condition = parse_expression(state)?;
    let body = parse_block(state)?;
    Ok(Statement::While { condition, body, position })
}

fn parse_do_while(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Fac)?;
    let body = parse_block(state)?;
    state.expect_keyword(Keyword::Dum)?;
    let condition = parse_expression(state)?;
    eat_terminator(state);
    Ok(Statement::DoWhile { body, condition, position })
}

fn parse_switch(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Cum)?;
    let discriminant = parse_expression(state)?;
    state.expect_punct(Punctuation::LBrace)?;
    let mut cases = vec![];
    let mut default = None;
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        if state.eat_keyword(Keyword::Casu) {
            let value = parse_expression(state)?;
            let body = parse_block(state)?;
            cases.push((value, body));
        } else if state.eat_keyword(Keyword::Aliter) {
            default = Some(parse_block(state)?);
        } else {
            break;
        }
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::Switch { discriminant, cases, default, position })
}

/// `discerne a, b { casu X, Y pro ... { } }` — see spec.md glossary and §4.3
/// "Pattern matching (discerne)". Commas inside a case are disambiguated by
/// looking one/two tokens ahead for `ut`/`pro` after an identifier.
fn parse_match(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Discerne)?;
    let mut discriminants = vec![parse_expression(state)?];
    while state.eat_punct(Punctuation::Comma) {
        discriminants.push(parse_expression(state)?);
    }
    state.expect_punct(Punctuation::LBrace)?;
    let mut cases = vec![];
    while state.eat_keyword(Keyword::Casu) {
        let needed = discriminants.len();
        let mut patterns = vec![parse_variant_pattern(state, needed)?];
        while state.eat_punct(Punctuation::Comma) {
            patterns.push(parse_variant_pattern(state, needed)?);
        }
        if patterns.len() != discriminants.len() {
            return Err(Diagnostic::new(
                Phase::Semantic,
                format!(
                    "match case has {} pattern(s) but {} discriminant(s) were matched on",
                    patterns.len(),
                    discriminants.len()
                ),
                patterns[0].position(),
            ));
        }
        let body = parse_block(state)?;
        cases.push(MatchCase { patterns, body });
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::Match { discriminants, cases, position })
}

fn parse_variant_pattern(state: &mut ParseState, discriminant_count: usize) -> Result<VariantPattern, Diagnostic> {
    let position = state.position();
    if matches!(state.peek().kind, TokenKind::Identifier) && state.peek().lexeme == "_" {
        state.bump();
        return Ok(VariantPattern::Wildcard { position });
    }
    let variant = state.expect_identifier()?;
    if state.eat_keyword(Keyword::Ut) {
        let binding = state.expect_identifier()?;
        return Ok(VariantPattern::Alias { variant, binding, position });
    }
    if state.eat_keyword(Keyword::Pro) {
        let mut bindings = vec![state.expect_identifier()?];
        // With only one discriminant every comma in this case belongs to the
        // binding list, so keep the old greedy behavior. With more than one,
        // a comma can instead separate this pattern from the next one, e.g.
        // `casu Click pro x, Quit { }` matching two discriminants: the comma
        // after `x` starts a fresh pattern, not another binding.
        while state.check_punct(Punctuation::Comma) {
            if discriminant_count > 1 && matches!(state.peek_n(1).kind, TokenKind::Identifier) {
                let starts_next_pattern = matches!(state.peek_n(2).as_keyword(), Some(Keyword::Ut) | Some(Keyword::Pro))
                    || matches!(state.peek_n(2).as_punct(), Some(Punctuation::LBrace));
                if starts_next_pattern {
                    break;
                }
            }
            state.bump();
            bindings.push(state.expect_identifier()?);
        }
        return Ok(VariantPattern::Positional { variant, bindings, position });
    }
    Ok(VariantPattern::Alias { variant: variant.clone(), binding: variant, position })
}

fn parse_for_of_or_range(state: &mut ParseState, is_async: bool) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Ex)?;
    let source_start = parse_expression(state)?;

    if let Expression::Range { start, end, inclusive, .. } = source_start {
        let step = if state.eat_keyword(Keyword::Per) { Some(parse_expression(state)?) } else { None };
        let (binding_mutable, binding) = parse_binding(state)?;
        let body = parse_block(state)?;
        return Ok(Statement::ForRange {
            binding_mutable,
            binding,
            start: *start,
            end: *end,
            inclusive,
            step,
            body,
            position,
        });
    }

    let mut dsl = vec![];
    while state.eat_punct(Punctuation::Comma) {
        dsl.push(super::expr::parse_dsl_verb(state)?);
    }
    let (binding_mutable, binding) = parse_binding(state)?;
    let body = parse_block(state)?;
    Ok(Statement::ForOf { binding_mutable, binding, source: source_start, is_async, dsl, body, position })
}

fn parse_for_in(state: &mut ParseState, is_async: bool) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::De)?;
    let source = parse_expression(state)?;
    let (binding_mutable, binding) = parse_binding(state)?;
    let body = parse_block(state)?;
    Ok(Statement::ForIn { binding_mutable, binding, source, is_async, body, position })
}

fn parse_binding(state: &mut ParseState) -> Result<(bool, String), Diagnostic> {
    let mutable = state.check_keyword(Keyword::Variabile);
    if !mutable {
        state.expect_keyword(Keyword::Fixum)?;
    } else {
        state.bump();
    }
    let name = state.expect_identifier()?;
    Ok((mutable, name))
}

fn parse_resource_scope(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Cura)?;
    let allocator = if matches!(state.peek().kind, TokenKind::Identifier) {
        match state.peek().lexeme.as_str() {
            "arena" => {
                state.bump();
                Some(AllocatorKind::Arena)
            }
            "pagina" => {
                state.bump();
                Some(AllocatorKind::Page)
            }
            _ => None,
        }
    } else {
        None
    };
    let acquire = parse_expression(state)?;
    let (_, binding) = parse_binding(state)?;
    let body = parse_block(state)?;
    Ok(Statement::ResourceScope { acquire, binding, allocator, body, position })
}

fn parse_try_catch(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Tenta)?;
    let try_block = parse_block(state)?;
    let catch = if state.eat_keyword(Keyword::Cape) {
        let binding = if matches!(state.peek().kind, TokenKind::Identifier) {
            Some(state.expect_identifier()?)
        } else {
            None
        };
        Some((binding, parse_block(state)?))
    } else {
        None
    };
    let finally = if state.eat_keyword(Keyword::Denique) { Some(parse_block(state)?) } else { None };
    Ok(Statement::TryCatch { try_block, catch, finally, position })
}

fn parse_guard(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Tutare)?;
    let condition = parse_expression(state)?;
    state.expect_keyword(Keyword::Aliter)?;
    let else_block = parse_block(state)?;
    Ok(Statement::Guard { condition, else_block, position })
}

fn parse_output(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    let kind = if state.eat_keyword(Keyword::Scribe) {
        OutputKind::Write
    } else if state.eat_keyword(Keyword::Vide) {
        OutputKind::Debug
    } else {
        state.expect_keyword(Keyword::Mone)?;
        OutputKind::Warn
    };
    let mut args = vec![parse_expression(state)?];
    while state.eat_punct(Punctuation::Comma) {
        args.push(parse_expression(state)?);
    }
    eat_terminator(state);
    Ok(Statement::Output { kind, args, position })
}

fn parse_entry_point(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    parse_entry_point_with_annotations(state, vec![])
}

fn parse_entry_point_with_annotations(state: &mut ParseState, annotations: Vec<Annotation>) -> Result<Statement, Diagnostic> {
    let position = state.position();
    let is_async = state.check_keyword(Keyword::Incipiet);
    state.bump();
    state.eat_punct(Punctuation::LParen);
    state.eat_punct(Punctuation::RParen);
    let body = parse_block(state)?;
    let cli = build_cli_spec(&annotations);
    Ok(Statement::EntryPoint { is_async, body, cli, position })
}

fn build_cli_spec(annotations: &[Annotation]) -> Option<CliSpec> {
    if !annotations.iter().any(|a| matches!(a, Annotation::Cli)) {
        return None;
    }
    let mut options = vec![];
    let mut operands = vec![];
    for a in annotations {
        match a {
            Annotation::CliOption(opt) => options.push(opt.clone()),
            Annotation::CliOperand(op) => operands.push(op.clone()),
            _ => {}
        }
    }
    Some(CliSpec { options, operands })
}

fn parse_test_suite(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Probatio)?;
    let name_tok = state.peek().clone();
    let name = if matches!(name_tok.kind, TokenKind::String) {
        state.bump();
        name_tok.lexeme
    } else {
        state.expect_identifier()?
    };
    state.expect_punct(Punctuation::LBrace)?;
    let mut body = vec![];
    while !state.check_punct(Punctuation::RBrace) && !state.is_eof() {
        match parse_top_level(state) {
            Ok(node) => body.push(node),
            Err(diag) => {
                state.push_error(diag);
                state.synchronize_statement();
            }
        }
    }
    state.expect_punct(Punctuation::RBrace)?;
    Ok(Statement::TestSuite { name, body, position })
}

fn parse_test_case(state: &mut ParseState) -> Result<Statement, Diagnostic> {
    let position = state.position();
    state.expect_keyword(Keyword::Casus)?;
    let name_tok = state.peek().clone();
    let name = if matches!(name_tok.kind, TokenKind::String) {
        state.bump();
        name_tok.lexeme
    } else {
        state.expect_identifier()?
    };
    let body = parse_block(state)?;
    Ok(Statement::TestCase { name, body, position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(src: &str) -> Program {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "{errors:?}");
        let mut state = ParseState::new(tokens);
        let program = parse_program(&mut state);
        assert!(state.errors.is_empty(), "{:?}", state.errors);
        program
    }

    #[test]
    fn empty_source_yields_empty_program() {
        let program = parse("");
        assert!(program.body.is_empty());
    }

    #[test]
    fn var_decl_with_list_type() {
        let program = parse("fixum xs: lista<numerus> = [1, 2, 3];");
        assert_eq!(program.body.len(), 1);
        assert!(matches!(program.body[0].stmt, Statement::VarDecl { .. }));
    }

    #[test]
    fn single_statement_body_forms() {
        let program = parse("functio f(): numerus reddit 1;");
        let Statement::FnDecl { body, .. } = &program.body[0].stmt else { panic!() };
        assert_eq!(body.statements.len(), 1);
        assert!(matches!(body.statements[0].stmt, Statement::Return { .. }));
    }

    #[test]
    fn range_for_loop() {
        let program = parse("ex 0..10 per 2 fixum i { scribe i; }");
        assert!(matches!(program.body[0].stmt, Statement::ForRange { .. }));
    }

    #[test]
    fn keyword_followed_by_paren_is_a_call() {
        // a user function named like a keyword-ish identifier shadows fine;
        // here we check that a bare call statement parses as an expression.
        let program = parse("scribe(1);");
        assert!(matches!(program.body[0].stmt, Statement::Output { .. }) == false);
    }

    #[test]
    fn vel_mixed_with_aut_is_an_error() {
        let (tokens, _) = tokenize("fixum x = a vel b aut c;");
        let mut state = ParseState::new(tokens);
        let _ = parse_program(&mut state);
        assert!(!state.errors.is_empty());
    }

    #[test]
    fn match_case_arity_mismatch_is_semantic_error() {
        let (tokens, _) = tokenize("discerne e { casu Click pro x { } }");
        let mut state = ParseState::new(tokens);
        let _ = parse_program(&mut state);
        assert!(state.errors.iter().any(|d| d.phase == Phase::Semantic));
    }

    #[test]
    fn multi_discriminant_pro_binding_does_not_swallow_next_pattern() {
        let program = parse("discerne a, b { casu Click pro x, Quit { } }");
        let Statement::Match { discriminants, cases, .. } = &program.body[0].stmt else { panic!() };
        assert_eq!(discriminants.len(), 2);
        assert_eq!(cases[0].patterns.len(), 2);
        match &cases[0].patterns[0] {
            VariantPattern::Positional { variant, bindings, .. } => {
                assert_eq!(variant, "Click");
                assert_eq!(bindings, &vec!["x".to_string()]);
            }
            other => panic!("expected a positional pattern, got {other:?}"),
        }
        assert!(matches!(&cases[0].patterns[1], VariantPattern::Alias { variant, .. } if variant == "Quit"));
    }
}
