//! Expression precedence climbing. See spec.md §4.3 "Algorithm" for the full
//! chain, lowest to highest:
//! assignment -> ternary -> logical-or/nullish -> logical-and ->
//! equality-and-type-check -> relational/range-relational -> bitwise-or ->
//! bitwise-xor -> bitwise-and -> range -> additive -> multiplicative -> unary
//! -> cast/conversion/shift (postfix) -> call-member-chain -> primary.

use crate::ast::{
    BinaryOp, DslAggregate, DslVerb, Expression, FormatPart, LambdaBody, Literal, UnaryOp,
};
use crate::ast::expression::Param;
use crate::diagnostics::{Diagnostic, Phase};
use crate::lexicon::{Keyword, CONTEXTUAL_UNARY_WORDS};
use crate::token::{Position, Punctuation, TokenKind};

use super::parse_state::ParseState;
use super::stmt::parse_block;
use super::types::parse_type;

pub fn parse_expression(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    parse_assignment(state)
}

fn parse_assignment(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let target = parse_ternary(state)?;
    if state.eat_punct(Punctuation::Eq) {
        let value = parse_assignment(state)?;
        return Ok(Expression::Assign { target: Box::new(target), value: Box::new(value), position });
    }
    Ok(target)
}

fn parse_ternary(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let condition = parse_or_nullish(state)?;
    if state.eat_punct(Punctuation::Question) {
        let if_true = parse_assignment(state)?;
        state.expect_punct(Punctuation::Colon)?;
        let if_false = parse_assignment(state)?;
        return Ok(Expression::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            position,
        });
    }
    Ok(condition)
}

#[derive(PartialEq)]
enum OrKind {
    LogicalOr,
    Nullish,
}

/// `vel` (nullish) and `aut`/`||` (logical-or) share a precedence level but
/// mixing them without parentheses is a parse error (spec.md §4.3).
fn parse_or_nullish(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_and(state)?;
    let mut kind: Option<OrKind> = None;
    loop {
        let this_kind = if state.check_punct(Punctuation::PipePipe) || state.check_keyword(Keyword::Aut) {
            OrKind::LogicalOr
        } else if state.check_keyword(Keyword::Vel) {
            OrKind::Nullish
        } else {
            break;
        };
        if let Some(prev) = &kind {
            if *prev != this_kind {
                let pos = state.position();
                return Err(Diagnostic::new(
                    Phase::Syntactic,
                    "mixing 'vel' (nullish) and 'aut'/'||' (logical-or) requires parentheses".to_string(),
                    pos,
                ));
            }
        }
        let op = match this_kind {
            OrKind::LogicalOr => BinaryOp::LogicalOr,
            OrKind::Nullish => BinaryOp::NullishCoalesce,
        };
        kind = Some(this_kind);
        state.bump();
        let right = parse_and(state)?;
        left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_and(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_equality_type_check(state)?;
    while state.check_punct(Punctuation::AmpAmp) || state.check_keyword(Keyword::Et) {
        state.bump();
        let right = parse_equality_type_check(state)?;
        left = Expression::Binary { op: BinaryOp::LogicalAnd, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_equality_type_check(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_relational(state)?;
    loop {
        if state.eat_keyword(Keyword::Intra) {
            let ty = parse_type(state)?;
            left = Expression::TypeCheck { expr: Box::new(left), ty, position };
            continue;
        }
        let op = if state.check_punct(Punctuation::EqEq) {
            BinaryOp::Eq
        } else if state.check_punct(Punctuation::NotEq) {
            BinaryOp::NotEq
        } else {
            break;
        };
        state.bump();
        let right = parse_relational(state)?;
        left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_relational(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_bitor(state)?;
    loop {
        let op = if state.check_punct(Punctuation::Lt) {
            BinaryOp::Lt
        } else if state.check_punct(Punctuation::Gt) {
            BinaryOp::Gt
        } else if state.check_punct(Punctuation::LtEq) {
            BinaryOp::LtEq
        } else if state.check_punct(Punctuation::GtEq) {
            BinaryOp::GtEq
        } else {
            break;
        };
        state.bump();
        let right = parse_bitor(state)?;
        left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_bitor(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_bitxor(state)?;
    while state.check_punct(Punctuation::Pipe) {
        state.bump();
        let right = parse_bitxor(state)?;
        left = Expression::Binary { op: BinaryOp::BitOr, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_bitxor(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_bitand(state)?;
    while state.check_punct(Punctuation::Caret) {
        state.bump();
        let right = parse_bitand(state)?;
        left = Expression::Binary { op: BinaryOp::BitXor, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_bitand(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_range(state)?;
    while state.check_punct(Punctuation::Amp) {
        state.bump();
        let right = parse_range(state)?;
        left = Expression::Binary { op: BinaryOp::BitAnd, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_range(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let start = parse_additive(state)?;
    if state.eat_punct(Punctuation::DotDot) {
        let inclusive = state.eat_punct(Punctuation::Eq);
        let end = parse_additive(state)?;
        return Ok(Expression::Range { start: Box::new(start), end: Box::new(end), inclusive, position });
    }
    Ok(start)
}

fn parse_additive(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_multiplicative(state)?;
    loop {
        let op = if state.check_punct(Punctuation::Plus) {
            BinaryOp::Add
        } else if state.check_punct(Punctuation::Minus) {
            BinaryOp::Sub
        } else {
            break;
        };
        state.bump();
        let right = parse_multiplicative(state)?;
        left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

fn parse_multiplicative(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut left = parse_unary(state)?;
    loop {
        let op = if state.check_punct(Punctuation::Star) {
            BinaryOp::Mul
        } else if state.check_punct(Punctuation::Slash) {
            BinaryOp::Div
        } else if state.check_punct(Punctuation::Percent) {
            BinaryOp::Mod
        } else {
            break;
        };
        state.bump();
        let right = parse_unary(state)?;
        left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), position };
    }
    Ok(left)
}

/// A contextual keyword is a unary operator only when followed, on the same
/// source line, by an operand-starting token (spec.md §4.3).
fn word_is_operator_here(state: &ParseState) -> bool {
    let Some(kw) = state.peek().as_keyword() else { return false };
    if !CONTEXTUAL_UNARY_WORDS.contains(&kw) {
        return false;
    }
    let line = state.current_line();
    let next = state.peek_n(1);
    if next.position.line != line {
        return false;
    }
    matches!(next.kind, TokenKind::Identifier | TokenKind::Number | TokenKind::BigInt | TokenKind::String)
        || next.as_keyword().map(|k| CONTEXTUAL_UNARY_WORDS.contains(&k)).unwrap_or(false)
        || next.as_punct() == Some(Punctuation::LParen)
}

fn parse_unary(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();

    if state.check_punct(Punctuation::Bang) {
        state.bump();
        let operand = parse_unary(state)?;
        return Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand), position });
    }
    if state.check_punct(Punctuation::Minus) {
        state.bump();
        let operand = parse_unary(state)?;
        return Ok(Expression::Unary { op: UnaryOp::SignNegative, operand: Box::new(operand), position });
    }
    if state.check_punct(Punctuation::Plus) {
        state.bump();
        let operand = parse_unary(state)?;
        return Ok(Expression::Unary { op: UnaryOp::SignPositive, operand: Box::new(operand), position });
    }

    if word_is_operator_here(state) {
        let kw = state.peek().as_keyword().unwrap();
        match kw {
            Keyword::Novum => {
                state.bump();
                let ty = parse_type(state)?;
                let args = parse_call_args(state)?;
                return Ok(Expression::New { type_name: ty, args, position });
            }
            Keyword::Expecta => {
                state.bump();
                let operand = parse_unary(state)?;
                return Ok(Expression::Unary { op: UnaryOp::Await, operand: Box::new(operand), position });
            }
            Keyword::Non => {
                state.bump();
                let operand = parse_unary(state)?;
                return Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand), position });
            }
            Keyword::Vacuum => {
                state.bump();
                let operand = parse_unary(state)?;
                return Ok(Expression::Unary { op: UnaryOp::Empty, operand: Box::new(operand), position });
            }
            Keyword::Certus => {
                state.bump();
                let operand = parse_unary(state)?;
                return Ok(Expression::Unary { op: UnaryOp::NullCheck, operand: Box::new(operand), position });
            }
            _ => {}
        }
    }

    parse_cast_level(state)
}

/// Postfix cast (`converte T`), fallible conversion (`tempta T vel expr`).
fn parse_cast_level(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut expr = parse_call_member_chain(state)?;
    loop {
        if state.eat_keyword(Keyword::Converte) {
            let target = parse_type(state)?;
            expr = Expression::Cast { expr: Box::new(expr), target, position };
            continue;
        }
        if state.eat_keyword(Keyword::Tempta) {
            let target = parse_type(state)?;
            let fallback = if state.eat_keyword(Keyword::Vel) {
                Some(Box::new(parse_unary(state)?))
            } else {
                None
            };
            expr = Expression::Conversion { expr: Box::new(expr), target, fallback, position };
            continue;
        }
        if state.check_punct(Punctuation::Shl) || state.check_punct(Punctuation::Shr) {
            let op = if state.check_punct(Punctuation::Shl) { BinaryOp::Shl } else { BinaryOp::Shr };
            state.bump();
            let rhs = parse_call_member_chain(state)?;
            expr = Expression::Binary { op, left: Box::new(expr), right: Box::new(rhs), position };
            continue;
        }
        break;
    }
    Ok(expr)
}

fn parse_call_member_chain(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let mut expr = parse_primary(state)?;
    loop {
        if state.check_punct(Punctuation::Dot) || state.check_punct(Punctuation::QuestionDot) {
            let optional = state.check_punct(Punctuation::QuestionDot);
            state.bump();
            let property = state.expect_identifier()?;
            let non_null = state.eat_punct(Punctuation::Bang);
            expr = Expression::Member { object: Box::new(expr), property, optional, non_null, position };
            continue;
        }
        if state.check_punct(Punctuation::LParen) {
            let args = parse_call_args(state)?;
            let non_null = state.eat_punct(Punctuation::Bang);
            expr = Expression::Call { callee: Box::new(expr), args, optional: false, non_null, position };
            continue;
        }
        if state.check_punct(Punctuation::LBracket) {
            state.bump();
            let index = parse_expression(state)?;
            state.expect_punct(Punctuation::RBracket)?;
            let non_null = state.eat_punct(Punctuation::Bang);
            expr = Expression::Index { object: Box::new(expr), index: Box::new(index), optional: false, non_null, position };
            continue;
        }
        if state.check_punct(Punctuation::PipeGt) {
            return parse_pipeline_tail(state, expr, position);
        }
        break;
    }
    Ok(expr)
}

fn parse_pipeline_tail(state: &mut ParseState, source: Expression, position: Position) -> Result<Expression, Diagnostic> {
    let mut verbs = vec![];
    while state.eat_punct(Punctuation::PipeGt) {
        verbs.push(parse_dsl_verb(state)?);
    }
    Ok(Expression::Pipeline { source: Box::new(source), verbs, position })
}

pub(super) fn parse_dsl_verb(state: &mut ParseState) -> Result<DslVerb, Diagnostic> {
    let name = state.expect_identifier()?;
    match name.as_str() {
        "primum" => Ok(DslVerb::First(parse_expression(state)?)),
        "postremum" => Ok(DslVerb::Last(parse_expression(state)?)),
        "ordina" => {
            let property = state.expect_identifier()?;
            let descending = state.eat_keyword(Keyword::Aliter);
            Ok(DslVerb::SortBy { property, descending })
        }
        "carpe" => Ok(DslVerb::Pluck(state.expect_identifier()?)),
        "grega" => Ok(DslVerb::GroupBy(state.expect_identifier()?)),
        "summa" => Ok(DslVerb::Aggregate(DslAggregate::Sum)),
        "maximum" => Ok(DslVerb::Aggregate(DslAggregate::Max)),
        "minimum" => Ok(DslVerb::Aggregate(DslAggregate::Min)),
        "medium" => Ok(DslVerb::Aggregate(DslAggregate::Average)),
        "numera" => Ok(DslVerb::Aggregate(DslAggregate::Count)),
        "cerne" => Ok(DslVerb::Filter(Box::new(parse_expression(state)?))),
        other => Err(Diagnostic::new(
            Phase::Syntactic,
            format!("unknown DSL pipeline verb '{other}'"),
            state.position(),
        )),
    }
}

fn parse_call_args(state: &mut ParseState) -> Result<Vec<Param>, Diagnostic> {
    state.expect_punct(Punctuation::LParen)?;
    let mut args = vec![];
    while !state.check_punct(Punctuation::RParen) {
        if matches!(state.peek().kind, TokenKind::Identifier)
            && state.peek_n(1).as_punct() == Some(Punctuation::Colon)
        {
            let name = state.expect_identifier()?;
            state.expect_punct(Punctuation::Colon)?;
            let value = parse_expression(state)?;
            args.push(Param::Named { name, value: Box::new(value) });
        } else {
            args.push(Param::Positional(Box::new(parse_expression(state)?)));
        }
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    state.expect_punct(Punctuation::RParen)?;
    Ok(args)
}

fn parse_primary(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let tok = state.peek().clone();

    match &tok.kind {
        TokenKind::Number => {
            state.bump();
            let value = if let Some(hex) = tok.lexeme.strip_prefix("0x") {
                i64::from_str_radix(hex, 16).unwrap_or(0) as f64
            } else {
                tok.lexeme.parse().unwrap_or(0.0)
            };
            Ok(Expression::Literal { value: Literal::Number { raw: tok.lexeme, value }, position })
        }
        TokenKind::BigInt => {
            state.bump();
            let raw = tok.lexeme.trim_end_matches('n').to_string();
            Ok(Expression::Literal { value: Literal::BigInt(raw), position })
        }
        TokenKind::String => {
            state.bump();
            let unescaped = unescape::unescape(&tok.lexeme).unwrap_or(tok.lexeme);
            Ok(Expression::Literal { value: Literal::Str(unescaped), position })
        }
        TokenKind::Template => {
            state.bump();
            Ok(Expression::FormatString { parts: split_template(&tok.lexeme), position })
        }
        TokenKind::Identifier => {
            state.bump();
            if tok.lexeme == "verum" {
                return Ok(Expression::Literal { value: Literal::Boolean(true), position });
            }
            if tok.lexeme == "falsum" {
                return Ok(Expression::Literal { value: Literal::Boolean(false), position });
            }
            if tok.lexeme == "nullum" {
                return Ok(Expression::Literal { value: Literal::Null, position });
            }
            Ok(Expression::Identifier { name: tok.lexeme, position })
        }
        TokenKind::Keyword(Keyword::Ego) => {
            state.bump();
            Ok(Expression::SelfRef { position })
        }
        TokenKind::Keyword(Keyword::Lege) => {
            state.bump();
            state.expect_punct(Punctuation::LParen)?;
            state.expect_punct(Punctuation::RParen)?;
            Ok(Expression::StdinRead { position })
        }
        TokenKind::Keyword(Keyword::Regula) => {
            state.bump();
            let body_tok = state.peek().clone();
            if body_tok.kind != TokenKind::RegexBody {
                return Err(Diagnostic::new(
                    Phase::Syntactic,
                    "expected a regex body immediately after 'regula'".to_string(),
                    position,
                ));
            }
            state.bump();
            let mut parts = body_tok.lexeme.splitn(2, crate::token::REGEX_BODY_FLAG_SEP);
            let body = parts.next().unwrap_or_default().to_string();
            let flags = parts.next().unwrap_or_default().to_string();
            Ok(Expression::Regex { body, flags, position })
        }
        TokenKind::Keyword(Keyword::Mox) => {
            state.bump();
            let body = parse_block(state)?;
            Ok(Expression::CompileTimeBlock { body, position })
        }
        TokenKind::Punctuation(Punctuation::LParen) => {
            if lambda_follows(state) {
                return parse_lambda(state);
            }
            state.bump();
            let inner = parse_expression(state)?;
            state.expect_punct(Punctuation::RParen)?;
            Ok(inner)
        }
        TokenKind::Punctuation(Punctuation::LBracket) => {
            state.bump();
            let mut elements = vec![];
            while !state.check_punct(Punctuation::RBracket) {
                elements.push(parse_expression(state)?);
                if !state.eat_punct(Punctuation::Comma) {
                    break;
                }
            }
            state.expect_punct(Punctuation::RBracket)?;
            Ok(Expression::ArrayLiteral { elements, position })
        }
        TokenKind::Punctuation(Punctuation::LBrace) => {
            state.bump();
            let mut fields = vec![];
            while !state.check_punct(Punctuation::RBrace) {
                let name = state.expect_identifier()?;
                state.expect_punct(Punctuation::Colon)?;
                let value = parse_expression(state)?;
                fields.push((name, value));
                if !state.eat_punct(Punctuation::Comma) {
                    break;
                }
            }
            state.expect_punct(Punctuation::RBrace)?;
            Ok(Expression::ObjectLiteral { fields, position })
        }
        TokenKind::Keyword(Keyword::Figendum) | TokenKind::Keyword(Keyword::Variandum) => parse_lambda(state),
        other => Err(Diagnostic::new(
            Phase::Syntactic,
            format!("unexpected token in expression: {other:?}"),
            position,
        )),
    }
}

/// Lookahead: does the parenthesized group starting here close with `=>`,
/// i.e. is this a lambda parameter list rather than a grouped expression?
fn lambda_follows(state: &ParseState) -> bool {
    let mut depth = 0i32;
    let mut n = 0usize;
    loop {
        let tok = state.peek_n(n);
        if tok.is_eof() {
            return false;
        }
        match tok.as_punct() {
            Some(Punctuation::LParen) => depth += 1,
            Some(Punctuation::RParen) => {
                depth -= 1;
                if depth == 0 {
                    return state.peek_n(n + 1).as_punct() == Some(Punctuation::FatArrow);
                }
            }
            _ => {}
        }
        n += 1;
        if n > 512 {
            return false;
        }
    }
}

fn parse_lambda(state: &mut ParseState) -> Result<Expression, Diagnostic> {
    let position = state.position();
    let is_async = state.eat_keyword(Keyword::Figendum) || state.eat_keyword(Keyword::Variandum);
    state.expect_punct(Punctuation::LParen)?;
    let mut params = vec![];
    while !state.check_punct(Punctuation::RParen) {
        let name = state.expect_identifier()?;
        let ty = if state.eat_punct(Punctuation::Colon) { Some(parse_type(state)?) } else { None };
        params.push((name, ty));
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    state.expect_punct(Punctuation::RParen)?;
    state.expect_punct(Punctuation::FatArrow)?;
    let body = if state.check_punct(Punctuation::LBrace) {
        LambdaBody::Block(parse_block(state)?)
    } else {
        LambdaBody::Expr(Box::new(parse_expression(state)?))
    };
    Ok(Expression::Lambda { params, body, is_async, position })
}

/// Splits a template literal's raw body into text and `${...}` expression
/// parts. Embedded-expression splitting stays a source-level convenience; the
/// AST keeps both, per spec.md §4.1.
fn split_template(raw: &str) -> Vec<FormatPart> {
    let mut parts = vec![];
    let mut text = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            if !text.is_empty() {
                parts.push(FormatPart::Text(std::mem::take(&mut text)));
            }
            let mut expr_src = String::new();
            let mut depth = 1;
            for c in chars.by_ref() {
                if c == '{' {
                    depth += 1;
                } else if c == '}' {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                expr_src.push(c);
            }
            let (tokens, _) = crate::lexer::tokenize(&expr_src);
            let mut inner_state = ParseState::new(tokens);
            if let Ok(expr) = parse_expression(&mut inner_state) {
                parts.push(FormatPart::Expr(expr));
            }
        } else {
            text.push(c);
        }
    }
    if !text.is_empty() {
        parts.push(FormatPart::Text(text));
    }
    parts
}
