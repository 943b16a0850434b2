//! Type syntax parsing.

use crate::ast::{OwnershipPrefix, TypeRef};
use crate::diagnostics::Diagnostic;
use crate::lexicon::Keyword;
use crate::token::{Punctuation, TokenKind};

use super::parse_state::ParseState;

pub fn parse_type(state: &mut ParseState) -> Result<TypeRef, Diagnostic> {
    let position = state.position();

    if state.eat_keyword(Keyword::Per) {
        let inner = parse_type(state)?;
        return Ok(TypeRef::Owned { prefix: OwnershipPrefix::Per, inner: Box::new(inner), position });
    }
    if state.eat_keyword(Keyword::Ex) {
        let inner = parse_type(state)?;
        return Ok(TypeRef::Owned { prefix: OwnershipPrefix::Ex, inner: Box::new(inner), position });
    }
    if state.eat_keyword(Keyword::De) {
        let inner = parse_type(state)?;
        return Ok(TypeRef::Owned { prefix: OwnershipPrefix::De, inner: Box::new(inner), position });
    }

    if let TokenKind::Number = state.peek().kind.clone() {
        let tok = state.bump();
        let value: i64 = tok.lexeme.parse().unwrap_or(0);
        return Ok(TypeRef::NumericLiteral { value, position });
    }

    let mut base = if state.check_punct(Punctuation::LParen) {
        parse_function_type(state)?
    } else {
        let name = state.expect_identifier()?;
        let mut params = vec![];
        if state.eat_punct(Punctuation::Lt) {
            loop {
                params.push(parse_type(state)?);
                if !state.eat_punct(Punctuation::Comma) {
                    break;
                }
            }
            state.expect_punct(Punctuation::Gt)?;
        }
        let nullable = state.eat_punct(Punctuation::Question);
        TypeRef::Named { name, params, nullable, position }
    };

    while state.eat_punct(Punctuation::LBracket) {
        state.expect_punct(Punctuation::RBracket)?;
        base = TypeRef::Array { element: Box::new(base), position };
    }

    Ok(base)
}

fn parse_function_type(state: &mut ParseState) -> Result<TypeRef, Diagnostic> {
    let position = state.position();
    state.expect_punct(Punctuation::LParen)?;
    let mut params = vec![];
    while !state.check_punct(Punctuation::RParen) {
        params.push(parse_type(state)?);
        if !state.eat_punct(Punctuation::Comma) {
            break;
        }
    }
    state.expect_punct(Punctuation::RParen)?;
    state.expect_punct(Punctuation::Arrow)?;
    let ret = parse_type(state)?;
    Ok(TypeRef::Function { params, ret: Box::new(ret), position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_one(src: &str) -> TypeRef {
        let (tokens, _) = tokenize(src);
        let mut state = ParseState::new(tokens);
        parse_type(&mut state).unwrap()
    }

    #[test]
    fn named_generic_nullable() {
        let ty = parse_one("lista<numerus>?");
        match ty {
            TypeRef::Named { name, params, nullable, .. } => {
                assert_eq!(name, "lista");
                assert_eq!(params.len(), 1);
                assert!(nullable);
            }
            _ => panic!("wrong shape"),
        }
    }

    #[test]
    fn array_shorthand() {
        let ty = parse_one("numerus[]");
        assert!(matches!(ty, TypeRef::Array { .. }));
    }

    #[test]
    fn ownership_prefix() {
        let ty = parse_one("per textus");
        assert!(matches!(ty, TypeRef::Owned { prefix: OwnershipPrefix::Per, .. }));
    }
}
