//! Module resolution, type tagging, and variant-layout recording. See
//! spec.md §4.5. Does not perform bidirectional inference — types flow from
//! declared annotations, literal forms, and norma lookups only.

mod env;
mod loader;
mod module;

pub use loader::{InMemoryLoader, ModuleLoader};
pub use module::{ExportKind, ExportMap, VariantIndex};

use std::collections::HashMap;
use std::path::Path;

use crate::ast::*;
use crate::ast::expression::Param;
use crate::diagnostics::{sort_diagnostics, Diagnostic, Phase};
use crate::token::Position;

use env::TypeEnv;
use module::{normalize_import_path, ModuleTable};

/// A resolved type, attached to receiver expressions of member-call
/// expressions (spec.md §3 "Lifecycle"). Kept as a side table keyed by
/// position rather than a mutated AST field, so the parser's output stays
/// immutable as spec.md's ownership section requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Named(String),
    Unknown,
}

pub struct AnnotatedProgram {
    pub program: Program,
    pub resolved_types: HashMap<Position, ResolvedType>,
    pub exports: ExportMap,
    pub variants: VariantIndex,
}

pub struct SemanticContext {
    modules: ModuleTable,
}

impl SemanticContext {
    pub fn new() -> Self {
        Self { modules: ModuleTable::new() }
    }
}

impl Default for SemanticContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `resolve(program, absolute_path) -> (annotated_program, semantic_errors)`.
/// `loader` supplies source text for imported files; the core stays pure with
/// respect to actual file I/O, which is out of scope (spec.md §1).
pub fn resolve(
    ctx: &mut SemanticContext,
    program: Program,
    absolute_path: &Path,
    loader: &mut dyn ModuleLoader,
) -> (AnnotatedProgram, Vec<Diagnostic>) {
    log::debug!("resolve: {} top-level statement(s) for {}", program.body.len(), absolute_path.display());
    let mut errors = vec![];

    let variants = module::variant_index(&program);
    let exports = module::export_map(&program);

    resolve_imports(&program, absolute_path, &mut ctx.modules, loader, &mut errors);

    let mut resolved_types = HashMap::new();
    let mut env = TypeEnv::new();
    for (i, node) in program.body.iter().enumerate() {
        log::trace!("resolving top-level statement {i}");
        walk_statement(&node.stmt, &mut env, &variants, &mut resolved_types, &mut errors);
    }

    sort_diagnostics(&mut errors);
    log::debug!("resolve: {} export(s), {} error(s)", exports.len(), errors.len());
    (AnnotatedProgram { program, resolved_types, exports, variants }, errors)
}

fn resolve_imports(
    program: &Program,
    absolute_path: &Path,
    modules: &mut ModuleTable,
    loader: &mut dyn ModuleLoader,
    errors: &mut Vec<Diagnostic>,
) {
    for node in &program.body {
        let Statement::Import { source, position, .. } = &node.stmt else { continue };

        if crate::norma::is_stdlib_namespace(source) {
            continue; // compile-time only, no module load (spec.md §4.5)
        }
        if !source.starts_with("./") && !source.starts_with("../") {
            continue; // external package path, passes through unchanged
        }

        let target_path = normalize_import_path(absolute_path, source);
        modules.resolve(&target_path, loader, *position, errors);
    }
}

fn walk_statement(
    stmt: &Statement,
    env: &mut TypeEnv,
    variants: &VariantIndex,
    resolved: &mut HashMap<Position, ResolvedType>,
    errors: &mut Vec<Diagnostic>,
) {
    match stmt {
        Statement::VarDecl { name, ty, value, .. } => {
            if let Some(value) = value {
                walk_expr(value, env, resolved, errors);
            }
            let declared = ty.as_ref().and_then(type_name);
            let inferred = value.as_ref().and_then(infer_literal_type);
            env.bind(name.clone(), declared.or(inferred));
        }
        Statement::FnDecl { params, body, .. } => {
            let mut inner = env.child();
            for p in params {
                inner.bind(p.name.clone(), type_name(&p.ty));
            }
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::If { condition, then_block, else_branch, .. } => {
            walk_expr(condition, env, resolved, errors);
            {
                let mut inner = env.child();
                walk_block(then_block, &mut inner, variants, resolved, errors);
            }
            match else_branch {
                Some(ElseBranch::Block(b)) => {
                    let mut inner = env.child();
                    walk_block(b, &mut inner, variants, resolved, errors);
                }
                Some(ElseBranch::If(s)) => walk_statement(s, env, variants, resolved, errors),
                None => {}
            }
        }
        Statement::While { condition, body, .. } | Statement::DoWhile { body, condition, .. } => {
            walk_expr(condition, env, resolved, errors);
            let mut inner = env.child();
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::ForOf { binding, source, body, .. } | Statement::ForIn { binding, source, body, .. } => {
            walk_expr(source, env, resolved, errors);
            let mut inner = env.child();
            inner.bind(binding.clone(), None);
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::ForRange { binding, start, end, body, .. } => {
            walk_expr(start, env, resolved, errors);
            walk_expr(end, env, resolved, errors);
            let mut inner = env.child();
            inner.bind(binding.clone(), Some("numerus".to_string()));
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::Match { discriminants, cases, .. } => {
            for d in discriminants {
                walk_expr(d, env, resolved, errors);
            }
            for case in cases {
                check_match_case_arity(case, variants, errors);
                let mut inner = env.child();
                walk_block(&case.body, &mut inner, variants, resolved, errors);
            }
        }
        Statement::Switch { discriminant, cases, default, .. } => {
            walk_expr(discriminant, env, resolved, errors);
            for (value, block) in cases {
                walk_expr(value, env, resolved, errors);
                let mut inner = env.child();
                walk_block(block, &mut inner, variants, resolved, errors);
            }
            if let Some(block) = default {
                let mut inner = env.child();
                walk_block(block, &mut inner, variants, resolved, errors);
            }
        }
        Statement::TryCatch { try_block, catch, finally, .. } => {
            {
                let mut inner = env.child();
                walk_block(try_block, &mut inner, variants, resolved, errors);
            }
            if let Some((binding, block)) = catch {
                let mut inner = env.child();
                if let Some(b) = binding {
                    inner.bind(b.clone(), None);
                }
                walk_block(block, &mut inner, variants, resolved, errors);
            }
            if let Some(block) = finally {
                let mut inner = env.child();
                walk_block(block, &mut inner, variants, resolved, errors);
            }
        }
        Statement::ResourceScope { acquire, binding, body, .. } => {
            walk_expr(acquire, env, resolved, errors);
            let mut inner = env.child();
            inner.bind(binding.clone(), None);
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::Guard { condition, else_block, .. } => {
            walk_expr(condition, env, resolved, errors);
            let mut inner = env.child();
            walk_block(else_block, &mut inner, variants, resolved, errors);
        }
        Statement::EntryPoint { body, .. }
        | Statement::TestCase { body, .. }
        | Statement::Setup { body, .. }
        | Statement::Teardown { body, .. } => {
            let mut inner = env.child();
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        Statement::TestSuite { body, .. } => {
            for node in body {
                walk_statement(&node.stmt, env, variants, resolved, errors);
            }
        }
        Statement::Return { expr: Some(e), .. }
        | Statement::Throw { expr: e, .. }
        | Statement::Panic { expr: e, .. }
        | Statement::Expression { expr: e, .. } => walk_expr(e, env, resolved, errors),
        Statement::Assertion { expr, message, .. } => {
            walk_expr(expr, env, resolved, errors);
            if let Some(m) = message {
                walk_expr(m, env, resolved, errors);
            }
        }
        Statement::Output { args, .. } => {
            for a in args {
                walk_expr(a, env, resolved, errors);
            }
        }
        Statement::Dispatch { target, args, .. } => {
            walk_expr(target, env, resolved, errors);
            for a in args {
                walk_expr(a, env, resolved, errors);
            }
        }
        Statement::Block(b) => {
            let mut inner = env.child();
            walk_block(b, &mut inner, variants, resolved, errors);
        }
        Statement::WithBlock { target, body, .. } => {
            walk_expr(target, env, resolved, errors);
            let mut inner = env.child();
            walk_block(body, &mut inner, variants, resolved, errors);
        }
        _ => {}
    }
}

fn walk_block(
    block: &Block,
    env: &mut TypeEnv,
    variants: &VariantIndex,
    resolved: &mut HashMap<Position, ResolvedType>,
    errors: &mut Vec<Diagnostic>,
) {
    for node in &block.statements {
        walk_statement(&node.stmt, env, variants, resolved, errors);
    }
}

fn walk_expr(
    expr: &Expression,
    env: &TypeEnv,
    resolved: &mut HashMap<Position, ResolvedType>,
    errors: &mut Vec<Diagnostic>,
) {
    match expr {
        Expression::Call { callee, args, .. } => {
            if let Expression::Member { object, .. } = callee.as_ref() {
                tag_receiver(object, env, resolved);
            }
            walk_expr(callee, env, resolved, errors);
            for a in args {
                let e = match a {
                    Param::Positional(e) => e,
                    Param::Named { value, .. } => value,
                };
                walk_expr(e, env, resolved, errors);
            }
        }
        Expression::Member { object, .. } | Expression::Index { object, .. } => {
            walk_expr(object, env, resolved, errors);
        }
        Expression::Unary { operand, .. } => walk_expr(operand, env, resolved, errors),
        Expression::Binary { left, right, .. } | Expression::Range { start: left, end: right, .. } => {
            walk_expr(left, env, resolved, errors);
            walk_expr(right, env, resolved, errors);
        }
        Expression::Ternary { condition, if_true, if_false, .. } => {
            walk_expr(condition, env, resolved, errors);
            walk_expr(if_true, env, resolved, errors);
            walk_expr(if_false, env, resolved, errors);
        }
        Expression::ArrayLiteral { elements, .. } => {
            for e in elements {
                walk_expr(e, env, resolved, errors);
            }
        }
        Expression::ObjectLiteral { fields, .. } => {
            for (_, v) in fields {
                walk_expr(v, env, resolved, errors);
            }
        }
        Expression::Assign { target, value, .. } => {
            walk_expr(target, env, resolved, errors);
            walk_expr(value, env, resolved, errors);
        }
        Expression::Cast { expr, .. } | Expression::TypeCheck { expr, .. } => walk_expr(expr, env, resolved, errors),
        Expression::Conversion { expr, fallback, .. } => {
            walk_expr(expr, env, resolved, errors);
            if let Some(f) = fallback {
                walk_expr(f, env, resolved, errors);
            }
        }
        Expression::Pipeline { source, .. } => walk_expr(source, env, resolved, errors),
        Expression::FormatString { parts, .. } => {
            for p in parts {
                if let FormatPart::Expr(e) = p {
                    walk_expr(e, env, resolved, errors);
                }
            }
        }
        Expression::Regex { body, position, .. } => {
            if let Err(err) = regex::Regex::new(body) {
                errors.push(Diagnostic::new(
                    Phase::Semantic,
                    format!("regex literal does not parse as a valid pattern ({err}); targets may still accept it under their own engine's grammar"),
                    *position,
                ));
            }
        }
        _ => {}
    }
}

fn tag_receiver(object: &Expression, env: &TypeEnv, resolved: &mut HashMap<Position, ResolvedType>) {
    if let Expression::Identifier { name, position } = object {
        let ty = env.lookup(name).map(ResolvedType::Named).unwrap_or(ResolvedType::Unknown);
        resolved.insert(*position, ty);
    }
}

/// Extracts a plain collection/type name from declared type syntax, looking
/// through ownership prefixes; generic parameters and nullability are not
/// needed for receiver tagging (spec.md §4.5 "Type tagging").
fn type_name(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named { name, .. } => Some(name.clone()),
        TypeRef::Owned { inner, .. } => type_name(inner),
        TypeRef::Array { .. } => Some("lista".to_string()),
        _ => None,
    }
}

fn infer_literal_type(expr: &Expression) -> Option<String> {
    match expr {
        Expression::ArrayLiteral { .. } => Some("lista".to_string()),
        Expression::ObjectLiteral { .. } => Some("tabula".to_string()),
        Expression::Literal { value: Literal::Str(_), .. } => Some("textus".to_string()),
        Expression::Literal { value: Literal::Number { .. }, .. } => Some("numerus".to_string()),
        Expression::Literal { value: Literal::Boolean(_), .. } => Some("logicus".to_string()),
        _ => None,
    }
}

/// Invariant (iii): a variant case's binding arity must match the declared
/// union variant's field count, when the union is known.
fn check_match_case_arity(case: &MatchCase, variants: &VariantIndex, errors: &mut Vec<Diagnostic>) {
    for pattern in &case.patterns {
        let VariantPattern::Positional { variant, bindings, position } = pattern else { continue };
        let Some(arity) = variants.arity_of(variant) else { continue };
        if bindings.len() != arity {
            errors.push(Diagnostic::new(
                Phase::Semantic,
                format!("variant '{variant}' has {arity} field(s) but the pattern binds {}", bindings.len()),
                *position,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    struct NoopLoader;
    impl ModuleLoader for NoopLoader {
        fn load(&mut self, _absolute_path: &Path) -> Option<String> {
            None
        }
    }

    fn resolve_src(src: &str) -> (AnnotatedProgram, Vec<Diagnostic>) {
        let (tokens, _) = tokenize(src);
        let (program, _) = parse(tokens);
        let mut ctx = SemanticContext::new();
        resolve(&mut ctx, program, Path::new("/root/main.fab"), &mut NoopLoader)
    }

    #[test]
    fn tags_stdlib_receiver_with_declared_type() {
        let (annotated, errors) = resolve_src("fixum xs: lista<numerus> = [1, 2]; xs.adde(3);");
        assert!(errors.is_empty());
        assert!(annotated
            .resolved_types
            .values()
            .any(|t| matches!(t, ResolvedType::Named(n) if n == "lista")));
    }

    #[test]
    fn detects_variant_arity_mismatch() {
        let src = "discretio Event { Click { numerus x, numerus y } Quit } \
                   discerne e { casu Click pro x { } casu Quit { } }";
        let (_annotated, errors) = resolve_src(src);
        assert!(errors.iter().any(|d| d.phase == Phase::Semantic));
    }

    #[test]
    fn malformed_regex_literal_is_flagged() {
        let (_annotated, errors) = resolve_src(r#"fixum r = regula/(unterminated-group/;"#);
        assert!(errors.iter().any(|d| d.phase == Phase::Semantic));
    }

    #[test]
    fn well_formed_regex_literal_passes() {
        let (_annotated, errors) = resolve_src(r#"fixum r = regula/[a-z]+/i;"#);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn stdlib_import_needs_no_loader() {
        let (_annotated, errors) = resolve_src("importa { radix } ex \"mathematica\";");
        assert!(errors.is_empty());
    }
}
