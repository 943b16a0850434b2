//! End-to-end pipeline tests: tokenize -> parse -> resolve -> generate,
//! driven purely through the public `faber` API. Mirrors the literal
//! scenarios and invariants this crate is expected to hold end to end.

use std::path::Path;

use pretty_assertions::assert_eq;

use faber::semantic::InMemoryLoader;
use faber::{generate, parse, resolve, tokenize, SemanticContext, Target};

fn compile(src: &str, target: Target) -> (String, Vec<faber::Diagnostic>) {
    let (tokens, mut errors) = tokenize(src);
    let (program, parse_errors) = parse(tokens);
    errors.extend(parse_errors);

    let mut ctx = SemanticContext::new();
    let mut loader = InMemoryLoader::new();
    let (annotated, sem_errors) = resolve(&mut ctx, program, Path::new("/virtual/main.fab"), &mut loader);
    errors.extend(sem_errors);

    let (source, _features, emit_errors) = generate(target, &annotated, 2, Path::new("/virtual/main.fab"));
    errors.extend(emit_errors);
    (source, errors)
}

#[test]
fn scenario_1_stdlib_method_dispatch() {
    let (source, errors) = compile("fixum xs: lista<numerus> = [1, 2, 3]; xs.adde(4);", Target::TypeScript);
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    assert!(source.contains("const xs: number[] = [1, 2, 3];"));
    assert!(source.contains("xs.push(4);"));
}

#[test]
fn scenario_2_morphology_failure_is_reported_and_commented() {
    let (source, errors) = compile("fixum xs: lista<numerus> = [1]; xs.additura(4);", Target::TypeScript);
    assert!(errors.iter().any(|d| d
        .message
        .contains("Morphology form 'futurum_activum' not declared for stem 'add'")));
    assert!(source.contains("MORPHOLOGY"));
}

#[test]
fn scenario_3_discriminated_union_and_match() {
    let src = "discretio Event { Click { numerus x, numerus y } Quit } \
               discerne e { casu Click pro x, y { scribe x; } casu Quit { } }";
    let (source, _errors) = compile(src, Target::TypeScript);
    assert!(source.contains("type Event ="));
    assert!(source.contains("tag: 'Click'"));
    assert!(source.contains("tag: 'Quit'"));
    assert!(source.contains("e.tag === \"Click\""));
}

#[test]
fn scenario_4_range_for_loop() {
    let (source, errors) = compile("ex 0..10 per 2 fixum i { scribe i; }", Target::TypeScript);
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    assert!(source.contains("for (let i = 0; i < 10; i += 2)"));
    assert!(source.contains("console.log(i);"));
}

#[test]
fn scenario_5_optional_chaining_across_targets() {
    let (ts, _) = compile("obj?.method(arg);", Target::TypeScript);
    assert!(ts.contains("obj?.method(arg)"));

    let (py, _) = compile("obj?.method(arg);", Target::Python);
    assert!(py.contains("(obj.method(arg) if obj is not None else None)"));
}

#[test]
fn scenario_6_resource_scope() {
    let (source, _errors) = compile("cura aperi(\"f\") fixum fd { lege(fd); }", Target::TypeScript);
    assert!(source.contains("const fd = aperi(\"f\");"));
    assert!(source.contains("try {"));
    assert!(source.contains("finally"));
    assert!(source.contains("fd.solve?.();"));
}

#[test]
fn scenario_7_regex_literal_and_compile_time_block() {
    let (ts, errors) = compile("scribe \"hi\";", Target::TypeScript);
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    assert_eq!(ts.trim(), "console.log(\"hi\");");

    let (source, errors) = compile("fixum pattern = regula/[a-z]+/i;", Target::Python);
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    assert!(source.contains("re.compile(r\"[a-z]+\")"));

    let (source, errors) = compile("fixum folded = mox { scribe \"noop\"; };", Target::TypeScript);
    assert!(errors.iter().any(|d| d.message.contains("compile-time block")));
    assert!(source.contains("null"));
}

#[test]
fn empty_file_produces_empty_program() {
    let (tokens, errors) = tokenize("");
    assert!(errors.is_empty());
    let (program, parse_errors) = parse(tokens);
    assert!(parse_errors.is_empty());
    assert!(program.body.is_empty());
}

#[test]
fn trailing_eof_comment_is_dropped_not_an_error() {
    let (tokens, lex_errors) = tokenize("fixum x: numerus = 1; // trailing\n");
    assert!(lex_errors.is_empty());
    let (_program, parse_errors) = parse(tokens);
    assert!(parse_errors.is_empty());
}

#[test]
fn tokenize_never_panics_on_garbage_input_and_always_ends_in_eof() {
    let (tokens, _errors) = tokenize("@@@ discretio ((( } } } ;;; fixum");
    assert!(matches!(tokens.last().map(|t| &t.kind), Some(faber::token::TokenKind::Eof)));
}

#[test]
fn parse_is_total_and_recovers_from_garbage() {
    let (tokens, _) = tokenize("@@@ discretio ((( } } } ;;; fixum");
    let (_program, _errors) = parse(tokens);
}

#[test]
fn module_cache_is_stable_across_repeated_resolution() {
    let src = "importa { helper } ex \"./lib.fab\"; functio uses(): nihil { helper(); }";
    let lib_src = "functio helper(): nihil { }";

    let mut ctx = SemanticContext::new();
    let mut loader = InMemoryLoader::new().with_file("/virtual/lib.fab", lib_src);

    let (tokens, _) = tokenize(src);
    let (program, _) = parse(tokens);
    let (first, first_errors) = resolve(&mut ctx, program.clone(), Path::new("/virtual/main.fab"), &mut loader);
    let (second, second_errors) = resolve(&mut ctx, program, Path::new("/virtual/main.fab"), &mut loader);

    assert!(first_errors.is_empty());
    assert!(second_errors.is_empty());
    assert_eq!(first.exports.len(), second.exports.len());
}
