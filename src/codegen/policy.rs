//! Per-target leaf policy: the small set of token choices that differ across
//! TypeScript/Python/C++ (spec.md §4.6 "Per-target policies"). Kept as pure
//! functions over `Target` rather than one file per target, so the control
//! flow in `codegen::emit_statement`/`emit_expression` stays a single
//! exhaustive match instead of being copied three times.

use crate::ast::{BinaryOp, OutputKind, UnaryOp};
use crate::norma::Target;

pub fn type_name(target: Target, builtin: &str) -> String {
    match (target, builtin) {
        (Target::TypeScript, "textus") => "string",
        (Target::TypeScript, "numerus") => "number",
        (Target::TypeScript, "logicus") => "boolean",
        (Target::TypeScript, "nihil") => "void",
        (Target::Python, "textus") => "str",
        (Target::Python, "numerus") => "float",
        (Target::Python, "logicus") => "bool",
        (Target::Python, "nihil") => "None",
        (Target::Cpp, "textus") => "std::string",
        (Target::Cpp, "numerus") => "double",
        (Target::Cpp, "logicus") => "bool",
        (Target::Cpp, "nihil") => "void",
        (_, other) => other,
    }
    .to_string()
}

pub fn collection_type(target: Target, name: &str, element: &str) -> String {
    match (target, name) {
        (Target::TypeScript, "lista") => format!("{element}[]"),
        (Target::TypeScript, "tabula") => format!("Map<string, {element}>"),
        (Target::TypeScript, "copia") => format!("Set<{element}>"),
        (Target::Python, "lista") => format!("list[{element}]"),
        (Target::Python, "tabula") => format!("dict[str, {element}]"),
        (Target::Python, "copia") => format!("set[{element}]"),
        (Target::Cpp, "lista") => format!("std::vector<{element}>"),
        (Target::Cpp, "tabula") => format!("std::map<std::string, {element}>"),
        (Target::Cpp, "copia") => format!("std::set<{element}>"),
        _ => element.to_string(),
    }
}

pub fn null_literal(target: Target) -> &'static str {
    match target {
        Target::TypeScript => "null",
        Target::Python => "None",
        Target::Cpp => "nullptr",
    }
}

pub fn self_name(target: Target) -> &'static str {
    match target {
        Target::TypeScript | Target::Cpp => "this",
        Target::Python => "self",
    }
}

pub fn bool_literal(target: Target, value: bool) -> &'static str {
    match (target, value) {
        (Target::Python, true) => "True",
        (Target::Python, false) => "False",
        (_, true) => "true",
        (_, false) => "false",
    }
}

pub fn statement_terminator(target: Target) -> &'static str {
    match target {
        Target::TypeScript | Target::Cpp => ";",
        Target::Python => "",
    }
}

pub fn binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::LtEq => "<=",
        BinaryOp::GtEq => ">=",
        BinaryOp::LogicalAnd => "&&",
        BinaryOp::LogicalOr => "||",
        BinaryOp::NullishCoalesce => "??",
    }
}

pub fn binary_op_py(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::LogicalAnd => "and",
        BinaryOp::LogicalOr => "or",
        BinaryOp::NullishCoalesce => "or",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        other => binary_op(other),
    }
}

pub fn binary_op_for(target: Target, op: BinaryOp) -> &'static str {
    match target {
        Target::Python => binary_op_py(op),
        _ => binary_op(op),
    }
}

pub fn unary_op_prefix(target: Target, op: UnaryOp) -> &'static str {
    match (target, op) {
        (Target::Python, UnaryOp::Not) => "not ",
        (_, UnaryOp::Not) => "!",
        (_, UnaryOp::SignNegative) => "-",
        (_, UnaryOp::SignPositive) => "+",
        (_, UnaryOp::Await) => "await ",
        (_, UnaryOp::Empty | UnaryOp::NullCheck) => "",
    }
}

/// Expands `object?.property` per target (spec.md §4.6 "Optional chaining").
/// TS keeps the native operator; Python and C++ need a full expression swap
/// at the call site, so this only covers the member-access fragment itself —
/// callers building a call expression rebuild the conditional around it.
pub fn optional_member(target: Target, object: &str, property: &str) -> String {
    match target {
        Target::TypeScript => format!("{object}?.{property}"),
        Target::Python => format!("({object}.{property} if {object} is not None else None)"),
        Target::Cpp => format!("{object}->{property}"),
    }
}

pub fn print_call(target: Target, kind: OutputKind, args: &[String]) -> String {
    let joined = args.join(", ");
    match (target, kind) {
        (Target::TypeScript, OutputKind::Write) => format!("console.log({joined})"),
        (Target::TypeScript, OutputKind::Debug) => format!("console.debug({joined})"),
        (Target::TypeScript, OutputKind::Warn) => format!("console.warn({joined})"),
        (Target::Python, OutputKind::Write) => format!("print({joined})"),
        (Target::Python, OutputKind::Debug) => format!("print({joined}, file=sys.stderr)"),
        (Target::Python, OutputKind::Warn) => format!("warnings.warn({joined})"),
        (Target::Cpp, OutputKind::Write) => format!("std::println({joined})"),
        (Target::Cpp, OutputKind::Debug) => format!("std::println(stderr, {joined})"),
        (Target::Cpp, OutputKind::Warn) => format!("std::println(stderr, {joined})"),
    }
}

/// The identifier a `@ innatum`/`@ subsidia`/`@ verte` annotation uses to
/// name this target (spec.md §6's `<t>` placeholder).
pub fn annotation_target_name(target: Target) -> &'static str {
    match target {
        Target::TypeScript => "typescript",
        Target::Python => "python",
        Target::Cpp => "cpp",
    }
}

/// `@ publicum`/`@ privatum`/`@ protectum` on a function only change
/// TypeScript's `export` keyword and C++'s `static` (internal-linkage)
/// keyword — Python has no enforced visibility level that doesn't also
/// require renaming every call site, which this generator's single-pass,
/// non-mangling identifier printing does not attempt (spec.md §6).
pub fn fn_visibility_prefix(target: Target, visibility: Option<crate::ast::Visibility>) -> &'static str {
    use crate::ast::Visibility;
    match (target, visibility) {
        (Target::TypeScript, Some(Visibility::Public)) => "export ",
        (Target::Cpp, Some(Visibility::Private) | Some(Visibility::Protected)) => "static ",
        _ => "",
    }
}

/// Same idea for a `genus` declaration, minus C++'s `static`: there is no
/// internal-linkage equivalent for a free-standing struct type the way
/// there is for a function.
pub fn struct_visibility_prefix(target: Target, visibility: Option<crate::ast::Visibility>) -> &'static str {
    use crate::ast::Visibility;
    match (target, visibility) {
        (Target::TypeScript, Some(Visibility::Public)) => "export ",
        _ => "",
    }
}

pub fn comment_prefix(target: Target) -> &'static str {
    match target {
        Target::Python => "#",
        _ => "//",
    }
}

pub fn block_comment(target: Target, body: &str) -> String {
    match target {
        Target::Python => body.lines().map(|l| format!("# {l}")).collect::<Vec<_>>().join("\n"),
        _ => format!("/* {body} */"),
    }
}
