//! Statements. See spec.md §3 "Statements".

use crate::ast::{Block, Expression, TypeRef, VariantPattern};
use crate::token::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// Payloads for `@ ...` annotations. See spec.md §6 "Annotations that affect emission".
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Visibility(Visibility),
    Abstract,
    Static,
    /// `@ innatum <t> "X", ...`
    NativeName(Vec<(String, String)>),
    /// `@ subsidia <t> "path"`
    HalImpl(Vec<(String, String)>),
    /// `@ radix stem, form, ...`
    Radix { stem: String, forms: Vec<String> },
    /// `@ verte <t> "m"` or `<t> (params) -> "tmpl"`
    Verte(Vec<VerteEntry>),
    /// `@ optio ...`
    CliOption(CliOption),
    /// `@ operandus ...`
    CliOperand(CliOperand),
    /// `@ cli`
    Cli,
    /// Anything not in the closed set above; preserved, ignored semantically.
    Unknown { name: String, raw_args: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerteEntry {
    pub target: String,
    pub rename: Option<String>,
    pub template_params: Vec<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOption {
    pub ty: TypeRef,
    pub binding: String,
    pub short: Option<String>,
    pub long: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOperand {
    pub variadic: bool,
    pub ty: TypeRef,
    pub name: String,
    pub default: Option<Expression>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorKind {
    Arena,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Write,
    Debug,
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Block),
    If(Box<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub patterns: Vec<VariantPattern>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpec {
    /// Invariant (v): exposes a specifier list or a wildcard, never both.
    List(Vec<(String, Option<String>)>),
    Wildcard(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliSpec {
    pub options: Vec<CliOption>,
    pub operands: Vec<CliOperand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import {
        spec: ImportSpec,
        source: String,
        position: Position,
    },
    VarDecl {
        mutable: bool,
        name: String,
        ty: Option<TypeRef>,
        value: Option<Expression>,
        position: Position,
    },
    FnDecl {
        name: String,
        params: Vec<Param>,
        ret: Option<TypeRef>,
        body: Block,
        is_async: bool,
        annotations: Vec<Annotation>,
        position: Position,
    },
    StructDecl {
        name: String,
        fields: Vec<Field>,
        annotations: Vec<Annotation>,
        position: Position,
    },
    InterfaceDecl {
        name: String,
        methods: Vec<MethodSig>,
        position: Position,
    },
    EnumDecl {
        name: String,
        variants: Vec<String>,
        position: Position,
    },
    UnionDecl {
        name: String,
        variants: Vec<VariantDef>,
        position: Position,
    },
    TypeAlias {
        name: String,
        ty: TypeRef,
        position: Position,
    },
    If {
        condition: Expression,
        then_block: Block,
        else_branch: Option<ElseBranch>,
        position: Position,
    },
    While {
        condition: Expression,
        body: Block,
        position: Position,
    },
    DoWhile {
        body: Block,
        condition: Expression,
        position: Position,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<(Expression, Block)>,
        default: Option<Block>,
        position: Position,
    },
    Match {
        discriminants: Vec<Expression>,
        cases: Vec<MatchCase>,
        position: Position,
    },
    ForOf {
        binding_mutable: bool,
        binding: String,
        source: Expression,
        is_async: bool,
        dsl: Vec<crate::ast::DslVerb>,
        body: Block,
        position: Position,
    },
    ForIn {
        binding_mutable: bool,
        binding: String,
        source: Expression,
        is_async: bool,
        body: Block,
        position: Position,
    },
    ForRange {
        binding_mutable: bool,
        binding: String,
        start: Expression,
        end: Expression,
        inclusive: bool,
        step: Option<Expression>,
        body: Block,
        position: Position,
    },
    WithBlock {
        target: Expression,
        body: Block,
        position: Position,
    },
    TryCatch {
        try_block: Block,
        catch: Option<(Option<String>, Block)>,
        finally: Option<Block>,
        position: Position,
    },
    Throw {
        expr: Expression,
        position: Position,
    },
    Panic {
        expr: Expression,
        position: Position,
    },
    Return {
        expr: Option<Expression>,
        position: Position,
    },
    Break {
        position: Position,
    },
    Continue {
        position: Position,
    },
    Guard {
        condition: Expression,
        else_block: Block,
        position: Position,
    },
    Assertion {
        expr: Expression,
        message: Option<Expression>,
        position: Position,
    },
    Output {
        kind: OutputKind,
        args: Vec<Expression>,
        position: Position,
    },
    Block(Block),
    Expression {
        expr: Expression,
        position: Position,
    },
    EntryPoint {
        is_async: bool,
        body: Block,
        cli: Option<CliSpec>,
        position: Position,
    },
    TestSuite {
        name: String,
        body: Vec<crate::ast::StmtNode>,
        position: Position,
    },
    TestCase {
        name: String,
        body: Block,
        position: Position,
    },
    Setup {
        body: Block,
        position: Position,
    },
    Teardown {
        body: Block,
        position: Position,
    },
    ResourceScope {
        acquire: Expression,
        binding: String,
        allocator: Option<AllocatorKind>,
        body: Block,
        position: Position,
    },
    Dispatch {
        target: Expression,
        args: Vec<Expression>,
        position: Position,
    },
}

impl Statement {
    pub fn position(&self) -> Position {
        use Statement::*;
        match self {
            Import { position, .. }
            | VarDecl { position, .. }
            | FnDecl { position, .. }
            | StructDecl { position, .. }
            | InterfaceDecl { position, .. }
            | EnumDecl { position, .. }
            | UnionDecl { position, .. }
            | TypeAlias { position, .. }
            | If { position, .. }
            | While { position, .. }
            | DoWhile { position, .. }
            | Switch { position, .. }
            | Match { position, .. }
            | ForOf { position, .. }
            | ForIn { position, .. }
            | ForRange { position, .. }
            | WithBlock { position, .. }
            | TryCatch { position, .. }
            | Throw { position, .. }
            | Panic { position, .. }
            | Return { position, .. }
            | Break { position }
            | Continue { position }
            | Guard { position, .. }
            | Assertion { position, .. }
            | Output { position, .. }
            | Expression { position, .. }
            | EntryPoint { position, .. }
            | TestSuite { position, .. }
            | TestCase { position, .. }
            | Setup { position, .. }
            | Teardown { position, .. }
            | ResourceScope { position, .. }
            | Dispatch { position, .. } => *position,
            Block(b) => b.position,
        }
    }
}
