//! Thin CLI driver around the faber compiler core. Everything that touches a
//! filesystem or a clock lives here; `faber` itself stays pure (spec.md §1).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;

use faber::diagnostics::{Diagnostic, Phase};
use faber::norma::Target;
use faber::semantic::ModuleLoader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile faber source to TypeScript, Python, or C++")]
#[command(propagate_version = true)]
struct Cli {
    /// The path to the faber source file.
    #[arg(index = 1)]
    file: PathBuf,

    /// The target language to emit.
    #[arg(value_enum, short, long)]
    target: CliTarget,

    /// Number of spaces per indentation level.
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Write generated source to this path instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit diagnostics as a JSON array instead of human-readable lines.
    #[arg(long)]
    emit_json: bool,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    verbosity: LogLevel,

    /// List every collection.method the norma registry knows about and exit.
    #[arg(long)]
    describe_norma: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliTarget {
    Typescript,
    Python,
    Cpp,
}

impl From<CliTarget> for Target {
    fn from(value: CliTarget) -> Self {
        match value {
            CliTarget::Typescript => Target::TypeScript,
            CliTarget::Python => Target::Python,
            CliTarget::Cpp => Target::Cpp,
        }
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Loads module sources straight off disk, relative to whatever absolute
/// path each import already carries (spec.md §4.5 leaves path normalization
/// up to the core; this only supplies bytes).
struct FsLoader;

impl ModuleLoader for FsLoader {
    fn load(&mut self, absolute_path: &Path) -> Option<String> {
        fs::read_to_string(absolute_path).ok()
    }
}

fn phase_label(phase: Phase) -> colored::ColoredString {
    match phase {
        Phase::Lexical => "lexical".red(),
        Phase::Syntactic => "syntax".red(),
        Phase::Morphological => "morphology".yellow(),
        Phase::Semantic => "semantic".yellow(),
        Phase::Emission => "emission".yellow(),
    }
}

fn print_diagnostics(file: &str, diagnostics: &[Diagnostic], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(diagnostics)?);
        return Ok(());
    }
    for d in diagnostics {
        eprintln!("[{}] {}", phase_label(d.phase), d.render(file).bold());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level((&cli.verbosity).into()).ok();

    if cli.describe_norma {
        for line in faber::norma::describe() {
            println!("{line}");
        }
        return Ok(());
    }

    let absolute_path = cli
        .file
        .canonicalize()
        .with_context(|| format!("could not find source file '{}'", cli.file.display()))?;
    let source = fs::read_to_string(&absolute_path)
        .with_context(|| format!("could not read '{}'", absolute_path.display()))?;
    let file_label = cli.file.to_string_lossy().to_string();

    info!("tokenizing {file_label}");
    let (tokens, lex_errors) = faber::tokenize(&source);

    info!("parsing {file_label}");
    let (program, parse_errors) = faber::parse(tokens);

    info!("resolving modules for {file_label}");
    let mut ctx = faber::SemanticContext::new();
    let mut loader = FsLoader;
    let (annotated, sem_errors) = faber::resolve(&mut ctx, program, &absolute_path, &mut loader);

    let target: Target = cli.target.into();
    info!("generating {target:?} output for {file_label}");
    let (generated, _features, emit_errors) = faber::generate(target, &annotated, cli.indent, &absolute_path);

    let mut diagnostics = vec![];
    diagnostics.extend(lex_errors);
    diagnostics.extend(parse_errors);
    diagnostics.extend(sem_errors);
    diagnostics.extend(emit_errors);
    faber::diagnostics::sort_diagnostics(&mut diagnostics);

    if !diagnostics.is_empty() {
        print_diagnostics(&file_label, &diagnostics, cli.emit_json)?;
    }

    match cli.output {
        Some(path) => fs::write(&path, generated)
            .with_context(|| format!("could not write '{}'", path.display()))?,
        None => println!("{generated}"),
    }

    Ok(())
}
