//! Module cache, cycle detection, and export extraction. See spec.md §4.5
//! "Module resolution" and "Cycle policy".

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::ast::{Program, Statement};
use crate::diagnostics::Diagnostic;
use crate::token::Position;

use super::loader::ModuleLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Function,
    Struct,
    Interface,
    Enum,
    Union,
    TypeAlias,
    Value,
}

pub type ExportMap = HashMap<String, ExportKind>;

/// `union type name -> variant name -> declared field arity`.
#[derive(Debug, Default, Clone)]
pub struct VariantIndex {
    arities: HashMap<String, usize>,
}

impl VariantIndex {
    pub fn arity_of(&self, variant: &str) -> Option<usize> {
        self.arities.get(variant).copied()
    }
}

pub fn variant_index(program: &Program) -> VariantIndex {
    let mut arities = HashMap::new();
    for node in &program.body {
        if let Statement::UnionDecl { variants, .. } = &node.stmt {
            for v in variants {
                arities.insert(v.name.clone(), v.fields.len());
            }
        }
    }
    VariantIndex { arities }
}

pub fn export_map(program: &Program) -> ExportMap {
    let mut exports = ExportMap::new();
    for node in &program.body {
        match &node.stmt {
            Statement::FnDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Function);
            }
            Statement::StructDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Struct);
            }
            Statement::InterfaceDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Interface);
            }
            Statement::EnumDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Enum);
            }
            Statement::UnionDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Union);
            }
            Statement::TypeAlias { name, .. } => {
                exports.insert(name.clone(), ExportKind::TypeAlias);
            }
            Statement::VarDecl { name, .. } => {
                exports.insert(name.clone(), ExportKind::Value);
            }
            _ => {}
        }
    }
    exports
}

/// Joins `source` against the directory containing `from`, appending `.fab`
/// when the source carries no extension (spec.md §4.5 "Module resolution").
pub fn normalize_import_path(from: &Path, source: &str) -> PathBuf {
    let base = from.parent().unwrap_or_else(|| Path::new("."));
    let mut joined = base.join(source);
    if joined.extension().is_none() {
        joined.set_extension("fab");
    }
    joined
}

#[derive(Clone)]
struct CachedModule {
    exports: ExportMap,
}

pub struct ModuleTable {
    cache: HashMap<PathBuf, CachedModule>,
    in_progress: HashSet<PathBuf>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self { cache: HashMap::new(), in_progress: HashSet::new() }
    }

    /// Resolves `path`, recursively parsing and caching on first visit.
    /// Matches spec.md §4.5's cycle policy: a cyclic edge returns an empty
    /// export map rather than failing the compile.
    pub fn resolve(
        &mut self,
        path: &Path,
        loader: &mut dyn ModuleLoader,
        _at: Position,
        errors: &mut Vec<Diagnostic>,
    ) -> ExportMap {
        if let Some(cached) = self.cache.get(path) {
            return cached.exports.clone();
        }
        if self.in_progress.contains(path) {
            return ExportMap::new();
        }

        let Some(source) = loader.load(path) else {
            // Out of scope here whether a missing file is an error; the
            // driver surfaces filesystem errors. The core records an empty
            // export map and moves on.
            self.cache.insert(path.to_path_buf(), CachedModule { exports: ExportMap::new() });
            return ExportMap::new();
        };

        self.in_progress.insert(path.to_path_buf());
        let (tokens, _lex_errors) = crate::lexer::tokenize(&source);
        let (program, _parse_errors) = crate::parser::parse(tokens);

        for node in &program.body {
            if let Statement::Import { source: inner_source, position, .. } = &node.stmt {
                if crate::norma::is_stdlib_namespace(inner_source) {
                    continue;
                }
                if !inner_source.starts_with("./") && !inner_source.starts_with("../") {
                    continue;
                }
                let inner_path = normalize_import_path(path, inner_source);
                self.resolve(&inner_path, loader, *position, errors);
            }
        }

        let exports = export_map(&program);
        self.in_progress.remove(path);
        self.cache.insert(path.to_path_buf(), CachedModule { exports: exports.clone() });
        exports
    }
}

impl Default for ModuleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::loader::InMemoryLoader;

    #[test]
    fn repeated_resolution_is_stable() {
        let mut table = ModuleTable::new();
        let mut loader = InMemoryLoader::new().with_file("/p/a.fab", "functio f(): numerus { reddit 1; }");
        let pos = Position::start();
        let first = table.resolve(Path::new("/p/a.fab"), &mut loader, pos, &mut vec![]);
        let second = table.resolve(Path::new("/p/a.fab"), &mut loader, pos, &mut vec![]);
        assert_eq!(first, second);
        assert!(first.contains_key("f"));
    }

    #[test]
    fn cyclic_import_returns_empty_map_without_failing() {
        let mut table = ModuleTable::new();
        let mut loader = InMemoryLoader::new()
            .with_file("/p/a.fab", "importa { b } ex \"./b.fab\";")
            .with_file("/p/b.fab", "importa { a } ex \"./a.fab\";");
        let pos = Position::start();
        let exports = table.resolve(Path::new("/p/a.fab"), &mut loader, pos, &mut vec![]);
        assert!(exports.is_empty());
    }
}
