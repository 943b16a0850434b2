//! Source-text supplier for module resolution. File I/O itself is out of
//! scope for the core (spec.md §1); the driver implements this trait.

use std::path::Path;

pub trait ModuleLoader {
    fn load(&mut self, absolute_path: &Path) -> Option<String>;
}

/// A loader backed by an in-memory map, used by tests and by the `fab`
/// round-trip emitter's self-contained fixtures.
pub struct InMemoryLoader {
    files: std::collections::HashMap<std::path::PathBuf, String>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self { files: std::collections::HashMap::new() }
    }

    pub fn with_file(mut self, path: impl Into<std::path::PathBuf>, source: impl Into<String>) -> Self {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl Default for InMemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for InMemoryLoader {
    fn load(&mut self, absolute_path: &Path) -> Option<String> {
        self.files.get(absolute_path).cloned()
    }
}
