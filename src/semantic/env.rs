//! A small scoped type environment for receiver tagging. Declared types and
//! literal-inferred types only — no constraint solving (spec.md §4.5).

use std::collections::HashMap;

/// A stack of scopes rather than a parent-linked borrow chain, so callers can
/// push/pop freely without fighting self-referential lifetimes.
pub struct TypeEnv {
    scopes: Vec<HashMap<String, Option<String>>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    /// Pushes a child scope and returns a guard that pops it on drop.
    pub fn child(&mut self) -> ScopeGuard<'_> {
        self.scopes.push(HashMap::new());
        ScopeGuard { env: self }
    }

    pub fn bind(&mut self, name: String, ty: Option<String>) {
        self.scopes.last_mut().expect("at least one scope").insert(name, ty);
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return ty.clone();
            }
        }
        None
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ScopeGuard<'e> {
    env: &'e mut TypeEnv,
}

impl std::ops::Deref for ScopeGuard<'_> {
    type Target = TypeEnv;
    fn deref(&self) -> &TypeEnv {
        self.env
    }
}

impl std::ops::DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut TypeEnv {
        self.env
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.env.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let mut env = TypeEnv::new();
        env.bind("xs".to_string(), Some("lista".to_string()));
        let mut child = env.child();
        child.bind("y".to_string(), None);
        assert_eq!(child.lookup("xs"), Some("lista".to_string()));
    }

    #[test]
    fn shadowing_in_child_does_not_leak_to_parent_after_drop() {
        let mut env = TypeEnv::new();
        env.bind("x".to_string(), Some("textus".to_string()));
        {
            let mut child = env.child();
            child.bind("x".to_string(), Some("numerus".to_string()));
            assert_eq!(child.lookup("x"), Some("numerus".to_string()));
        }
        assert_eq!(env.lookup("x"), Some("textus".to_string()));
    }
}
