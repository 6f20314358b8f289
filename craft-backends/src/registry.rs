//! Backend registry for discovery and by-name selection.

use std::collections::HashMap;

use craft_parser::AstNode;

use crate::backend::Backend;
use crate::error::BackendError;

/// Registry of lowering backends, selectable by name.
///
/// ```
/// use craft_backends::BackendRegistry;
///
/// let registry = BackendRegistry::with_defaults();
/// assert!(registry.has("c"));
/// assert!(registry.has("wat"));
/// ```
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BackendRegistry {
            backends: HashMap::new(),
        }
    }

    /// Create a registry with the four standard backends registered under
    /// their default options.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::backends::script::ScriptBackend::new());
        registry.register(crate::backends::c::CBackend);
        registry.register(crate::backends::wat::WatBackend);
        registry.register(crate::backends::llvm::LlvmBackend);
        registry
    }

    /// Register a backend; an existing backend with the same name is
    /// replaced.
    pub fn register<B: Backend + 'static>(&mut self, backend: B) {
        self.backends
            .insert(backend.name().to_string(), Box::new(backend));
    }

    /// Get a backend by name.
    pub fn get(&self, name: &str) -> Result<&dyn Backend, BackendError> {
        self.backends
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| BackendError::BackendNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// All registered backend names, sorted.
    pub fn list_backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Translate an AST with the named backend.
    pub fn translate(&self, ast: &AstNode, name: &str) -> Result<String, BackendError> {
        self.get(name)?.translate(ast)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
