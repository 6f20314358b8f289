//! Error type for backend operations.

use std::fmt;

/// Errors surfaced by backends and the registry.
///
/// Translation itself only fails on a malformed known node; unknown node
/// types are recursed into, never rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No backend registered under the requested name.
    BackendNotFound(String),
    /// A known node shape was missing required pieces.
    Malformed { backend: String, message: String },
    /// The script backend's execute path failed to evaluate the emitted
    /// program.
    Execution { backend: String, message: String },
}

impl BackendError {
    pub fn malformed(backend: &str, message: impl Into<String>) -> Self {
        BackendError::Malformed {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    pub fn execution(backend: &str, message: impl Into<String>) -> Self {
        BackendError::Execution {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// The backend this error came from, if any.
    pub fn backend(&self) -> Option<&str> {
        match self {
            BackendError::BackendNotFound(_) => None,
            BackendError::Malformed { backend, .. } | BackendError::Execution { backend, .. } => {
                Some(backend)
            }
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::BackendNotFound(name) => write!(f, "unknown backend '{name}'"),
            BackendError::Malformed { backend, message } => {
                write!(f, "backend '{backend}': malformed node: {message}")
            }
            BackendError::Execution { backend, message } => {
                write!(f, "backend '{backend}': execution failed: {message}")
            }
        }
    }
}

impl std::error::Error for BackendError {}
