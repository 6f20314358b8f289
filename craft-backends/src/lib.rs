//! Multi-target lowering for ParserCraft ASTs
//!
//!     This crate provides a uniform interface for lowering the AST produced
//!     by the grammar engine into different target forms (a runnable
//!     high-level script form, ANSI C, WebAssembly text, LLVM IR).
//!
//! Architecture
//!
//!     - Backend trait: the single-method contract every target implements
//!     - BackendRegistry: discovery and by-name selection of backends
//!     - shape: the node-shape recognition rules every backend shares
//!     - backends/<target>: one module per concrete backend
//!
//!     This is a pure lib: it powers the CLI but is shell agnostic. Backends
//!     are plain structs carrying only formatting options; translation is a
//!     pure function over the input AST. Adding a target means implementing
//!     Backend and the shared recognition rules, and registering it; no
//!     change to the AST, the grammar engine, or other backends.
//!
//!     Backends never fail on unknown node types (they recurse into the
//!     children); they fail only on malformed known nodes, with a
//!     [`BackendError`] naming the backend.

pub mod backend;
pub mod backends;
pub mod error;
pub mod registry;
mod shape;

pub use backend::Backend;
pub use backends::c::CBackend;
pub use backends::llvm::LlvmBackend;
pub use backends::script::{Bindings, ScriptBackend, TranspileOptions, Value};
pub use backends::wat::WatBackend;
pub use error::BackendError;
pub use registry::BackendRegistry;
