//! Backend trait definition.
//!
//! All backends consume an [`AstNode`] tree and produce a target string;
//! they share the single-method contract plus the recognition rules in the
//! `shape` module. Backends carry only their formatting options and no
//! state, so a `translate` call is a pure function of its input.

use craft_parser::AstNode;

use crate::error::BackendError;

/// A lowering target.
pub trait Backend: Send + Sync {
    /// The name this backend registers under (e.g. "c", "wat").
    fn name(&self) -> &str;

    /// Optional human description of the target form.
    fn description(&self) -> &str {
        ""
    }

    /// Walk the AST and emit the target form (UTF-8, LF line endings).
    fn translate(&self, ast: &AstNode) -> Result<String, BackendError>;
}
