//! AST definitions and source-position utilities.
//!
//! The interpreter produces a tree of [`AstNode`]s. Nodes carry a stable
//! surface for external consumers: node type string, optional value,
//! children, 1-based line/column, and the matched span. [`SourceMap`]
//! provides the byte-offset to line/column conversion used when nodes and
//! errors are constructed.

pub mod node;
pub mod source_map;

pub use node::{AstNode, NodeKind};
pub use source_map::{Position, SourceMap};
