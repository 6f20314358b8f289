//! # craft-parser
//!
//! The grammar engine at the heart of ParserCraft. A language designer writes
//! a grammar in PEG notation, and this crate turns it into a compiled
//! [`Grammar`], matches source programs against it with a packrat
//! interpreter, and produces an [`AstNode`] tree that the backend family can
//! lower to other target forms.
//!
//! Layout
//!
//!     src/peg       Grammar definition side: the PEG expression algebra,
//!                   compiled grammars with build-time validation, the
//!                   fluent builder, and the notation parser.
//!     src/ast       Source-code side: the AST node produced by parsing and
//!                   the byte-offset to line/column machinery.
//!     src/interp    The packrat interpreter (memoized recursive descent)
//!                   and the built-in token matchers.
//!     src/incremental
//!                   A stateful wrapper that keeps grammar, source, AST and
//!                   memo table together across localized edits.
//!
//! The typical flow:
//!
//! ```
//! use craft_parser::{parse_grammar, Interpreter};
//!
//! let grammar = parse_grammar(
//!     "program   <- statement+\n\
//!      statement <- IDENT \"=\" expr \";\"\n\
//!      expr      <- NUMBER",
//!     "tiny",
//! )?;
//! let ast = Interpreter::new(&grammar).parse("x = 1 ;")?;
//! assert_eq!(ast.node_type(), "program");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Everything here is synchronous and single-threaded. Errors are returned
//! as values ([`GrammarError`], [`SourceError`]); nothing is logged and
//! nothing panics on malformed input.

pub mod ast;
pub mod error;
pub mod incremental;
pub mod interp;
pub mod peg;

pub use ast::{AstNode, NodeKind, Position, SourceMap};
pub use error::{GrammarError, SourceError};
pub use incremental::{IncrementalParser, ParseStats};
pub use interp::{Interpreter, MemoTable};
pub use peg::notation::parse_grammar;
pub use peg::{Grammar, GrammarBuilder, PegExpr, Rule};
