//! Error types for the grammar engine.
//!
//! Two kinds of failure can come out of this crate, and both are plain
//! values: [`GrammarError`] for problems in the grammar itself (bad PEG
//! notation, undefined references, left recursion) and [`SourceError`] for a
//! source program that the grammar does not accept. Backends have their own
//! error kind in the backends crate.

use std::fmt;

/// A problem in the grammar: malformed PEG notation or a validation failure
/// at build time. Positions are 1-based and refer to the grammar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl GrammarError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grammar error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for GrammarError {}

/// A source program the grammar does not accept.
///
/// `line` and `column` (1-based) locate the furthest byte offset the parse
/// ever reached (`furthest`), and `rule` names the deepest rule attempted
/// there. Ties between rules at the same position go to the last one tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub line: usize,
    pub column: usize,
    pub furthest: usize,
    pub rule: String,
    pub message: String,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {} (in rule '{}'): {}",
            self.line, self.column, self.rule, self.message
        )
    }
}

impl std::error::Error for SourceError {}
