//! Incremental parsing for editor-style workloads.
//!
//! [`IncrementalParser`] owns a `(grammar, source, ast, memo)` quadruple.
//! `parse` replaces all of it; [`IncrementalParser::apply_edit`] splices a
//! byte range of the source and re-parses while keeping every memo cell
//! whose computation never looked at or past the edit point. Cells record
//! the byte extent they examined while being computed, so retention is a
//! single predicate: `extent <= edit start`. Cells keyed before the edit
//! whose evaluation scanned into the edited region are discarded; a stale
//! failure there could otherwise mask a now-valid match.
//!
//! The AST after any sequence of edits is identical to a full parse of the
//! final text. On an edit that makes the source unparseable, the previous
//! successful AST is kept and the error is surfaced.

use crate::ast::AstNode;
use crate::error::SourceError;
use crate::interp::{Interpreter, MemoTable};
use crate::peg::grammar::Grammar;

/// Counters describing how much work incrementality saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Full and incremental parses performed so far.
    pub total_parses: usize,
    /// Memo cells carried across the most recent edit.
    pub reused_cells: usize,
}

/// A parser that keeps its state alive between parses.
#[derive(Debug)]
pub struct IncrementalParser {
    grammar: Grammar,
    source: String,
    ast: Option<AstNode>,
    memo: MemoTable,
    stats: ParseStats,
}

impl IncrementalParser {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            source: String::new(),
            ast: None,
            memo: MemoTable::new(),
            stats: ParseStats::default(),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The current source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The most recent successful AST, if any.
    pub fn ast(&self) -> Option<&AstNode> {
        self.ast.as_ref()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Number of live memo cells.
    pub fn memo_size(&self) -> usize {
        self.memo.len()
    }

    /// Full parse: replaces source, AST and memo.
    pub fn parse(&mut self, source: &str) -> Result<&AstNode, SourceError> {
        self.source.clear();
        self.source.push_str(source);
        self.memo.clear();
        self.stats.reused_cells = 0;
        self.reparse()
    }

    /// Replace the byte range `[start, end)` of the current source with
    /// `new_text` and re-parse, reusing memo cells from the untouched
    /// prefix.
    ///
    /// The range must lie within the source and on character boundaries.
    pub fn apply_edit(
        &mut self,
        start: usize,
        end: usize,
        new_text: &str,
    ) -> Result<&AstNode, SourceError> {
        assert!(
            start <= end && end <= self.source.len(),
            "edit range {start}..{end} out of bounds for source of length {}",
            self.source.len()
        );
        self.source.replace_range(start..end, new_text);
        self.stats.reused_cells = self.memo.retain_prefix(start);
        self.reparse()
    }

    /// Drop all memo state, forcing the next parse to start cold.
    pub fn invalidate(&mut self) {
        self.memo.clear();
    }

    /// Reset to a freshly constructed parser.
    pub fn reset(&mut self) {
        self.source.clear();
        self.ast = None;
        self.memo.clear();
        self.stats = ParseStats::default();
    }

    fn reparse(&mut self) -> Result<&AstNode, SourceError> {
        self.stats.total_parses += 1;
        let interpreter = Interpreter::new(&self.grammar);
        match interpreter.parse_with_memo(&self.source, &mut self.memo) {
            Ok(node) => Ok(&*self.ast.insert(node)),
            Err(err) => Err(err),
        }
    }
}
