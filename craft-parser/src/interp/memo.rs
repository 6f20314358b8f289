//! The packrat memo table.
//!
//! Cells are keyed by `(RuleId, byte position at invocation)`. Besides the
//! cached outcome, every cell records the exclusive upper bound of source
//! bytes its computation examined; the incremental parser uses that extent
//! to decide which cells survive an edit.

use std::collections::HashMap;

use crate::ast::AstNode;
use crate::peg::grammar::RuleId;

#[derive(Debug, Clone)]
pub(crate) enum Cached {
    Failure,
    Success { node: AstNode, end: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct MemoCell {
    pub result: Cached,
    pub extent: usize,
}

/// Memoization table for one parse, or for the lifetime of an incremental
/// parser.
#[derive(Debug, Clone, Default)]
pub struct MemoTable {
    cells: HashMap<(RuleId, usize), MemoCell>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Drop every cell whose computation examined bytes at or beyond
    /// `cutoff`; the survivors were computed entirely from the untouched
    /// prefix and stay valid verbatim. Returns how many cells survived.
    pub(crate) fn retain_prefix(&mut self, cutoff: usize) -> usize {
        self.cells.retain(|_, cell| cell.extent <= cutoff);
        self.cells.len()
    }

    pub(crate) fn get(&self, id: RuleId, pos: usize) -> Option<&MemoCell> {
        self.cells.get(&(id, pos))
    }

    pub(crate) fn insert(&mut self, id: RuleId, pos: usize, cell: MemoCell) {
        self.cells.insert((id, pos), cell);
    }
}
