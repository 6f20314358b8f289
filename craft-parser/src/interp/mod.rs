//! The packrat interpreter.
//!
//! Recursive-descent PEG evaluation with per-call memoization keyed by
//! `(rule id, byte position)`. With the memo in place each rule is evaluated
//! at most once per position, so a parse is linear in source length for a
//! fixed grammar.
//!
//! Whitespace handling: ASCII whitespace is skipped at rule invocation and
//! by the literal and built-in token matchers; it is never skipped between
//! the items of a sequence beyond that. Every literal matched inside a rule
//! body surfaces as an `Operator` leaf, which is what lets backends
//! recognize assignments and arithmetic structurally.
//!
//! Error reporting tracks the single furthest byte offset reached across
//! the whole parse together with the deepest rule attempted there
//! (last-attempted wins ties); a failed parse reports that position as a
//! 1-based line/column.

pub mod memo;
pub mod tokens;

pub use memo::MemoTable;

use crate::ast::{AstNode, NodeKind, SourceMap};
use crate::error::SourceError;
use crate::peg::expr::PegExpr;
use crate::peg::grammar::{Grammar, TokenKind};

use memo::{Cached, MemoCell};

/// Matches a compiled grammar against source strings.
pub struct Interpreter<'g> {
    grammar: &'g Grammar,
}

impl<'g> Interpreter<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Parse `source`, producing the root node (its type equals the start
    /// rule's name). The memo table is transient and discarded on return.
    pub fn parse(&self, source: &str) -> Result<AstNode, SourceError> {
        let mut memo = MemoTable::new();
        self.parse_with_memo(source, &mut memo)
    }

    /// Parse `source` against a caller-owned memo table. Pre-populated
    /// cells are trusted as-is; the incremental parser uses this to reuse
    /// work across edits.
    pub fn parse_with_memo(
        &self,
        source: &str,
        memo: &mut MemoTable,
    ) -> Result<AstNode, SourceError> {
        let start = self.grammar.start_rule().to_string();
        let mut run = ParseRun {
            grammar: self.grammar,
            source,
            map: SourceMap::new(source),
            memo,
            furthest: 0,
            furthest_rule: start.clone(),
            scan_max: 0,
        };
        match run.eval_rule(&start, 0) {
            Some((node, end)) => {
                let rest = skip_ws(source, end);
                if rest < source.len() {
                    return Err(run.error_at(rest, &start, true));
                }
                Ok(node)
            }
            None => {
                let (pos, rule) = (run.furthest, run.furthest_rule.clone());
                Err(run.error_at(pos, &rule, false))
            }
        }
    }
}

/// What one expression contributed to the enclosing rule's AST.
enum Fragment {
    /// Nothing (predicates, empty optionals).
    Empty,
    /// Raw literal text; wrapped into an `Operator` leaf when collected
    /// inside a sequence or repetition.
    Text { value: String, start: usize },
    Node(AstNode),
    Nodes(Vec<AstNode>),
}

struct MatchOk {
    end: usize,
    frag: Fragment,
}

/// Per-parse state: source, memo, and error-reporting bookkeeping.
struct ParseRun<'a> {
    grammar: &'a Grammar,
    source: &'a str,
    map: SourceMap,
    memo: &'a mut MemoTable,
    furthest: usize,
    furthest_rule: String,
    /// Exclusive upper bound of bytes examined so far; recorded per memo
    /// cell so the incremental parser can retain prefix cells safely.
    scan_max: usize,
}

impl<'a> ParseRun<'a> {
    fn eval_rule(&mut self, name: &str, pos: usize) -> Option<(AstNode, usize)> {
        if let Some(token) = TokenKind::from_name(name) {
            return self.eval_token(token, pos);
        }
        let id = self.grammar.rule_id(name)?;

        if pos >= self.furthest {
            self.furthest = pos;
            self.furthest_rule.clear();
            self.furthest_rule.push_str(name);
        }

        if let Some(cell) = self.memo.get(id, pos) {
            let extent = cell.extent;
            let cached = match &cell.result {
                Cached::Failure => None,
                Cached::Success { node, end } => Some((node.clone(), *end)),
            };
            self.touch(extent);
            return cached;
        }

        let rule = self.grammar.rule_by_id(id);
        let body_pos = skip_ws(self.source, pos);
        let outcome = self.eval_expr(&rule.pattern, body_pos);

        match outcome {
            Some(m) => {
                let node = self.rule_node(&rule.name, body_pos, m.end, m.frag);
                self.memo.insert(
                    id,
                    pos,
                    MemoCell {
                        result: Cached::Success {
                            node: node.clone(),
                            end: m.end,
                        },
                        extent: self.scan_max,
                    },
                );
                Some((node, m.end))
            }
            None => {
                self.memo.insert(
                    id,
                    pos,
                    MemoCell {
                        result: Cached::Failure,
                        extent: self.scan_max,
                    },
                );
                None
            }
        }
    }

    fn eval_token(&mut self, token: TokenKind, pos: usize) -> Option<(AstNode, usize)> {
        let id = self.grammar.token_id(token);
        if let Some(cell) = self.memo.get(id, pos) {
            let extent = cell.extent;
            let cached = match &cell.result {
                Cached::Failure => None,
                Cached::Success { node, end } => Some((node.clone(), *end)),
            };
            self.touch(extent);
            return cached;
        }

        let start = skip_ws(self.source, pos);
        match tokens::match_token(token, self.source, start) {
            Some(m) => {
                self.touch(m.end + 1);
                let node = AstNode::new(
                    m.kind,
                    Some(m.value),
                    Vec::new(),
                    self.map.position(start),
                    m.span,
                );
                self.memo.insert(
                    id,
                    pos,
                    MemoCell {
                        result: Cached::Success {
                            node: node.clone(),
                            end: m.end,
                        },
                        extent: self.scan_max,
                    },
                );
                Some((node, m.end))
            }
            None => {
                self.touch(start + 1);
                self.memo.insert(
                    id,
                    pos,
                    MemoCell {
                        result: Cached::Failure,
                        extent: self.scan_max,
                    },
                );
                None
            }
        }
    }

    fn eval_expr(&mut self, expr: &PegExpr, pos: usize) -> Option<MatchOk> {
        match expr {
            PegExpr::Literal(text) => self.eval_literal(text, pos),
            PegExpr::RuleRef(name) => self.eval_rule(name, pos).map(|(node, end)| MatchOk {
                end,
                frag: Fragment::Node(node),
            }),
            PegExpr::Sequence(items) => {
                let mut nodes = Vec::new();
                let mut cur = pos;
                for item in items {
                    let m = self.eval_expr(item, cur)?;
                    cur = m.end;
                    self.collect(&mut nodes, m.frag);
                }
                Some(MatchOk {
                    end: cur,
                    frag: Fragment::Nodes(nodes),
                })
            }
            PegExpr::Choice(items) => {
                for item in items {
                    if let Some(m) = self.eval_expr(item, pos) {
                        return Some(m);
                    }
                }
                None
            }
            PegExpr::ZeroOrMore(inner) => {
                let (_, m) = self.eval_repeat(inner, pos);
                Some(m)
            }
            PegExpr::OneOrMore(inner) => {
                let (count, m) = self.eval_repeat(inner, pos);
                if count == 0 {
                    return None;
                }
                Some(m)
            }
            PegExpr::Optional(inner) => Some(self.eval_expr(inner, pos).unwrap_or(MatchOk {
                end: pos,
                frag: Fragment::Empty,
            })),
            PegExpr::AndPredicate(inner) => match self.eval_expr(inner, pos) {
                Some(_) => Some(MatchOk {
                    end: pos,
                    frag: Fragment::Empty,
                }),
                None => None,
            },
            PegExpr::NotPredicate(inner) => match self.eval_expr(inner, pos) {
                Some(_) => None,
                None => Some(MatchOk {
                    end: pos,
                    frag: Fragment::Empty,
                }),
            },
        }
    }

    /// Greedy repetition. A success that consumes no input terminates the
    /// loop without counting as an iteration.
    fn eval_repeat(&mut self, inner: &PegExpr, pos: usize) -> (usize, MatchOk) {
        let mut nodes = Vec::new();
        let mut cur = pos;
        let mut count = 0;
        loop {
            match self.eval_expr(inner, cur) {
                Some(m) if m.end > cur => {
                    cur = m.end;
                    count += 1;
                    self.collect(&mut nodes, m.frag);
                }
                _ => break,
            }
        }
        (
            count,
            MatchOk {
                end: cur,
                frag: Fragment::Nodes(nodes),
            },
        )
    }

    fn eval_literal(&mut self, text: &str, pos: usize) -> Option<MatchOk> {
        let start = skip_ws(self.source, pos);
        let end = start + text.len();
        self.touch(end);
        if !self.source[start..].starts_with(text) {
            return None;
        }
        // Alphabetic literals (keywords) must not match a prefix of a
        // longer identifier.
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic()) {
            self.touch(end + 1);
            if matches!(
                self.source[end..].chars().next(),
                Some(c) if c.is_ascii_alphanumeric() || c == '_'
            ) {
                return None;
            }
        }
        Some(MatchOk {
            end,
            frag: Fragment::Text {
                value: text.to_string(),
                start,
            },
        })
    }

    fn collect(&mut self, nodes: &mut Vec<AstNode>, frag: Fragment) {
        match frag {
            Fragment::Empty => {}
            Fragment::Text { value, start } => {
                if !value.trim().is_empty() {
                    nodes.push(AstNode::leaf(
                        NodeKind::Operator,
                        value.clone(),
                        self.map.position(start),
                        value,
                    ));
                }
            }
            Fragment::Node(node) => nodes.push(node),
            Fragment::Nodes(list) => nodes.extend(list),
        }
    }

    fn rule_node(&self, name: &str, start: usize, end: usize, frag: Fragment) -> AstNode {
        let (value, children) = match frag {
            Fragment::Text { value, .. } => (Some(value), Vec::new()),
            Fragment::Node(node) => (None, vec![node]),
            Fragment::Nodes(list) => (None, list),
            Fragment::Empty => (None, Vec::new()),
        };
        AstNode::new(
            NodeKind::Rule(name.to_string()),
            value,
            children,
            self.map.position(start),
            self.source[start..end].to_string(),
        )
    }

    fn touch(&mut self, pos: usize) {
        if pos > self.scan_max {
            self.scan_max = pos;
        }
    }

    fn error_at(&self, pos: usize, rule: &str, trailing: bool) -> SourceError {
        let position = self.map.position(pos);
        let context: String = self.source[pos..]
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(30)
            .collect();
        let message = if pos >= self.source.len() {
            "unexpected end of input".to_string()
        } else if trailing {
            format!("unexpected trailing input '{context}'")
        } else {
            format!("unexpected input '{context}'")
        };
        SourceError {
            line: position.line,
            column: position.column,
            furthest: pos,
            rule: rule.to_string(),
            message,
        }
    }
}

/// Advance past ASCII whitespace.
fn skip_ws(source: &str, mut pos: usize) -> usize {
    let bytes = source.as_bytes();
    while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b'\r' | b'\n') {
        pos += 1;
    }
    pos
}
