//! Compiled grammars and the fluent builder.
//!
//! A [`Grammar`] is frozen at build time: rules get dense integer ids (the
//! packrat memo is keyed by id, not name), every reference is checked
//! against the rule map and the built-in token names, and left-recursive
//! rules are rejected. After `build` the grammar is immutable.

use std::collections::{HashMap, HashSet};

use crate::error::GrammarError;
use crate::peg::expr::PegExpr;

/// The reserved built-in token matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Ident,
    Str,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [TokenKind::Number, TokenKind::Ident, TokenKind::Str];

    pub fn from_name(name: &str) -> Option<TokenKind> {
        match name {
            "NUMBER" => Some(TokenKind::Number),
            "IDENT" => Some(TokenKind::Ident),
            "STRING" => Some(TokenKind::Str),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENT",
            TokenKind::Str => "STRING",
        }
    }
}

/// Dense integer id assigned to every rule (and built-in token) at build
/// time; the packrat memo is keyed by `(RuleId, position)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) u32);

/// A single named rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: PegExpr,
    pub description: String,
}

/// A rule declaration carried into `Grammar::build`, with the grammar-text
/// position it came from (line 1, column 1 for builder-made rules).
#[derive(Debug, Clone)]
pub(crate) struct RuleDecl {
    pub rule: Rule,
    pub line: usize,
    pub column: usize,
}

/// A complete, validated grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    label: String,
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
    token_base: u32,
    start: String,
}

impl Grammar {
    /// Validate declarations and freeze them into a grammar.
    ///
    /// The first declared rule becomes the start rule unless one is named
    /// explicitly. Redeclaring a name replaces the earlier pattern but keeps
    /// the original declaration order.
    pub(crate) fn build(
        label: impl Into<String>,
        decls: Vec<RuleDecl>,
        start: Option<String>,
    ) -> Result<Grammar, GrammarError> {
        if decls.is_empty() {
            return Err(GrammarError::new(1, 1, "grammar has no rules"));
        }

        let mut rules: Vec<Rule> = Vec::new();
        let mut positions: Vec<(usize, usize)> = Vec::new();
        let mut index: HashMap<String, RuleId> = HashMap::new();
        for decl in decls {
            match index.get(&decl.rule.name) {
                Some(&RuleId(i)) => {
                    rules[i as usize] = decl.rule;
                    positions[i as usize] = (decl.line, decl.column);
                }
                None => {
                    index.insert(decl.rule.name.clone(), RuleId(rules.len() as u32));
                    positions.push((decl.line, decl.column));
                    rules.push(decl.rule);
                }
            }
        }

        let start = start.unwrap_or_else(|| rules[0].name.clone());
        if !index.contains_key(&start) {
            return Err(GrammarError::new(
                1,
                1,
                format!("start rule '{start}' is not defined"),
            ));
        }

        let grammar = Grammar {
            label: label.into(),
            token_base: rules.len() as u32,
            rules,
            index,
            start,
        };
        grammar.check_references(&positions)?;
        grammar.check_left_recursion(&positions)?;
        Ok(grammar)
    }

    fn check_references(&self, positions: &[(usize, usize)]) -> Result<(), GrammarError> {
        for (i, rule) in self.rules.iter().enumerate() {
            let mut undefined = None;
            rule.pattern.visit(&mut |e| {
                if let PegExpr::RuleRef(name) = e {
                    let known =
                        TokenKind::from_name(name).is_some() || self.index.contains_key(name);
                    if !known && undefined.is_none() {
                        undefined = Some(name.clone());
                    }
                }
            });
            if let Some(name) = undefined {
                let (line, column) = positions[i];
                return Err(GrammarError::new(
                    line,
                    column,
                    format!("rule '{}' references undefined rule '{name}'", rule.name),
                ));
            }
        }
        Ok(())
    }

    fn check_left_recursion(&self, positions: &[(usize, usize)]) -> Result<(), GrammarError> {
        for (i, rule) in self.rules.iter().enumerate() {
            // Transitive closure of the rules reachable at first position.
            let mut reachable: HashSet<String> = HashSet::new();
            let mut work: Vec<String> = Vec::new();
            self.first_refs(&rule.pattern, &mut work);
            while let Some(name) = work.pop() {
                if !reachable.insert(name.clone()) {
                    continue;
                }
                if let Some(target) = self.rule(&name) {
                    self.first_refs(&target.pattern, &mut work);
                }
            }
            if reachable.contains(&rule.name) {
                let (line, column) = positions[i];
                return Err(GrammarError::new(
                    line,
                    column,
                    format!(
                        "rule '{}' is left-recursive, which PEG does not allow",
                        rule.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Collect the rule names an expression can invoke at its first input
    /// position, stepping over nullable prefixes.
    fn first_refs(&self, expr: &PegExpr, out: &mut Vec<String>) {
        match expr {
            PegExpr::RuleRef(name) => {
                if TokenKind::from_name(name).is_none() {
                    out.push(name.clone());
                }
            }
            PegExpr::Sequence(items) => {
                for item in items {
                    self.first_refs(item, out);
                    if !self.nullable(item, &mut HashSet::new()) {
                        break;
                    }
                }
            }
            PegExpr::Choice(items) => {
                for item in items {
                    self.first_refs(item, out);
                }
            }
            PegExpr::ZeroOrMore(inner)
            | PegExpr::OneOrMore(inner)
            | PegExpr::Optional(inner)
            | PegExpr::AndPredicate(inner)
            | PegExpr::NotPredicate(inner) => self.first_refs(inner, out),
            PegExpr::Literal(_) => {}
        }
    }

    /// Whether an expression can succeed without consuming input. Rule
    /// reference cycles are treated as non-nullable; the left-recursion
    /// check reports them separately.
    fn nullable(&self, expr: &PegExpr, visiting: &mut HashSet<String>) -> bool {
        match expr {
            PegExpr::Literal(text) => text.is_empty(),
            PegExpr::RuleRef(name) => {
                if TokenKind::from_name(name).is_some() {
                    return false;
                }
                if !visiting.insert(name.clone()) {
                    return false;
                }
                let result = match self.rule(name) {
                    Some(rule) => self.nullable(&rule.pattern, visiting),
                    None => false,
                };
                visiting.remove(name);
                result
            }
            PegExpr::Sequence(items) => items.iter().all(|i| self.nullable(i, visiting)),
            PegExpr::Choice(items) => items.iter().any(|i| self.nullable(i, visiting)),
            PegExpr::ZeroOrMore(_) | PegExpr::Optional(_) => true,
            PegExpr::OneOrMore(inner) => self.nullable(inner, visiting),
            PegExpr::AndPredicate(_) | PegExpr::NotPredicate(_) => true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start_rule(&self) -> &str {
        &self.start
    }

    /// Rebuild this grammar with a different start rule.
    pub fn with_start(mut self, start: impl Into<String>) -> Result<Grammar, GrammarError> {
        let start = start.into();
        if !self.index.contains_key(&start) {
            return Err(GrammarError::new(
                1,
                1,
                format!("start rule '{start}' is not defined"),
            ));
        }
        self.start = start;
        Ok(self)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&RuleId(i)| &self.rules[i as usize])
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    pub(crate) fn rule_by_id(&self, RuleId(i): RuleId) -> &Rule {
        &self.rules[i as usize]
    }

    /// The memo id reserved for a built-in token matcher.
    pub(crate) fn token_id(&self, token: TokenKind) -> RuleId {
        let offset = match token {
            TokenKind::Number => 0,
            TokenKind::Ident => 1,
            TokenKind::Str => 2,
        };
        RuleId(self.token_base + offset)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Fluent grammar construction for programmatic use.
///
/// ```
/// use craft_parser::{GrammarBuilder, PegExpr};
///
/// let grammar = GrammarBuilder::new("tiny")
///     .rule("program", PegExpr::plus(PegExpr::rule("statement")))
///     .rule(
///         "statement",
///         PegExpr::seq(vec![
///             PegExpr::rule("IDENT"),
///             PegExpr::lit("="),
///             PegExpr::rule("NUMBER"),
///             PegExpr::lit(";"),
///         ]),
///     )
///     .build()?;
/// assert_eq!(grammar.start_rule(), "program");
/// # Ok::<(), craft_parser::GrammarError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    label: String,
    decls: Vec<RuleDecl>,
    start: Option<String>,
}

impl GrammarBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            decls: Vec::new(),
            start: None,
        }
    }

    pub fn rule(self, name: impl Into<String>, pattern: PegExpr) -> Self {
        self.rule_with_description(name, pattern, "")
    }

    pub fn rule_with_description(
        mut self,
        name: impl Into<String>,
        pattern: PegExpr,
        description: impl Into<String>,
    ) -> Self {
        self.decls.push(RuleDecl {
            rule: Rule {
                name: name.into(),
                pattern,
                description: description.into(),
            },
            line: 1,
            column: 1,
        });
        self
    }

    /// Set the start rule; defaults to the first rule added.
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        Grammar::build(self.label, self.decls, self.start)
    }
}
