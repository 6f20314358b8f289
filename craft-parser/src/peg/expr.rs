//! The PEG expression algebra.
//!
//! A [`PegExpr`] is a plain tree value with no identity beyond its
//! structure; two equal trees are interchangeable. The constructors here are
//! what the [`crate::GrammarBuilder`] and the notation parser both produce.

/// One PEG parsing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PegExpr {
    /// Match a string verbatim (after leading whitespace skipping).
    Literal(String),
    /// Invoke a named rule, or a built-in token matcher when the name is
    /// one of the reserved token names.
    RuleRef(String),
    /// Match each child in order; any failure aborts the sequence.
    Sequence(Vec<PegExpr>),
    /// Try children in order; the first success wins.
    Choice(Vec<PegExpr>),
    /// Greedy repetition; always succeeds.
    ZeroOrMore(Box<PegExpr>),
    /// Greedy repetition requiring at least one match.
    OneOrMore(Box<PegExpr>),
    /// Match the inner expression or nothing.
    Optional(Box<PegExpr>),
    /// Zero-width positive look-ahead.
    AndPredicate(Box<PegExpr>),
    /// Zero-width negative look-ahead.
    NotPredicate(Box<PegExpr>),
}

impl PegExpr {
    pub fn lit(text: impl Into<String>) -> PegExpr {
        PegExpr::Literal(text.into())
    }

    pub fn rule(name: impl Into<String>) -> PegExpr {
        PegExpr::RuleRef(name.into())
    }

    /// A sequence; a single item collapses to itself.
    pub fn seq(mut items: Vec<PegExpr>) -> PegExpr {
        if items.len() == 1 {
            items.remove(0)
        } else {
            PegExpr::Sequence(items)
        }
    }

    /// An ordered choice; a single item collapses to itself.
    pub fn choice(mut items: Vec<PegExpr>) -> PegExpr {
        if items.len() == 1 {
            items.remove(0)
        } else {
            PegExpr::Choice(items)
        }
    }

    pub fn star(inner: PegExpr) -> PegExpr {
        PegExpr::ZeroOrMore(Box::new(inner))
    }

    pub fn plus(inner: PegExpr) -> PegExpr {
        PegExpr::OneOrMore(Box::new(inner))
    }

    pub fn opt(inner: PegExpr) -> PegExpr {
        PegExpr::Optional(Box::new(inner))
    }

    pub fn and_pred(inner: PegExpr) -> PegExpr {
        PegExpr::AndPredicate(Box::new(inner))
    }

    pub fn not_pred(inner: PegExpr) -> PegExpr {
        PegExpr::NotPredicate(Box::new(inner))
    }

    /// Visit this expression and all sub-expressions, depth-first.
    pub fn visit(&self, f: &mut impl FnMut(&PegExpr)) {
        self.visit_impl(f)
    }

    fn visit_impl(&self, f: &mut dyn FnMut(&PegExpr)) {
        f(self);
        match self {
            PegExpr::Sequence(items) | PegExpr::Choice(items) => {
                for item in items {
                    item.visit_impl(f);
                }
            }
            PegExpr::ZeroOrMore(inner)
            | PegExpr::OneOrMore(inner)
            | PegExpr::Optional(inner)
            | PegExpr::AndPredicate(inner)
            | PegExpr::NotPredicate(inner) => inner.visit_impl(f),
            PegExpr::Literal(_) | PegExpr::RuleRef(_) => {}
        }
    }
}
