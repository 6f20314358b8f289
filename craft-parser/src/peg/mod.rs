//! Grammar definition: the PEG expression algebra, compiled grammars, the
//! fluent builder and the notation parser.

pub mod expr;
pub mod grammar;
pub mod notation;

pub use expr::PegExpr;
pub use grammar::{Grammar, GrammarBuilder, Rule, RuleId, TokenKind};
