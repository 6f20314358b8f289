//! Parser for PEG grammar notation.
//!
//! One rule per logical line:
//!
//! ```text
//! rule_name <- pattern
//! ```
//!
//! where a pattern supports juxtaposition (sequence), `/` (ordered choice),
//! postfix `*` `+` `?`, prefix `&` (and-predicate) and `!` (not-predicate),
//! grouping `(...)`, double- or single-quoted literals, and bare
//! identifiers referencing rules or built-in tokens. `#` starts a comment
//! line; a line that begins with whitespace and carries no `<-` continues
//! the previous rule.
//!
//! Reference existence is deliberately not checked here so that forward and
//! mutually recursive references work; `Grammar::build` performs that check
//! along with left-recursion rejection.

use crate::error::GrammarError;
use crate::peg::expr::PegExpr;
use crate::peg::grammar::{Grammar, Rule, RuleDecl};

/// Parse PEG notation into a compiled [`Grammar`].
///
/// The first rule declared becomes the start rule.
pub fn parse_grammar(text: &str, label: &str) -> Result<Grammar, GrammarError> {
    let mut logical: Vec<(usize, String)> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let stripped = raw.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let continues = raw.starts_with(|c: char| c.is_whitespace()) && !stripped.contains("<-");
        match logical.last_mut() {
            Some((_, current)) if continues => {
                current.push(' ');
                current.push_str(stripped);
            }
            _ => logical.push((line_no, stripped.to_string())),
        }
    }

    let mut decls = Vec::new();
    for (line_no, rule_text) in logical {
        decls.push(parse_rule_line(&rule_text, line_no)?);
    }
    Grammar::build(label, decls, None)
}

fn parse_rule_line(text: &str, line: usize) -> Result<RuleDecl, GrammarError> {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;

    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    let name_start = pos;
    if pos >= chars.len() || !(chars[pos].is_ascii_alphabetic() || chars[pos] == '_') {
        return Err(GrammarError::new(line, pos + 1, "expected a rule name"));
    }
    while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
        pos += 1;
    }
    let name: String = chars[name_start..pos].iter().collect();

    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    if !(pos + 1 < chars.len() && chars[pos] == '<' && chars[pos + 1] == '-') {
        return Err(GrammarError::new(
            line,
            pos + 1,
            format!("expected '<-' after rule name '{name}'"),
        ));
    }
    pos += 2;

    let mut parser = PatternParser {
        chars,
        pos,
        line,
    };
    let pattern = parser.parse()?;

    Ok(RuleDecl {
        rule: Rule {
            name,
            pattern,
            description: String::new(),
        },
        line,
        column: name_start + 1,
    })
}

/// Recursive-descent parser over one rule's pattern text. Precedence,
/// strictest to loosest: primary, postfix quantifier, prefix predicate,
/// sequence, choice.
struct PatternParser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl PatternParser {
    fn parse(&mut self) -> Result<PegExpr, GrammarError> {
        self.skip_ws();
        if self.at_end() {
            // An empty body is accepted; it can never match.
            return Ok(PegExpr::Choice(Vec::new()));
        }
        let expr = self.parse_choice()?;
        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(self.err(format!("unexpected character '{c}' in pattern")));
        }
        Ok(expr)
    }

    fn parse_choice(&mut self) -> Result<PegExpr, GrammarError> {
        let mut alternatives = vec![self.parse_sequence()?];
        loop {
            self.skip_ws();
            if self.peek() == Some('/') {
                self.pos += 1;
                alternatives.push(self.parse_sequence()?);
            } else {
                break;
            }
        }
        Ok(PegExpr::choice(alternatives))
    }

    fn parse_sequence(&mut self) -> Result<PegExpr, GrammarError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some('/') | Some(')') => break,
                _ => items.push(self.parse_prefix()?),
            }
        }
        if items.is_empty() {
            return Err(self.err("expected a pattern"));
        }
        Ok(PegExpr::seq(items))
    }

    fn parse_prefix(&mut self) -> Result<PegExpr, GrammarError> {
        self.skip_ws();
        match self.peek() {
            Some(c @ ('&' | '!')) => {
                self.pos += 1;
                self.skip_ws();
                if matches!(self.peek(), None | Some('/') | Some(')')) {
                    return Err(self.err(format!("'{c}' predicate has no operand")));
                }
                let inner = self.parse_suffix()?;
                Ok(match c {
                    '&' => PegExpr::and_pred(inner),
                    _ => PegExpr::not_pred(inner),
                })
            }
            _ => self.parse_suffix(),
        }
    }

    fn parse_suffix(&mut self) -> Result<PegExpr, GrammarError> {
        let expr = self.parse_primary()?;
        self.skip_ws();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(PegExpr::star(expr))
            }
            Some('+') => {
                self.pos += 1;
                Ok(PegExpr::plus(expr))
            }
            Some('?') => {
                self.pos += 1;
                Ok(PegExpr::opt(expr))
            }
            _ => Ok(expr),
        }
    }

    fn parse_primary(&mut self) -> Result<PegExpr, GrammarError> {
        self.skip_ws();
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_literal(q),
            Some('(') => {
                self.pos += 1;
                self.skip_ws();
                if self.peek() == Some(')') {
                    return Err(self.err("empty group"));
                }
                let inner = self.parse_choice()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.err("unclosed group"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                    self.pos += 1;
                }
                let name: String = self.chars[start..self.pos].iter().collect();
                Ok(PegExpr::RuleRef(name))
            }
            Some(c @ ('*' | '+' | '?')) => {
                Err(self.err(format!("quantifier '{c}' has no operand")))
            }
            Some(c) => Err(self.err(format!("unexpected character '{c}'"))),
            None => Err(self.err("expected a pattern")),
        }
    }

    fn parse_literal(&mut self, quote: char) -> Result<PegExpr, GrammarError> {
        let open_col = self.pos + 1;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(GrammarError::new(self.line, open_col, "unterminated literal"))
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(PegExpr::Literal(value));
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(other) => {
                            return Err(self.err(format!("unknown escape sequence '\\{other}'")))
                        }
                        None => {
                            return Err(GrammarError::new(
                                self.line,
                                open_col,
                                "unterminated literal",
                            ))
                        }
                    };
                    value.push(escaped);
                    self.pos += 1;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn err(&self, message: impl Into<String>) -> GrammarError {
        GrammarError::new(self.line, self.pos + 1, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rule() {
        let grammar = parse_grammar("program <- statement*", "t").expect("parses");
        assert!(grammar.rule("program").is_some());
        assert_eq!(grammar.start_rule(), "program");
    }

    #[test]
    fn test_parse_multiple_rules() {
        let grammar = parse_grammar(
            "program <- statement+\n\
             statement <- assignment\n\
             assignment <- IDENT \"=\" expr \";\"\n\
             expr <- NUMBER",
            "t",
        )
        .expect("parses");
        assert_eq!(grammar.len(), 4);
        assert_eq!(grammar.start_rule(), "program");
    }

    #[test]
    fn test_parse_choice_structure() {
        let grammar = parse_grammar(
            "factor <- NUMBER / IDENT / \"(\" factor \")\"",
            "t",
        )
        .expect("parses");
        let rule = grammar.rule("factor").expect("rule exists");
        match &rule.pattern {
            PegExpr::Choice(alts) => assert_eq!(alts.len(), 3),
            other => panic!("expected choice, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_quantifiers() {
        let grammar = parse_grammar(
            "many <- \"a\"*\nsome <- \"a\"+\nmaybe <- \"a\"?",
            "t",
        )
        .expect("parses");
        assert!(matches!(
            grammar.rule("many").map(|r| &r.pattern),
            Some(PegExpr::ZeroOrMore(_))
        ));
        assert!(matches!(
            grammar.rule("some").map(|r| &r.pattern),
            Some(PegExpr::OneOrMore(_))
        ));
        assert!(matches!(
            grammar.rule("maybe").map(|r| &r.pattern),
            Some(PegExpr::Optional(_))
        ));
    }

    #[test]
    fn test_parse_predicates() {
        let grammar = parse_grammar("a <- &\"x\" \"xy\"\nb <- !\"x\" \"y\"", "t").expect("parses");
        match grammar.rule("a").map(|r| &r.pattern) {
            Some(PegExpr::Sequence(items)) => {
                assert!(matches!(items[0], PegExpr::AndPredicate(_)));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
        match grammar.rule("b").map(|r| &r.pattern) {
            Some(PegExpr::Sequence(items)) => {
                assert!(matches!(items[0], PegExpr::NotPredicate(_)));
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_predicate_binds_looser_than_quantifier() {
        let grammar = parse_grammar("a <- !\"x\"*", "t").expect("parses");
        match grammar.rule("a").map(|r| &r.pattern) {
            Some(PegExpr::NotPredicate(inner)) => {
                assert!(matches!(**inner, PegExpr::ZeroOrMore(_)));
            }
            other => panic!("expected predicate over repetition, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_escapes() {
        let grammar = parse_grammar(r#"esc <- "a\nb\t\"\\""#, "t").expect("parses");
        assert_eq!(
            grammar.rule("esc").map(|r| &r.pattern),
            Some(&PegExpr::Literal("a\nb\t\"\\".to_string()))
        );
    }

    #[test]
    fn test_single_quoted_literal() {
        let grammar = parse_grammar("semi <- ';'", "t").expect("parses");
        assert_eq!(
            grammar.rule("semi").map(|r| &r.pattern),
            Some(&PegExpr::Literal(";".to_string()))
        );
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let grammar = parse_grammar(
            "# arithmetic\n\nprogram <- NUMBER\n# trailing comment",
            "t",
        )
        .expect("parses");
        assert_eq!(grammar.len(), 1);
    }

    #[test]
    fn test_continuation_lines() {
        let grammar = parse_grammar(
            "factor <- NUMBER\n    / IDENT\nother <- factor",
            "t",
        )
        .expect("parses");
        assert_eq!(grammar.len(), 2);
        assert!(matches!(
            grammar.rule("factor").map(|r| &r.pattern),
            Some(PegExpr::Choice(_))
        ));
    }

    #[test]
    fn test_empty_rule_body_accepted() {
        let grammar = parse_grammar("nothing <- \nprogram <- NUMBER", "t").expect("parses");
        assert_eq!(
            grammar.rule("nothing").map(|r| &r.pattern),
            Some(&PegExpr::Choice(Vec::new()))
        );
    }

    #[test]
    fn test_missing_arrow_is_error() {
        let err = parse_grammar("program NUMBER", "t").expect_err("must fail");
        assert_eq!(err.line, 1);
        assert!(err.message.contains("<-"));
    }

    #[test]
    fn test_dangling_quantifier_is_error() {
        let err = parse_grammar("a <- * NUMBER", "t").expect_err("must fail");
        assert_eq!(err.line, 1);
        assert!(err.message.contains("quantifier"));
    }

    #[test]
    fn test_predicate_without_operand_is_error() {
        let err = parse_grammar("a <- NUMBER &", "t").expect_err("must fail");
        assert!(err.message.contains("predicate has no operand"));
    }

    #[test]
    fn test_unclosed_group_is_error() {
        let err = parse_grammar("a <- ( NUMBER \"+\"", "t").expect_err("must fail");
        assert!(err.message.contains("unclosed group"));
    }

    #[test]
    fn test_unterminated_literal_is_error() {
        let err = parse_grammar("a <- \"abc", "t").expect_err("must fail");
        assert!(err.message.contains("unterminated literal"));
    }

    #[test]
    fn test_unknown_escape_is_error() {
        let err = parse_grammar(r#"a <- "\q""#, "t").expect_err("must fail");
        assert!(err.message.contains("unknown escape"));
    }

    #[test]
    fn test_error_reports_later_line() {
        let err = parse_grammar("a <- NUMBER\nb <- (IDENT", "t").expect_err("must fail");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_forward_references_allowed() {
        let grammar = parse_grammar("a <- b\nb <- NUMBER", "t").expect("parses");
        assert_eq!(grammar.start_rule(), "a");
    }

    #[test]
    fn test_left_recursive_notation_rejected_at_build() {
        // Scenario: `expr <- expr "+" NUMBER / NUMBER` must fail before any
        // source is parsed.
        let err =
            parse_grammar("expr <- expr \"+\" NUMBER / NUMBER", "t").expect_err("must fail");
        assert!(err.message.contains("left-recursive"));
        assert!(err.message.contains("expr"));
    }
}
