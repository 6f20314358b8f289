//! Built-in token matchers.
//!
//! `NUMBER`, `IDENT` and `STRING` are not grammar rules; they are fixed
//! matchers registered under reserved names. Each skips leading ASCII
//! whitespace (the caller does that) and then attempts its pattern at the
//! given byte offset. The number and identifier patterns are ordinary
//! regular expressions compiled once; strings are scanned by hand because
//! the delimiter may be escaped inside.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::NodeKind;
use crate::peg::grammar::TokenKind;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[0-9]+(\.[0-9]+)?").expect("number pattern compiles")
});

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*").expect("identifier pattern compiles")
});

/// A successful token match at some position.
pub(crate) struct TokenMatch {
    pub kind: NodeKind,
    /// Leaf value: the raw matched text, or for strings the content between
    /// the delimiters with no escape interpretation.
    pub value: String,
    /// The full matched text, delimiters included.
    pub span: String,
    /// Byte offset just past the match.
    pub end: usize,
}

/// Attempt a built-in token at `pos` (whitespace already skipped).
pub(crate) fn match_token(token: TokenKind, source: &str, pos: usize) -> Option<TokenMatch> {
    let rest = &source[pos..];
    match token {
        TokenKind::Number => NUMBER_RE.find(rest).map(|m| TokenMatch {
            kind: NodeKind::Number,
            value: m.as_str().to_string(),
            span: m.as_str().to_string(),
            end: pos + m.end(),
        }),
        TokenKind::Ident => IDENT_RE.find(rest).map(|m| TokenMatch {
            kind: NodeKind::Identifier,
            value: m.as_str().to_string(),
            span: m.as_str().to_string(),
            end: pos + m.end(),
        }),
        TokenKind::Str => match_string(source, pos),
    }
}

/// Scan a single- or double-quoted string. A backslash escapes the next
/// character for delimiter purposes, but the value keeps the raw text
/// between the quotes untouched.
fn match_string(source: &str, pos: usize) -> Option<TokenMatch> {
    let bytes = source.as_bytes();
    let quote = match bytes.get(pos) {
        Some(&q @ (b'"' | b'\'')) => q,
        _ => return None,
    };
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b if b == quote => {
                return Some(TokenMatch {
                    kind: NodeKind::Str,
                    value: source[pos + 1..i].to_string(),
                    span: source[pos..=i].to_string(),
                    end: i + 1,
                });
            }
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_integer_and_decimal() {
        let m = match_token(TokenKind::Number, "42 ;", 0).expect("matches");
        assert_eq!(m.value, "42");
        assert_eq!(m.end, 2);

        let m = match_token(TokenKind::Number, "3.25", 0).expect("matches");
        assert_eq!(m.value, "3.25");
        assert_eq!(m.end, 4);
    }

    #[test]
    fn test_number_negative() {
        let m = match_token(TokenKind::Number, "-7", 0).expect("matches");
        assert_eq!(m.value, "-7");
    }

    #[test]
    fn test_number_rejects_nonnumeric() {
        assert!(match_token(TokenKind::Number, "abc", 0).is_none());
        assert!(match_token(TokenKind::Number, "- 1", 0).is_none());
    }

    #[test]
    fn test_ident() {
        let m = match_token(TokenKind::Ident, "_area51 = 1", 0).expect("matches");
        assert_eq!(m.value, "_area51");
        assert!(match_token(TokenKind::Ident, "9lives", 0).is_none());
    }

    #[test]
    fn test_string_double_and_single() {
        let m = match_token(TokenKind::Str, "\"hi\" rest", 0).expect("matches");
        assert_eq!(m.value, "hi");
        assert_eq!(m.span, "\"hi\"");
        assert_eq!(m.end, 4);

        let m = match_token(TokenKind::Str, "'ok'", 0).expect("matches");
        assert_eq!(m.value, "ok");
    }

    #[test]
    fn test_string_keeps_escapes_raw() {
        let m = match_token(TokenKind::Str, r#""a\"b""#, 0).expect("matches");
        assert_eq!(m.value, r#"a\"b"#);
        assert_eq!(m.end, 6);
    }

    #[test]
    fn test_string_unterminated_fails() {
        assert!(match_token(TokenKind::Str, "\"open", 0).is_none());
    }
}
