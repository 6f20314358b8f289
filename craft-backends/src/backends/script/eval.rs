//! Evaluator for the emitted script form.
//!
//! The execute path transpiles an AST and then runs the emitted text here:
//! a line-based interpreter covering exactly the statement forms the script
//! backend emits for arithmetic programs (assignments and bare
//! expressions). Anything structured (function definitions, conditionals,
//! loops) is out of execute's scope and reported as unsupported.

use std::collections::BTreeMap;
use std::fmt;

/// Top-level bindings produced by a script run, in name order.
pub type Bindings = BTreeMap<String, Value>;

/// A runtime value in the script form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Run a script in a fresh scope and return its top-level bindings.
pub(crate) fn run_script(source: &str) -> Result<Bindings, String> {
    let mut env = Bindings::new();
    for (i, raw) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if raw.starts_with(|c: char| c.is_whitespace()) || line.ends_with(':') {
            return Err(format!(
                "line {line_no}: only assignments and expressions are supported"
            ));
        }
        let result = match split_assignment(line) {
            Some((name, expr)) => {
                let value = eval_expr(expr, &env)
                    .map_err(|e| format!("line {line_no}: {e}"))?;
                env.insert(name.to_string(), value);
                Ok(())
            }
            None => eval_expr(line, &env)
                .map(|_| ())
                .map_err(|e| format!("line {line_no}: {e}")),
        };
        result?;
    }
    Ok(env)
}

/// Split `name = expr`, rejecting `==`-style comparisons.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let idx = line.find('=')?;
    if bytes.get(idx + 1) == Some(&b'=') {
        return None;
    }
    if idx > 0 && matches!(bytes[idx - 1], b'<' | b'>' | b'!' | b':') {
        return None;
    }
    let name = line[..idx].trim();
    let mut chars = name.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &line[idx + 1..]))
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(Value),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let mut toks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = if is_float {
                    text.parse::<f64>().map(Value::Float).map_err(|_| ())
                } else {
                    text.parse::<i64>().map(Value::Int).map_err(|_| ())
                };
                toks.push(Tok::Num(
                    value.map_err(|_| format!("invalid number '{text}'"))?,
                ));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                toks.push(Tok::Ident(chars[start..i].iter().collect()));
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let mut s = String::new();
                loop {
                    match chars.get(i).copied() {
                        None => return Err("unterminated string".to_string()),
                        Some(ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => match chars.get(i + 1).copied() {
                            Some(esc) => {
                                s.push(esc);
                                i += 2;
                            }
                            None => return Err("unterminated string".to_string()),
                        },
                        Some(ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                toks.push(Tok::Str(s));
            }
            '+' => {
                toks.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                toks.push(Tok::Minus);
                i += 1;
            }
            '*' => {
                toks.push(Tok::Star);
                i += 1;
            }
            '/' => {
                toks.push(Tok::Slash);
                i += 1;
            }
            '%' => {
                toks.push(Tok::Percent);
                i += 1;
            }
            '(' => {
                toks.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                toks.push(Tok::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(toks)
}

/// Evaluate one expression against the current environment.
fn eval_expr(text: &str, env: &Bindings) -> Result<Value, String> {
    let toks = tokenize(text)?;
    let mut parser = ExprParser {
        toks: &toks,
        pos: 0,
        env,
    };
    let value = parser.expr()?;
    if parser.pos < parser.toks.len() {
        return Err("unexpected trailing tokens".to_string());
    }
    Ok(value)
}

struct ExprParser<'a> {
    toks: &'a [Tok],
    pos: usize,
    env: &'a Bindings,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn expr(&mut self) -> Result<Value, String> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.pos += 1;
                    acc = add(acc, self.term()?)?;
                }
                Some(Tok::Minus) => {
                    self.pos += 1;
                    acc = arith(acc, self.term()?, "-")?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Value, String> {
        let mut acc = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => "*",
                Some(Tok::Slash) => "/",
                Some(Tok::Percent) => "%",
                _ => break,
            };
            self.pos += 1;
            acc = arith(acc, self.unary()?, op)?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Value, String> {
        if self.peek() == Some(&Tok::Minus) {
            self.pos += 1;
            return match self.unary()? {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(x) => Ok(Value::Float(-x)),
                Value::Str(_) => Err("cannot negate a string".to_string()),
            };
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Value, String> {
        match self.peek().cloned() {
            Some(Tok::Num(v)) => {
                self.pos += 1;
                Ok(v)
            }
            Some(Tok::Str(s)) => {
                self.pos += 1;
                Ok(Value::Str(s))
            }
            Some(Tok::Ident(name)) => {
                self.pos += 1;
                if self.peek() == Some(&Tok::LParen) {
                    return Err(format!(
                        "function calls ('{name}') are not supported by execute"
                    ));
                }
                self.env
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("undefined variable '{name}'"))
            }
            Some(Tok::LParen) => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(&Tok::RParen) {
                    return Err("missing ')'".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            _ => Err("expected an expression".to_string()),
        }
    }
}

fn add(a: Value, b: Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Err("cannot mix strings and numbers in '+'".to_string())
        }
        (a, b) => arith(a, b, "+"),
    }
}

fn arith(a: Value, b: Value, op: &str) -> Result<Value, String> {
    let (a, b) = match (a, b) {
        (Value::Int(a), Value::Int(b)) => return int_arith(a, b, op),
        (Value::Int(a), Value::Float(b)) => (a as f64, b),
        (Value::Float(a), Value::Int(b)) => (a, b as f64),
        (Value::Float(a), Value::Float(b)) => (a, b),
        _ => return Err(format!("cannot apply '{op}' to strings")),
    };
    Ok(Value::Float(match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        _ => a % b,
    }))
}

/// Integer arithmetic; `/` is true division and always yields a float,
/// like the scripting languages the emitted form mirrors.
fn int_arith(a: i64, b: i64, op: &str) -> Result<Value, String> {
    match op {
        "+" => Ok(Value::Int(a + b)),
        "-" => Ok(Value::Int(a - b)),
        "*" => Ok(Value::Int(a * b)),
        "/" => {
            if b == 0 {
                Err("division by zero".to_string())
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        _ => {
            if b == 0 {
                Err("modulo by zero".to_string())
            } else {
                Ok(Value::Int(a % b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_and_reference() {
        let env = run_script("x = 2 + 3 * 4\ny = x - 4").expect("runs");
        assert_eq!(env.get("x"), Some(&Value::Int(14)));
        assert_eq!(env.get("y"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_parentheses_and_unary_minus() {
        let env = run_script("a = (2 + 3) * -2").expect("runs");
        assert_eq!(env.get("a"), Some(&Value::Int(-10)));
    }

    #[test]
    fn test_division_is_always_true_division() {
        let env = run_script("a = 10 / 2\nb = 7 / 2").expect("runs");
        assert_eq!(env.get("a"), Some(&Value::Float(5.0)));
        assert_eq!(env.get("b"), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_string_values() {
        let env = run_script("s = \"hi\" + \" there\"").expect("runs");
        assert_eq!(env.get("s"), Some(&Value::Str("hi there".to_string())));
    }

    #[test]
    fn test_comments_skipped() {
        let env = run_script("# src: line 1\nx = 1").expect("runs");
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_undefined_variable() {
        let err = run_script("x = y + 1").expect_err("must fail");
        assert!(err.contains("undefined variable 'y'"));
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_division_by_zero() {
        let err = run_script("x = 1 / 0").expect_err("must fail");
        assert!(err.contains("division by zero"));
    }

    #[test]
    fn test_structured_statements_rejected() {
        let err = run_script("if x:\n    y = 1").expect_err("must fail");
        assert!(err.contains("only assignments and expressions"));
    }
}
