//! Inline template expansion for source files.
//!
//! Before a file is parsed as YAML, every `<%= expr %>` tag is replaced by the
//! rendered result of `expr`. The expression language is deliberately small:
//!
//! - literals: integers, floats, `'single'` or `"double"` quoted strings,
//!   `nil`, `true`, `false`
//! - binary `+ - * / %` with the usual precedence, unary `-`, parentheses
//! - `+` concatenates when either operand is a string
//! - `env("NAME")` and `env("NAME", "default")` read the environment snapshot
//!   of the current resolution run
//!
//! Text outside tags is copied through untouched, so expansion never changes
//! the YAML structure around a tag.

use regex_lite::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<%=(.*?)%>").expect("valid template tag pattern"));

/// Failure while evaluating a template expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{expression}`: {message}")]
pub struct TemplateError {
    pub expression: String,
    pub message: String,
}

/// Expand every `<%= expr %>` tag in `text`.
pub fn expand(text: &str, env: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut failure = None;
    let expanded = TAG.replace_all(text, |caps: &Captures| {
        let source = caps[1].trim();
        match evaluate(source, env) {
            Ok(value) => value.to_string(),
            Err(message) => {
                failure.get_or_insert(TemplateError {
                    expression: source.to_string(),
                    message,
                });
                String::new()
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(expanded.into_owned()),
    }
}

/// Evaluate a single expression.
fn evaluate(source: &str, env: &BTreeMap<String, String>) -> Result<Scalar, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        env,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected {token:?}"));
    }
    Ok(value)
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{i}"),
            // Debug keeps the fractional part (`2.0`), so YAML still sees a float
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Nil => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '\'' | '"' => {
                let (literal, next) = read_string(&chars, i)?;
                tokens.push(Token::Str(literal));
                i = next;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let is_float =
                    i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit();
                if is_float {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    let value = text
                        .parse::<f64>()
                        .map_err(|e| format!("bad float literal {text}: {e}"))?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text
                        .parse::<i64>()
                        .map_err(|e| format!("bad integer literal {text}: {e}"))?;
                    tokens.push(Token::Int(value));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start`; returns the literal and the index
/// just past the closing quote.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut literal = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((literal, i + 1)),
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                let resolved = match (quote, escaped) {
                    ('"', 'n') => '\n',
                    ('"', 't') => '\t',
                    (_, other) if other == quote || other == '\\' => other,
                    _ => {
                        literal.push('\\');
                        escaped
                    }
                };
                literal.push(resolved);
                i += 2;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    Err("unterminated string literal".to_string())
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    env: &'a BTreeMap<String, String>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {expected:?}, found {token:?}")),
            None => Err(format!("expected {expected:?}, found end of expression")),
        }
    }

    fn expr(&mut self) -> Result<Scalar, String> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Scalar, String> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Scalar, String> {
        if let Some(Token::Op('-')) = self.peek() {
            self.pos += 1;
            return match self.unary()? {
                Scalar::Int(i) => i
                    .checked_neg()
                    .map(Scalar::Int)
                    .ok_or_else(|| "integer overflow".to_string()),
                Scalar::Float(x) => Ok(Scalar::Float(-x)),
                other => Err(format!("cannot negate {other:?}")),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Scalar, String> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Scalar::Int(i)),
            Some(Token::Float(x)) => Ok(Scalar::Float(x)),
            Some(Token::Str(s)) => Ok(Scalar::Str(s)),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "nil" => Ok(Scalar::Nil),
                "true" => Ok(Scalar::Bool(true)),
                "false" => Ok(Scalar::Bool(false)),
                "env" => self.env_call(),
                other => Err(format!("unknown identifier '{other}'")),
            },
            Some(token) => Err(format!("unexpected {token:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn env_call(&mut self) -> Result<Scalar, String> {
        self.expect(Token::LParen)?;
        let name = match self.expr()? {
            Scalar::Str(name) => name,
            other => return Err(format!("env() name must be a string, got {other:?}")),
        };
        let default = if let Some(Token::Comma) = self.peek() {
            self.pos += 1;
            Some(self.expr()?)
        } else {
            None
        };
        self.expect(Token::RParen)?;

        Ok(match self.env.get(&name) {
            Some(value) => Scalar::Str(value.clone()),
            None => default.unwrap_or(Scalar::Nil),
        })
    }
}

fn binary(op: char, lhs: Scalar, rhs: Scalar) -> Result<Scalar, String> {
    use Scalar::{Float, Int, Str};

    let overflow = || "integer overflow".to_string();
    match (op, lhs, rhs) {
        ('+', Str(a), b) => Ok(Str(format!("{a}{b}"))),
        ('+', a, Str(b)) => Ok(Str(format!("{a}{b}"))),
        ('+', Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or_else(overflow),
        ('-', Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or_else(overflow),
        ('*', Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or_else(overflow),
        ('/' | '%', Int(_), Int(0)) => Err("divided by 0".to_string()),
        ('/', Int(a), Int(b)) => a.checked_div(b).map(Int).ok_or_else(overflow),
        ('%', Int(a), Int(b)) => a.checked_rem(b).map(Int).ok_or_else(overflow),
        (op, a, b) => match (as_float(&a), as_float(&b)) {
            (Some(x), Some(y)) => Ok(Float(match op {
                '+' => x + y,
                '-' => x - y,
                '*' => x * y,
                '/' => x / y,
                _ => x % y,
            })),
            _ => Err(format!("unsupported operands for '{op}': {a:?}, {b:?}")),
        },
    }
}

fn as_float(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Int(i) => Some(*i as f64),
        Scalar::Float(x) => Some(*x),
        _ => None,
    }
}
