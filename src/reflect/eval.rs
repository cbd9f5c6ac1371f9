//! Constant expression evaluator.
//!
//! Covers the subset of PHP constant expressions that appears in class
//! constants and default values. Anything outside it evaluates to
//! [`Value::Expr`] carrying the raw source text.

use super::lexer::{Token, TokenKind};
use super::ConstExpr;
use crate::value::{array_insert, next_index, ArrayKey, Value};

/// Reference chains deeper than this are treated as unevaluable.
const MAX_DEPTH: usize = 16;

/// Resolves `Class::NAME` references during evaluation.
pub trait ConstantLookup {
    fn class_constant(&self, class: &str, name: &str, depth: usize) -> Option<Value>;
}

/// Lookup for expressions evaluated without any class context.
pub struct NoLookup;

impl ConstantLookup for NoLookup {
    fn class_constant(&self, _class: &str, _name: &str, _depth: usize) -> Option<Value> {
        None
    }
}

pub fn evaluate(expr: &ConstExpr, lookup: &dyn ConstantLookup, depth: usize) -> Value {
    if depth > MAX_DEPTH || expr.tokens.is_empty() {
        return Value::Expr(expr.raw.clone());
    }
    let mut evaluator = Evaluator {
        tokens: &expr.tokens,
        pos: 0,
        expr,
        lookup,
        depth,
    };
    match evaluator.expression(0) {
        Some(value) if evaluator.pos == expr.tokens.len() => value,
        _ => Value::Expr(expr.raw.clone()),
    }
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    expr: &'a ConstExpr,
    lookup: &'a dyn ConstantLookup,
    depth: usize,
}

fn binary_precedence(tok: &Token) -> Option<u8> {
    if tok.kind != TokenKind::Punct {
        return None;
    }
    match tok.text.as_str() {
        "|" => Some(1),
        "^" => Some(2),
        "&" => Some(3),
        "<<" | ">>" => Some(4),
        "." => Some(5),
        "+" | "-" => Some(6),
        "*" | "/" | "%" => Some(7),
        _ => None,
    }
}

impl Evaluator<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek().is_some_and(|t| t.is(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expression(&mut self, min_precedence: u8) -> Option<Value> {
        let mut lhs = self.unary()?;
        while let Some(tok) = self.peek() {
            let Some(precedence) = binary_precedence(tok) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let op = tok.text.clone();
            self.pos += 1;
            let rhs = self.expression(precedence + 1)?;
            lhs = apply_binary(&op, lhs, rhs)?;
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<Value> {
        if self.eat("-") {
            return match self.unary()? {
                Value::Int(i) => Some(
                    i.checked_neg()
                        .map_or(Value::Float(-(i as f64)), Value::Int),
                ),
                Value::Float(f) => Some(Value::Float(-f)),
                _ => None,
            };
        }
        if self.eat("+") {
            return match self.unary()? {
                v @ (Value::Int(_) | Value::Float(_)) => Some(v),
                _ => None,
            };
        }
        if self.eat("(") {
            let inner = self.expression(0)?;
            return self.eat(")").then_some(inner);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Value> {
        let tok = self.peek()?.clone();
        self.pos += 1;
        match tok.kind {
            TokenKind::Integer => Some(parse_integer(&tok.text)),
            TokenKind::Float => tok.text.replace('_', "").parse().ok().map(Value::Float),
            TokenKind::String => decode_string(&tok.text).map(Value::String),
            TokenKind::Heredoc => decode_heredoc(&tok.text).map(Value::String),
            TokenKind::Punct if tok.text == "[" => self.array("]"),
            TokenKind::Name => self.name(&tok),
            _ => None,
        }
    }

    fn name(&mut self, tok: &Token) -> Option<Value> {
        let lower = tok.text.to_ascii_lowercase();
        match lower.trim_start_matches('\\') {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            "null" => return Some(Value::Null),
            "array" if self.peek().is_some_and(|t| t.is("(")) => {
                self.pos += 1;
                return self.array(")");
            }
            _ => {}
        }
        if self.eat("::") {
            let member = self.peek()?.clone();
            if member.kind != TokenKind::Name {
                return None;
            }
            self.pos += 1;
            let class = self.class_name(&tok.text)?;
            if member.text.eq_ignore_ascii_case("class") {
                return Some(Value::String(class));
            }
            return self
                .lookup
                .class_constant(&class, &member.text, self.depth + 1)
                .filter(|v| !matches!(v, Value::Expr(_)));
        }
        global_constant(tok.text.trim_start_matches('\\'))
    }

    fn class_name(&self, name: &str) -> Option<String> {
        let scope = self.expr.scope.as_deref();
        match name.to_ascii_lowercase().as_str() {
            "self" | "static" => scope.map(|s| s.class_name.clone()),
            "parent" => scope.and_then(|s| s.parent.clone()),
            _ => Some(match scope {
                Some(s) => s.names.resolve_class(name),
                None => name.trim_start_matches('\\').to_string(),
            }),
        }
    }

    fn array(&mut self, close: &str) -> Option<Value> {
        let mut entries: Vec<(ArrayKey, Value)> = Vec::new();
        loop {
            if self.eat(close) {
                return Some(Value::Array(entries));
            }
            if self.peek().is_some_and(|t| t.is("...")) {
                return None;
            }
            let first = self.expression(0)?;
            if self.eat("=>") {
                let key = first.to_array_key()?;
                let value = self.expression(0)?;
                array_insert(&mut entries, key, value);
            } else {
                let key = ArrayKey::Int(next_index(&entries));
                array_insert(&mut entries, key, first);
            }
            if !self.eat(",") {
                return self.eat(close).then_some(Value::Array(entries));
            }
        }
    }
}

fn apply_binary(op: &str, lhs: Value, rhs: Value) -> Option<Value> {
    if op == "." {
        let mut out = lhs.to_php_string()?;
        out.push_str(&rhs.to_php_string()?);
        return Some(Value::String(out));
    }
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, a, b),
        (a, b) => {
            let (x, y) = (as_float(&a)?, as_float(&b)?);
            match op {
                "+" => Some(Value::Float(x + y)),
                "-" => Some(Value::Float(x - y)),
                "*" => Some(Value::Float(x * y)),
                "/" if y != 0.0 => Some(Value::Float(x / y)),
                _ => None,
            }
        }
    }
}

fn int_binary(op: &str, a: i64, b: i64) -> Option<Value> {
    let value = match op {
        "+" => a.checked_add(b).map_or(Value::Float(a as f64 + b as f64), Value::Int),
        "-" => a.checked_sub(b).map_or(Value::Float(a as f64 - b as f64), Value::Int),
        "*" => a.checked_mul(b).map_or(Value::Float(a as f64 * b as f64), Value::Int),
        "/" if b == 0 => return None,
        "/" if a.checked_rem(b) == Some(0) => Value::Int(a.checked_div(b)?),
        "/" => Value::Float(a as f64 / b as f64),
        "%" => Value::Int(a.checked_rem(b)?),
        "|" => Value::Int(a | b),
        "&" => Value::Int(a & b),
        "^" => Value::Int(a ^ b),
        "<<" => Value::Int(a.checked_shl(u32::try_from(b).ok()?)?),
        ">>" => Value::Int(a.checked_shr(u32::try_from(b).ok()?)?),
        _ => return None,
    };
    Some(value)
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Value {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8)
    } else {
        lower.parse()
    };
    match parsed {
        Ok(i) => Value::Int(i),
        // Out-of-range integer literals become floats.
        Err(_) => Value::Float(lower.parse().unwrap_or(f64::INFINITY)),
    }
}

fn global_constant(name: &str) -> Option<Value> {
    let value = match name {
        "PHP_EOL" => Value::String("\n".to_string()),
        "PHP_INT_MAX" => Value::Int(i64::MAX),
        "PHP_INT_MIN" => Value::Int(i64::MIN),
        "PHP_INT_SIZE" => Value::Int(8),
        "PHP_FLOAT_EPSILON" => Value::Float(f64::EPSILON),
        "PHP_FLOAT_MAX" => Value::Float(f64::MAX),
        "DIRECTORY_SEPARATOR" => Value::String("/".to_string()),
        "M_PI" => Value::Float(std::f64::consts::PI),
        "INF" => Value::Float(f64::INFINITY),
        "NAN" => Value::Float(f64::NAN),
        _ => return None,
    };
    Some(value)
}

/// Decode a quoted string literal; interpolating strings yield `None`.
pub fn decode_string(text: &str) -> Option<String> {
    if text.len() < 2 {
        return None;
    }
    let body = &text[1..text.len() - 1];
    match text.as_bytes()[0] {
        b'\'' => Some(unescape_single(body)),
        b'"' => unescape_double(body),
        _ => None,
    }
}

fn unescape_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn unescape_double(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_' || *n == '{') =>
            {
                return None;
            }
            '{' if chars.peek() == Some(&'$') => return None,
            '\\' => {
                let Some(next) = chars.next() else {
                    out.push('\\');
                    break;
                };
                match next {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'v' => out.push('\u{0B}'),
                    'e' => out.push('\u{1B}'),
                    'f' => out.push('\u{0C}'),
                    '\\' => out.push('\\'),
                    '$' => out.push('$'),
                    '"' => out.push('"'),
                    '0'..='7' => {
                        let mut code = next.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            match chars.peek().and_then(|d| d.to_digit(8)) {
                                Some(d) => {
                                    code = code * 8 + d;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(code & 0xFF).unwrap_or('\u{FFFD}'));
                    }
                    'x' if chars.peek().is_some_and(char::is_ascii_hexdigit) => {
                        let mut code = 0;
                        for _ in 0..2 {
                            match chars.peek().and_then(|d| d.to_digit(16)) {
                                Some(d) => {
                                    code = code * 16 + d;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    'u' if chars.peek() == Some(&'{') => {
                        chars.next();
                        let hex: String = chars.by_ref().take_while(|&d| d != '}').collect();
                        let code = u32::from_str_radix(&hex, 16).ok()?;
                        out.push(char::from_u32(code)?);
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Decode a heredoc or nowdoc token, removing the closing marker's indentation.
fn decode_heredoc(text: &str) -> Option<String> {
    let (header, rest) = text.split_once('\n')?;
    let nowdoc = header.contains('\'');
    let (body, closing) = rest.rsplit_once('\n').unwrap_or(("", rest));
    let indent = closing.len() - closing.trim_start().len();
    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.get(indent..).unwrap_or(line.trim_start()))
        .collect();
    let joined = lines.join("\n");
    if nowdoc {
        Some(joined)
    } else {
        unescape_double(&joined)
    }
}
