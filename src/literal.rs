//! PHP source literals for evaluated values, in short array syntax.

use crate::value::{float_to_string, ArrayKey, Value};

const INDENT: &str = "  ";

/// Render `value` as it would be written in PHP source.
pub fn render_literal(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(i) => write_int(out, *i),
        Value::Float(f) => out.push_str(&float_to_string(*f)),
        Value::String(s) => write_string(out, s),
        Value::Expr(raw) => out.push_str(raw),
        Value::Array(entries) if entries.is_empty() => out.push_str("[]"),
        Value::Array(entries) => {
            out.push_str("[\n");
            for (key, item) in entries {
                out.push_str(&INDENT.repeat(level + 1));
                match key {
                    ArrayKey::Int(i) => write_int(out, *i),
                    ArrayKey::String(s) => write_string(out, s),
                }
                out.push_str(" => ");
                write_value(out, item, level + 1);
                out.push_str(",\n");
            }
            out.push_str(&INDENT.repeat(level));
            out.push(']');
        }
    }
}

/// `i64::MIN` has no decimal literal in PHP; `var_export` writes it as a
/// subtraction.
fn write_int(out: &mut String, i: i64) {
    if i == i64::MIN {
        out.push_str(&format!("{}-1", i64::MIN + 1));
    } else {
        out.push_str(&i.to_string());
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
}
