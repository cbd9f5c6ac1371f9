//! Evaluated constant values.

/// Array key after PHP's key normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

/// A constant expression after evaluation.
///
/// `Expr` keeps the raw source text of anything the evaluator does not
/// understand (ternaries, `new`, enum cases, unknown global constants).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<(ArrayKey, Value)>),
    Expr(String),
}

impl Value {
    /// Type name as reported by PHP's `gettype()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Expr(_) => "expression",
        }
    }

    /// String conversion used by the `.` operator; `None` for arrays and
    /// unevaluated expressions.
    pub fn to_php_string(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(true) => Some("1".to_string()),
            Self::Bool(false) => Some(String::new()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(float_to_php_string(*f)),
            Self::String(s) => Some(s.clone()),
            Self::Array(_) | Self::Expr(_) => None,
        }
    }

    /// Normalize a value used as an array key the way PHP does.
    pub fn to_array_key(&self) -> Option<ArrayKey> {
        match self {
            Self::Int(i) => Some(ArrayKey::Int(*i)),
            Self::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            Self::Float(f) if f.is_finite() => Some(ArrayKey::Int(f.trunc() as i64)),
            Self::Null => Some(ArrayKey::String(String::new())),
            Self::String(s) => Some(match canonical_int(s) {
                Some(i) => ArrayKey::Int(i),
                None => ArrayKey::String(s.clone()),
            }),
            _ => None,
        }
    }
}

/// Append or overwrite an entry, keeping the first insertion position.
pub fn array_insert(entries: &mut Vec<(ArrayKey, Value)>, key: ArrayKey, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

/// Next automatic integer key: one past the largest integer key, or 0.
pub fn next_index(entries: &[(ArrayKey, Value)]) -> i64 {
    entries
        .iter()
        .filter_map(|(k, _)| match k {
            ArrayKey::Int(i) => Some(*i),
            ArrayKey::String(_) => None,
        })
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Decimal strings without leading zeros or `+` become integer keys.
fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

/// Float string conversion: integral values lose their `.0`, so `1.0`
/// becomes `"1"` while `1.0E+20` keeps its mantissa.
fn float_to_php_string(f: f64) -> String {
    let literal = float_to_string(f);
    match literal.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => literal,
    }
}

/// Float literal formatting: shortest round-trip digits, always with a
/// decimal point or exponent, exponent form outside `[1e-4, 1e15)`.
pub fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e15).contains(&abs) {
        let formatted = format!("{f:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{mantissa}.0")
        };
        let exponent = match exponent.strip_prefix('-') {
            Some(digits) => format!("-{digits}"),
            None => format!("+{exponent}"),
        };
        return format!("{mantissa}E{exponent}");
    }
    let plain = f.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
