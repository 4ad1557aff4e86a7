//! Bound parameters and placeholder substitution.

use serde_json::Value;

/// Marker character replaced by bound parameters.
pub const PLACEHOLDER: char = '#';

/// One typed value bound into an operand.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl ParamValue {
    /// JSON textual form spliced into operand text: strings are quoted and
    /// escaped, the rest use their JSON literal representation.
    #[must_use]
    pub fn render(&self) -> String {
        Value::from(self).to_string()
    }
}

impl From<&ParamValue> for Value {
    fn from(p: &ParamValue) -> Self {
        match p {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Value::from(*f),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Null => Value::Null,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Replaces each marker with the next unconsumed parameter, starting at
/// `offset`. Markers beyond the end of the parameter list stay literal.
/// Returns the bound text and the new offset, which callers thread into the
/// substitution of the next operand of the same operation.
pub fn bind_placeholders(text: &str, params: &[ParamValue], offset: usize) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut next = offset;
    for c in text.chars() {
        if c == PLACEHOLDER
            && let Some(p) = params.get(next)
        {
            out.push_str(&p.render());
            next += 1;
            continue;
        }
        out.push(c);
    }
    (out, next)
}
