//! Result-row field extraction.

use crate::errors::BridgeError;
use serde_json::Value;

/// Column name bound to the whole raw result; also the root token every
/// resolvable field path starts with.
pub const RESULT_COLUMN: &str = "result";

/// One mapped row: requested path to extracted text, in request order.
///
/// A path rooted outside the reserved alias is carried with no value so the
/// caller still sees every column it asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultEntry {
    values: Vec<(String, Option<String>)>,
}

impl ResultEntry {
    /// Looks up a column. `None` covers both "not requested" and
    /// "unresolved".
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.iter().find(|(name, _)| name == column).and_then(|(_, v)| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push(&mut self, name: &str, value: Option<String>) {
        self.values.push((name.to_string(), value));
    }
}

/// Maps one raw result row onto the requested field paths.
///
/// JSON-object rows resolve every path; anything else falls back to the
/// count/boolean forms and binds the reserved alias column alone.
pub(crate) fn build_entry(raw: &str, fields: &[String]) -> Result<ResultEntry, BridgeError> {
    if let Ok(root @ Value::Object(_)) = serde_json::from_str::<Value>(raw) {
        let mut entry = ResultEntry::default();
        for field in fields {
            entry.push(field, extract_path(&root, raw, field)?);
        }
        return Ok(entry);
    }
    fallback_entry(raw)
}

fn fallback_entry(raw: &str) -> Result<ResultEntry, BridgeError> {
    let trimmed = raw.trim();
    let numeric = trimmed.parse::<u64>().is_ok();
    let boolean = trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false");
    if numeric || boolean {
        let mut entry = ResultEntry::default();
        entry.push(RESULT_COLUMN, Some(raw.to_string()));
        Ok(entry)
    } else {
        Err(BridgeError::DataExtraction(format!("cannot interpret result text: {raw}")))
    }
}

/// Resolves one field path against the parsed row. Paths rooted outside the
/// reserved alias are unresolved (`Ok(None)`); the bare alias binds the whole
/// raw text.
fn extract_path(root: &Value, raw: &str, path: &str) -> Result<Option<String>, BridgeError> {
    let mut segments = path.split('.');
    let head = segments.next().unwrap_or("");
    if head != RESULT_COLUMN {
        return Ok(None);
    }
    let rest: Vec<&str> = segments.collect();
    let Some((last, inner)) = rest.split_last() else {
        return Ok(Some(raw.to_string()));
    };
    let mut cur = root;
    for seg in inner {
        cur = step(cur, seg, path)?;
    }
    let value = step(cur, last, path)?;
    match scalar_text(value) {
        Some(text) => Ok(Some(text)),
        None => Err(path_error(path, "value is not a scalar")),
    }
}

fn step<'a>(cur: &'a Value, segment: &str, path: &str) -> Result<&'a Value, BridgeError> {
    let seg = parse_segment(segment).map_err(|msg| path_error(path, msg))?;
    let Value::Object(map) = cur else {
        return Err(path_error(path, "expected an object"));
    };
    let mut value = map.get(seg.key).ok_or_else(|| path_error(path, "missing key"))?;
    if let Some(idx) = seg.index {
        let Value::Array(items) = value else {
            return Err(path_error(path, "expected an array"));
        };
        value = items.get(idx).ok_or_else(|| path_error(path, "index out of range"))?;
    }
    Ok(value)
}

struct Segment<'a> {
    key: &'a str,
    index: Option<usize>,
}

/// `items[2]` -> key `items`, index 2. Index syntax errors surface as
/// extraction failures, the same as unresolvable keys.
fn parse_segment(text: &str) -> Result<Segment<'_>, &'static str> {
    match text.find('[') {
        None => Ok(Segment { key: text, index: None }),
        Some(open) => {
            let close = text.find(']').ok_or("unterminated index")?;
            if close <= open {
                return Err("malformed index");
            }
            let idx: usize = text[open + 1..close].parse().map_err(|_| "malformed index")?;
            Ok(Segment { key: &text[..open], index: Some(idx) })
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Object(_) | Value::Array(_) => None,
    }
}

fn path_error(path: &str, detail: &str) -> BridgeError {
    BridgeError::DataExtraction(format!("cannot resolve '{path}': {detail}"))
}
