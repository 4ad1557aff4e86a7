//! Filter evaluation over BSON documents.
//!
//! Filters are plain BSON documents in the store's query shape: field
//! equality, per-field operator documents (`$eq`, `$ne`, `$gt`, `$gte`,
//! `$lt`, `$lte`, `$in`, `$nin`, `$exists`, plus `$regex` behind the `regex`
//! feature) and the logical connectives `$and`, `$or`, `$nor`. Top-level
//! clauses are conjoined. `$ne` and `$nin` match documents missing the field;
//! the remaining comparisons do not.

use crate::errors::BridgeError;
use bson::{Bson, Document};
use std::cmp::Ordering;

pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;

/// Evaluates `filter` against one stored document.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool, BridgeError> {
    for (key, cond) in filter {
        let hit = match key.as_str() {
            "$and" => {
                let mut all = true;
                for branch in clause_list(cond, key)? {
                    if !matches(doc, branch)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_branch(doc, cond, key)?,
            "$nor" => !any_branch(doc, cond, key)?,
            _ => field_matches(doc, key, cond)?,
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_branch(doc: &Document, cond: &Bson, op: &str) -> Result<bool, BridgeError> {
    for branch in clause_list(cond, op)? {
        if matches(doc, branch)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn clause_list<'a>(
    cond: &'a Bson,
    op: &str,
) -> Result<impl Iterator<Item = &'a Document>, BridgeError> {
    let Bson::Array(items) = cond else {
        return Err(BridgeError::Execution(format!("{op} expects an array of documents")));
    };
    let mut branches = Vec::with_capacity(items.len());
    for item in items {
        let Bson::Document(d) = item else {
            return Err(BridgeError::Execution(format!("{op} expects an array of documents")));
        };
        branches.push(d);
    }
    Ok(branches.into_iter())
}

fn field_matches(doc: &Document, path: &str, cond: &Bson) -> Result<bool, BridgeError> {
    let value = get_path(doc, path);
    match cond {
        Bson::Document(spec) if operator_document(spec)? => {
            #[cfg(feature = "regex")]
            let case_insensitive =
                spec.get_str("$options").map(|o| o.contains('i')).unwrap_or(false);
            for (op, operand) in spec {
                #[cfg(feature = "regex")]
                if op == "$options" && spec.contains_key("$regex") {
                    continue;
                }
                let hit = match op.as_str() {
                    "$eq" => value.is_some_and(|v| bson_eq(v, operand)),
                    "$ne" => !value.is_some_and(|v| bson_eq(v, operand)),
                    "$gt" => cmp_hit(value, operand, |o| o == Ordering::Greater),
                    "$gte" => cmp_hit(value, operand, |o| o != Ordering::Less),
                    "$lt" => cmp_hit(value, operand, |o| o == Ordering::Less),
                    "$lte" => cmp_hit(value, operand, |o| o != Ordering::Greater),
                    "$in" => {
                        let set = set_operand(operand, op)?;
                        value.is_some_and(|v| in_set(v, set))
                    }
                    "$nin" => {
                        let set = set_operand(operand, op)?;
                        !value.is_some_and(|v| in_set(v, set))
                    }
                    "$exists" => {
                        let Bson::Boolean(want) = operand else {
                            return Err(BridgeError::Execution(
                                "$exists expects a boolean".into(),
                            ));
                        };
                        value.is_some() == *want
                    }
                    #[cfg(feature = "regex")]
                    "$regex" => regex_hit(value, operand, case_insensitive)?,
                    other => {
                        return Err(BridgeError::Execution(format!(
                            "unsupported filter operator: {other}"
                        )));
                    }
                };
                if !hit {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(value.is_some_and(|v| bson_eq(v, cond))),
    }
}

/// True when every key of `spec` is an operator, false when none is.
/// A mix of the two is rejected.
fn operator_document(spec: &Document) -> Result<bool, BridgeError> {
    let ops = spec.keys().filter(|k| k.starts_with('$')).count();
    if ops == 0 {
        Ok(false)
    } else if ops == spec.len() {
        Ok(true)
    } else {
        Err(BridgeError::Execution("filter mixes operators and plain fields".into()))
    }
}

fn cmp_hit(value: Option<&Bson>, operand: &Bson, want: fn(Ordering) -> bool) -> bool {
    value.is_some_and(|v| want(compare_bson(v, operand)))
}

fn set_operand<'a>(operand: &'a Bson, op: &str) -> Result<&'a [Bson], BridgeError> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(BridgeError::Execution(format!("{op} expects an array"))),
    }
}

fn in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| bson_eq(v, x))
}

#[cfg(feature = "regex")]
fn regex_hit(
    value: Option<&Bson>,
    operand: &Bson,
    case_insensitive: bool,
) -> Result<bool, BridgeError> {
    let Bson::String(pattern) = operand else {
        return Err(BridgeError::Execution("$regex expects a string pattern".into()));
    };
    if let Some(Bson::String(s)) = value {
        let mut re = regex::RegexBuilder::new(pattern);
        re.case_insensitive(case_insensitive);
        if let Ok(r) = re.build() { Ok(r.is_match(s)) } else { Ok(false) }
    } else {
        Ok(false)
    }
}

/// Equality with numeric coercion across int widths and doubles.
fn bson_eq(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b)) == Ordering::Equal;
    }
    a == b
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Total order over BSON values: numerics compare by magnitude, strings and
/// booleans natively, everything else by type rank.
pub(crate) fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) => 2,
        Bson::Int64(_) => 3,
        Bson::Double(_) => 4,
        Bson::String(_) => 5,
        Bson::Array(_) => 6,
        Bson::Document(_) => 7,
        Bson::Binary(_) => 8,
        Bson::ObjectId(_) => 9,
        Bson::DateTime(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::Timestamp(_) => 12,
        Bson::Symbol(_) => 13,
        Bson::Decimal128(_) => 14,
        Bson::Undefined => 15,
        Bson::DbPointer(_) => 16,
        Bson::JavaScriptCode(_) => 17,
        Bson::JavaScriptCodeWithScope(_) => 18,
        Bson::MaxKey => 250,
        Bson::MinKey => 251,
    }
}

/// Resolves a dotted path against nested documents. Array elements are not
/// addressable here; only document nesting is traversed.
pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() > MAX_PATH_DEPTH {
        return None;
    }
    let mut cur = doc;
    for (i, part) in parts.iter().enumerate() {
        let v = cur.get(part)?;
        if i + 1 == parts.len() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}
