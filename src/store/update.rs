//! Update-modifier application.

use crate::errors::BridgeError;
use bson::{Bson, Document};

/// Applies `modifier` to `doc` in place. Returns whether the document
/// changed.
///
/// A modifier whose keys all start with `$` is applied operator by operator
/// (`$set`, `$inc`, `$unset`); a modifier with no `$` keys replaces the whole
/// document while keeping the existing `_id`. Mixing the two is an error.
pub fn apply_modifier(doc: &mut Document, modifier: &Document) -> Result<bool, BridgeError> {
    let ops = modifier.keys().filter(|k| k.starts_with('$')).count();
    if ops == 0 {
        return Ok(replace_document(doc, modifier));
    }
    if ops != modifier.len() {
        return Err(BridgeError::Execution("update mixes operators and plain fields".into()));
    }
    let mut changed = false;
    for (op, arg) in modifier {
        let Bson::Document(fields) = arg else {
            return Err(BridgeError::Execution(format!("{op} expects a document")));
        };
        for (path, value) in fields {
            let did = match op.as_str() {
                "$set" => set_path(doc, path, value.clone()),
                "$inc" => inc_path(doc, path, value)?,
                "$unset" => unset_path(doc, path),
                other => {
                    return Err(BridgeError::Execution(format!(
                        "unsupported update operator: {other}"
                    )));
                }
            };
            changed |= did;
        }
    }
    Ok(changed)
}

/// Builds the starting document for an upsert: the filter's top-level
/// equality clauses, with operator documents and logical connectives
/// skipped. Dotted keys seed nested documents.
pub fn seed_from_filter(filter: &Document) -> Document {
    let mut seed = Document::new();
    for (key, value) in filter {
        if key.starts_with('$') {
            continue;
        }
        if let Bson::Document(spec) = value
            && spec.keys().any(|k| k.starts_with('$'))
        {
            continue;
        }
        set_path(&mut seed, key, value.clone());
    }
    seed
}

fn replace_document(doc: &mut Document, replacement: &Document) -> bool {
    let mut next = Document::new();
    if let Some(id) = doc.get("_id") {
        next.insert("_id", id.clone());
    }
    for (key, value) in replacement {
        if key != "_id" {
            next.insert(key.clone(), value.clone());
        }
    }
    let changed = *doc != next;
    *doc = next;
    changed
}

fn ensure_subdoc<'a>(root: &'a mut Document, key: &str) -> &'a mut Document {
    let needs_new = !matches!(root.get(key), Some(Bson::Document(_)));
    if needs_new {
        root.insert(key.to_string(), Bson::Document(Document::new()));
    }
    match root.get_mut(key) {
        Some(Bson::Document(d)) => d,
        _ => unreachable!(),
    }
}

fn traverse_to_parent<'a>(root: &'a mut Document, path: &str) -> (&'a mut Document, String) {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    let mut last = String::new();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            last = seg.to_string();
            break;
        }
        cur = ensure_subdoc(cur, seg);
    }
    (cur, last)
}

fn set_path(root: &mut Document, path: &str, value: Bson) -> bool {
    let (parent, last) = traverse_to_parent(root, path);
    let old = parent.insert(last, value.clone());
    old.as_ref() != Some(&value)
}

/// Removes the value at `path` without creating intermediate documents.
fn unset_path(root: &mut Document, path: &str) -> bool {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.remove(seg).is_some();
        }
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return false,
        }
    }
    false
}

fn get_path_cloned(root: &Document, path: &str) -> Option<Bson> {
    let mut cur = root;
    let mut iter = path.split('.').peekable();
    while let Some(seg) = iter.next() {
        if iter.peek().is_none() {
            return cur.get(seg).cloned();
        }
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

enum Num {
    I(i64),
    F(f64),
}

fn as_num(v: &Bson) -> Option<Num> {
    match v {
        Bson::Int32(i) => Some(Num::I(i64::from(*i))),
        Bson::Int64(i) => Some(Num::I(*i)),
        Bson::Double(f) => Some(Num::F(*f)),
        _ => None,
    }
}

fn inc_path(root: &mut Document, path: &str, by: &Bson) -> Result<bool, BridgeError> {
    let step = as_num(by)
        .ok_or_else(|| BridgeError::Execution("$inc expects a numeric argument".into()))?;
    let next = match get_path_cloned(root, path) {
        None => by.clone(),
        Some(cur) => {
            let base = as_num(&cur).ok_or_else(|| {
                BridgeError::Execution(format!("$inc target '{path}' is not numeric"))
            })?;
            match (base, step) {
                (Num::I(a), Num::I(b)) => Bson::Int64(a.checked_add(b).ok_or_else(|| {
                    BridgeError::Execution(format!("$inc overflow at '{path}'"))
                })?),
                (Num::I(a), Num::F(b)) => Bson::Double(a as f64 + b),
                (Num::F(a), Num::I(b)) => Bson::Double(a + b as f64),
                (Num::F(a), Num::F(b)) => Bson::Double(a + b),
            }
        }
    };
    Ok(set_path(root, path, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn set_creates_nested_paths() {
        let mut d = doc! { "_id": "1" };
        let changed = apply_modifier(&mut d, &doc! { "$set": { "a.b": 5 } }).unwrap();
        assert!(changed);
        assert_eq!(d, doc! { "_id": "1", "a": { "b": 5 } });
        // setting the same value again is a no-op
        assert!(!apply_modifier(&mut d, &doc! { "$set": { "a.b": 5 } }).unwrap());
    }

    #[test]
    fn inc_preserves_integer_arithmetic() {
        let mut d = doc! { "n": 1 };
        apply_modifier(&mut d, &doc! { "$inc": { "n": 2 } }).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Int64(3)));
        apply_modifier(&mut d, &doc! { "$inc": { "n": 0.5 } }).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Double(3.5)));
    }

    #[test]
    fn inc_on_missing_field_inserts_the_step() {
        let mut d = doc! {};
        apply_modifier(&mut d, &doc! { "$inc": { "n": 4 } }).unwrap();
        assert_eq!(d.get("n"), Some(&Bson::Int32(4)));
    }

    #[test]
    fn inc_rejects_non_numeric_targets() {
        let mut d = doc! { "n": "abc" };
        assert!(apply_modifier(&mut d, &doc! { "$inc": { "n": 1 } }).is_err());
        assert!(apply_modifier(&mut d, &doc! { "$inc": { "m": "x" } }).is_err());
    }

    #[test]
    fn unset_removes_and_reports() {
        let mut d = doc! { "a": { "b": 1 }, "c": 2 };
        assert!(apply_modifier(&mut d, &doc! { "$unset": { "a.b": "" } }).unwrap());
        assert!(!apply_modifier(&mut d, &doc! { "$unset": { "absent": "" } }).unwrap());
        // unsetting under a missing parent neither errors nor creates it
        assert!(!apply_modifier(&mut d, &doc! { "$unset": { "x.y": "" } }).unwrap());
        assert_eq!(d, doc! { "a": {}, "c": 2 });
    }

    #[test]
    fn replacement_keeps_id() {
        let mut d = doc! { "_id": "k", "old": 1 };
        let changed = apply_modifier(&mut d, &doc! { "fresh": true }).unwrap();
        assert!(changed);
        assert_eq!(d, doc! { "_id": "k", "fresh": true });
    }

    #[test]
    fn mixed_modifier_is_rejected() {
        let mut d = doc! {};
        assert!(apply_modifier(&mut d, &doc! { "$set": { "a": 1 }, "b": 2 }).is_err());
    }

    #[test]
    fn upsert_seed_takes_equality_fields_only() {
        let filter = doc! { "name": "ada", "age": { "$gt": 30 }, "$or": [], "address.city": "x" };
        let seed = seed_from_filter(&filter);
        assert_eq!(seed, doc! { "name": "ada", "address": { "city": "x" } });
    }
}
