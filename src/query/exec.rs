//! Operation dispatch: one parsed expression becomes exactly one store call.

use crate::errors::BridgeError;
use crate::query::params::{ParamValue, bind_placeholders};
use crate::query::parse::{Operation, ParsedQuery};
use crate::query::rows::{RowSet, RowStream};
use crate::store::{CollectionHandle, DocumentStore, UpdateOptions};
use log::{debug, warn};

pub(crate) fn run(
    store: &dyn DocumentStore,
    expression: &str,
    params: &[ParamValue],
    fields: Vec<String>,
) -> Result<RowSet, BridgeError> {
    let query = ParsedQuery::parse(expression)?;
    debug!("running {} on '{}'", query.operation, query.collection);
    let stream = dispatch(store, &query, params)?;
    Ok(RowSet::new(stream, fields))
}

fn dispatch(
    store: &dyn DocumentStore,
    query: &ParsedQuery,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let handle = store.collection(&query.collection);
    match query.operation {
        Operation::Count => count(handle.as_ref(), query.operands.single(), params),
        Operation::Find => find(handle.as_ref(), query.operands.single(), params),
        Operation::FindOne => find_one(handle.as_ref(), query.operands.single(), params),
        Operation::Insert => insert(handle.as_ref(), query.operands.single(), params),
        Operation::Remove => remove(handle.as_ref(), query.operands.single(), params),
        Operation::Update => update(handle.as_ref(), query.operands.tokens(), params),
        Operation::Drop => {
            handle.drop_collection()?;
            Ok(RowStream::Empty)
        }
        Operation::Exists => exists(store, handle.as_ref()),
        Operation::Create => {
            store.create_collection(handle.name())?;
            Ok(RowStream::Empty)
        }
    }
}

fn count(
    handle: &dyn CollectionHandle,
    operand: Option<&str>,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let total = match operand {
        Some(text) => {
            let (bound, used) = bind_placeholders(text, params, 0);
            note_unconsumed(params, used);
            handle.count_documents(Some(&parse_operand(&bound)?))?
        }
        None => {
            note_unconsumed(params, 0);
            handle.count_documents(None)?
        }
    };
    Ok(RowStream::fixed(vec![total.to_string()]))
}

fn find(
    handle: &dyn CollectionHandle,
    operand: Option<&str>,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let (bound, used) = bind_placeholders(operand.unwrap_or("{}"), params, 0);
    note_unconsumed(params, used);
    let cursor = handle.find(&parse_operand(&bound)?)?;
    Ok(RowStream::Lazy(cursor))
}

fn find_one(
    handle: &dyn CollectionHandle,
    operand: Option<&str>,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let (bound, used) = bind_placeholders(operand.unwrap_or("{}"), params, 0);
    note_unconsumed(params, used);
    match handle.find_one(&parse_operand(&bound)?)? {
        Some(doc) => Ok(RowStream::fixed(vec![serde_json::to_string(&doc)?])),
        // zero matches means zero rows, not an eager NoResult
        None => Ok(RowStream::fixed(Vec::new())),
    }
}

fn insert(
    handle: &dyn CollectionHandle,
    operand: Option<&str>,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let Some(text) = operand else {
        return Err(BridgeError::MissingQuery("insert".into()));
    };
    let (bound, used) = bind_placeholders(text, params, 0);
    note_unconsumed(params, used);
    handle.insert_one(parse_operand(&bound)?)?;
    Ok(RowStream::Empty)
}

fn remove(
    handle: &dyn CollectionHandle,
    operand: Option<&str>,
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    let Some(text) = operand else {
        return Err(BridgeError::MissingQuery("remove".into()));
    };
    let (bound, used) = bind_placeholders(text, params, 0);
    note_unconsumed(params, used);
    let report = handle.delete_many(&parse_operand(&bound)?)?;
    debug!("removed {} document(s)", report.deleted);
    Ok(RowStream::Empty)
}

fn update(
    handle: &dyn CollectionHandle,
    tokens: &[String],
    params: &[ParamValue],
) -> Result<RowStream, BridgeError> {
    if tokens.is_empty() {
        return Err(BridgeError::MissingQuery("update".into()));
    }
    if tokens.len() < 2 {
        return Err(BridgeError::MissingModifier);
    }
    if tokens[0].trim().is_empty() {
        return Err(BridgeError::MissingQuery("update".into()));
    }
    let (filter_text, used) = bind_placeholders(&tokens[0], params, 0);
    let (modifier_text, used) = bind_placeholders(&tokens[1], params, used);
    note_unconsumed(params, used);
    let upsert = tokens.get(2).is_some_and(|t| parse_bool_token(t));
    let multi = tokens.get(3).is_some_and(|t| parse_bool_token(t));
    let filter = parse_operand(&filter_text)?;
    let modifier = parse_operand(&modifier_text)?;
    let options = UpdateOptions { upsert };
    let report = if multi {
        handle.update_many(&filter, &modifier, options)?
    } else {
        handle.update_one(&filter, &modifier, options)?
    };
    debug!(
        "update matched {} modified {} upserted {}",
        report.matched, report.modified, report.upserted
    );
    Ok(RowStream::Empty)
}

fn exists(
    store: &dyn DocumentStore,
    handle: &dyn CollectionHandle,
) -> Result<RowStream, BridgeError> {
    let present = store.list_collection_names()?.iter().any(|n| n == handle.name());
    Ok(RowStream::fixed(vec![present.to_string()]))
}

/// Parses bound operand text as one JSON object and converts it to BSON.
fn parse_operand(text: &str) -> Result<bson::Document, BridgeError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| BridgeError::InvalidOperand(format!("{text}: {e}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(BridgeError::InvalidOperand(format!("not a JSON object: {text}")));
    };
    Ok(bson::Document::try_from(map)?)
}

/// The literal `true` in any case; everything else, including junk, is
/// false.
fn parse_bool_token(token: &str) -> bool {
    token.trim().eq_ignore_ascii_case("true")
}

fn note_unconsumed(params: &[ParamValue], used: usize) {
    if used < params.len() {
        warn!("{} bound parameter(s) were not consumed", params.len() - used);
    }
}
