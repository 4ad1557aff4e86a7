//! Row streaming over operation results.

use crate::errors::BridgeError;
use crate::query::extract::{self, RESULT_COLUMN, ResultEntry};
use crate::store::DocumentCursor;

/// Raw row source: a live cursor for find, a pre-rendered list for the
/// single-row operations, or nothing at all for writes.
pub(crate) enum RowStream {
    Lazy(Box<dyn DocumentCursor>),
    Fixed { rows: Vec<String>, pos: usize },
    Empty,
}

impl RowStream {
    pub(crate) fn fixed(rows: Vec<String>) -> Self {
        Self::Fixed { rows, pos: 0 }
    }

    fn try_advance(&mut self) -> Result<Option<String>, BridgeError> {
        match self {
            Self::Lazy(cursor) => match cursor.try_next()? {
                Some(doc) => Ok(Some(serde_json::to_string(&doc)?)),
                None => Ok(None),
            },
            Self::Fixed { rows, pos } => {
                let row = rows.get(*pos).cloned();
                if row.is_some() {
                    *pos += 1;
                }
                Ok(row)
            }
            Self::Empty => Ok(None),
        }
    }
}

/// Forward-only row sequence handed back to callers.
///
/// `has_next` peeks one raw row ahead; `next_entry` maps it through field
/// extraction. Once exhausted, or after any error, the sequence is done:
/// further `next_entry` calls fail with `NoResult` and iteration yields
/// nothing more. Dropping the set early releases the underlying cursor.
pub struct RowSet {
    stream: RowStream,
    fields: Vec<String>,
    pending: Option<Result<String, BridgeError>>,
    done: bool,
}

impl RowSet {
    pub(crate) fn new(stream: RowStream, fields: Vec<String>) -> Self {
        Self { stream, fields, pending: None, done: false }
    }

    /// Fixed single-column descriptor for callers not using nested paths.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        vec![RESULT_COLUMN.to_string()]
    }

    /// The field paths this set projects into each entry.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// True when another row can be produced. A stream error also counts as
    /// "another row": it surfaces from the following `next_entry` call, so
    /// this stays a plain boolean.
    pub fn has_next(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.pending.is_some() {
            return true;
        }
        match self.stream.try_advance() {
            Ok(Some(raw)) => {
                self.pending = Some(Ok(raw));
                true
            }
            Ok(None) => {
                self.done = true;
                false
            }
            Err(e) => {
                self.pending = Some(Err(e));
                true
            }
        }
    }

    /// Produces the next mapped row.
    ///
    /// # Errors
    /// `NoResult` when the sequence is exhausted or was never
    /// result-bearing; `DataExtraction` when the row cannot be mapped
    /// (terminating the sequence); store errors from the underlying cursor.
    pub fn next_entry(&mut self) -> Result<ResultEntry, BridgeError> {
        if self.done {
            return Err(BridgeError::NoResult);
        }
        let raw = match self.pending.take() {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                self.done = true;
                return Err(e);
            }
            None => match self.stream.try_advance() {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    self.done = true;
                    return Err(BridgeError::NoResult);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            },
        };
        match extract::build_entry(&raw, &self.fields) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RowSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSet")
            .field("fields", &self.fields)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Iterator for RowSet {
    type Item = Result<ResultEntry, BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() { Some(self.next_entry()) } else { None }
    }
}
