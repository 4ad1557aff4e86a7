//! Expression parsing.
//!
//! Grammar: `<collection>.<operation>(<operand>)`. The scanner anchors on
//! the first `(`, takes the last `.` before it to split the collection from
//! the operation label, and the last `)` to close the operand. Text after
//! the closing `)` is ignored. Operands may therefore contain dots, nested
//! braces, and parenthesized strings without confusing the scanner.

use crate::errors::BridgeError;

/// Operations the adapter can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    Find,
    FindOne,
    Insert,
    Remove,
    Update,
    Drop,
    Exists,
    Create,
}

impl Operation {
    /// Label table; matching is exact and case-sensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "count" => Self::Count,
            "find" => Self::Find,
            "findOne" => Self::FindOne,
            "insert" => Self::Insert,
            "remove" => Self::Remove,
            "update" => Self::Update,
            "drop" => Self::Drop,
            "exists" => Self::Exists,
            "create" => Self::Create,
            _ => return None,
        })
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Find => "find",
            Self::FindOne => "findOne",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Drop => "drop",
            Self::Exists => "exists",
            Self::Create => "create",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operand tokens attached to a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandList {
    /// Single optional literal (every operation except update).
    Single(Option<String>),
    /// Update's comma-split tokens: filter, modifier, then optional flags.
    Split(Vec<String>),
}

impl OperandList {
    #[must_use]
    pub fn single(&self) -> Option<&str> {
        match self {
            Self::Single(operand) => operand.as_deref(),
            Self::Split(tokens) => tokens.first().map(String::as_str),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Split(tokens) => tokens,
            Self::Single(_) => &[],
        }
    }
}

/// A query expression reduced to its three parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub collection: String,
    pub operation: Operation,
    pub operands: OperandList,
}

impl ParsedQuery {
    /// Parses an expression such as `users.find({"age": {"$gt": 30}})`.
    ///
    /// # Errors
    /// `MalformedQuery` when the collection, label, or argument list cannot
    /// be located; `UnsupportedOperation` for an unknown label.
    pub fn parse(expression: &str) -> Result<Self, BridgeError> {
        let text = expression.trim();
        let open = text.find('(').ok_or_else(|| malformed("missing operation argument list"))?;
        let head = &text[..open];
        let dot = head.rfind('.').ok_or_else(|| malformed("collection not specified"))?;
        let collection = head[..dot].trim();
        if collection.is_empty() {
            return Err(malformed("collection not specified"));
        }
        let label = head[dot + 1..].trim();
        if label.is_empty() {
            return Err(malformed("operation not specified"));
        }
        let operation = Operation::from_label(label)
            .ok_or_else(|| BridgeError::UnsupportedOperation(label.to_string()))?;
        let tail = &text[open + 1..];
        let close = tail.rfind(')').ok_or_else(|| malformed("unterminated argument list"))?;
        let operand_text = tail[..close].trim();
        let operands = if operation == Operation::Update {
            OperandList::Split(split_update_operand(operand_text))
        } else if operand_text.is_empty() {
            OperandList::Single(None)
        } else {
            OperandList::Single(Some(strip_quotes(operand_text).to_string()))
        };
        Ok(Self { collection: collection.to_string(), operation, operands })
    }
}

fn malformed(msg: &str) -> BridgeError {
    BridgeError::MalformedQuery(msg.to_string())
}

/// Splits an update operand on commas outside `{...}`. Tokens are trimmed
/// and quote-stripped; an empty trailing token is dropped, empty interior
/// tokens are kept so a missing filter still occupies its position.
fn split_update_operand(operand: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut buf = String::new();
    for c in operand.chars() {
        match c {
            '{' => {
                depth += 1;
                buf.push(c);
            }
            '}' => {
                depth -= 1;
                buf.push(c);
            }
            ',' if depth == 0 => {
                tokens.push(strip_quotes(buf.trim()).to_string());
                buf.clear();
            }
            _ => buf.push(c),
        }
    }
    let last = buf.trim();
    if !last.is_empty() {
        tokens.push(strip_quotes(last).to_string());
    }
    tokens
}

/// Removes one surrounding quote pair when the token both starts and ends
/// with a quote character. The two ends do not have to match.
fn strip_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2
        && matches!(bytes[0], b'\'' | b'"')
        && matches!(bytes[bytes.len() - 1], b'\'' | b'"')
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
