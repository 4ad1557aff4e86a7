pub mod errors;
pub mod logger;
pub mod output;
pub mod query;
pub mod store;

pub use crate::errors::BridgeError;
pub use crate::output::{OutputElement, flatten};
pub use crate::query::{
    OperandList, Operation, PLACEHOLDER, ParamValue, ParsedQuery, RESULT_COLUMN, ResultEntry,
    RowSet, bind_placeholders,
};
pub use crate::store::{
    CollectionHandle, DeleteReport, DocumentCursor, DocumentStore, MemoryStore, UpdateOptions,
    UpdateReport,
};

/// The adapter facade: owns a store and runs query expressions against it.
pub struct Bridge<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> Bridge<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps back into the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs one expression with the given bound parameters, projecting the
    /// whole-result column.
    ///
    /// # Errors
    /// `MalformedQuery`/`UnsupportedOperation` from parsing,
    /// `MissingQuery`/`MissingModifier` for absent required operands, and
    /// whatever the store reports while executing.
    pub fn execute(&self, expression: &str, params: &[ParamValue]) -> Result<RowSet, BridgeError> {
        self.execute_with(expression, params, vec![RESULT_COLUMN.to_string()])
    }

    /// Runs one expression projecting an explicit field-path list, usually
    /// produced by [`flatten`].
    ///
    /// # Errors
    /// As [`Bridge::execute`].
    pub fn execute_with(
        &self,
        expression: &str,
        params: &[ParamValue],
        fields: Vec<String>,
    ) -> Result<RowSet, BridgeError> {
        query::run(&self.store, expression, params, fields)
    }
}
