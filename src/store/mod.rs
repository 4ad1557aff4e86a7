//! Store abstraction consumed by the dispatcher.
//!
//! The traits here mirror the slice of a document database the adapter
//! touches: resolve a collection handle, then run exactly one operation
//! against it. [`MemoryStore`] is the bundled in-process backend; anything
//! speaking to a real server implements the same traits.

pub mod matcher;
pub mod memory;
pub mod update;

pub use memory::MemoryStore;

use crate::errors::BridgeError;
use bson::Document;

/// Options accepted by the update operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub upsert: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
    pub upserted: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
}

/// A database able to resolve collections by name.
///
/// Resolving a handle never fails by itself; operations on the handle report
/// errors when they run.
pub trait DocumentStore: Send + Sync {
    fn collection(&self, name: &str) -> Box<dyn CollectionHandle + '_>;
    fn list_collection_names(&self) -> Result<Vec<String>, BridgeError>;
    fn create_collection(&self, name: &str) -> Result<(), BridgeError>;
}

/// One named collection of documents.
pub trait CollectionHandle {
    fn name(&self) -> &str;
    fn count_documents(&self, filter: Option<&Document>) -> Result<u64, BridgeError>;
    fn find(&self, filter: &Document) -> Result<Box<dyn DocumentCursor>, BridgeError>;
    fn find_one(&self, filter: &Document) -> Result<Option<Document>, BridgeError>;
    fn insert_one(&self, document: Document) -> Result<(), BridgeError>;
    fn delete_many(&self, filter: &Document) -> Result<DeleteReport, BridgeError>;
    fn update_one(
        &self,
        filter: &Document,
        modifier: &Document,
        options: UpdateOptions,
    ) -> Result<UpdateReport, BridgeError>;
    fn update_many(
        &self,
        filter: &Document,
        modifier: &Document,
        options: UpdateOptions,
    ) -> Result<UpdateReport, BridgeError>;
    fn drop_collection(&self) -> Result<(), BridgeError>;
}

/// Forward-only stream of matching documents.
///
/// Implementations own whatever live resources back the stream and must
/// release them in `Drop`, so discarding a cursor mid-iteration cannot leak
/// server-side state.
pub trait DocumentCursor {
    fn try_next(&mut self) -> Result<Option<Document>, BridgeError>;
}
