//! In-process store backend.

use crate::errors::BridgeError;
use crate::store::{
    CollectionHandle, DeleteReport, DocumentCursor, DocumentStore, UpdateOptions, UpdateReport,
    matcher, update,
};
use bson::Document;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Reference backend holding collections in memory, in insertion order.
///
/// Cloning is cheap; clones share the same data. Useful on its own for tests
/// and as the model implementation of the [`DocumentStore`] traits.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-loads documents into a collection, creating it when missing.
    /// Documents without an `_id` get a generated one.
    pub fn seed(&self, collection: &str, documents: Vec<Document>) {
        let mut guard = self.collections.write();
        let entry = guard.entry(collection.to_string()).or_default();
        for mut doc in documents {
            ensure_id(&mut doc);
            entry.push(doc);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn collection(&self, name: &str) -> Box<dyn CollectionHandle + '_> {
        Box::new(MemoryCollection { name: name.to_string(), store: self.clone() })
    }

    fn list_collection_names(&self) -> Result<Vec<String>, BridgeError> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_collection(&self, name: &str) -> Result<(), BridgeError> {
        let mut guard = self.collections.write();
        if guard.contains_key(name) {
            return Err(BridgeError::CollectionAlreadyExists(name.to_string()));
        }
        guard.insert(name.to_string(), Vec::new());
        Ok(())
    }
}

fn ensure_id(doc: &mut Document) {
    if !doc.contains_key("_id") {
        doc.insert("_id", uuid::Uuid::new_v4().to_string());
    }
}

struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

impl MemoryCollection {
    fn run_update(
        &self,
        filter: &Document,
        modifier: &Document,
        options: UpdateOptions,
        multi: bool,
    ) -> Result<UpdateReport, BridgeError> {
        let mut guard = self.store.collections.write();
        let mut report = UpdateReport::default();
        if let Some(docs) = guard.get_mut(&self.name) {
            for doc in docs.iter_mut() {
                if matcher::matches(doc, filter)? {
                    report.matched += 1;
                    if update::apply_modifier(doc, modifier)? {
                        report.modified += 1;
                    }
                    if !multi {
                        break;
                    }
                }
            }
        }
        if report.matched == 0 && options.upsert {
            let mut seeded = update::seed_from_filter(filter);
            update::apply_modifier(&mut seeded, modifier)?;
            ensure_id(&mut seeded);
            guard.entry(self.name.clone()).or_default().push(seeded);
            report.upserted = true;
            debug!("upserted one document into '{}'", self.name);
        }
        Ok(report)
    }
}

impl CollectionHandle for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn count_documents(&self, filter: Option<&Document>) -> Result<u64, BridgeError> {
        let guard = self.store.collections.read();
        let Some(docs) = guard.get(&self.name) else {
            return Ok(0);
        };
        match filter {
            None => Ok(docs.len() as u64),
            Some(f) => {
                let mut n = 0u64;
                for doc in docs {
                    if matcher::matches(doc, f)? {
                        n += 1;
                    }
                }
                Ok(n)
            }
        }
    }

    /// Snapshots the matching documents at call time; writes made while the
    /// cursor is open do not show up in it.
    fn find(&self, filter: &Document) -> Result<Box<dyn DocumentCursor>, BridgeError> {
        let guard = self.store.collections.read();
        let mut matched = Vec::new();
        if let Some(docs) = guard.get(&self.name) {
            for doc in docs {
                if matcher::matches(doc, filter)? {
                    matched.push(doc.clone());
                }
            }
        }
        Ok(Box::new(MemoryCursor { docs: matched.into_iter() }))
    }

    fn find_one(&self, filter: &Document) -> Result<Option<Document>, BridgeError> {
        let guard = self.store.collections.read();
        if let Some(docs) = guard.get(&self.name) {
            for doc in docs {
                if matcher::matches(doc, filter)? {
                    return Ok(Some(doc.clone()));
                }
            }
        }
        Ok(None)
    }

    fn insert_one(&self, mut document: Document) -> Result<(), BridgeError> {
        ensure_id(&mut document);
        let mut guard = self.store.collections.write();
        guard.entry(self.name.clone()).or_default().push(document);
        Ok(())
    }

    fn delete_many(&self, filter: &Document) -> Result<DeleteReport, BridgeError> {
        let mut guard = self.store.collections.write();
        let Some(docs) = guard.get_mut(&self.name) else {
            return Ok(DeleteReport::default());
        };
        let mut keep = Vec::with_capacity(docs.len());
        for doc in docs.iter() {
            keep.push(!matcher::matches(doc, filter)?);
        }
        let deleted = keep.iter().filter(|k| !**k).count() as u64;
        let mut flags = keep.into_iter();
        docs.retain(|_| flags.next().unwrap_or(true));
        Ok(DeleteReport { deleted })
    }

    fn update_one(
        &self,
        filter: &Document,
        modifier: &Document,
        options: UpdateOptions,
    ) -> Result<UpdateReport, BridgeError> {
        self.run_update(filter, modifier, options, false)
    }

    fn update_many(
        &self,
        filter: &Document,
        modifier: &Document,
        options: UpdateOptions,
    ) -> Result<UpdateReport, BridgeError> {
        self.run_update(filter, modifier, options, true)
    }

    fn drop_collection(&self) -> Result<(), BridgeError> {
        self.store.collections.write().remove(&self.name);
        Ok(())
    }
}

struct MemoryCursor {
    docs: std::vec::IntoIter<Document>,
}

impl DocumentCursor for MemoryCursor {
    fn try_next(&mut self) -> Result<Option<Document>, BridgeError> {
        Ok(self.docs.next())
    }
}
