//! In-memory `DocumentStore` used by the unit tests of this crate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{merge_top_level, Collection, DocumentStore, PortError, PortResult};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<Collection, Vec<(String, Value)>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Makes every subsequent write fail like the simulated backend does.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("Server error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> PortResult<Option<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|(key, _)| key == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn list(&self, collection: Collection) -> PortResult<Vec<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn add(&self, collection: Collection, id: &str, document: Value) -> PortResult<Value> {
        self.check_write()?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|(key, _)| key == id) {
            return Err(PortError::Conflict(id.to_string()));
        }
        docs.push((id.to_string(), document.clone()));
        Ok(document)
    }

    async fn update(&self, collection: Collection, id: &str, partial: Value) -> PortResult<Value> {
        self.check_write()?;
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|(key, _)| key == id))
            .map(|(_, doc)| doc)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        merge_top_level(doc, partial)?;
        Ok(doc.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> PortResult<bool> {
        self.check_write()?;
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(key, _)| key != id);
        Ok(docs.len() != before)
    }

    async fn count(&self, collection: Collection) -> PortResult<usize> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(&collection).map_or(0, Vec::len))
    }

    async fn bulk_add(&self, collection: Collection, documents: Vec<(String, Value)>) -> PortResult<()> {
        for (id, document) in documents {
            self.add(collection, &id, document).await?;
        }
        Ok(())
    }
}
