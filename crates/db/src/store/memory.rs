//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use musclegram_common::AppResult;
use serde_json::Value;
use tokio::sync::RwLock;

use super::DocumentStore;

/// Document store held in process memory.
///
/// Every operation yields to the scheduler first, so concurrent callers
/// interleave between round trips the way they would against a remote store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        tokio::task::yield_now().await;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, id: &str, document: Value) -> AppResult<bool> {
        tokio::task::yield_now().await;
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.contains_key(id) {
            return Ok(false);
        }
        documents.insert(id.to_string(), document);
        Ok(true)
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        tokio::task::yield_now().await;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        tokio::task::yield_now().await;
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .is_some_and(|documents| documents.remove(id).is_some()))
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Value>> {
        tokio::task::yield_now().await;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }
}
