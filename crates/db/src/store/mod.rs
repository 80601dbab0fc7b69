//! Document store abstraction.
//!
//! The store is a set of named collections holding JSON documents keyed by id.
//! It offers no multi-document transactions. The only atomic primitive callers
//! may rely on is [`DocumentStore::insert`], which creates a document only if
//! its id is absent.

use async_trait::async_trait;
use musclegram_common::AppResult;
use serde_json::Value;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Backend-agnostic document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

    /// Create a document if no document with `id` exists.
    ///
    /// Returns `false`, leaving the existing document untouched, when the id is taken.
    async fn insert(&self, collection: &str, id: &str, document: Value) -> AppResult<bool>;

    /// Create or replace a document.
    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// All documents of a collection, in no particular order.
    async fn list(&self, collection: &str) -> AppResult<Vec<Value>>;

    /// Documents whose top-level fields equal the filter's values.
    async fn find(&self, collection: &str, filter: &Filter) -> AppResult<Vec<Value>> {
        let documents = self.list(collection).await?;
        Ok(documents
            .into_iter()
            .filter(|document| filter.matches(document))
            .collect())
    }
}

/// Conjunction of top-level field equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// An empty filter, matching every document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Require `field` to equal `value`. A `null` value also matches an absent field.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// The conditions, in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether `document` satisfies every condition.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| match document.get(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}
