//! Typed, time-bounded access to one collection.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use musclegram_common::{AppError, AppResult};
use serde_json::Value;
use tracing::warn;

use crate::entities::Document;
use crate::store::{DocumentStore, Filter};

/// A named collection of `T` records.
///
/// Every store round trip is bounded by the configured lookup timeout and
/// fails with [`AppError::Timeout`] rather than hanging.
pub struct DocumentCollection<T> {
    store: Arc<dyn DocumentStore>,
    name: String,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

impl<T: Document> DocumentCollection<T> {
    /// Create a handle on collection `name`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            store,
            name: name.into(),
            timeout,
            _marker: PhantomData,
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn bounded<R>(&self, op: &str, fut: impl Future<Output = AppResult<R>>) -> AppResult<R> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(collection = %self.name, op = op, timeout_ms = self.timeout.as_millis() as u64, "Store lookup timed out");
                Err(AppError::Timeout(format!(
                    "{op} on {} exceeded {}ms",
                    self.name,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Find a record by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<T>> {
        self.bounded("get", self.store.get(&self.name, id))
            .await?
            .map(decode)
            .transpose()
    }

    /// Create a record unless its id is taken. Returns whether it was written.
    pub async fn insert(&self, record: &T) -> AppResult<bool> {
        let value = serde_json::to_value(record)?;
        self.bounded("insert", self.store.insert(&self.name, record.id(), value))
            .await
    }

    /// Create or replace a record.
    pub async fn put(&self, record: &T) -> AppResult<()> {
        let value = serde_json::to_value(record)?;
        self.bounded("put", self.store.put(&self.name, record.id(), value))
            .await
    }

    /// Delete a record by ID. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.bounded("delete", self.store.delete(&self.name, id)).await
    }

    /// Records matching `filter`.
    pub async fn find(&self, filter: &Filter) -> AppResult<Vec<T>> {
        self.bounded("find", self.store.find(&self.name, filter))
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// First record matching `filter`.
    pub async fn find_one(&self, filter: &Filter) -> AppResult<Option<T>> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    /// Whether any record matches `filter`.
    pub async fn exists(&self, filter: &Filter) -> AppResult<bool> {
        Ok(!self.find(filter).await?.is_empty())
    }

    /// Number of records matching `filter`.
    pub async fn count(&self, filter: &Filter) -> AppResult<u64> {
        Ok(self.find(filter).await?.len() as u64)
    }

    /// Every record in the collection.
    pub async fn all(&self) -> AppResult<Vec<T>> {
        self.bounded("list", self.store.list(&self.name))
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}

fn decode<T: Document>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(AppError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Like;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;

    fn like(id: &str, post_id: &str, user_id: &str) -> Like {
        Like {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_typed_round_trip_and_queries() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let likes = DocumentCollection::<Like>::new(store, "likes", Duration::from_secs(1));

        assert!(likes.insert(&like("l1", "p1", "u1")).await.unwrap());
        assert!(likes.insert(&like("l2", "p1", "u2")).await.unwrap());
        assert!(!likes.insert(&like("l2", "p9", "u9")).await.unwrap());

        let found = likes.find_by_id("l2").await.unwrap().unwrap();
        assert_eq!(found.post_id, "p1");

        let filter = Filter::new().eq("postId", "p1");
        assert_eq!(likes.count(&filter).await.unwrap(), 2);
        assert!(likes.exists(&Filter::new().eq("userId", "u2")).await.unwrap());
        assert!(!likes.exists(&Filter::new().eq("userId", "u3")).await.unwrap());
    }

    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn get(&self, _: &str, _: &str) -> AppResult<Option<Value>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn insert(&self, _: &str, _: &str, _: Value) -> AppResult<bool> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(true)
        }

        async fn put(&self, _: &str, _: &str, _: Value) -> AppResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn delete(&self, _: &str, _: &str) -> AppResult<bool> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(false)
        }

        async fn list(&self, _: &str) -> AppResult<Vec<Value>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_stalled_lookup_times_out() {
        let likes = DocumentCollection::<Like>::new(
            Arc::new(StalledStore),
            "likes",
            Duration::from_millis(20),
        );

        let result = likes.find_by_id("l1").await;
        assert!(matches!(result, Err(AppError::Timeout(_))));

        let result = likes.find(&Filter::new().eq("postId", "p1")).await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }
}
