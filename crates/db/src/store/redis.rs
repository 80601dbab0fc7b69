//! Redis-backed document store.
//!
//! Documents are JSON strings under `{prefix}:{collection}:{id}`. Each
//! collection keeps the set of its ids under `{prefix}:idx:{collection}` so it
//! can be listed without `SCAN`.

use std::sync::Arc;

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface, SetsInterface};
use fred::types::SetOptions;
use musclegram_common::{AppError, AppResult};
use serde_json::Value;
use tracing::{debug, info};

use super::DocumentStore;

/// Document store on top of a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisStore {
    /// Wrap an already connected client.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, prefix: String) -> Self {
        Self { redis, prefix }
    }

    /// Connect to the Redis server at `url`.
    pub async fn connect(url: &str, prefix: &str) -> AppResult<Self> {
        let config = fred::types::config::Config::from_url(url).map_err(redis_error)?;
        let client = RedisClient::new(config, None, None, None);
        client.connect();
        client.wait_for_connect().await.map_err(redis_error)?;
        info!(prefix = %prefix, "Connected to Redis document store");
        Ok(Self::new(Arc::new(client), prefix.to_string()))
    }

    fn document_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{collection}:{id}", self.prefix)
    }

    fn index_key(&self, collection: &str) -> String {
        format!("{}:idx:{collection}", self.prefix)
    }
}

fn redis_error(err: fred::error::Error) -> AppError {
    AppError::Store(err.to_string())
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let raw: Option<String> = self
            .redis
            .get(self.document_key(collection, id))
            .await
            .map_err(redis_error)?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(AppError::from)
    }

    async fn insert(&self, collection: &str, id: &str, document: Value) -> AppResult<bool> {
        let json = serde_json::to_string(&document)?;

        // NX returns None if the key already exists, Some("OK") if set
        let result: Option<String> = self
            .redis
            .set(
                self.document_key(collection, id),
                json,
                None,
                Some(SetOptions::NX),
                false,
            )
            .await
            .map_err(redis_error)?;

        if result.is_none() {
            debug!(collection = %collection, id = %id, "Insert skipped, id exists");
            return Ok(false);
        }

        self.redis
            .sadd::<(), _, _>(self.index_key(collection), id.to_string())
            .await
            .map_err(redis_error)?;
        Ok(true)
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        let json = serde_json::to_string(&document)?;
        self.redis
            .set::<(), _, _>(self.document_key(collection, id), json, None, None, false)
            .await
            .map_err(redis_error)?;
        self.redis
            .sadd::<(), _, _>(self.index_key(collection), id.to_string())
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let removed: i64 = self
            .redis
            .del(self.document_key(collection, id))
            .await
            .map_err(redis_error)?;
        self.redis
            .srem::<(), _, _>(self.index_key(collection), id.to_string())
            .await
            .map_err(redis_error)?;
        Ok(removed > 0)
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Value>> {
        let ids: Vec<String> = self
            .redis
            .smembers(self.index_key(collection))
            .await
            .map_err(redis_error)?;

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| self.document_key(collection, id))
            .collect();
        let raws: Vec<Option<String>> = self.redis.mget(keys).await.map_err(redis_error)?;

        // Ids whose document vanished between SMEMBERS and MGET are skipped.
        raws.into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(AppError::from))
            .collect()
    }
}
