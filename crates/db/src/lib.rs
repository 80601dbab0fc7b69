//! Document store layer for musclegram.
//!
//! Records live as JSON documents in named collections behind the
//! [`store::DocumentStore`] trait. Repositories in [`repositories`] give each
//! record type its typed queries.

pub mod collection;
pub mod entities;
pub mod repositories;
pub mod store;
pub mod test_utils;

use std::sync::Arc;

use musclegram_common::{AppResult, Config, StoreBackend};
use tracing::info;

pub use collection::DocumentCollection;
pub use repositories::Repositories;
pub use store::{DocumentStore, Filter, MemoryStore, RedisStore};

/// Initialize the configured document store.
pub async fn init(config: &Config) -> AppResult<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.store.redis_url, &config.store.prefix).await?;
            Ok(Arc::new(store))
        }
    }
}
