//! Test utilities for store operations.
//!
//! Provides in-memory repositories for unit tests and Redis settings for the
//! ignored integration tests.

use std::sync::Arc;

use chrono::Utc;
use musclegram_common::{CollectionNames, Config, IdGenerator};

use crate::entities::{Exercise, ExerciseSet, Post, User};
use crate::repositories::Repositories;
use crate::store::MemoryStore;

/// Test Redis configuration.
#[derive(Debug, Clone)]
pub struct TestRedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
}

impl Default for TestRedisConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_REDIS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(6380),
        }
    }
}

impl TestRedisConfig {
    /// Get the Redis URL.
    #[must_use]
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// A key prefix no other test run shares.
#[must_use]
pub fn unique_prefix() -> String {
    format!("mg_test_{}", IdGenerator::new().generate())
}

/// Configuration whose collection names are isolated under `prefix`.
#[must_use]
pub fn test_config(prefix: &str) -> Config {
    Config {
        collections: CollectionNames::with_prefix(prefix),
        ..Config::default()
    }
}

/// Repositories over a fresh in-memory store.
#[must_use]
pub fn test_repositories() -> (Arc<MemoryStore>, Repositories) {
    let store = Arc::new(MemoryStore::new());
    let repos = Repositories::new(store.clone(), &Config::default());
    (store, repos)
}

/// A user record with placeholder profile fields.
#[must_use]
pub fn sample_user(id: &str, username: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        email: format!("{username}@example.com"),
        display_name: username.to_string(),
        username: username.to_string(),
        bio: String::new(),
        avatar: String::new(),
        created_at: now,
        updated_at: now,
    }
}

/// A one-set bench press post.
#[must_use]
pub fn sample_post(id: &str, user_id: &str) -> Post {
    let now = Utc::now();
    Post {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content: String::new(),
        exercise: Exercise {
            id: "bench_press".to_string(),
            name: "Bench Press".to_string(),
            sets: vec![ExerciseSet {
                weight: "60".to_string(),
                reps: "10".to_string(),
            }],
            memo: None,
            photo: None,
        },
        timestamp: now,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_url() {
        let config = TestRedisConfig {
            host: "localhost".to_string(),
            port: 6380,
        };
        assert_eq!(config.redis_url(), "redis://localhost:6380");
    }

    #[test]
    fn test_unique_prefixes_differ() {
        assert_ne!(unique_prefix(), unique_prefix());
        assert_eq!(test_config("t9").collections.posts, "t9_posts");
    }
}
