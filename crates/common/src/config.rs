//! Application configuration.

use crate::collections::CollectionNames;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store configuration.
    pub store: StoreConfig,
    /// Consistency and bounding parameters.
    pub consistency: ConsistencyConfig,
    /// Collection name registry.
    pub collections: CollectionNames,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store. Data does not outlive the process.
    #[default]
    Memory,
    /// Redis-backed store.
    Redis,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: StoreBackend,
    /// Redis connection URL.
    pub redis_url: String,
    /// Key prefix for all Redis keys.
    pub prefix: String,
}

/// Consistency configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Upper bound for a single store round trip, in milliseconds.
    pub lookup_timeout_ms: u64,
    /// Attempts of the check-write-reverify sequence before giving up with a conflict.
    pub max_write_attempts: u32,
    /// Age after which a guard whose owner record is missing may be reclaimed, in seconds.
    pub stale_guard_secs: u64,
    /// Maximum ancestor chain walked when validating a comment parent.
    pub max_comment_depth: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is not set.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: "redis://localhost:6379".to_string(),
            prefix: "musclegram".to_string(),
        }
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5_000,
            max_write_attempts: 3,
            stale_guard_secs: 30,
            max_comment_depth: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "musclegram=info".to_string(),
            json: false,
        }
    }
}

impl ConsistencyConfig {
    /// Lookup timeout as a [`Duration`].
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Stale guard grace period as a [`Duration`].
    #[must_use]
    pub const fn stale_guard_after(&self) -> Duration {
        Duration::from_secs(self.stale_guard_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `MUSCLEGRAM_ENV`)
    /// 4. Environment variables with `MUSCLEGRAM__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("MUSCLEGRAM_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MUSCLEGRAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MUSCLEGRAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
