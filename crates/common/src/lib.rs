//! Common utilities and shared types for musclegram.
//!
//! This crate provides foundational components used across all musclegram crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Collections**: The collection name registry via [`CollectionNames`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use musclegram_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID {id} for collection {}", config.collections.posts);
//!     Ok(())
//! }
//! ```

pub mod collections;
pub mod config;
pub mod error;
pub mod id;

pub use collections::CollectionNames;
pub use config::{Config, ConsistencyConfig, LoggingConfig, StoreBackend, StoreConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
