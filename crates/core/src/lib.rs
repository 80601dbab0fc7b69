//! Core business logic for musclegram.
//!
//! - [`services`]: validation and writes per entity, plus read-side queries
//! - [`consistency`]: uniqueness-scoped writes on a store without transactions
//! - [`audit`]: integrity checks over the stored records

pub mod audit;
pub mod consistency;
pub mod services;
pub mod validation;

pub use audit::{AuditReport, IntegrityAuditor, Violation, ViolationKind};
pub use consistency::{UniqueKey, UniqueWriter};
pub use services::*;
