//! Unique guard entity.
//!
//! A guard document is claimed with an insert-if-absent before a
//! uniqueness-scoped record is written. Its id is derived from the unique key,
//! so two writers racing for the same key contend on the same document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueGuard {
    /// Derived from the unique key
    pub id: String,

    /// Collection of the guarded record
    pub collection: String,

    /// Id of the record holding the key
    pub owner_id: String,

    pub claimed_at: DateTime<Utc>,
}

impl Document for UniqueGuard {
    fn id(&self) -> &str {
        &self.id
    }
}
