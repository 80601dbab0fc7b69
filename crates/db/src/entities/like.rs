//! Like entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,

    pub post_id: String,

    /// The user who liked the post
    pub user_id: String,

    pub created_at: DateTime<Utc>,
}

impl Document for Like {
    fn id(&self) -> &str {
        &self.id
    }
}
