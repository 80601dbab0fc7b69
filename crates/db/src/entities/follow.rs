//! Follow entity (follow relationships between users).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: String,

    /// The user who is following
    pub follower_id: String,

    /// The user being followed
    pub following_id: String,

    pub created_at: DateTime<Utc>,
}

impl Document for Follow {
    fn id(&self) -> &str {
        &self.id
    }
}
