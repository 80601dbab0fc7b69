//! Comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    pub post_id: String,

    /// Author
    pub user_id: String,

    pub content: String,

    /// Parent comment on the same post, for threaded replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}
