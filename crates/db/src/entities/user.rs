//! User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Stored lower-cased; unique across users
    pub email: String,

    pub display_name: String,

    /// Unique across users
    pub username: String,

    #[serde(default)]
    pub bio: String,

    /// Avatar URL, empty when unset
    #[serde(default)]
    pub avatar: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Copy the display fields other records denormalize.
    #[must_use]
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            user_id: self.id.clone(),
            name: self.display_name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

impl Document for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Point-in-time copy of a user's display fields.
///
/// Holders keep the values they were created with; later edits to the
/// [`User`] are not propagated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    #[serde(rename = "fromUserId")]
    pub user_id: String,

    #[serde(rename = "fromUserName")]
    pub name: String,

    #[serde(rename = "fromUserAvatar", default)]
    pub avatar: String,
}
