//! Notification entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Document, UserSnapshot};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Like,
    Follow,
    Comment,
}

impl NotificationType {
    /// Whether notifications of this type point at a post.
    #[must_use]
    pub const fn requires_post(self) -> bool {
        matches!(self, Self::Like | Self::Comment)
    }

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Comment => "comment",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,

    /// Recipient
    pub user_id: String,

    /// Triggering user's display fields as of creation time
    #[serde(flatten)]
    pub from: UserSnapshot,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    /// Related post (like and comment notifications only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,

    pub message: String,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl Document for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}
