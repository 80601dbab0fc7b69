//! Record shapes persisted in the document store.
//!
//! Field names are serialized in camelCase; timestamps as RFC 3339 strings.

#![allow(missing_docs)]

use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod comment;
pub mod custom_exercise;
pub mod days_goal;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod unique_guard;
pub mod user;

pub use comment::Comment;
pub use custom_exercise::CustomExercise;
pub use days_goal::DaysGoal;
pub use follow::Follow;
pub use like::Like;
pub use notification::{Notification, NotificationType};
pub use post::{Exercise, ExerciseSet, Post};
pub use unique_guard::UniqueGuard;
pub use user::{User, UserSnapshot};

/// A record stored as one document in a named collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identifier, unique within the record's collection.
    fn id(&self) -> &str;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_notification_wire_shape() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let notification = Notification {
            id: "n1".to_string(),
            user_id: "u2".to_string(),
            from: UserSnapshot {
                user_id: "u1".to_string(),
                name: "Alice".to_string(),
                avatar: "https://cdn.example.com/a.png".to_string(),
            },
            notification_type: NotificationType::Like,
            post_id: Some("p1".to_string()),
            message: "Alice liked your post".to_string(),
            is_read: false,
            created_at,
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["fromUserId"], json!("u1"));
        assert_eq!(value["fromUserName"], json!("Alice"));
        assert_eq!(value["fromUserAvatar"], json!("https://cdn.example.com/a.png"));
        assert_eq!(value["type"], json!("like"));
        assert_eq!(value["postId"], json!("p1"));
        assert_eq!(value["isRead"], json!(false));
        assert_eq!(value["createdAt"], json!("2025-03-01T09:30:00Z"));
    }

    #[test]
    fn test_follow_notification_omits_post_id() {
        let value = json!({
            "id": "n2",
            "userId": "u2",
            "fromUserId": "u1",
            "fromUserName": "Alice",
            "type": "follow",
            "message": "Alice started following you",
            "createdAt": "2025-03-01T09:30:00Z",
        });

        let notification: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(notification.notification_type, NotificationType::Follow);
        assert!(notification.post_id.is_none());
        assert!(!notification.is_read);
        assert_eq!(notification.from.avatar, "");

        let back = serde_json::to_value(&notification).unwrap();
        assert!(back.get("postId").is_none());
    }

    #[test]
    fn test_post_sets_are_strings() {
        let value = json!({
            "id": "p1",
            "userId": "u1",
            "content": "Leg day",
            "exercise": {
                "id": "squat",
                "name": "Back Squat",
                "sets": [{"weight": "100", "reps": "5"}, {"weight": "102.5", "reps": "3"}],
                "memo": "felt heavy"
            },
            "timestamp": "2025-03-01T07:00:00Z",
            "createdAt": "2025-03-01T09:30:00Z",
            "updatedAt": "2025-03-01T09:30:00Z",
        });

        let post: Post = serde_json::from_value(value).unwrap();
        assert_eq!(post.exercise.sets.len(), 2);
        assert_eq!(post.exercise.sets[1].weight, "102.5");
        assert_eq!(post.exercise.memo.as_deref(), Some("felt heavy"));
        assert!(post.exercise.photo.is_none());
    }
}
