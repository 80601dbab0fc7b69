//! Post entity (a logged workout).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,

    /// Author
    pub user_id: String,

    #[serde(default)]
    pub content: String,

    pub exercise: Exercise,

    /// When the workout happened (user supplied)
    pub timestamp: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The exercise performed in a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Catalog or custom exercise id
    pub id: String,

    pub name: String,

    pub sets: Vec<ExerciseSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    /// Photo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// One set. Weight and reps are kept as the strings the user typed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub weight: String,
    pub reps: String,
}
