//! Custom exercise entity (user-defined additions to the exercise catalog).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomExercise {
    pub id: String,

    /// Owner
    pub user_id: String,

    pub body_part: String,

    pub exercise_name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for CustomExercise {
    fn id(&self) -> &str {
        &self.id
    }
}
