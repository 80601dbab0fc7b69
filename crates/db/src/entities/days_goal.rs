//! Monthly workout-days goal entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysGoal {
    pub id: String,

    pub user_id: String,

    /// Calendar month the goal applies to, `YYYY-MM` (UTC)
    pub period: String,

    /// Number of distinct workout days aimed for in the period
    pub monthly_target: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for DaysGoal {
    fn id(&self) -> &str {
        &self.id
    }
}
