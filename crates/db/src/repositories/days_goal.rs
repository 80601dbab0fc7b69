//! Days goal repository.

use crate::collection::DocumentCollection;
use crate::entities::DaysGoal;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// Days goal repository for store operations.
#[derive(Clone)]
pub struct DaysGoalRepository {
    docs: DocumentCollection<DaysGoal>,
}

impl DaysGoalRepository {
    /// Create a new days goal repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<DaysGoal>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<DaysGoal> {
        &self.docs
    }

    /// Find a goal by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<DaysGoal> {
        self.docs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Days goal {id}")))
    }

    /// The goal a user set for a period.
    pub async fn find_by_period(&self, user_id: &str, period: &str) -> AppResult<Option<DaysGoal>> {
        self.docs
            .find_one(&Self::period_filter(user_id, period))
            .await
    }

    /// All goals of a user, most recent period first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<DaysGoal>> {
        let mut goals = self.docs.find(&Filter::new().eq("userId", user_id)).await?;
        goals.sort_by(|a, b| b.period.cmp(&a.period));
        Ok(goals)
    }

    /// Replace a goal record.
    pub async fn update(&self, goal: &DaysGoal) -> AppResult<()> {
        self.docs.put(goal).await
    }

    /// Delete a goal.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Filter selecting a user's goal for a period.
    #[must_use]
    pub fn period_filter(user_id: &str, period: &str) -> Filter {
        Filter::new().eq("userId", user_id).eq("period", period)
    }
}
