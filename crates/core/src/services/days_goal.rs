//! Days goal service.
//!
//! A days goal is the number of distinct days a user intends to train in one
//! calendar month (UTC).

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Utc};
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::DaysGoal;
use musclegram_db::repositories::Repositories;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::consistency::{UniqueKey, UniqueWriter};
use crate::validation::{days_in_month, parse_period, validate_period};

/// Input for setting a monthly goal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDaysGoalInput {
    #[validate(length(min = 1))]
    pub user_id: String,

    /// `YYYY-MM`
    #[validate(custom(function = "validate_period"))]
    pub period: String,

    #[validate(range(min = 1, max = 31))]
    pub monthly_target: u32,
}

/// Input for changing a monthly goal.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDaysGoalInput {
    #[validate(range(min = 1, max = 31))]
    pub monthly_target: Option<u32>,
}

/// Training days logged in a month against the goal for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProgress {
    pub period: String,
    /// `None` when no goal is set for the period.
    pub target: Option<u32>,
    /// Distinct days with at least one post.
    pub workout_days: u32,
    pub remaining: u32,
    pub achieved: bool,
}

/// Days goal service for business logic.
#[derive(Clone)]
pub struct DaysGoalService {
    repos: Repositories,
    writer: UniqueWriter,
    id_gen: IdGenerator,
}

impl DaysGoalService {
    /// Create a new days goal service.
    #[must_use]
    pub const fn new(repos: Repositories, writer: UniqueWriter) -> Self {
        Self {
            repos,
            writer,
            id_gen: IdGenerator::new(),
        }
    }

    fn key(&self, goal: &DaysGoal) -> UniqueKey {
        UniqueKey::new(
            self.repos.days_goals.collection().name(),
            &[("userId", goal.user_id.as_str()), ("period", goal.period.as_str())],
        )
    }

    /// Validate a goal and shape the record.
    pub async fn validate_create(&self, input: CreateDaysGoalInput) -> AppResult<DaysGoal> {
        input.validate()?;
        check_target(&input.period, input.monthly_target)?;
        self.repos.users.get_by_id(&input.user_id).await?;

        let now = Utc::now();
        let goal = DaysGoal {
            id: self.id_gen.generate(),
            user_id: input.user_id,
            period: input.period,
            monthly_target: input.monthly_target,
            created_at: now,
            updated_at: now,
        };
        self.writer
            .check(self.repos.days_goals.collection(), &goal.id, &[self.key(&goal)])
            .await?;
        Ok(goal)
    }

    /// Set the goal for a month.
    pub async fn create(&self, input: CreateDaysGoalInput) -> AppResult<DaysGoal> {
        let goal = self.validate_create(input).await?;
        self.writer
            .create(self.repos.days_goals.collection(), &goal, &[self.key(&goal)])
            .await?;
        info!(user_id = %goal.user_id, period = %goal.period, target = goal.monthly_target, "Days goal set");
        Ok(goal)
    }

    /// Validate a change and return the updated record.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateDaysGoalInput,
    ) -> AppResult<DaysGoal> {
        input.validate()?;
        let mut goal = self.get_owned(actor_id, id).await?;
        if let Some(target) = input.monthly_target {
            check_target(&goal.period, target)?;
            goal.monthly_target = target;
        }
        goal.updated_at = Utc::now();
        Ok(goal)
    }

    /// Change the target of a goal.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateDaysGoalInput,
    ) -> AppResult<DaysGoal> {
        let goal = self.validate_update(actor_id, id, input).await?;
        self.repos.days_goals.update(&goal).await?;
        Ok(goal)
    }

    /// Delete a goal.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let goal = self.get_owned(actor_id, id).await?;
        self.repos.days_goals.delete(&goal.id).await?;
        self.writer.release(&goal.id, &[self.key(&goal)]).await;
        Ok(())
    }

    /// The goal a user set for `period`, if any.
    pub async fn get_for_period(&self, user_id: &str, period: &str) -> AppResult<Option<DaysGoal>> {
        self.repos.days_goals.find_by_period(user_id, period).await
    }

    /// Count distinct workout days in `period` and compare with the goal.
    pub async fn monthly_progress(&self, user_id: &str, period: &str) -> AppResult<MonthlyProgress> {
        let first = parse_period(period)
            .ok_or_else(|| AppError::InvalidArgument(format!("Invalid period {period:?}")))?;

        let (goal, posts) = futures::try_join!(
            self.repos.days_goals.find_by_period(user_id, period),
            self.repos.posts.find_by_user(user_id, usize::MAX, None),
        )?;

        let days: BTreeSet<NaiveDate> = posts
            .iter()
            .map(|post| post.timestamp.date_naive())
            .filter(|day| same_month(*day, first))
            .collect();
        let workout_days = days.len() as u32;
        let target = goal.map(|goal| goal.monthly_target);

        Ok(MonthlyProgress {
            period: period.to_string(),
            target,
            workout_days,
            remaining: target.map_or(0, |t| t.saturating_sub(workout_days)),
            achieved: target.is_some_and(|t| workout_days >= t),
        })
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<DaysGoal> {
        let goal = self.repos.days_goals.get_by_id(id).await?;
        if goal.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the owner can change a goal".to_string(),
            ));
        }
        Ok(goal)
    }
}

fn same_month(day: NaiveDate, first: NaiveDate) -> bool {
    day.year() == first.year() && day.month() == first.month()
}

fn check_target(period: &str, target: u32) -> AppResult<()> {
    let first = parse_period(period)
        .ok_or_else(|| AppError::InvalidArgument(format!("Invalid period {period:?}")))?;
    let days = days_in_month(first);
    if target == 0 || target > days {
        return Err(AppError::InvalidArgument(format!(
            "monthlyTarget must be between 1 and {days} for {period}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, exercise, fixture};
    use crate::services::CreatePostInput;
    use chrono::TimeZone;

    fn input(user_id: &str, period: &str, target: u32) -> CreateDaysGoalInput {
        CreateDaysGoalInput {
            user_id: user_id.to_string(),
            period: period.to_string(),
            monthly_target: target,
        }
    }

    #[tokio::test]
    async fn test_one_goal_per_period() {
        let Fixture { services, alice, .. } = fixture().await;
        let svc = &services.days_goals;

        svc.create(input(&alice.id, "2025-03", 12)).await.unwrap();
        let dup = svc.create(input(&alice.id, "2025-03", 20)).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        svc.create(input(&alice.id, "2025-04", 20)).await.unwrap();
    }

    #[tokio::test]
    async fn test_target_bounds() {
        let Fixture { services, alice, .. } = fixture().await;
        let svc = &services.days_goals;

        let zero = svc.create(input(&alice.id, "2025-03", 0)).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let too_many = svc.create(input(&alice.id, "2025-02", 29)).await;
        assert!(matches!(too_many, Err(AppError::InvalidArgument(_))));

        let bad_period = svc.create(input(&alice.id, "March", 10)).await;
        assert!(matches!(bad_period, Err(AppError::Validation(_))));

        let goal = svc.create(input(&alice.id, "2024-02", 29)).await.unwrap();
        let shrink = svc
            .update(
                &alice.id,
                &goal.id,
                UpdateDaysGoalInput {
                    monthly_target: Some(30),
                },
            )
            .await;
        assert!(matches!(shrink, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_monthly_progress_counts_distinct_days() {
        let Fixture { services, alice, .. } = fixture().await;
        services
            .days_goals
            .create(input(&alice.id, "2025-03", 3))
            .await
            .unwrap();

        let days = [
            Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 4, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 1, 7, 0, 0).unwrap(),
        ];
        for timestamp in days {
            services
                .posts
                .create(CreatePostInput {
                    user_id: alice.id.clone(),
                    content: None,
                    exercise: exercise(&[("40", "8")]),
                    timestamp: Some(timestamp),
                })
                .await
                .unwrap();
        }

        let progress = services
            .days_goals
            .monthly_progress(&alice.id, "2025-03")
            .await
            .unwrap();
        assert_eq!(progress.workout_days, 2);
        assert_eq!(progress.target, Some(3));
        assert_eq!(progress.remaining, 1);
        assert!(!progress.achieved);

        let april = services
            .days_goals
            .monthly_progress(&alice.id, "2025-04")
            .await
            .unwrap();
        assert_eq!(april.workout_days, 1);
        assert_eq!(april.target, None);
        assert!(!april.achieved);
    }
}
