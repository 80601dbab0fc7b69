//! Custom exercise service.

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::CustomExercise;
use musclegram_db::repositories::Repositories;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::consistency::{UniqueKey, UniqueWriter};

/// Input for defining a custom exercise.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomExerciseInput {
    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(min = 1, max = 32))]
    pub body_part: String,

    #[validate(length(min = 1, max = 64))]
    pub exercise_name: String,
}

/// Input for renaming a custom exercise.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomExerciseInput {
    #[validate(length(min = 1, max = 32))]
    pub body_part: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub exercise_name: Option<String>,
}

/// Custom exercise service for business logic.
#[derive(Clone)]
pub struct CustomExerciseService {
    repos: Repositories,
    writer: UniqueWriter,
    id_gen: IdGenerator,
}

impl CustomExerciseService {
    /// Create a new custom exercise service.
    #[must_use]
    pub const fn new(repos: Repositories, writer: UniqueWriter) -> Self {
        Self {
            repos,
            writer,
            id_gen: IdGenerator::new(),
        }
    }

    fn key(&self, exercise: &CustomExercise) -> UniqueKey {
        UniqueKey::new(
            self.repos.custom_exercises.collection().name(),
            &[
                ("userId", exercise.user_id.as_str()),
                ("bodyPart", exercise.body_part.as_str()),
                ("exerciseName", exercise.exercise_name.as_str()),
            ],
        )
    }

    /// Validate a custom exercise and shape the record.
    pub async fn validate_create(&self, input: CreateCustomExerciseInput) -> AppResult<CustomExercise> {
        input.validate()?;
        self.repos.users.get_by_id(&input.user_id).await?;

        let now = Utc::now();
        let exercise = CustomExercise {
            id: self.id_gen.generate(),
            user_id: input.user_id,
            body_part: input.body_part.trim().to_string(),
            exercise_name: input.exercise_name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        blank_check(&exercise)?;
        self.writer
            .check(
                self.repos.custom_exercises.collection(),
                &exercise.id,
                &[self.key(&exercise)],
            )
            .await?;
        Ok(exercise)
    }

    /// Define a custom exercise.
    pub async fn create(&self, input: CreateCustomExerciseInput) -> AppResult<CustomExercise> {
        let exercise = self.validate_create(input).await?;
        self.writer
            .create(
                self.repos.custom_exercises.collection(),
                &exercise,
                &[self.key(&exercise)],
            )
            .await?;
        info!(id = %exercise.id, user_id = %exercise.user_id, name = %exercise.exercise_name, "Custom exercise created");
        Ok(exercise)
    }

    /// Validate a change and return the updated record.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateCustomExerciseInput,
    ) -> AppResult<CustomExercise> {
        let current = self.get_owned(actor_id, id).await?;
        self.apply_update(&current, input).await
    }

    async fn apply_update(
        &self,
        current: &CustomExercise,
        input: UpdateCustomExerciseInput,
    ) -> AppResult<CustomExercise> {
        input.validate()?;
        let mut exercise = current.clone();
        if let Some(body_part) = input.body_part {
            exercise.body_part = body_part.trim().to_string();
        }
        if let Some(exercise_name) = input.exercise_name {
            exercise.exercise_name = exercise_name.trim().to_string();
        }
        blank_check(&exercise)?;
        exercise.updated_at = Utc::now();

        self.writer
            .check(
                self.repos.custom_exercises.collection(),
                &exercise.id,
                &[self.key(&exercise)],
            )
            .await?;
        Ok(exercise)
    }

    /// Update a custom exercise.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateCustomExerciseInput,
    ) -> AppResult<CustomExercise> {
        let current = self.get_owned(actor_id, id).await?;
        let exercise = self.apply_update(&current, input).await?;
        self.writer
            .replace(
                self.repos.custom_exercises.collection(),
                &current,
                &exercise,
                &[self.key(&current)],
                &[self.key(&exercise)],
            )
            .await?;
        Ok(exercise)
    }

    /// Delete a custom exercise.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let exercise = self.get_owned(actor_id, id).await?;
        self.repos.custom_exercises.delete(&exercise.id).await?;
        self.writer.release(&exercise.id, &[self.key(&exercise)]).await;
        Ok(())
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<CustomExercise> {
        let exercise = self.repos.custom_exercises.get_by_id(id).await?;
        if exercise.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the owner can change a custom exercise".to_string(),
            ));
        }
        Ok(exercise)
    }
}

fn blank_check(exercise: &CustomExercise) -> AppResult<()> {
    if exercise.body_part.is_empty() || exercise.exercise_name.is_empty() {
        return Err(AppError::Validation(
            "bodyPart and exerciseName must not be blank".to_string(),
        ));
    }
    Ok(())
}
