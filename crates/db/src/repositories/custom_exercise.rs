//! Custom exercise repository.

use crate::collection::DocumentCollection;
use crate::entities::CustomExercise;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// Custom exercise repository for store operations.
#[derive(Clone)]
pub struct CustomExerciseRepository {
    docs: DocumentCollection<CustomExercise>,
}

impl CustomExerciseRepository {
    /// Create a new custom exercise repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<CustomExercise>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<CustomExercise> {
        &self.docs
    }

    /// Find a custom exercise by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<CustomExercise>> {
        self.docs.find_by_id(id).await
    }

    /// Find a custom exercise by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<CustomExercise> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Custom exercise {id}")))
    }

    /// A user's custom exercises, ordered by body part then name.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<CustomExercise>> {
        let mut exercises = self.docs.find(&Filter::new().eq("userId", user_id)).await?;
        exercises.sort_by(|a, b| {
            (a.body_part.as_str(), a.exercise_name.as_str())
                .cmp(&(b.body_part.as_str(), b.exercise_name.as_str()))
        });
        Ok(exercises)
    }

    /// A user's custom exercises for one body part, ordered by name.
    pub async fn find_by_body_part(
        &self,
        user_id: &str,
        body_part: &str,
    ) -> AppResult<Vec<CustomExercise>> {
        let mut exercises = self
            .docs
            .find(&Filter::new().eq("userId", user_id).eq("bodyPart", body_part))
            .await?;
        exercises.sort_by(|a, b| a.exercise_name.cmp(&b.exercise_name));
        Ok(exercises)
    }

    /// Replace a custom exercise record.
    pub async fn update(&self, exercise: &CustomExercise) -> AppResult<()> {
        self.docs.put(exercise).await
    }

    /// Delete a custom exercise.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Filter selecting a user's exercise by body part and name.
    #[must_use]
    pub fn name_filter(user_id: &str, body_part: &str, exercise_name: &str) -> Filter {
        Filter::new()
            .eq("userId", user_id)
            .eq("bodyPart", body_part)
            .eq("exerciseName", exercise_name)
    }
}
