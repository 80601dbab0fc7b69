//! Post service.

use chrono::{DateTime, Utc};
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::{Exercise, ExerciseSet, Post};
use musclegram_db::repositories::Repositories;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::like::like_key;
use crate::consistency::UniqueWriter;
use crate::validation::check_sets;

/// One set as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetInput {
    #[validate(length(min = 1, max = 16))]
    pub weight: String,

    #[validate(length(min = 1, max = 16))]
    pub reps: String,
}

/// The exercise performed in a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExerciseInput {
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(min = 1, max = 100), nested)]
    pub sets: Vec<SetInput>,

    #[validate(length(max = 1000))]
    pub memo: Option<String>,

    #[validate(length(max = 2048))]
    pub photo: Option<String>,
}

impl From<ExerciseInput> for Exercise {
    fn from(input: ExerciseInput) -> Self {
        Self {
            id: input.id,
            name: input.name,
            sets: input
                .sets
                .into_iter()
                .map(|set| ExerciseSet {
                    weight: set.weight.trim().to_string(),
                    reps: set.reps.trim().to_string(),
                })
                .collect(),
            memo: input.memo.filter(|memo| !memo.is_empty()),
            photo: input.photo.filter(|photo| !photo.is_empty()),
        }
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(max = 2000))]
    pub content: Option<String>,

    #[validate(nested)]
    pub exercise: ExerciseInput,

    /// When the workout happened. Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Input for updating a post.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(max = 2000))]
    pub content: Option<String>,

    #[validate(nested)]
    pub exercise: Option<ExerciseInput>,

    pub timestamp: Option<DateTime<Utc>>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
    writer: UniqueWriter,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(repos: Repositories, writer: UniqueWriter) -> Self {
        Self {
            repos,
            writer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate a new post and shape the record.
    pub async fn validate_create(&self, input: CreatePostInput) -> AppResult<Post> {
        input.validate()?;
        let exercise = Exercise::from(input.exercise);
        check_sets(&exercise.sets)?;

        self.repos.users.get_by_id(&input.user_id).await?;

        let now = Utc::now();
        Ok(Post {
            id: self.id_gen.generate(),
            user_id: input.user_id,
            content: input.content.unwrap_or_default(),
            exercise,
            timestamp: input.timestamp.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a post.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<Post> {
        let post = self.validate_create(input).await?;
        self.repos.posts.create(&post).await?;
        info!(post_id = %post.id, user_id = %post.user_id, exercise = %post.exercise.name, "Post created");
        Ok(post)
    }

    /// Get a post.
    pub async fn get(&self, id: &str) -> AppResult<Post> {
        self.repos.posts.get_by_id(id).await
    }

    /// Validate a change to a post and return the updated record.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdatePostInput,
    ) -> AppResult<Post> {
        input.validate()?;
        let mut post = self.get_owned(actor_id, id).await?;

        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(exercise) = input.exercise {
            let exercise = Exercise::from(exercise);
            check_sets(&exercise.sets)?;
            post.exercise = exercise;
        }
        if let Some(timestamp) = input.timestamp {
            post.timestamp = timestamp;
        }
        post.updated_at = Utc::now();
        Ok(post)
    }

    /// Update a post.
    pub async fn update(&self, actor_id: &str, id: &str, input: UpdatePostInput) -> AppResult<Post> {
        let post = self.validate_update(actor_id, id, input).await?;
        self.repos.posts.update(&post).await?;
        info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    /// Delete a post together with its likes, comments and notifications.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let post = self.get_owned(actor_id, id).await?;
        let r = &self.repos;

        let (likes, comments, notifications) = futures::try_join!(
            r.likes.find_by_post(&post.id),
            r.comments.find_by_post(&post.id),
            r.notifications.find_by_post(&post.id),
        )?;

        let likes_collection = r.likes.collection().name();
        for like in &likes {
            r.likes.delete(&like.id).await?;
            self.writer
                .release(&like.id, &[like_key(likes_collection, &like.post_id, &like.user_id)])
                .await;
        }
        for comment in &comments {
            r.comments.delete(&comment.id).await?;
        }
        for notification in &notifications {
            if let Err(e) = r.notifications.delete(&notification.id).await {
                warn!(error = %e, notification_id = %notification.id, "Failed to delete post notification");
            }
        }

        r.posts.delete(&post.id).await?;
        info!(
            post_id = %post.id,
            likes = likes.len(),
            comments = comments.len(),
            notifications = notifications.len(),
            "Post deleted"
        );
        Ok(())
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<Post> {
        let post = self.repos.posts.get_by_id(id).await?;
        if post.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can change a post".to_string(),
            ));
        }
        Ok(post)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, exercise, fixture};
    use crate::services::{CreateCommentInput, CreateLikeInput};

    fn post_input(user_id: &str, sets: &[(&str, &str)]) -> CreatePostInput {
        CreatePostInput {
            user_id: user_id.to_string(),
            content: Some("Push day".to_string()),
            exercise: exercise(sets),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_create_requires_numeric_sets() {
        let Fixture { services, alice, .. } = fixture().await;

        let post = services
            .posts
            .create(post_input(&alice.id, &[("60", "10"), ("62.5", "8")]))
            .await
            .unwrap();
        assert_eq!(post.exercise.sets.len(), 2);
        assert_eq!(post.timestamp, post.created_at);

        let negative = services
            .posts
            .validate_create(post_input(&alice.id, &[("60", "-3")]))
            .await;
        assert!(matches!(negative, Err(AppError::InvalidArgument(_))));

        let text = services
            .posts
            .validate_create(post_input(&alice.id, &[("heavy", "5")]))
            .await;
        assert!(matches!(text, Err(AppError::InvalidArgument(_))));

        let empty = services.posts.validate_create(post_input(&alice.id, &[])).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_for_missing_user() {
        let Fixture { services, .. } = fixture().await;

        let result = services
            .posts
            .create(post_input("ghost", &[("60", "10")]))
            .await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_checks_owner_and_sets() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;

        let forbidden = services
            .posts
            .update(
                &alice.id,
                &post.id,
                UpdatePostInput {
                    content: Some("mine now".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        let bad_sets = services
            .posts
            .update(
                &bob.id,
                &post.id,
                UpdatePostInput {
                    exercise: Some(exercise(&[("1e999", "5")])),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(bad_sets, Err(AppError::InvalidArgument(_))));

        let updated = services
            .posts
            .update(
                &bob.id,
                &post.id,
                UpdatePostInput {
                    content: Some("New PR".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "New PR");
        assert_eq!(updated.exercise, post.exercise);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;

        services
            .likes
            .create(CreateLikeInput {
                post_id: post.id.clone(),
                user_id: alice.id.clone(),
            })
            .await
            .unwrap();
        let parent = services
            .comments
            .create(CreateCommentInput {
                post_id: post.id.clone(),
                user_id: alice.id.clone(),
                content: "Nice".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
        services
            .comments
            .create(CreateCommentInput {
                post_id: post.id.clone(),
                user_id: bob.id.clone(),
                content: "Thanks".to_string(),
                parent_id: Some(parent.id.clone()),
            })
            .await
            .unwrap();

        services.posts.delete(&bob.id, &post.id).await.unwrap();

        let r = &services.repos;
        assert!(r.likes.find_by_post(&post.id).await.unwrap().is_empty());
        assert!(r.comments.find_by_post(&post.id).await.unwrap().is_empty());
        assert!(r.notifications.find_by_post(&post.id).await.unwrap().is_empty());
        assert!(matches!(
            services.posts.get(&post.id).await,
            Err(AppError::PostNotFound(_))
        ));
        assert!(r.guards.all().await.unwrap().is_empty());
    }
}
