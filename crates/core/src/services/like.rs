//! Like service.

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::{Like, NotificationType};
use musclegram_db::repositories::Repositories;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::notification::NotificationService;
use crate::consistency::{UniqueKey, UniqueWriter};

/// Input for liking a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLikeInput {
    #[validate(length(min = 1))]
    pub post_id: String,

    #[validate(length(min = 1))]
    pub user_id: String,
}

/// Key allowing one like per user and post.
pub(crate) fn like_key(collection: &str, post_id: &str, user_id: &str) -> UniqueKey {
    UniqueKey::new(collection, &[("postId", post_id), ("userId", user_id)])
}

/// Like service for business logic.
///
/// Likes are never edited; they are created and deleted by the liking user.
#[derive(Clone)]
pub struct LikeService {
    repos: Repositories,
    writer: UniqueWriter,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        repos: Repositories,
        writer: UniqueWriter,
        notifications: NotificationService,
    ) -> Self {
        Self {
            repos,
            writer,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    fn key(&self, like: &Like) -> UniqueKey {
        like_key(self.repos.likes.collection().name(), &like.post_id, &like.user_id)
    }

    /// Validate a like and shape the record.
    pub async fn validate_create(&self, input: CreateLikeInput) -> AppResult<Like> {
        input.validate()?;

        let (_, _) = futures::try_join!(
            self.repos.users.get_by_id(&input.user_id),
            self.repos.posts.get_by_id(&input.post_id),
        )?;

        let like = Like {
            id: self.id_gen.generate(),
            post_id: input.post_id,
            user_id: input.user_id,
            created_at: Utc::now(),
        };
        self.writer
            .check(self.repos.likes.collection(), &like.id, &[self.key(&like)])
            .await?;
        Ok(like)
    }

    /// Like a post and notify its author.
    pub async fn create(&self, input: CreateLikeInput) -> AppResult<Like> {
        let like = self.validate_create(input).await?;
        self.writer
            .create(self.repos.likes.collection(), &like, &[self.key(&like)])
            .await?;
        info!(like_id = %like.id, post_id = %like.post_id, user_id = %like.user_id, "Post liked");

        match self.repos.posts.find_by_id(&like.post_id).await {
            Ok(Some(post)) => {
                if let Err(e) = self
                    .notifications
                    .notify(&post.user_id, &like.user_id, NotificationType::Like, Some(&post.id))
                    .await
                {
                    warn!(error = %e, like_id = %like.id, "Failed to create like notification");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, like_id = %like.id, "Failed to load liked post"),
        }

        Ok(like)
    }

    /// Likes cannot be edited. Non-owners get `Forbidden`, the owner
    /// `InvalidArgument`.
    pub async fn validate_update(&self, actor_id: &str, id: &str) -> AppResult<Like> {
        let like = self.get_owned(actor_id, id).await?;
        Err(AppError::InvalidArgument(format!(
            "Like {} cannot be edited, only deleted",
            like.id
        )))
    }

    /// Delete a like. Only the liking user may delete it.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let like = self.get_owned(actor_id, id).await?;
        self.remove(&like).await
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<Like> {
        let like = self
            .repos
            .likes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Like {id}")))?;
        if like.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the liking user can change a like".to_string(),
            ));
        }
        Ok(like)
    }

    /// Remove the like `user_id` left on `post_id`.
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let like = self
            .repos
            .likes
            .find_by_pair(post_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Like on {post_id} by {user_id}")))?;
        self.remove(&like).await
    }

    async fn remove(&self, like: &Like) -> AppResult<()> {
        self.repos.likes.delete(&like.id).await?;
        self.writer.release(&like.id, &[self.key(like)]).await;
        info!(like_id = %like.id, post_id = %like.post_id, "Like removed");
        Ok(())
    }
}
