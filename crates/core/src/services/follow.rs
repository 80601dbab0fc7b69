//! Follow service.

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::{Follow, NotificationType};
use musclegram_db::repositories::Repositories;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::notification::NotificationService;
use crate::consistency::{UniqueKey, UniqueWriter};

/// Input for following a user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowInput {
    #[validate(length(min = 1))]
    pub follower_id: String,

    #[validate(length(min = 1))]
    pub following_id: String,
}

/// Follow service for business logic.
///
/// Follows are never edited; they are created and deleted by the follower.
#[derive(Clone)]
pub struct FollowService {
    repos: Repositories,
    writer: UniqueWriter,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
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

    fn key(&self, follow: &Follow) -> UniqueKey {
        UniqueKey::new(
            self.repos.follows.collection().name(),
            &[
                ("followerId", follow.follower_id.as_str()),
                ("followingId", follow.following_id.as_str()),
            ],
        )
    }

    /// Validate a follow and shape the record.
    pub async fn validate_create(&self, input: CreateFollowInput) -> AppResult<Follow> {
        // Can't follow yourself
        if input.follower_id == input.following_id {
            return Err(AppError::InvalidArgument(
                "Cannot follow yourself".to_string(),
            ));
        }
        input.validate()?;

        let (_, _) = futures::try_join!(
            self.repos.users.get_by_id(&input.follower_id),
            self.repos.users.get_by_id(&input.following_id),
        )?;

        let follow = Follow {
            id: self.id_gen.generate(),
            follower_id: input.follower_id,
            following_id: input.following_id,
            created_at: Utc::now(),
        };
        self.writer
            .check(self.repos.follows.collection(), &follow.id, &[self.key(&follow)])
            .await?;
        Ok(follow)
    }

    /// Follow a user and notify them.
    pub async fn create(&self, input: CreateFollowInput) -> AppResult<Follow> {
        let follow = self.validate_create(input).await?;
        self.writer
            .create(self.repos.follows.collection(), &follow, &[self.key(&follow)])
            .await?;
        info!(follower = %follow.follower_id, following = %follow.following_id, "User followed");

        if let Err(e) = self
            .notifications
            .notify(
                &follow.following_id,
                &follow.follower_id,
                NotificationType::Follow,
                None,
            )
            .await
        {
            warn!(error = %e, follow_id = %follow.id, "Failed to create follow notification");
        }

        Ok(follow)
    }

    /// Follows cannot be edited. Non-owners get `Forbidden`, the owner
    /// `InvalidArgument`.
    pub async fn validate_update(&self, actor_id: &str, id: &str) -> AppResult<Follow> {
        let follow = self.get_owned(actor_id, id).await?;
        Err(AppError::InvalidArgument(format!(
            "Follow {} cannot be edited, only deleted",
            follow.id
        )))
    }

    /// Delete a follow. Only the follower may delete it.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let follow = self.get_owned(actor_id, id).await?;
        self.remove(&follow).await
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<Follow> {
        let follow = self
            .repos
            .follows
            .collection()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Follow {id}")))?;
        if follow.follower_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the follower can change a follow".to_string(),
            ));
        }
        Ok(follow)
    }

    /// Stop following a user.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> AppResult<()> {
        let follow = self
            .repos
            .follows
            .find_by_pair(follower_id, following_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not following".to_string()))?;
        self.remove(&follow).await
    }

    async fn remove(&self, follow: &Follow) -> AppResult<()> {
        self.repos.follows.delete(&follow.id).await?;
        self.writer.release(&follow.id, &[self.key(follow)]).await;
        info!(follower = %follow.follower_id, following = %follow.following_id, "User unfollowed");
        Ok(())
    }
}
