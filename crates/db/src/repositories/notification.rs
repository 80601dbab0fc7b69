//! Notification repository.

use super::page;
use crate::collection::DocumentCollection;
use crate::entities::Notification;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// Notification repository for store operations.
#[derive(Clone)]
pub struct NotificationRepository {
    docs: DocumentCollection<Notification>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<Notification>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<Notification> {
        &self.docs
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Notification>> {
        self.docs.find_by_id(id).await
    }

    /// Find a notification by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Notification> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {id}")))
    }

    /// Create a new notification.
    pub async fn create(&self, notification: &Notification) -> AppResult<()> {
        if self.docs.insert(notification).await? {
            Ok(())
        } else {
            Err(AppError::Internal(format!(
                "Notification id collision: {}",
                notification.id
            )))
        }
    }

    /// Replace a notification record.
    pub async fn update(&self, notification: &Notification) -> AppResult<()> {
        self.docs.put(notification).await
    }

    /// Delete a notification.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Get notifications for a user, newest first (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: usize,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<Notification>> {
        let mut filter = Filter::new().eq("userId", user_id);
        if unread_only {
            filter = filter.eq("isRead", false);
        }
        let notifications = self.docs.find(&filter).await?;
        Ok(page(notifications, limit, until_id))
    }

    /// Notifications pointing at a post.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<Notification>> {
        self.docs.find(&Filter::new().eq("postId", post_id)).await
    }

    /// Notifications triggered by a user.
    pub async fn find_from_user(&self, from_user_id: &str) -> AppResult<Vec<Notification>> {
        self.docs
            .find(&Filter::new().eq("fromUserId", from_user_id))
            .await
    }

    /// Every notification received by a user.
    pub async fn find_all_for_user(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        self.docs.find(&Filter::new().eq("userId", user_id)).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.docs
            .count(&Filter::new().eq("userId", user_id).eq("isRead", false))
            .await
    }
}
