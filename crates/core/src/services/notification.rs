//! Notification service.

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::{Notification, NotificationType, UserSnapshot};
use musclegram_db::repositories::{NotificationRepository, PostRepository, UserRepository};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Input for creating a notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationInput {
    /// Recipient
    #[validate(length(min = 1))]
    pub user_id: String,

    /// Triggering user
    #[validate(length(min = 1))]
    pub from_user_id: String,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    pub post_id: Option<String>,

    /// Defaults to a sentence built from the type and the triggering user's name.
    #[validate(length(min = 1, max = 500))]
    pub message: Option<String>,
}

/// Input for updating a notification. Only the read flag may change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationInput {
    pub is_read: Option<bool>,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        user_repo: UserRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            notification_repo,
            user_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate a notification and shape the record, snapshotting the sender.
    pub async fn validate_create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
        input.validate()?;

        match (input.notification_type.requires_post(), &input.post_id) {
            (true, None) => {
                return Err(AppError::InvalidArgument(format!(
                    "{} notification requires postId",
                    input.notification_type.as_str()
                )));
            }
            (false, Some(_)) => {
                return Err(AppError::InvalidArgument(format!(
                    "{} notification must not carry postId",
                    input.notification_type.as_str()
                )));
            }
            _ => {}
        }

        self.user_repo.get_by_id(&input.user_id).await?;
        let from = self.user_repo.get_by_id(&input.from_user_id).await?.snapshot();
        if let Some(post_id) = &input.post_id {
            self.post_repo.get_by_id(post_id).await?;
        }

        let message = input
            .message
            .unwrap_or_else(|| default_message(input.notification_type, &from));

        Ok(Notification {
            id: self.id_gen.generate(),
            user_id: input.user_id,
            from,
            notification_type: input.notification_type,
            post_id: input.post_id,
            message,
            is_read: false,
            created_at: Utc::now(),
        })
    }

    /// Create a notification.
    pub async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
        let notification = self.validate_create(input).await?;
        self.notification_repo.create(&notification).await?;
        info!(
            id = %notification.id,
            user_id = %notification.user_id,
            kind = notification.notification_type.as_str(),
            "Notification created"
        );
        Ok(notification)
    }

    /// Notify `recipient_id` of an action by `actor_id`. Acting on your own
    /// content does not notify.
    pub async fn notify(
        &self,
        recipient_id: &str,
        actor_id: &str,
        notification_type: NotificationType,
        post_id: Option<&str>,
    ) -> AppResult<Option<Notification>> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        self.create(CreateNotificationInput {
            user_id: recipient_id.to_string(),
            from_user_id: actor_id.to_string(),
            notification_type,
            post_id: post_id.map(str::to_string),
            message: None,
        })
        .await
        .map(Some)
    }

    /// Validate a change to a notification. Only the recipient may change it.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateNotificationInput,
    ) -> AppResult<Notification> {
        input.validate()?;
        let mut notification = self.get_for_recipient(actor_id, id).await?;
        if let Some(is_read) = input.is_read {
            notification.is_read = is_read;
        }
        Ok(notification)
    }

    /// Update a notification.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateNotificationInput,
    ) -> AppResult<Notification> {
        let notification = self.validate_update(actor_id, id, input).await?;
        self.notification_repo.update(&notification).await?;
        Ok(notification)
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, actor_id: &str, id: &str) -> AppResult<Notification> {
        self.update(actor_id, id, UpdateNotificationInput { is_read: Some(true) })
            .await
    }

    /// Mark every notification of a user as read. Returns how many changed.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<usize> {
        let unread = self
            .notification_repo
            .find_by_user(user_id, usize::MAX, None, true)
            .await?;
        let count = unread.len();
        futures::future::try_join_all(unread.into_iter().map(|mut notification| {
            notification.is_read = true;
            let repo = self.notification_repo.clone();
            async move { repo.update(&notification).await }
        }))
        .await?;
        Ok(count)
    }

    /// Delete a notification. Only the recipient may delete it.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        self.get_for_recipient(actor_id, id).await?;
        self.notification_repo.delete(id).await?;
        Ok(())
    }

    async fn get_for_recipient(&self, actor_id: &str, id: &str) -> AppResult<Notification> {
        let notification = self.notification_repo.get_by_id(id).await?;
        if notification.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the recipient can change a notification".to_string(),
            ));
        }
        Ok(notification)
    }
}

fn default_message(notification_type: NotificationType, from: &UserSnapshot) -> String {
    match notification_type {
        NotificationType::Like => format!("{} liked your post", from.name),
        NotificationType::Follow => format!("{} started following you", from.name),
        NotificationType::Comment => format!("{} commented on your post", from.name),
    }
}
