//! Comment service.

use std::collections::HashSet;

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::{Comment, NotificationType};
use musclegram_db::repositories::Repositories;
use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

use super::notification::NotificationService;

/// Input for commenting on a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1))]
    pub post_id: String,

    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(min = 1, max = 1000))]
    pub content: String,

    /// Comment this one replies to, on the same post.
    pub parent_id: Option<String>,
}

/// Input for updating a comment. The parent is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 1000))]
    pub content: Option<String>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
    notifications: NotificationService,
    max_depth: usize,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        repos: Repositories,
        notifications: NotificationService,
        max_depth: usize,
    ) -> Self {
        Self {
            repos,
            notifications,
            max_depth,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate a comment and shape the record.
    pub async fn validate_create(&self, input: CreateCommentInput) -> AppResult<Comment> {
        input.validate()?;

        let (_, _) = futures::try_join!(
            self.repos.users.get_by_id(&input.user_id),
            self.repos.posts.get_by_id(&input.post_id),
        )?;

        let id = self.id_gen.generate();
        if let Some(parent_id) = &input.parent_id {
            self.check_parent(&id, &input.post_id, parent_id).await?;
        }

        let now = Utc::now();
        Ok(Comment {
            id,
            post_id: input.post_id,
            user_id: input.user_id,
            content: input.content,
            parent_id: input.parent_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Comment on a post and notify its author.
    pub async fn create(&self, input: CreateCommentInput) -> AppResult<Comment> {
        let comment = self.validate_create(input).await?;
        self.repos.comments.create(&comment).await?;
        if let Some(parent_id) = &comment.parent_id {
            self.verify_parent(&comment, parent_id).await?;
        }
        info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");

        match self.repos.posts.find_by_id(&comment.post_id).await {
            Ok(Some(post)) => {
                if let Err(e) = self
                    .notifications
                    .notify(
                        &post.user_id,
                        &comment.user_id,
                        NotificationType::Comment,
                        Some(&post.id),
                    )
                    .await
                {
                    warn!(error = %e, comment_id = %comment.id, "Failed to create comment notification");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, comment_id = %comment.id, "Failed to load commented post"),
        }

        Ok(comment)
    }

    /// Validate a change to a comment and return the updated record.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<Comment> {
        input.validate()?;
        let mut comment = self.get_owned(actor_id, id).await?;

        if let Some(content) = input.content {
            comment.content = content;
        }
        comment.updated_at = Utc::now();
        Ok(comment)
    }

    /// Update a comment.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<Comment> {
        let comment = self.validate_update(actor_id, id, input).await?;
        self.repos.comments.update(&comment).await?;
        info!(comment_id = %comment.id, "Comment updated");
        Ok(comment)
    }

    /// Delete a comment. Comments that still have replies cannot be deleted.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let comment = self.get_owned(actor_id, id).await?;
        if !self.repos.comments.find_replies(&comment.id).await?.is_empty() {
            return Err(AppError::Conflict(format!(
                "Comment {id} has replies"
            )));
        }
        self.repos.comments.delete(&comment.id).await?;

        // A reply written after the check above must not be orphaned.
        match self.repos.comments.find_replies(&comment.id).await {
            Ok(replies) if replies.is_empty() => {
                info!(comment_id = %comment.id, "Comment deleted");
                Ok(())
            }
            Ok(_) => {
                warn!(comment_id = %comment.id, "Reply arrived during delete, restoring comment");
                self.repos.comments.update(&comment).await?;
                Err(AppError::Conflict(format!("Comment {id} has replies")))
            }
            Err(e) => {
                if let Err(restore) = self.repos.comments.update(&comment).await {
                    warn!(error = %restore, comment_id = %comment.id, "Failed to restore comment");
                }
                Err(e)
            }
        }
    }

    /// Re-read the parent of a just written reply. If it was deleted in the
    /// meantime, the reply is removed again.
    async fn verify_parent(&self, comment: &Comment, parent_id: &str) -> AppResult<()> {
        let outcome = match self.repos.comments.find_by_id(parent_id).await {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => AppError::CommentNotFound(parent_id.to_string()),
            Err(e) => e,
        };

        warn!(comment_id = %comment.id, parent_id = %parent_id, "Parent not confirmed, removing reply");
        if let Err(e) = self.repos.comments.delete(&comment.id).await {
            warn!(error = %e, comment_id = %comment.id, "Failed to remove reply");
        }
        Err(outcome)
    }

    /// Check that `parent_id` can be the parent of comment `id` on `post_id`.
    ///
    /// Walks the ancestor chain up to the configured depth. Reaching `id`
    /// again, or any comment twice, is a cycle.
    async fn check_parent(&self, id: &str, post_id: &str, parent_id: &str) -> AppResult<()> {
        let mut seen = HashSet::from([id.to_string()]);
        let mut next = Some(parent_id.to_string());

        for depth in 0..self.max_depth {
            let Some(current_id) = next else {
                debug!(comment_id = %id, depth, "Comment ancestry checked");
                return Ok(());
            };
            if !seen.insert(current_id.clone()) {
                return Err(AppError::InvalidArgument(format!(
                    "Comment parent chain of {id} forms a cycle at {current_id}"
                )));
            }

            let ancestor = self.repos.comments.get_by_id(&current_id).await?;
            if ancestor.post_id != post_id {
                return Err(AppError::InvalidArgument(format!(
                    "Comment {current_id} belongs to another post"
                )));
            }
            next = ancestor.parent_id;
        }

        if next.is_none() {
            return Ok(());
        }
        Err(AppError::InvalidArgument(format!(
            "Comment thread deeper than {}",
            self.max_depth
        )))
    }

    async fn get_owned(&self, actor_id: &str, id: &str) -> AppResult<Comment> {
        let comment = self.repos.comments.get_by_id(id).await?;
        if comment.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can change a comment".to_string(),
            ));
        }
        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, exercise, fixture};
    use crate::services::CreatePostInput;

    fn input(post_id: &str, user_id: &str, parent_id: Option<&str>) -> CreateCommentInput {
        CreateCommentInput {
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            content: "Great set".to_string(),
            parent_id: parent_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_reply_on_same_post() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;

        let top = services.comments.create(input(&post.id, &alice.id, None)).await.unwrap();
        let reply = services
            .comments
            .create(input(&post.id, &bob.id, Some(&top.id)))
            .await
            .unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(top.id.as_str()));

        // Only alice's comment notifies bob; bob replying to his own post does not.
        assert_eq!(services.repos.notifications.count_unread(&bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_parent_on_other_post_is_invalid() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;
        let other = services
            .posts
            .create(CreatePostInput {
                user_id: alice.id.clone(),
                content: None,
                exercise: exercise(&[("20", "12")]),
                timestamp: None,
            })
            .await
            .unwrap();
        let foreign = services
            .comments
            .create(input(&other.id, &bob.id, None))
            .await
            .unwrap();

        let result = services
            .comments
            .create(input(&post.id, &alice.id, Some(&foreign.id)))
            .await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let Fixture {
            services,
            alice,
            post,
            ..
        } = fixture().await;

        let result = services
            .comments
            .create(input(&post.id, &alice.id, Some("ghost")))
            .await;
        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_never_moves_parent() {
        let Fixture {
            services,
            alice,
            post,
            ..
        } = fixture().await;

        let a = services.comments.create(input(&post.id, &alice.id, None)).await.unwrap();
        let b = services.comments.create(input(&post.id, &alice.id, None)).await.unwrap();

        let patch = |content: &str, parent: &str| -> UpdateCommentInput {
            serde_json::from_value(serde_json::json!({"content": content, "parentId": parent}))
                .unwrap()
        };
        let (ra, rb) = tokio::join!(
            services.comments.update(&alice.id, &a.id, patch("edited a", &b.id)),
            services.comments.update(&alice.id, &b.id, patch("edited b", &a.id)),
        );

        assert_eq!(ra.unwrap().content, "edited a");
        assert_eq!(rb.unwrap().content, "edited b");
        for id in [&a.id, &b.id] {
            let stored = services.repos.comments.get_by_id(id).await.unwrap();
            assert!(stored.parent_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_depth_is_bounded() {
        let Fixture {
            services,
            alice,
            post,
            ..
        } = fixture().await;
        let shallow = CommentService::new(services.repos.clone(), services.notifications.clone(), 3);

        let mut parent: Option<String> = None;
        for _ in 0..4 {
            let comment = shallow
                .create(input(&post.id, &alice.id, parent.as_deref()))
                .await
                .unwrap();
            parent = Some(comment.id);
        }

        let result = shallow
            .create(input(&post.id, &alice.id, parent.as_deref()))
            .await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_delete_with_replies_conflicts() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;

        let top = services.comments.create(input(&post.id, &alice.id, None)).await.unwrap();
        let reply = services
            .comments
            .create(input(&post.id, &bob.id, Some(&top.id)))
            .await
            .unwrap();

        let result = services.comments.delete(&alice.id, &top.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let forbidden = services.comments.delete(&alice.id, &reply.id).await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        services.comments.delete(&bob.id, &reply.id).await.unwrap();
        services.comments.delete(&alice.id, &top.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_racing_reply_leaves_no_orphan() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;

        let top = services.comments.create(input(&post.id, &alice.id, None)).await.unwrap();

        let (deleted, replied) = tokio::join!(
            services.comments.delete(&alice.id, &top.id),
            services.comments.create(input(&post.id, &bob.id, Some(&top.id))),
        );

        assert!(!(deleted.is_ok() && replied.is_ok()));
        let top_exists = services.repos.comments.find_by_id(&top.id).await.unwrap().is_some();
        assert_eq!(top_exists, deleted.is_err());

        for comment in services.repos.comments.find_by_post(&post.id).await.unwrap() {
            if let Some(parent_id) = &comment.parent_id {
                assert!(services.repos.comments.find_by_id(parent_id).await.unwrap().is_some());
            }
        }
    }
}
