//! Comment repository.

use crate::collection::DocumentCollection;
use crate::entities::Comment;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// Comment repository for store operations.
#[derive(Clone)]
pub struct CommentRepository {
    docs: DocumentCollection<Comment>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<Comment>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<Comment> {
        &self.docs
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Comment>> {
        self.docs.find_by_id(id).await
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Comment> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, comment: &Comment) -> AppResult<()> {
        if self.docs.insert(comment).await? {
            Ok(())
        } else {
            Err(AppError::Internal(format!("Comment id collision: {}", comment.id)))
        }
    }

    /// Replace a comment record.
    pub async fn update(&self, comment: &Comment) -> AppResult<()> {
        self.docs.put(comment).await
    }

    /// Delete a comment.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Comments on a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        let mut comments = self.docs.find(&Filter::new().eq("postId", post_id)).await?;
        comments.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(comments)
    }

    /// Direct replies to a comment.
    pub async fn find_replies(&self, parent_id: &str) -> AppResult<Vec<Comment>> {
        self.docs.find(&Filter::new().eq("parentId", parent_id)).await
    }

    /// Comments written by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Comment>> {
        self.docs.find(&Filter::new().eq("userId", user_id)).await
    }

    /// Count comments on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        self.docs.count(&Filter::new().eq("postId", post_id)).await
    }
}
