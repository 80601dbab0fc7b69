//! Post repository.

use super::page;
use crate::collection::DocumentCollection;
use crate::entities::Post;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// Post repository for store operations.
#[derive(Clone)]
pub struct PostRepository {
    docs: DocumentCollection<Post>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<Post>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<Post> {
        &self.docs
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Post>> {
        self.docs.find_by_id(id).await
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Post> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, post: &Post) -> AppResult<()> {
        if self.docs.insert(post).await? {
            Ok(())
        } else {
            Err(AppError::Internal(format!("Post id collision: {}", post.id)))
        }
    }

    /// Replace a post record.
    pub async fn update(&self, post: &Post) -> AppResult<()> {
        self.docs.put(post).await
    }

    /// Delete a post.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Posts by a user, newest first (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: usize,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Post>> {
        let posts = self.docs.find(&Filter::new().eq("userId", user_id)).await?;
        Ok(page(posts, limit, until_id))
    }

    /// Posts by any of `user_ids`, newest first (paginated).
    pub async fn find_by_users(
        &self,
        user_ids: &[String],
        limit: usize,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Post>> {
        let per_user = futures::future::try_join_all(user_ids.iter().map(|id| async move {
            self.docs.find(&Filter::new().eq("userId", id.as_str())).await
        }))
        .await?;
        Ok(page(per_user.into_iter().flatten().collect(), limit, until_id))
    }

    /// Count posts by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        self.docs.count(&Filter::new().eq("userId", user_id)).await
    }
}
