//! Like repository.

use crate::collection::DocumentCollection;
use crate::entities::Like;
use crate::store::Filter;
use musclegram_common::AppResult;

/// Like repository for store operations.
#[derive(Clone)]
pub struct LikeRepository {
    docs: DocumentCollection<Like>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<Like>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<Like> {
        &self.docs
    }

    /// Find a like by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Like>> {
        self.docs.find_by_id(id).await
    }

    /// Find the like a user left on a post.
    pub async fn find_by_pair(&self, post_id: &str, user_id: &str) -> AppResult<Option<Like>> {
        self.docs
            .find_one(&Self::pair_filter(post_id, user_id))
            .await
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, post_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(post_id, user_id).await?.is_some())
    }

    /// Likes on a post.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<Like>> {
        self.docs.find(&Filter::new().eq("postId", post_id)).await
    }

    /// Likes left by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Like>> {
        self.docs.find(&Filter::new().eq("userId", user_id)).await
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        self.docs.count(&Filter::new().eq("postId", post_id)).await
    }

    /// Delete a like.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Filter selecting the like of `user_id` on `post_id`.
    #[must_use]
    pub fn pair_filter(post_id: &str, user_id: &str) -> Filter {
        Filter::new().eq("postId", post_id).eq("userId", user_id)
    }
}
