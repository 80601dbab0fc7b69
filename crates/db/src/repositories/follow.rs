//! Follow repository.

use super::page;
use crate::collection::DocumentCollection;
use crate::entities::Follow;
use crate::store::Filter;
use musclegram_common::AppResult;

/// Follow repository for store operations.
#[derive(Clone)]
pub struct FollowRepository {
    docs: DocumentCollection<Follow>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<Follow>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<Follow> {
        &self.docs
    }

    /// Find a follow relationship by follower and followed user.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> AppResult<Option<Follow>> {
        self.docs
            .find_one(&Self::pair_filter(follower_id, following_id))
            .await
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, following_id).await?.is_some())
    }

    /// Delete a follow relationship.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }

    /// Relationships where `user_id` is the follower, newest first (paginated).
    pub async fn find_following(
        &self,
        user_id: &str,
        limit: usize,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Follow>> {
        let follows = self.docs.find(&Filter::new().eq("followerId", user_id)).await?;
        Ok(page(follows, limit, until_id))
    }

    /// Relationships where `user_id` is followed, newest first (paginated).
    pub async fn find_followers(
        &self,
        user_id: &str,
        limit: usize,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Follow>> {
        let follows = self.docs.find(&Filter::new().eq("followingId", user_id)).await?;
        Ok(page(follows, limit, until_id))
    }

    /// Ids of every user `user_id` follows.
    pub async fn following_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .docs
            .find(&Filter::new().eq("followerId", user_id))
            .await?
            .into_iter()
            .map(|follow| follow.following_id)
            .collect())
    }

    /// Count users following `user_id`.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.docs.count(&Filter::new().eq("followingId", user_id)).await
    }

    /// Count users `user_id` follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        self.docs.count(&Filter::new().eq("followerId", user_id)).await
    }

    /// Filter selecting the follow of `follower_id` on `following_id`.
    #[must_use]
    pub fn pair_filter(follower_id: &str, following_id: &str) -> Filter {
        Filter::new()
            .eq("followerId", follower_id)
            .eq("followingId", following_id)
    }
}
