//! User repository.

use crate::collection::DocumentCollection;
use crate::entities::User;
use crate::store::Filter;
use musclegram_common::{AppError, AppResult};

/// User repository for store operations.
#[derive(Clone)]
pub struct UserRepository {
    docs: DocumentCollection<User>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<User>) -> Self {
        Self { docs }
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &DocumentCollection<User> {
        &self.docs
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.docs.find_by_id(id).await
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs. Missing ids are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<User>> {
        let found = futures::future::try_join_all(ids.iter().map(|id| self.find_by_id(id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.docs
            .find_one(&Filter::new().eq("username", username))
            .await
    }

    /// Find a user by (lower-cased) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.docs
            .find_one(&Filter::new().eq("email", email.to_lowercase()))
            .await
    }

    /// Replace a user record.
    pub async fn update(&self, user: &User) -> AppResult<()> {
        self.docs.put(user).await
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.docs.delete(id).await
    }
}
