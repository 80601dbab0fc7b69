//! Unique guard repository.

use chrono::Utc;
use tracing::debug;

use crate::collection::DocumentCollection;
use crate::entities::UniqueGuard;
use musclegram_common::AppResult;

/// Guard documents backing uniqueness-scoped writes.
#[derive(Clone)]
pub struct UniqueGuardRepository {
    docs: DocumentCollection<UniqueGuard>,
}

impl UniqueGuardRepository {
    /// Create a new guard repository.
    #[must_use]
    pub const fn new(docs: DocumentCollection<UniqueGuard>) -> Self {
        Self { docs }
    }

    /// Claim `guard_id` for `owner_id`. Returns `false` if someone holds it.
    pub async fn claim(&self, guard_id: &str, collection: &str, owner_id: &str) -> AppResult<bool> {
        let guard = UniqueGuard {
            id: guard_id.to_string(),
            collection: collection.to_string(),
            owner_id: owner_id.to_string(),
            claimed_at: Utc::now(),
        };
        let claimed = self.docs.insert(&guard).await?;
        debug!(guard = %guard_id, owner = %owner_id, claimed, "Guard claim");
        Ok(claimed)
    }

    /// Find a guard.
    pub async fn find(&self, guard_id: &str) -> AppResult<Option<UniqueGuard>> {
        self.docs.find_by_id(guard_id).await
    }

    /// Release `guard_id` if `owner_id` still holds it. Returns whether it was released.
    pub async fn release(&self, guard_id: &str, owner_id: &str) -> AppResult<bool> {
        match self.find(guard_id).await? {
            Some(guard) if guard.owner_id == owner_id => self.docs.delete(guard_id).await,
            _ => Ok(false),
        }
    }

    /// Create or overwrite a guard.
    pub async fn put(&self, guard: &UniqueGuard) -> AppResult<()> {
        self.docs.put(guard).await
    }

    /// Every guard.
    pub async fn all(&self) -> AppResult<Vec<UniqueGuard>> {
        self.docs.all().await
    }
}
