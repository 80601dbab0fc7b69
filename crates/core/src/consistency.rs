//! Uniqueness-scoped writes without transactions.
//!
//! The store only guarantees an atomic insert-if-absent per document. A write
//! that must keep a key unique therefore runs check, claim, write and
//! re-verify, and undoes its own write when re-verification shows it lost.
//!
//! The claim is a guard document whose id is derived from the key, so racing
//! writers contend on one document and the store picks the winner. A guard
//! left behind by a crashed writer is reclaimed once its owner record is
//! missing and the guard is older than the configured grace period.

use std::time::Duration;

use chrono::Utc;
use musclegram_common::{AppError, AppResult, ConsistencyConfig};
use musclegram_db::DocumentCollection;
use musclegram_db::entities::Document;
use musclegram_db::repositories::UniqueGuardRepository;
use musclegram_db::store::Filter;
use tracing::{debug, warn};

/// A combination of field values that at most one record may hold.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueKey {
    label: String,
    filter: Filter,
    guard_id: String,
}

impl UniqueKey {
    /// Key over `fields` of records in `collection`.
    #[must_use]
    pub fn new(collection: &str, fields: &[(&str, &str)]) -> Self {
        let mut filter = Filter::new();
        for (field, value) in fields {
            filter = filter.eq(*field, *value);
        }
        let names: Vec<&str> = fields.iter().map(|(field, _)| *field).collect();
        let values: Vec<&str> = fields.iter().map(|(_, value)| *value).collect();
        // JSON keeps the encoding unambiguous when values contain separators.
        let encoded = serde_json::to_string(&values).unwrap_or_default();
        Self {
            label: format!("{collection}({})", names.join(", ")),
            filter,
            guard_id: format!("{collection}:{}:{encoded}", names.join("+")),
        }
    }

    /// Filter selecting records holding this key.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Id of the guard document for this key.
    #[must_use]
    pub fn guard_id(&self) -> &str {
        &self.guard_id
    }

    /// Human-readable name of the key, for errors and logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

enum Claim {
    Held,
    Taken,
    Retry,
}

/// Runs the check, claim, write, re-verify sequence for unique keys.
#[derive(Clone)]
pub struct UniqueWriter {
    guards: UniqueGuardRepository,
    max_attempts: u32,
    stale_after: Duration,
}

impl UniqueWriter {
    /// Create a writer over the guard collection.
    #[must_use]
    pub fn new(guards: UniqueGuardRepository, config: &ConsistencyConfig) -> Self {
        Self {
            guards,
            max_attempts: config.max_write_attempts.max(1),
            stale_after: config.stale_guard_after(),
        }
    }

    /// Fail with `Conflict` if a record other than `own_id` holds any of `keys`.
    pub async fn check<T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        own_id: &str,
        keys: &[UniqueKey],
    ) -> AppResult<()> {
        for key in keys {
            let holders = docs.find(key.filter()).await?;
            if holders.iter().any(|record| record.id() != own_id) {
                return Err(AppError::Conflict(format!("{} already exists", key.label())));
            }
        }
        Ok(())
    }

    /// Insert `record`, holding every key in `keys`.
    pub async fn create<T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        record: &T,
        keys: &[UniqueKey],
    ) -> AppResult<()> {
        let id = record.id();

        for attempt in 1..=self.max_attempts {
            self.check(docs, id, keys).await?;

            let claimed = match self.claim_all(docs, id, keys).await? {
                Ok(claimed) => claimed,
                Err(Claim::Retry) => {
                    debug!(collection = %docs.name(), attempt, "Retrying unique write after reclaiming a guard");
                    continue;
                }
                Err(_) => return Err(Self::conflict(docs, keys)),
            };

            match docs.insert(record).await {
                Ok(true) => {}
                Ok(false) => {
                    self.release_claims(id, &claimed).await;
                    return Err(AppError::Internal(format!(
                        "{} id collision: {id}",
                        docs.name()
                    )));
                }
                Err(e) => {
                    self.release_claims(id, &claimed).await;
                    return Err(e);
                }
            }

            if self.verify(docs, id, keys).await? {
                debug!(collection = %docs.name(), id = %id, "Unique write verified");
                return Ok(());
            }

            warn!(collection = %docs.name(), id = %id, "Lost unique write race, compensating");
            if let Err(e) = docs.delete(id).await {
                warn!(error = %e, collection = %docs.name(), id = %id, "Failed to delete losing write");
            }
            self.release_claims(id, &claimed).await;
            return Err(Self::conflict(docs, keys));
        }

        Err(AppError::Conflict(format!(
            "{} write did not settle after {} attempts",
            docs.name(),
            self.max_attempts
        )))
    }

    /// Replace `current` with `updated`, moving any key that changed.
    ///
    /// Keys whose guard id is unchanged are kept as they are. New guards are
    /// claimed before the write; old ones are released after it is verified.
    pub async fn replace<T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        current: &T,
        updated: &T,
        current_keys: &[UniqueKey],
        updated_keys: &[UniqueKey],
    ) -> AppResult<()> {
        let id = updated.id();
        let moved: Vec<UniqueKey> = updated_keys
            .iter()
            .filter(|key| !current_keys.iter().any(|k| k.guard_id() == key.guard_id()))
            .cloned()
            .collect();

        if moved.is_empty() {
            return docs.put(updated).await;
        }

        for attempt in 1..=self.max_attempts {
            self.check(docs, id, &moved).await?;

            let claimed = match self.claim_all(docs, id, &moved).await? {
                Ok(claimed) => claimed,
                Err(Claim::Retry) => {
                    debug!(collection = %docs.name(), attempt, "Retrying unique update after reclaiming a guard");
                    continue;
                }
                Err(_) => return Err(Self::conflict(docs, &moved)),
            };

            if let Err(e) = docs.put(updated).await {
                self.release_claims(id, &claimed).await;
                return Err(e);
            }

            if self.verify(docs, id, &moved).await? {
                let released: Vec<&UniqueKey> = current_keys
                    .iter()
                    .filter(|key| !updated_keys.iter().any(|k| k.guard_id() == key.guard_id()))
                    .collect();
                self.release_claims(id, &released).await;
                return Ok(());
            }

            warn!(collection = %docs.name(), id = %id, "Lost unique update race, restoring previous record");
            if let Err(e) = docs.put(current).await {
                warn!(error = %e, collection = %docs.name(), id = %id, "Failed to restore record");
            }
            self.release_claims(id, &claimed).await;
            return Err(Self::conflict(docs, &moved));
        }

        Err(AppError::Conflict(format!(
            "{} update did not settle after {} attempts",
            docs.name(),
            self.max_attempts
        )))
    }

    /// Release the guards `owner_id` holds for `keys`.
    ///
    /// Called after the owner record is deleted. A guard that fails to release
    /// is left for reclamation.
    pub async fn release(&self, owner_id: &str, keys: &[UniqueKey]) {
        let keys: Vec<&UniqueKey> = keys.iter().collect();
        self.release_claims(owner_id, &keys).await;
    }

    async fn release_claims(&self, owner_id: &str, keys: &[&UniqueKey]) {
        for key in keys {
            if let Err(e) = self.guards.release(key.guard_id(), owner_id).await {
                warn!(error = %e, guard = %key.guard_id(), "Failed to release unique guard");
            }
        }
    }

    fn conflict<T: Document>(docs: &DocumentCollection<T>, keys: &[UniqueKey]) -> AppError {
        let labels: Vec<&str> = keys.iter().map(UniqueKey::label).collect();
        AppError::Conflict(format!(
            "{} already exists in {}",
            labels.join(" / "),
            docs.name()
        ))
    }

    /// Claim every key. On failure, claims made so far are released.
    async fn claim_all<'k, T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        owner_id: &str,
        keys: &'k [UniqueKey],
    ) -> AppResult<Result<Vec<&'k UniqueKey>, Claim>> {
        let mut claimed = Vec::with_capacity(keys.len());
        for key in keys {
            let outcome = match self.claim(docs, owner_id, key).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.release_claims(owner_id, &claimed).await;
                    return Err(e);
                }
            };
            match outcome {
                Claim::Held => claimed.push(key),
                other => {
                    self.release_claims(owner_id, &claimed).await;
                    return Ok(Err(other));
                }
            }
        }
        Ok(Ok(claimed))
    }

    async fn claim<T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        owner_id: &str,
        key: &UniqueKey,
    ) -> AppResult<Claim> {
        if self
            .guards
            .claim(key.guard_id(), docs.name(), owner_id)
            .await?
        {
            return Ok(Claim::Held);
        }

        let Some(guard) = self.guards.find(key.guard_id()).await? else {
            // Released between our insert and read.
            return Ok(Claim::Retry);
        };
        if guard.owner_id == owner_id {
            return Ok(Claim::Held);
        }

        let holders = docs.find(key.filter()).await?;
        if holders.iter().any(|record| record.id() == guard.owner_id) {
            return Ok(Claim::Taken);
        }

        let age = (Utc::now() - guard.claimed_at).to_std().unwrap_or_default();
        if age < self.stale_after {
            return Ok(Claim::Taken);
        }

        warn!(
            guard = %key.guard_id(),
            owner = %guard.owner_id,
            age_secs = age.as_secs(),
            "Reclaiming stale unique guard"
        );
        self.reclaim(key, &guard.owner_id).await?;
        Ok(Claim::Retry)
    }

    /// Remove the guard for `key` only while `stale_owner` still holds it.
    ///
    /// Another writer may have reclaimed and re-claimed the guard since it
    /// was judged stale; that claim is left alone.
    async fn reclaim(&self, key: &UniqueKey, stale_owner: &str) -> AppResult<bool> {
        let removed = self.guards.release(key.guard_id(), stale_owner).await?;
        if !removed {
            debug!(guard = %key.guard_id(), "Stale guard already replaced");
        }
        Ok(removed)
    }

    /// Whether `id` still owns every key and is the only record holding it.
    async fn verify<T: Document>(
        &self,
        docs: &DocumentCollection<T>,
        id: &str,
        keys: &[UniqueKey],
    ) -> AppResult<bool> {
        for key in keys {
            let owned = self
                .guards
                .find(key.guard_id())
                .await?
                .is_some_and(|guard| guard.owner_id == id);
            if !owned {
                return Ok(false);
            }
            let holders = docs.find(key.filter()).await?;
            if holders.iter().any(|record| record.id() != id) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
