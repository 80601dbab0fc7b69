//! User service.

use chrono::Utc;
use musclegram_common::{AppError, AppResult, IdGenerator};
use musclegram_db::entities::User;
use musclegram_db::repositories::Repositories;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::consistency::{UniqueKey, UniqueWriter};
use crate::validation::validate_username;

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub display_name: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(max = 2048))]
    pub avatar: Option<String>,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(email, length(max = 254))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,

    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    /// Empty string clears the avatar.
    #[validate(length(max = 2048))]
    pub avatar: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
    writer: UniqueWriter,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(repos: Repositories, writer: UniqueWriter) -> Self {
        Self {
            repos,
            writer,
            id_gen: IdGenerator::new(),
        }
    }

    fn keys(&self, user: &User) -> [UniqueKey; 2] {
        let collection = self.repos.users.collection().name();
        [
            UniqueKey::new(collection, &[("username", user.username.as_str())]),
            UniqueKey::new(collection, &[("email", user.email.as_str())]),
        ]
    }

    /// Validate a new user and shape the record.
    pub async fn validate_create(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;

        let now = Utc::now();
        let user = User {
            id: self.id_gen.generate(),
            email: input.email.to_lowercase(),
            display_name: input.display_name,
            username: input.username,
            bio: input.bio.unwrap_or_default(),
            avatar: input.avatar.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.writer
            .check(self.repos.users.collection(), &user.id, &self.keys(&user))
            .await?;
        Ok(user)
    }

    /// Create a new user.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<User> {
        let user = self.validate_create(input).await?;
        self.writer
            .create(self.repos.users.collection(), &user, &self.keys(&user))
            .await?;
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Get a user.
    pub async fn get(&self, id: &str) -> AppResult<User> {
        self.repos.users.get_by_id(id).await
    }

    /// Find a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<User> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Validate a profile change and return the updated record.
    pub async fn validate_update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateUserInput,
    ) -> AppResult<User> {
        let current = self.repos.users.get_by_id(id).await?;
        self.apply_update(actor_id, &current, input).await
    }

    async fn apply_update(
        &self,
        actor_id: &str,
        current: &User,
        input: UpdateUserInput,
    ) -> AppResult<User> {
        input.validate()?;
        if current.id != actor_id {
            return Err(AppError::Forbidden(
                "Users can only edit their own profile".to_string(),
            ));
        }

        let mut user = current.clone();
        if let Some(email) = input.email {
            user.email = email.to_lowercase();
        }
        if let Some(display_name) = input.display_name {
            user.display_name = display_name;
        }
        if let Some(username) = input.username {
            user.username = username;
        }
        if let Some(bio) = input.bio {
            user.bio = bio;
        }
        if let Some(avatar) = input.avatar {
            user.avatar = avatar;
        }
        user.updated_at = Utc::now();

        self.writer
            .check(self.repos.users.collection(), &user.id, &self.keys(&user))
            .await?;
        Ok(user)
    }

    /// Update a user's profile.
    pub async fn update(&self, actor_id: &str, id: &str, input: UpdateUserInput) -> AppResult<User> {
        let current = self.repos.users.get_by_id(id).await?;
        let user = self.apply_update(actor_id, &current, input).await?;
        self.writer
            .replace(
                self.repos.users.collection(),
                &current,
                &user,
                &self.keys(&current),
                &self.keys(&user),
            )
            .await?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Delete a user.
    ///
    /// Refused with `Conflict` while any record still belongs to or points
    /// at the user; those must be removed first.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        if actor_id != id {
            return Err(AppError::Forbidden(
                "Users can only delete their own account".to_string(),
            ));
        }
        let user = self.repos.users.get_by_id(id).await?;

        let dependents = self.dependents(id).await?;
        if !dependents.is_empty() {
            return Err(AppError::Conflict(format!(
                "User {id} is still referenced by {}",
                dependents.join(", ")
            )));
        }

        self.repos.users.delete(id).await?;
        self.writer.release(id, &self.keys(&user)).await;
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Names of the collections holding records that reference the user.
    async fn dependents(&self, id: &str) -> AppResult<Vec<String>> {
        let r = &self.repos;
        let (posts, likes, comments, followers, following, exercises, received, sent, goals) =
            futures::try_join!(
                r.posts.count_by_user(id),
                r.likes.find_by_user(id),
                r.comments.find_by_user(id),
                r.follows.count_followers(id),
                r.follows.count_following(id),
                r.custom_exercises.find_by_user(id),
                r.notifications.find_all_for_user(id),
                r.notifications.find_from_user(id),
                r.days_goals.find_by_user(id),
            )?;

        let mut dependents = Vec::new();
        let mut note = |present: bool, name: &str| {
            if present {
                dependents.push(name.to_string());
            }
        };
        note(posts > 0, r.posts.collection().name());
        note(!likes.is_empty(), r.likes.collection().name());
        note(!comments.is_empty(), r.comments.collection().name());
        note(followers > 0 || following > 0, r.follows.collection().name());
        note(!exercises.is_empty(), r.custom_exercises.collection().name());
        note(
            !received.is_empty() || !sent.is_empty(),
            r.notifications.collection().name(),
        );
        note(!goals.is_empty(), r.days_goals.collection().name());
        Ok(dependents)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, fixture, services};

    fn alice_input() -> CreateUserInput {
        CreateUserInput {
            email: "Alice@Example.com".to_string(),
            display_name: "Alice".to_string(),
            username: "alice".to_string(),
            bio: None,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_lowercases_email() {
        let services = services();
        let user = services.users.create(alice_input()).await.unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.bio, "");
        assert_eq!(services.users.get_by_username("alice").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let services = services();
        services.users.create(alice_input()).await.unwrap();

        let result = services
            .users
            .create(CreateUserInput {
                email: "other@example.com".to_string(),
                ..alice_input()
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_ignores_case() {
        let services = services();
        services.users.create(alice_input()).await.unwrap();

        let result = services
            .users
            .create(CreateUserInput {
                email: "ALICE@example.COM".to_string(),
                username: "alice2".to_string(),
                ..alice_input()
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_username_is_rejected() {
        let services = services();
        let result = services
            .users
            .create(CreateUserInput {
                username: "not valid!".to_string(),
                ..alice_input()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_same_username_one_wins() {
        let services = services();
        let (a, b) = tokio::join!(
            services.users.create(alice_input()),
            services.users.create(CreateUserInput {
                email: "second@example.com".to_string(),
                ..alice_input()
            }),
        );

        assert!(a.is_ok() ^ b.is_ok());
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rename_moves_username() {
        let services = services();
        let user = services.users.create(alice_input()).await.unwrap();

        services
            .users
            .update(
                &user.id,
                &user.id,
                UpdateUserInput {
                    username: Some("alicia".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The old name is free again.
        services
            .users
            .create(CreateUserInput {
                email: "new@example.com".to_string(),
                ..alice_input()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let Fixture { services, alice, .. } = fixture().await;

        let result = services
            .users
            .update(
                "bob",
                &alice.id,
                UpdateUserInput {
                    bio: Some("hacked".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_referenced_user_is_refused() {
        let Fixture { services, bob, .. } = fixture().await;

        // Bob still owns the fixture post.
        let result = services.users.delete(&bob.id, &bob.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(services.users.get(&bob.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_unreferenced_user() {
        let services = services();
        let user = services.users.create(alice_input()).await.unwrap();

        services.users.delete(&user.id, &user.id).await.unwrap();
        assert!(matches!(
            services.users.get(&user.id).await,
            Err(AppError::UserNotFound(_))
        ));
        // Username and email can be taken again.
        services.users.create(alice_input()).await.unwrap();
    }
}
