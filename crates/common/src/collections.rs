//! Collection name registry.
//!
//! Every persisted record type lives in its own named collection. The names are
//! part of configuration and are handed to the repositories explicitly, so two
//! deployments (or two test runs) can share one store under different names.

use serde::Deserialize;

/// Names of the document collections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    /// User profiles.
    pub users: String,
    /// Workout posts.
    pub posts: String,
    /// Likes on posts.
    pub likes: String,
    /// Comments on posts.
    pub comments: String,
    /// Follow relationships.
    pub follows: String,
    /// User-defined exercises.
    pub custom_exercises: String,
    /// Notifications.
    pub notifications: String,
    /// Monthly workout-day goals.
    pub days_goals: String,
    /// Guard documents claimed by uniqueness-scoped writes.
    pub unique_guards: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            posts: "posts".to_string(),
            likes: "likes".to_string(),
            comments: "comments".to_string(),
            follows: "follows".to_string(),
            custom_exercises: "custom_exercises".to_string(),
            notifications: "notifications".to_string(),
            days_goals: "days_goals".to_string(),
            unique_guards: "unique_guards".to_string(),
        }
    }
}

impl CollectionNames {
    /// Collection names prefixed with `prefix_`. Used to isolate test runs.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        let base = Self::default();
        let p = |name: String| format!("{prefix}_{name}");
        Self {
            users: p(base.users),
            posts: p(base.posts),
            likes: p(base.likes),
            comments: p(base.comments),
            follows: p(base.follows),
            custom_exercises: p(base.custom_exercises),
            notifications: p(base.notifications),
            days_goals: p(base.days_goals),
            unique_guards: p(base.unique_guards),
        }
    }

    /// All record collections, excluding the internal guard collection.
    #[must_use]
    pub fn records(&self) -> [&str; 8] {
        [
            &self.users,
            &self.posts,
            &self.likes,
            &self.comments,
            &self.follows,
            &self.custom_exercises,
            &self.notifications,
            &self.days_goals,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = CollectionNames::default();
        assert_eq!(
            names.records(),
            [
                "users",
                "posts",
                "likes",
                "comments",
                "follows",
                "custom_exercises",
                "notifications",
                "days_goals",
            ]
        );
        assert_eq!(names.unique_guards, "unique_guards");
    }

    #[test]
    fn test_prefixed_names() {
        let names = CollectionNames::with_prefix("t1");
        assert_eq!(names.users, "t1_users");
        assert_eq!(names.unique_guards, "t1_unique_guards");
    }
}
