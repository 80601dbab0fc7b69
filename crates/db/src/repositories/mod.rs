//! Repositories over the document collections.

use std::sync::Arc;
use std::time::Duration;

use crate::collection::DocumentCollection;
use crate::entities::Document;
use crate::store::DocumentStore;
use musclegram_common::Config;

pub mod comment;
pub mod custom_exercise;
pub mod days_goal;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod unique_guard;
pub mod user;

pub use comment::CommentRepository;
pub use custom_exercise::CustomExerciseRepository;
pub use days_goal::DaysGoalRepository;
pub use follow::FollowRepository;
pub use like::LikeRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use unique_guard::UniqueGuardRepository;
pub use user::UserRepository;

/// Every repository, wired to one store and one collection registry.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Repositories {
    pub users: UserRepository,
    pub posts: PostRepository,
    pub likes: LikeRepository,
    pub comments: CommentRepository,
    pub follows: FollowRepository,
    pub custom_exercises: CustomExerciseRepository,
    pub notifications: NotificationRepository,
    pub days_goals: DaysGoalRepository,
    pub guards: UniqueGuardRepository,
}

impl Repositories {
    /// Build the repositories from configuration.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let names = &config.collections;
        let timeout = config.consistency.lookup_timeout();

        Self {
            users: UserRepository::new(open(&store, &names.users, timeout)),
            posts: PostRepository::new(open(&store, &names.posts, timeout)),
            likes: LikeRepository::new(open(&store, &names.likes, timeout)),
            comments: CommentRepository::new(open(&store, &names.comments, timeout)),
            follows: FollowRepository::new(open(&store, &names.follows, timeout)),
            custom_exercises: CustomExerciseRepository::new(open(&store, &names.custom_exercises, timeout)),
            notifications: NotificationRepository::new(open(&store, &names.notifications, timeout)),
            days_goals: DaysGoalRepository::new(open(&store, &names.days_goals, timeout)),
            guards: UniqueGuardRepository::new(open(&store, &names.unique_guards, timeout)),
        }
    }
}

fn open<T: Document>(
    store: &Arc<dyn DocumentStore>,
    name: &str,
    timeout: Duration,
) -> DocumentCollection<T> {
    DocumentCollection::new(Arc::clone(store), name, timeout)
}

/// Newest-first page of records, ids strictly below `until_id`.
pub(crate) fn page<T: Document>(mut records: Vec<T>, limit: usize, until_id: Option<&str>) -> Vec<T> {
    if let Some(until) = until_id {
        records.retain(|record| record.id() < until);
    }
    records.sort_by(|a, b| b.id().cmp(a.id()));
    records.truncate(limit);
    records
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::{Follow, Post};
    use crate::test_utils::{sample_post, test_repositories};
    use chrono::Utc;
    use maplit::hashset;
    use std::collections::HashSet;

    fn follow(id: &str, follower: &str, following: &str) -> Follow {
        Follow {
            id: id.to_string(),
            follower_id: follower.to_string(),
            following_id: following.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_orders_newest_first_and_respects_cursor() {
        let follows = vec![
            follow("01a", "u1", "u2"),
            follow("01c", "u1", "u3"),
            follow("01b", "u1", "u4"),
        ];

        let first = page(follows.clone(), 2, None);
        assert_eq!(
            first.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
            ["01c", "01b"]
        );

        let next = page(follows, 2, Some("01b"));
        assert_eq!(next.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(), ["01a"]);
    }

    #[tokio::test]
    async fn test_feed_query_spans_users() {
        let (_store, repos) = test_repositories();
        let posts: Vec<Post> = vec![
            sample_post("01p1", "alice"),
            sample_post("01p2", "bob"),
            sample_post("01p3", "carol"),
        ];
        for post in &posts {
            repos.posts.create(post).await.unwrap();
        }

        let feed = repos
            .posts
            .find_by_users(&["alice".to_string(), "bob".to_string()], 10, None)
            .await
            .unwrap();
        let ids: HashSet<&str> = feed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, hashset! {"01p1", "01p2"});
        assert_eq!(feed[0].id, "01p2");
    }

    #[tokio::test]
    async fn test_follow_counts() {
        let (_store, repos) = test_repositories();
        for f in [
            follow("f1", "alice", "bob"),
            follow("f2", "carol", "bob"),
            follow("f3", "bob", "alice"),
        ] {
            repos.follows.collection().insert(&f).await.unwrap();
        }

        assert_eq!(repos.follows.count_followers("bob").await.unwrap(), 2);
        assert_eq!(repos.follows.count_following("bob").await.unwrap(), 1);
        assert!(repos.follows.is_following("carol", "bob").await.unwrap());
        assert!(!repos.follows.is_following("bob", "carol").await.unwrap());
        assert_eq!(
            repos.follows.following_ids("alice").await.unwrap(),
            vec!["bob".to_string()]
        );
    }

    #[tokio::test]
    async fn test_guard_release_checks_owner() {
        let (_store, repos) = test_repositories();
        assert!(repos.guards.claim("likes:p1:u1", "likes", "l1").await.unwrap());
        assert!(!repos.guards.claim("likes:p1:u1", "likes", "l2").await.unwrap());

        assert!(!repos.guards.release("likes:p1:u1", "l2").await.unwrap());
        assert!(repos.guards.release("likes:p1:u1", "l1").await.unwrap());
        assert!(repos.guards.find("likes:p1:u1").await.unwrap().is_none());
    }
}
