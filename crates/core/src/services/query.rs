//! Read-side queries for the presentation layer.
//!
//! Everything here takes identifiers and filter parameters and returns
//! records or aggregates. Nothing writes.

use musclegram_common::AppResult;
use musclegram_db::entities::{Comment, CustomExercise, DaysGoal, Notification, Post, User};
use musclegram_db::repositories::Repositories;
use serde::Serialize;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 20;

/// A post with its engagement counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub post: Post,
    pub like_count: u64,
    pub comment_count: u64,
    /// Whether the viewing user liked the post. `false` without a viewer.
    pub liked_by_viewer: bool,
}

/// Follower and following counts of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Query service over every collection.
#[derive(Clone)]
pub struct QueryService {
    repos: Repositories,
}

impl QueryService {
    /// Create a new query service.
    #[must_use]
    pub const fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Posts by a user, newest first.
    pub async fn user_posts(
        &self,
        user_id: &str,
        limit: Option<usize>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Post>> {
        self.repos
            .posts
            .find_by_user(user_id, limit.unwrap_or(DEFAULT_LIMIT), until_id)
            .await
    }

    /// Posts by the users `user_id` follows and by `user_id`, newest first.
    pub async fn home_feed(
        &self,
        user_id: &str,
        limit: Option<usize>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Post>> {
        let mut authors = self.repos.follows.following_ids(user_id).await?;
        authors.push(user_id.to_string());
        self.repos
            .posts
            .find_by_users(&authors, limit.unwrap_or(DEFAULT_LIMIT), until_id)
            .await
    }

    /// A post with like and comment counts.
    pub async fn post_summary(&self, post_id: &str, viewer_id: Option<&str>) -> AppResult<PostSummary> {
        let post = self.repos.posts.get_by_id(post_id).await?;
        let liked = async {
            match viewer_id {
                Some(viewer) => self.repos.likes.has_liked(post_id, viewer).await,
                None => Ok(false),
            }
        };
        let (like_count, comment_count, liked_by_viewer) = futures::try_join!(
            self.repos.likes.count_by_post(post_id),
            self.repos.comments.count_by_post(post_id),
            liked,
        )?;
        Ok(PostSummary {
            post,
            like_count,
            comment_count,
            liked_by_viewer,
        })
    }

    /// Comments on a post, oldest first.
    pub async fn comment_thread(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        self.repos.posts.get_by_id(post_id).await?;
        self.repos.comments.find_by_post(post_id).await
    }

    /// Users following `user_id`, most recent first.
    pub async fn followers(
        &self,
        user_id: &str,
        limit: Option<usize>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<User>> {
        let follows = self
            .repos
            .follows
            .find_followers(user_id, limit.unwrap_or(DEFAULT_LIMIT), until_id)
            .await?;
        let ids: Vec<String> = follows.into_iter().map(|f| f.follower_id).collect();
        self.repos.users.find_by_ids(&ids).await
    }

    /// Users `user_id` follows, most recent first.
    pub async fn following(
        &self,
        user_id: &str,
        limit: Option<usize>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<User>> {
        let follows = self
            .repos
            .follows
            .find_following(user_id, limit.unwrap_or(DEFAULT_LIMIT), until_id)
            .await?;
        let ids: Vec<String> = follows.into_iter().map(|f| f.following_id).collect();
        self.repos.users.find_by_ids(&ids).await
    }

    /// Follower and following counts.
    pub async fn follow_counts(&self, user_id: &str) -> AppResult<FollowCounts> {
        let (followers, following) = futures::try_join!(
            self.repos.follows.count_followers(user_id),
            self.repos.follows.count_following(user_id),
        )?;
        Ok(FollowCounts {
            followers,
            following,
        })
    }

    /// Notifications of a user, newest first.
    pub async fn notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<usize>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<Notification>> {
        self.repos
            .notifications
            .find_by_user(user_id, limit.unwrap_or(DEFAULT_LIMIT), until_id, unread_only)
            .await
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.repos.notifications.count_unread(user_id).await
    }

    /// Custom exercises of a user, optionally for one body part.
    pub async fn custom_exercises(
        &self,
        user_id: &str,
        body_part: Option<&str>,
    ) -> AppResult<Vec<CustomExercise>> {
        match body_part {
            Some(body_part) => {
                self.repos
                    .custom_exercises
                    .find_by_body_part(user_id, body_part)
                    .await
            }
            None => self.repos.custom_exercises.find_by_user(user_id).await,
        }
    }

    /// Every goal a user has set, most recent period first.
    pub async fn days_goals(&self, user_id: &str) -> AppResult<Vec<DaysGoal>> {
        self.repos.days_goals.find_by_user(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, exercise, fixture};
    use crate::services::{
        CreateCommentInput, CreateCustomExerciseInput, CreateFollowInput, CreateLikeInput,
        CreatePostInput,
    };
    use maplit::hashset;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_home_feed_includes_followed_and_own_posts() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;
        let own = services
            .posts
            .create(CreatePostInput {
                user_id: alice.id.clone(),
                content: None,
                exercise: exercise(&[("100", "3")]),
                timestamp: None,
            })
            .await
            .unwrap();

        let before = services.queries.home_feed(&alice.id, None, None).await.unwrap();
        assert_eq!(before.len(), 1);

        services
            .follows
            .create(CreateFollowInput {
                follower_id: alice.id.clone(),
                following_id: bob.id.clone(),
            })
            .await
            .unwrap();

        let feed = services.queries.home_feed(&alice.id, None, None).await.unwrap();
        let ids: HashSet<&str> = feed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, hashset! {post.id.as_str(), own.id.as_str()});

        let first = services.queries.home_feed(&alice.id, Some(1), None).await.unwrap();
        let rest = services
            .queries
            .home_feed(&alice.id, Some(10), Some(&first[0].id))
            .await
            .unwrap();
        assert_eq!(first.len() + rest.len(), 2);
    }

    #[tokio::test]
    async fn test_post_summary() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;
        services
            .likes
            .create(CreateLikeInput {
                post_id: post.id.clone(),
                user_id: alice.id.clone(),
            })
            .await
            .unwrap();
        services
            .comments
            .create(CreateCommentInput {
                post_id: post.id.clone(),
                user_id: alice.id.clone(),
                content: "Strong".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        let summary = services.queries.post_summary(&post.id, Some(&alice.id)).await.unwrap();
        assert_eq!(summary.like_count, 1);
        assert_eq!(summary.comment_count, 1);
        assert!(summary.liked_by_viewer);

        let anonymous = services.queries.post_summary(&post.id, None).await.unwrap();
        assert!(!anonymous.liked_by_viewer);

        let as_bob = services.queries.post_summary(&post.id, Some(&bob.id)).await.unwrap();
        assert!(!as_bob.liked_by_viewer);
    }

    #[tokio::test]
    async fn test_follow_lists_and_notifications() {
        let Fixture {
            services,
            alice,
            bob,
            ..
        } = fixture().await;
        services
            .follows
            .create(CreateFollowInput {
                follower_id: alice.id.clone(),
                following_id: bob.id.clone(),
            })
            .await
            .unwrap();

        let followers = services.queries.followers(&bob.id, None, None).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, alice.id);
        let following = services.queries.following(&alice.id, None, None).await.unwrap();
        assert_eq!(following[0].id, bob.id);
        assert_eq!(
            services.queries.follow_counts(&bob.id).await.unwrap(),
            FollowCounts {
                followers: 1,
                following: 0
            }
        );

        assert_eq!(services.queries.unread_count(&bob.id).await.unwrap(), 1);
        let unread = services
            .queries
            .notifications(&bob.id, true, None, None)
            .await
            .unwrap();
        services
            .notifications
            .mark_as_read(&bob.id, &unread[0].id)
            .await
            .unwrap();
        assert!(
            services
                .queries
                .notifications(&bob.id, true, None, None)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            services
                .queries
                .notifications(&bob.id, false, None, None)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_custom_exercises_by_body_part() {
        let Fixture { services, alice, .. } = fixture().await;
        for (part, name) in [("legs", "Hack Squat"), ("back", "Seal Row"), ("legs", "Belt Squat")] {
            services
                .custom_exercises
                .create(CreateCustomExerciseInput {
                    user_id: alice.id.clone(),
                    body_part: part.to_string(),
                    exercise_name: name.to_string(),
                })
                .await
                .unwrap();
        }

        let legs = services
            .queries
            .custom_exercises(&alice.id, Some("legs"))
            .await
            .unwrap();
        let names: Vec<&str> = legs.iter().map(|e| e.exercise_name.as_str()).collect();
        assert_eq!(names, ["Belt Squat", "Hack Squat"]);

        let all = services.queries.custom_exercises(&alice.id, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].body_part, "back");
    }
}
