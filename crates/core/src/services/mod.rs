//! Business logic services.
//!
//! Each service validates its entity's inputs (`validate_create`,
//! `validate_update`) with lookups only, and layers the writes on top
//! (`create`, `update`, `delete`).

#![allow(missing_docs)]

use std::sync::Arc;

use musclegram_common::Config;
use musclegram_db::repositories::Repositories;
use musclegram_db::store::DocumentStore;

use crate::audit::IntegrityAuditor;
use crate::consistency::UniqueWriter;

pub mod comment;
pub mod custom_exercise;
pub mod days_goal;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod query;
pub mod user;

pub use comment::{CommentService, CreateCommentInput, UpdateCommentInput};
pub use custom_exercise::{
    CreateCustomExerciseInput, CustomExerciseService, UpdateCustomExerciseInput,
};
pub use days_goal::{CreateDaysGoalInput, DaysGoalService, MonthlyProgress, UpdateDaysGoalInput};
pub use follow::{CreateFollowInput, FollowService};
pub use like::{CreateLikeInput, LikeService};
pub use notification::{CreateNotificationInput, NotificationService, UpdateNotificationInput};
pub use post::{CreatePostInput, ExerciseInput, PostService, SetInput, UpdatePostInput};
pub use query::{FollowCounts, PostSummary, QueryService};
pub use user::{CreateUserInput, UpdateUserInput, UserService};

/// Every service, wired to one store.
#[derive(Clone)]
pub struct Services {
    pub repos: Repositories,
    pub users: UserService,
    pub posts: PostService,
    pub likes: LikeService,
    pub comments: CommentService,
    pub follows: FollowService,
    pub custom_exercises: CustomExerciseService,
    pub notifications: NotificationService,
    pub days_goals: DaysGoalService,
    pub queries: QueryService,
    pub auditor: IntegrityAuditor,
}

impl Services {
    /// Build every service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let repos = Repositories::new(store, config);
        let consistency = &config.consistency;
        let writer = UniqueWriter::new(repos.guards.clone(), consistency);
        let notifications = NotificationService::new(
            repos.notifications.clone(),
            repos.users.clone(),
            repos.posts.clone(),
        );

        Self {
            users: UserService::new(repos.clone(), writer.clone()),
            posts: PostService::new(repos.clone(), writer.clone()),
            likes: LikeService::new(repos.clone(), writer.clone(), notifications.clone()),
            comments: CommentService::new(
                repos.clone(),
                notifications.clone(),
                consistency.max_comment_depth,
            ),
            follows: FollowService::new(repos.clone(), writer.clone(), notifications.clone()),
            custom_exercises: CustomExerciseService::new(repos.clone(), writer.clone()),
            days_goals: DaysGoalService::new(repos.clone(), writer),
            queries: QueryService::new(repos.clone()),
            auditor: IntegrityAuditor::new(repos.clone(), consistency.max_comment_depth),
            notifications,
            repos,
        }
    }
}
