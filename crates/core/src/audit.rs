//! Integrity audit over raw records.
//!
//! The services keep the relationships intact for writes they perform. The
//! auditor checks the stored records themselves, so data written by other
//! clients, by older versions, or left half-done by a failed cascade is
//! reported too. It never repairs anything.

use std::collections::{HashMap, HashSet};
use std::fmt;

use musclegram_common::AppResult;
use musclegram_db::entities::{
    Comment, CustomExercise, DaysGoal, Follow, Like, Notification, Post, User,
};
use musclegram_db::repositories::Repositories;
use serde::Serialize;
use tracing::{info, warn};

use crate::validation::{check_sets, days_in_month, parse_period};

/// What is wrong with a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationKind {
    /// `field` names a record that does not exist.
    DanglingReference { field: String, target: String },
    /// Another record holds the same unique key.
    DuplicateKey { key: String, other_id: String },
    /// A user follows themselves.
    SelfFollow,
    /// The parent comment belongs to another post.
    ParentOnOtherPost { parent_id: String },
    /// The parent chain loops or exceeds the maximum depth.
    BrokenThread { detail: String },
    /// `postId` is missing on a like/comment notification or present on a follow notification.
    NotificationShape,
    /// The exercise has no sets or a set is not a non-negative number.
    InvalidSets { detail: String },
    /// The monthly target is outside `1..=days in period`, or the period is malformed.
    InvalidGoal { detail: String },
}

/// One broken record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub collection: String,
    pub record_id: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: ", self.collection, self.record_id)?;
        match &self.kind {
            ViolationKind::DanglingReference { field, target } => {
                write!(f, "{field} references missing {target}")
            }
            ViolationKind::DuplicateKey { key, other_id } => {
                write!(f, "duplicate {key} shared with {other_id}")
            }
            ViolationKind::SelfFollow => write!(f, "user follows themselves"),
            ViolationKind::ParentOnOtherPost { parent_id } => {
                write!(f, "parent {parent_id} is on another post")
            }
            ViolationKind::BrokenThread { detail } => write!(f, "broken thread: {detail}"),
            ViolationKind::NotificationShape => write!(f, "postId does not match notification type"),
            ViolationKind::InvalidSets { detail } => write!(f, "invalid sets: {detail}"),
            ViolationKind::InvalidGoal { detail } => write!(f, "invalid goal: {detail}"),
        }
    }
}

/// Result of one audit run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Records scanned per collection.
    pub scanned: HashMap<String, usize>,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Whether no violation was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn flag(&mut self, collection: &str, record_id: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            collection: collection.to_string(),
            record_id: record_id.to_string(),
            kind,
        });
    }
}

struct Snapshot {
    users: Vec<User>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    custom_exercises: Vec<CustomExercise>,
    notifications: Vec<Notification>,
    days_goals: Vec<DaysGoal>,
}

/// Scans every collection for broken relationships.
#[derive(Clone)]
pub struct IntegrityAuditor {
    repos: Repositories,
    max_comment_depth: usize,
}

impl IntegrityAuditor {
    /// Create a new auditor.
    #[must_use]
    pub const fn new(repos: Repositories, max_comment_depth: usize) -> Self {
        Self {
            repos,
            max_comment_depth,
        }
    }

    /// Run the audit.
    pub async fn run(&self) -> AppResult<AuditReport> {
        let snapshot = self.load().await?;
        let mut report = AuditReport::default();
        let r = &self.repos;

        for (name, count) in [
            (r.users.collection().name(), snapshot.users.len()),
            (r.posts.collection().name(), snapshot.posts.len()),
            (r.likes.collection().name(), snapshot.likes.len()),
            (r.comments.collection().name(), snapshot.comments.len()),
            (r.follows.collection().name(), snapshot.follows.len()),
            (r.custom_exercises.collection().name(), snapshot.custom_exercises.len()),
            (r.notifications.collection().name(), snapshot.notifications.len()),
            (r.days_goals.collection().name(), snapshot.days_goals.len()),
        ] {
            report.scanned.insert(name.to_string(), count);
        }

        let user_ids: HashSet<&str> = snapshot.users.iter().map(|u| u.id.as_str()).collect();
        let post_ids: HashSet<&str> = snapshot.posts.iter().map(|p| p.id.as_str()).collect();

        self.audit_users(&snapshot, &mut report);
        self.audit_posts(&snapshot, &user_ids, &mut report);
        self.audit_likes(&snapshot, &user_ids, &post_ids, &mut report);
        self.audit_comments(&snapshot, &user_ids, &post_ids, &mut report);
        self.audit_follows(&snapshot, &user_ids, &mut report);
        self.audit_custom_exercises(&snapshot, &user_ids, &mut report);
        self.audit_notifications(&snapshot, &user_ids, &post_ids, &mut report);
        self.audit_days_goals(&snapshot, &user_ids, &mut report);

        if report.is_clean() {
            info!(collections = report.scanned.len(), "Integrity audit clean");
        } else {
            warn!(violations = report.violations.len(), "Integrity audit found violations");
        }
        Ok(report)
    }

    async fn load(&self) -> AppResult<Snapshot> {
        let r = &self.repos;
        let (users, posts, likes, comments, follows, custom_exercises, notifications, days_goals) =
            futures::try_join!(
                r.users.collection().all(),
                r.posts.collection().all(),
                r.likes.collection().all(),
                r.comments.collection().all(),
                r.follows.collection().all(),
                r.custom_exercises.collection().all(),
                r.notifications.collection().all(),
                r.days_goals.collection().all(),
            )?;
        Ok(Snapshot {
            users,
            posts,
            likes,
            comments,
            follows,
            custom_exercises,
            notifications,
            days_goals,
        })
    }

    fn audit_users(&self, s: &Snapshot, report: &mut AuditReport) {
        let name = self.repos.users.collection().name();
        duplicates(report, name, "username", s.users.iter().map(|u| (u.id.as_str(), u.username.clone())));
        duplicates(
            report,
            name,
            "email",
            s.users.iter().map(|u| (u.id.as_str(), u.email.to_lowercase())),
        );
    }

    fn audit_posts(&self, s: &Snapshot, users: &HashSet<&str>, report: &mut AuditReport) {
        let name = self.repos.posts.collection().name();
        for post in &s.posts {
            dangling(report, name, &post.id, "userId", &post.user_id, users);
            if let Err(e) = check_sets(&post.exercise.sets) {
                report.flag(name, &post.id, ViolationKind::InvalidSets { detail: e.to_string() });
            }
        }
    }

    fn audit_likes(
        &self,
        s: &Snapshot,
        users: &HashSet<&str>,
        posts: &HashSet<&str>,
        report: &mut AuditReport,
    ) {
        let name = self.repos.likes.collection().name();
        for like in &s.likes {
            dangling(report, name, &like.id, "userId", &like.user_id, users);
            dangling(report, name, &like.id, "postId", &like.post_id, posts);
        }
        duplicates(
            report,
            name,
            "(postId, userId)",
            s.likes.iter().map(|l| (l.id.as_str(), format!("{}/{}", l.post_id, l.user_id))),
        );
    }

    fn audit_comments(
        &self,
        s: &Snapshot,
        users: &HashSet<&str>,
        posts: &HashSet<&str>,
        report: &mut AuditReport,
    ) {
        let name = self.repos.comments.collection().name();
        let by_id: HashMap<&str, &Comment> = s.comments.iter().map(|c| (c.id.as_str(), c)).collect();

        for comment in &s.comments {
            dangling(report, name, &comment.id, "userId", &comment.user_id, users);
            dangling(report, name, &comment.id, "postId", &comment.post_id, posts);

            let Some(parent_id) = &comment.parent_id else {
                continue;
            };
            let Some(parent) = by_id.get(parent_id.as_str()) else {
                report.flag(
                    name,
                    &comment.id,
                    ViolationKind::DanglingReference {
                        field: "parentId".to_string(),
                        target: parent_id.clone(),
                    },
                );
                continue;
            };
            if parent.post_id != comment.post_id {
                report.flag(
                    name,
                    &comment.id,
                    ViolationKind::ParentOnOtherPost {
                        parent_id: parent_id.clone(),
                    },
                );
            }
            if let Some(detail) = self.thread_problem(comment, &by_id) {
                report.flag(name, &comment.id, ViolationKind::BrokenThread { detail });
            }
        }
    }

    /// Walk the ancestors of `comment`; describe a cycle or excess depth.
    fn thread_problem(&self, comment: &Comment, by_id: &HashMap<&str, &Comment>) -> Option<String> {
        let mut seen = HashSet::from([comment.id.as_str()]);
        let mut next = comment.parent_id.as_deref();
        let mut depth = 0;
        while let Some(id) = next {
            if !seen.insert(id) {
                return Some(format!("cycle through {id}"));
            }
            depth += 1;
            if depth > self.max_comment_depth {
                return Some(format!("deeper than {}", self.max_comment_depth));
            }
            next = by_id.get(id).and_then(|c| c.parent_id.as_deref());
        }
        None
    }

    fn audit_follows(&self, s: &Snapshot, users: &HashSet<&str>, report: &mut AuditReport) {
        let name = self.repos.follows.collection().name();
        for follow in &s.follows {
            dangling(report, name, &follow.id, "followerId", &follow.follower_id, users);
            dangling(report, name, &follow.id, "followingId", &follow.following_id, users);
            if follow.follower_id == follow.following_id {
                report.flag(name, &follow.id, ViolationKind::SelfFollow);
            }
        }
        duplicates(
            report,
            name,
            "(followerId, followingId)",
            s.follows
                .iter()
                .map(|f| (f.id.as_str(), format!("{}/{}", f.follower_id, f.following_id))),
        );
    }

    fn audit_custom_exercises(&self, s: &Snapshot, users: &HashSet<&str>, report: &mut AuditReport) {
        let name = self.repos.custom_exercises.collection().name();
        for exercise in &s.custom_exercises {
            dangling(report, name, &exercise.id, "userId", &exercise.user_id, users);
        }
        duplicates(
            report,
            name,
            "(userId, bodyPart, exerciseName)",
            s.custom_exercises.iter().map(|e| {
                (
                    e.id.as_str(),
                    format!("{}/{}/{}", e.user_id, e.body_part, e.exercise_name),
                )
            }),
        );
    }

    fn audit_notifications(
        &self,
        s: &Snapshot,
        users: &HashSet<&str>,
        posts: &HashSet<&str>,
        report: &mut AuditReport,
    ) {
        let name = self.repos.notifications.collection().name();
        for n in &s.notifications {
            dangling(report, name, &n.id, "userId", &n.user_id, users);
            dangling(report, name, &n.id, "fromUserId", &n.from.user_id, users);
            match (&n.post_id, n.notification_type.requires_post()) {
                (Some(post_id), true) => dangling(report, name, &n.id, "postId", post_id, posts),
                (None, false) => {}
                _ => report.flag(name, &n.id, ViolationKind::NotificationShape),
            }
        }
    }

    fn audit_days_goals(&self, s: &Snapshot, users: &HashSet<&str>, report: &mut AuditReport) {
        let name = self.repos.days_goals.collection().name();
        for goal in &s.days_goals {
            dangling(report, name, &goal.id, "userId", &goal.user_id, users);
            match parse_period(&goal.period) {
                None => report.flag(
                    name,
                    &goal.id,
                    ViolationKind::InvalidGoal {
                        detail: format!("malformed period {:?}", goal.period),
                    },
                ),
                Some(first) => {
                    let days = days_in_month(first);
                    if goal.monthly_target == 0 || goal.monthly_target > days {
                        report.flag(
                            name,
                            &goal.id,
                            ViolationKind::InvalidGoal {
                                detail: format!(
                                    "target {} outside 1..={days}",
                                    goal.monthly_target
                                ),
                            },
                        );
                    }
                }
            }
        }
        duplicates(
            report,
            name,
            "(userId, period)",
            s.days_goals
                .iter()
                .map(|g| (g.id.as_str(), format!("{}/{}", g.user_id, g.period))),
        );
    }
}

fn dangling(
    report: &mut AuditReport,
    collection: &str,
    record_id: &str,
    field: &str,
    target: &str,
    existing: &HashSet<&str>,
) {
    if !existing.contains(target) {
        report.flag(
            collection,
            record_id,
            ViolationKind::DanglingReference {
                field: field.to_string(),
                target: target.to_string(),
            },
        );
    }
}

/// Flag every record after the first that shares a key value.
fn duplicates<'a>(
    report: &mut AuditReport,
    collection: &str,
    key: &str,
    values: impl Iterator<Item = (&'a str, String)>,
) {
    let mut first_holder: HashMap<String, &'a str> = HashMap::new();
    let mut entries: Vec<(&'a str, String)> = values.collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (id, value) in entries {
        match first_holder.get(&value) {
            Some(other) => report.flag(
                collection,
                id,
                ViolationKind::DuplicateKey {
                    key: key.to_string(),
                    other_id: (*other).to_string(),
                },
            ),
            None => {
                first_holder.insert(value, id);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{Fixture, fixture};
    use crate::services::{CreateFollowInput, CreateLikeInput};
    use chrono::Utc;
    use musclegram_db::entities::{ExerciseSet, NotificationType};
    use musclegram_db::test_utils::{sample_post, sample_user};

    fn kinds(report: &AuditReport) -> Vec<&ViolationKind> {
        report.violations.iter().map(|v| &v.kind).collect()
    }

    #[tokio::test]
    async fn test_clean_store_after_service_writes() {
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
            .follows
            .create(CreateFollowInput {
                follower_id: alice.id.clone(),
                following_id: bob.id.clone(),
            })
            .await
            .unwrap();

        let report = services.auditor.run().await.unwrap();
        assert!(report.is_clean(), "{:?}", report.violations);
        assert_eq!(report.scanned["likes"], 1);
        assert_eq!(report.scanned["notifications"], 2);
    }

    #[tokio::test]
    async fn test_reports_raw_violations() {
        let Fixture {
            services,
            alice,
            bob,
            post,
        } = fixture().await;
        let r = &services.repos;
        let now = Utc::now();

        // Two likes on one pair, one on a missing post.
        for (id, post_id) in [("l1", post.id.as_str()), ("l2", post.id.as_str()), ("l3", "gone")] {
            r.likes
                .collection()
                .insert(&Like {
                    id: id.to_string(),
                    post_id: post_id.to_string(),
                    user_id: alice.id.clone(),
                    created_at: now,
                })
                .await
                .unwrap();
        }
        r.follows
            .collection()
            .insert(&Follow {
                id: "f1".to_string(),
                follower_id: bob.id.clone(),
                following_id: bob.id.clone(),
                created_at: now,
            })
            .await
            .unwrap();
        r.notifications
            .create(&Notification {
                id: "n1".to_string(),
                user_id: bob.id.clone(),
                from: alice.snapshot(),
                notification_type: NotificationType::Like,
                post_id: None,
                message: "Alice liked your post".to_string(),
                is_read: false,
                created_at: now,
            })
            .await
            .unwrap();
        let mut bad_post = sample_post("p-bad", &alice.id);
        bad_post.exercise.sets = vec![ExerciseSet {
            weight: "-1".to_string(),
            reps: "5".to_string(),
        }];
        r.posts.create(&bad_post).await.unwrap();
        // Two comments pointing at each other.
        for (id, parent) in [("c1", "c2"), ("c2", "c1")] {
            r.comments
                .create(&Comment {
                    id: id.to_string(),
                    post_id: post.id.clone(),
                    user_id: alice.id.clone(),
                    content: "loop".to_string(),
                    parent_id: Some(parent.to_string()),
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }
        let mut twin = sample_user("alice-2", "alice");
        twin.email = "someone@example.com".to_string();
        r.users.collection().insert(&twin).await.unwrap();

        let report = services.auditor.run().await.unwrap();
        let kinds = kinds(&report);

        assert!(kinds.contains(&&ViolationKind::DuplicateKey {
            key: "(postId, userId)".to_string(),
            other_id: "l1".to_string(),
        }));
        assert!(kinds.contains(&&ViolationKind::DanglingReference {
            field: "postId".to_string(),
            target: "gone".to_string(),
        }));
        assert!(kinds.contains(&&ViolationKind::SelfFollow));
        assert!(kinds.contains(&&ViolationKind::NotificationShape));
        assert!(kinds.iter().any(|k| matches!(k, ViolationKind::InvalidSets { .. })));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| matches!(k, ViolationKind::BrokenThread { .. }))
                .count(),
            2
        );
        assert!(report.violations.iter().any(|v| v.record_id == "alice-2"
            && matches!(&v.kind, ViolationKind::DuplicateKey { key, .. } if key == "username")));
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation {
            collection: "follows".to_string(),
            record_id: "f1".to_string(),
            kind: ViolationKind::SelfFollow,
        };
        assert_eq!(violation.to_string(), "follows/f1: user follows themselves");
    }
}
