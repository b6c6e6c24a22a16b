/**
 * Notification Fan-out
 *
 * Runs after the triggering post or comment is already stored. For each
 * recipient one notification record is written independently, then push
 * notices go out best-effort. Nothing here returns an error: failures are
 * logged with recipient and group ids and counted in the [`FanoutReport`].
 *
 * # Triggers
 *
 * - **New post**: every group member except the author
 * - **Comment**: the post's author, unless they wrote the comment
 */

use futures_util::future::join_all;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::services::{PushMessage, PushSender};
use crate::backend::store::{GroupStore, NotificationStore, Repositories, UserStore};
use crate::shared::models::{NewNotification, NotificationKind};

/// Comment previews are cut to this many characters
pub const PREVIEW_CHARS: usize = 100;

/// Appended to a cut preview
pub const ELLIPSIS: &str = "...";

const DEFAULT_GROUP_NAME: &str = "Your group";
const DEFAULT_CAPTION: &str = "New post shared";

/// First [`PREVIEW_CHARS`] characters plus [`ELLIPSIS`] when longer, else `text` unchanged
pub fn truncate_message(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// A unit of fan-out work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutJob {
    NewPost {
        post_id: Uuid,
        group_id: Uuid,
        author_id: Uuid,
        caption: String,
    },
    Comment {
        post_id: Uuid,
        post_author_id: Uuid,
        commenter_id: Uuid,
        commenter_name: String,
        text: String,
    },
}

/// Kind and ids only; captions and comment text stay out of logs
impl fmt::Display for FanoutJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanoutJob::NewPost { post_id, group_id, author_id, .. } => {
                write!(f, "new_post post={} group={} author={}", post_id, group_id, author_id)
            }
            FanoutJob::Comment { post_id, post_author_id, commenter_id, .. } => {
                write!(f, "comment post={} author={} commenter={}", post_id, post_author_id, commenter_id)
            }
        }
    }
}

/// Outcome of one fan-out run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Recipients resolved for the job
    pub recipients: usize,
    /// Notification records written
    pub persisted: usize,
    /// Notification writes that failed
    pub failed: usize,
    /// Push deliveries the provider accepted
    pub pushed: usize,
}

/// Resolves recipients, writes notifications and sends push notices
#[derive(Clone)]
pub struct FanoutEngine {
    users: Arc<dyn UserStore>,
    groups: Arc<dyn GroupStore>,
    notifications: Arc<dyn NotificationStore>,
    push: Arc<dyn PushSender>,
}

impl FanoutEngine {
    pub fn new(repos: &Repositories, push: Arc<dyn PushSender>) -> Self {
        Self {
            users: repos.users.clone(),
            groups: repos.groups.clone(),
            notifications: repos.notifications.clone(),
            push,
        }
    }

    /// Run a job to completion; never fails
    pub async fn run(&self, job: FanoutJob) -> FanoutReport {
        match job {
            FanoutJob::NewPost {
                post_id,
                group_id,
                author_id,
                caption,
            } => self.new_post(post_id, group_id, author_id, &caption).await,
            FanoutJob::Comment {
                post_id,
                post_author_id,
                commenter_id,
                commenter_name,
                text,
            } => {
                self.comment(post_id, post_author_id, commenter_id, &commenter_name, &text)
                    .await
            }
        }
    }

    async fn new_post(&self, post_id: Uuid, group_id: Uuid, author_id: Uuid, caption: &str) -> FanoutReport {
        let mut report = FanoutReport::default();

        let group = match self.groups.find_by_id(group_id).await {
            Ok(Some(group)) => group,
            Ok(None) => {
                tracing::warn!("Fan-out for post {} skipped: group {} not found", post_id, group_id);
                return report;
            }
            Err(e) => {
                tracing::error!("Fan-out for post {} could not load group {}: {}", post_id, group_id, e);
                return report;
            }
        };

        let mut seen = HashSet::new();
        let recipients: Vec<Uuid> = group
            .members
            .iter()
            .copied()
            .filter(|id| *id != author_id && seen.insert(*id))
            .collect();
        report.recipients = recipients.len();
        if recipients.is_empty() {
            tracing::debug!("No one to notify for post {} in group {}", post_id, group_id);
            return report;
        }

        let group_name = match group.name.trim() {
            "" => DEFAULT_GROUP_NAME,
            name => name,
        };
        let caption = match caption.trim() {
            "" => DEFAULT_CAPTION,
            caption => caption,
        };
        let message = format!("New post in {}: {}", group_name, caption);

        let writes = recipients.iter().map(|recipient| {
            self.notifications.create(NewNotification {
                user: *recipient,
                kind: NotificationKind::NewPost,
                post: Some(post_id),
                group: Some(group_id),
                from_user: author_id,
                message: message.clone(),
            })
        });
        for (recipient, result) in recipients.iter().zip(join_all(writes).await) {
            match result {
                Ok(_) => report.persisted += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        "Failed to store new-post notification for user {} in group {}: {}",
                        recipient,
                        group_id,
                        e
                    );
                }
            }
        }

        let tokens: Vec<String> = match self.users.find_many(&recipients).await {
            Ok(users) => users
                .into_iter()
                .filter_map(|u| u.push_token)
                .filter(|t| !t.is_empty())
                .collect(),
            Err(e) => {
                tracing::warn!("Push skipped for group {}: could not load recipients: {}", group_id, e);
                Vec::new()
            }
        };

        if !tokens.is_empty() {
            let push = PushMessage::new(format!("New post in {}", group_name), caption)
                .with_data("type", "group_post")
                .with_data("groupId", group_id.to_string())
                .with_data("groupName", group_name);
            match self.push.send_multicast(&tokens, &push).await {
                Ok(delivered) => {
                    report.pushed = delivered;
                    tracing::info!("Push sent for group {}: {}/{}", group_id, delivered, tokens.len());
                }
                Err(e) => tracing::warn!("Push for group {} failed: {}", group_id, e),
            }
        }

        tracing::info!(
            "New-post fan-out for post {}: {} of {} notification(s) stored",
            post_id,
            report.persisted,
            report.recipients
        );
        report
    }

    async fn comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        commenter_id: Uuid,
        commenter_name: &str,
        text: &str,
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        if commenter_id == author_id {
            return report;
        }
        report.recipients = 1;

        let preview = truncate_message(text);
        match self
            .notifications
            .create(NewNotification {
                user: author_id,
                kind: NotificationKind::Comment,
                post: Some(post_id),
                group: None,
                from_user: commenter_id,
                message: preview.clone(),
            })
            .await
        {
            Ok(_) => report.persisted = 1,
            Err(e) => {
                report.failed = 1;
                tracing::warn!("Failed to store comment notification for user {} on post {}: {}", author_id, post_id, e);
            }
        }

        let token = match self.users.find_by_id(author_id).await {
            Ok(Some(author)) => author.push_token.filter(|t| !t.is_empty()),
            Ok(None) => {
                tracing::warn!("Post author {} not found for comment push", author_id);
                None
            }
            Err(e) => {
                tracing::warn!("Could not load post author {}: {}", author_id, e);
                None
            }
        };

        if let Some(token) = token {
            let push = PushMessage::new("New comment on your post", format!("{}: {}", commenter_name, preview))
                .with_data("type", "post_comment")
                .with_data("postId", post_id.to_string());
            match self.push.send(&token, &push).await {
                Ok(()) => report.pushed = 1,
                Err(e) => tracing::warn!("Comment push to user {} failed: {}", author_id, e),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::services::ServiceError;
    use crate::backend::store::StoreError;
    use crate::shared::models::{NewGroup, NewUser, Notification};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPush {
        sent: Mutex<Vec<(String, PushMessage)>>,
        fail: bool,
    }

    #[async_trait]
    impl PushSender for RecordingPush {
        async fn send(&self, token: &str, message: &PushMessage) -> Result<(), ServiceError> {
            if self.fail {
                return Err(ServiceError::invalid("Push", "provider down"));
            }
            self.sent.lock().unwrap().push((token.to_string(), message.clone()));
            Ok(())
        }
    }

    /// Fails writes for one recipient, delegates the rest
    struct FailFor {
        inner: Arc<dyn NotificationStore>,
        user: Uuid,
    }

    #[async_trait]
    impl NotificationStore for FailFor {
        async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
            if new.user == self.user {
                return Err(StoreError::Corrupt("disk full".into()));
            }
            self.inner.create(new).await
        }
        async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, StoreError> {
            self.inner.list_for_user(user_id, limit).await
        }
        async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
            self.inner.mark_all_read(user_id).await
        }
    }

    async fn user(repos: &Repositories, name: &str, token: Option<&str>) -> Uuid {
        let id = repos
            .users
            .create(NewUser {
                external_uid: None,
                username: name.to_string(),
                phone_number: format!("+1-{}", name),
                dob: None,
            })
            .await
            .unwrap()
            .id;
        repos.users.set_push_token(id, token).await.unwrap();
        id
    }

    async fn group(repos: &Repositories, name: &str, admin: Uuid, members: Vec<Uuid>) -> Uuid {
        repos
            .groups
            .create(NewGroup {
                name: name.to_string(),
                admin,
                members,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        let text = "a".repeat(40);
        assert_eq!(truncate_message(&text), text);
        assert_eq!(truncate_message(&"b".repeat(100)), "b".repeat(100));
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "c".repeat(150);
        let cut = truncate_message(&text);
        assert_eq!(cut, format!("{}...", "c".repeat(100)));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(101);
        assert_eq!(truncate_message(&text), format!("{}...", "é".repeat(100)));
    }

    proptest! {
        #[test]
        fn prop_truncate_rule(text in "\\PC{0,250}") {
            let out = truncate_message(&text);
            let len = text.chars().count();
            if len > PREVIEW_CHARS {
                prop_assert!(out.ends_with(ELLIPSIS));
                let prefix: String = text.chars().take(PREVIEW_CHARS).collect();
                prop_assert_eq!(out, format!("{}{}", prefix, ELLIPSIS));
            } else {
                prop_assert_eq!(out, text);
            }
        }
    }

    #[tokio::test]
    async fn test_new_post_notifies_everyone_but_author() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", Some("tok-a")).await;
        let b = user(&repos, "bob", Some("tok-b")).await;
        let c = user(&repos, "carol", None).await;
        let g = group(&repos, "Hikers", a, vec![a, b, c]).await;
        let push = Arc::new(RecordingPush::default());
        let engine = FanoutEngine::new(&repos, push.clone());

        let post = Uuid::new_v4();
        let report = engine
            .run(FanoutJob::NewPost {
                post_id: post,
                group_id: g,
                author_id: a,
                caption: "Summit!".into(),
            })
            .await;

        assert_eq!(report, FanoutReport { recipients: 2, persisted: 2, failed: 0, pushed: 1 });
        assert!(repos.notifications.list_for_user(a, 20).await.unwrap().is_empty());
        for recipient in [b, c] {
            let list = repos.notifications.list_for_user(recipient, 20).await.unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].kind, NotificationKind::NewPost);
            assert_eq!(list[0].from_user, a);
            assert_eq!(list[0].group, Some(g));
            assert_eq!(list[0].post, Some(post));
            assert_eq!(list[0].message, "New post in Hikers: Summit!");
        }

        let sent = push.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "tok-b");
        assert_eq!(sent[0].1.title, "New post in Hikers");
        assert_eq!(sent[0].1.data["type"], "group_post");
    }

    #[tokio::test]
    async fn test_new_post_uses_fallback_caption() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", None).await;
        let b = user(&repos, "bob", None).await;
        let g = group(&repos, "Hikers", a, vec![a, b]).await;
        let engine = FanoutEngine::new(&repos, Arc::new(RecordingPush::default()));

        engine
            .run(FanoutJob::NewPost { post_id: Uuid::new_v4(), group_id: g, author_id: a, caption: "  ".into() })
            .await;
        let list = repos.notifications.list_for_user(b, 20).await.unwrap();
        assert_eq!(list[0].message, "New post in Hikers: New post shared");
    }

    #[tokio::test]
    async fn test_push_failure_keeps_records() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", None).await;
        let b = user(&repos, "bob", Some("tok-b")).await;
        let c = user(&repos, "carol", Some("tok-c")).await;
        let g = group(&repos, "Hikers", a, vec![a, b, c]).await;
        let push = Arc::new(RecordingPush { fail: true, ..Default::default() });
        let engine = FanoutEngine::new(&repos, push);

        let report = engine
            .run(FanoutJob::NewPost { post_id: Uuid::new_v4(), group_id: g, author_id: a, caption: "x".into() })
            .await;
        assert_eq!(report.persisted, 2);
        assert_eq!(report.pushed, 0);
    }

    #[tokio::test]
    async fn test_one_failed_write_does_not_block_others() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", None).await;
        let b = user(&repos, "bob", None).await;
        let c = user(&repos, "carol", None).await;
        let g = group(&repos, "Hikers", a, vec![a, b, c]).await;
        let failing = Arc::new(FailFor { inner: repos.notifications.clone(), user: b });
        let repos = repos.with_notifications(failing);
        let engine = FanoutEngine::new(&repos, Arc::new(RecordingPush::default()));

        let report = engine
            .run(FanoutJob::NewPost { post_id: Uuid::new_v4(), group_id: g, author_id: a, caption: "x".into() })
            .await;
        assert_eq!(report, FanoutReport { recipients: 2, persisted: 1, failed: 1, pushed: 0 });
        assert_eq!(repos.notifications.list_for_user(c, 20).await.unwrap().len(), 1);
    }

    #[test]
    fn test_job_display_omits_text() {
        let job = FanoutJob::Comment {
            post_id: Uuid::new_v4(),
            post_author_id: Uuid::new_v4(),
            commenter_id: Uuid::new_v4(),
            commenter_name: "bob".into(),
            text: "my secret plans".into(),
        };
        let shown = job.to_string();
        assert!(shown.starts_with("comment post="));
        assert!(!shown.contains("secret"));
        assert!(!shown.contains("bob"));

        let job = FanoutJob::NewPost {
            post_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            caption: "private caption".into(),
        };
        assert!(!job.to_string().contains("private"));
    }

    #[tokio::test]
    async fn test_missing_group_is_absorbed() {
        let repos = Repositories::in_memory();
        let engine = FanoutEngine::new(&repos, Arc::new(RecordingPush::default()));
        let report = engine
            .run(FanoutJob::NewPost {
                post_id: Uuid::new_v4(),
                group_id: Uuid::new_v4(),
                author_id: Uuid::new_v4(),
                caption: String::new(),
            })
            .await;
        assert_eq!(report, FanoutReport::default());
    }

    #[tokio::test]
    async fn test_self_comment_creates_nothing() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", Some("tok-a")).await;
        let push = Arc::new(RecordingPush::default());
        let engine = FanoutEngine::new(&repos, push.clone());

        let report = engine
            .run(FanoutJob::Comment {
                post_id: Uuid::new_v4(),
                post_author_id: a,
                commenter_id: a,
                commenter_name: "alice".into(),
                text: "nice".into(),
            })
            .await;
        assert_eq!(report, FanoutReport::default());
        assert!(repos.notifications.list_for_user(a, 20).await.unwrap().is_empty());
        assert!(push.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_notifies_author_with_preview() {
        let repos = Repositories::in_memory();
        let a = user(&repos, "alice", Some("tok-a")).await;
        let b = user(&repos, "bob", None).await;
        let push = Arc::new(RecordingPush::default());
        let engine = FanoutEngine::new(&repos, push.clone());
        let post = Uuid::new_v4();
        let text = "x".repeat(150);

        let report = engine
            .run(FanoutJob::Comment {
                post_id: post,
                post_author_id: a,
                commenter_id: b,
                commenter_name: "bob".into(),
                text: text.clone(),
            })
            .await;
        assert_eq!(report, FanoutReport { recipients: 1, persisted: 1, failed: 0, pushed: 1 });

        let list = repos.notifications.list_for_user(a, 20).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, NotificationKind::Comment);
        assert_eq!(list[0].post, Some(post));
        assert_eq!(list[0].from_user, b);
        assert_eq!(list[0].message, format!("{}...", "x".repeat(100)));

        let sent = push.sent.lock().unwrap();
        assert_eq!(sent[0].0, "tok-a");
        assert_eq!(sent[0].1.body, format!("bob: {}...", "x".repeat(100)));
        assert_eq!(sent[0].1.data["postId"], post.to_string());
    }
}
