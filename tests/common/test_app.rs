//! In-process test application
//!
//! Builds the real router over the in-memory store with fake external
//! services and drives it through `axum_test::TestServer`.

use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use spamit::backend::routes::create_router;
use spamit::backend::server::{AppState, ServiceHandles};
use spamit::backend::services::LocalBlobStore;
use spamit::backend::store::Repositories;
use spamit::shared::config::AppConfig;
use spamit::shared::models::Notification;

use super::fakes::{FakeIdentity, RecordingPush, RecordingSms};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const APP_URL: &str = "https://spamit.test";
pub const PUBLIC_BASE_URL: &str = "http://media.spamit.test";

/// A running app plus handles on everything behind it
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub repos: Repositories,
    pub identity: Arc<FakeIdentity>,
    pub push: Arc<RecordingPush>,
    pub sms: Arc<RecordingSms>,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_repos(Repositories::in_memory()).await
    }

    /// Build the app over caller-supplied repositories
    pub async fn with_repos(repos: Repositories) -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let config = AppConfig::builder()
            .jwt_secret(TEST_SECRET)
            .app_url(APP_URL)
            .public_base_url(PUBLIC_BASE_URL)
            .upload_dir(uploads.path())
            .build()
            .expect("Failed to build test config");

        let identity = Arc::new(FakeIdentity::default());
        let push = Arc::new(RecordingPush::default());
        let sms = Arc::new(RecordingSms::default());
        let services = ServiceHandles {
            identity: identity.clone(),
            push: push.clone(),
            sms: sms.clone(),
            blobs: Arc::new(LocalBlobStore::new(uploads.path(), PUBLIC_BASE_URL)),
        };

        let (state, _worker) = AppState::new(config, repos.clone(), services);
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");

        Self {
            server,
            state,
            repos,
            identity,
            push,
            sms,
            uploads,
        }
    }

    /// Group ids recorded on the user's side of the membership relation
    pub async fn groups_of(&self, user_id: Uuid) -> Vec<Uuid> {
        self.repos
            .users
            .find_by_id(user_id)
            .await
            .unwrap()
            .map(|u| u.groups)
            .unwrap_or_default()
    }

    /// Member ids recorded on the group's side, `None` once deleted
    pub async fn members_of(&self, group_id: Uuid) -> Option<Vec<Uuid>> {
        self.repos
            .groups
            .find_by_id(group_id)
            .await
            .unwrap()
            .map(|g| g.members)
    }

    /// Check both sides of the membership relation agree for these ids
    pub async fn assert_mirrored(&self, group_ids: &[Uuid], user_ids: &[Uuid]) {
        for group_id in group_ids {
            let members = self.members_of(*group_id).await.unwrap_or_default();
            for user_id in user_ids {
                let groups = self.groups_of(*user_id).await;
                assert_eq!(
                    members.contains(user_id),
                    groups.contains(group_id),
                    "user {} and group {} disagree on membership",
                    user_id,
                    group_id
                );
            }
        }
    }

    /// Poll until `user_id` has at least `count` notifications
    ///
    /// Fan-out runs in the background, so tests wait for it instead of
    /// reading right after the triggering request.
    pub async fn wait_for_notifications(&self, user_id: Uuid, count: usize) -> Vec<Notification> {
        for _ in 0..100 {
            let found = self.repos.notifications.list_for_user(user_id, 50).await.unwrap();
            if found.len() >= count {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} notification(s) for {}", count, user_id);
    }

    /// Give background fan-out time to run before asserting on absence
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
