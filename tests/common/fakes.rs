//! Fake external services
//!
//! In-process stand-ins for the identity provider, push gateway and SMS
//! provider. Each records what it was asked to do and can be told to fail.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use spamit::backend::services::{
    IdentityVerifier, PushMessage, PushSender, ServiceError, SmsSender, VerifiedIdentity,
};
use spamit::backend::store::{NotificationStore, Page, PostFilter, PostStore, StoreError};
use spamit::shared::models::{Comment, NewNotification, NewPost, Notification, Post};

/// Identity provider that accepts only registered tokens
#[derive(Default)]
pub struct FakeIdentity {
    tokens: Mutex<HashMap<String, VerifiedIdentity>>,
}

impl FakeIdentity {
    pub fn register(&self, id_token: &str, identity: VerifiedIdentity) {
        self.tokens
            .lock()
            .unwrap()
            .insert(id_token.to_string(), identity);
    }
}

#[async_trait]
impl IdentityVerifier for FakeIdentity {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServiceError> {
        self.tokens
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or_else(|| ServiceError::invalid("Identity", "unknown token"))
    }
}

/// Push gateway that records every delivery
#[derive(Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<(String, PushMessage)>>,
    failing: AtomicBool,
}

impl RecordingPush {
    /// Reject every delivery from now on
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> HashSet<String> {
        self.sent().into_iter().map(|(token, _)| token).collect()
    }
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Rejected {
                service: "Push",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));
        Ok(())
    }
}

/// SMS provider that records every message
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    attempted: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingSms {
    /// Reject messages to `number`
    pub fn fail_for(&self, number: &str) {
        self.failing.lock().unwrap().insert(number.to_string());
    }

    /// Successfully sent `(to, body)` pairs
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Every number a send was attempted for, including failures
    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), ServiceError> {
        self.attempted.lock().unwrap().push(to.to_string());
        if self.failing.lock().unwrap().contains(to) {
            return Err(ServiceError::Rejected {
                service: "SMS",
                status: 400,
                body: "invalid number".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Notification store whose writes fail for one recipient
pub struct FailingNotifications {
    pub inner: Arc<dyn NotificationStore>,
    pub fail_for: Uuid,
}

#[async_trait]
impl NotificationStore for FailingNotifications {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
        if new.user == self.fail_for {
            return Err(StoreError::Corrupt("write rejected".to_string()));
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

/// Post store whose inserts always fail; reads delegate
pub struct FailingPosts {
    pub inner: Arc<dyn PostStore>,
}

#[async_trait]
impl PostStore for FailingPosts {
    async fn create(&self, _new: NewPost) -> Result<Post, StoreError> {
        Err(StoreError::Corrupt("insert rejected".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError> {
        self.inner.list(filter, page).await
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, StoreError> {
        self.inner.toggle_like(post_id, user_id).await
    }

    async fn add_comment(&self, post_id: Uuid, comment: Comment) -> Result<Option<Comment>, StoreError> {
        self.inner.add_comment(post_id, comment).await
    }
}
