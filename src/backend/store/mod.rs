//! Persistence Layer
//!
//! One async trait per aggregate, each object safe so the rest of the
//! backend holds `Arc<dyn _>` handles and never names a concrete store.
//!
//! # Implementations
//!
//! - **`postgres`** - `sqlx` over Postgres. Member sets and back-references
//!   are `UUID[]` columns so set-add/set-remove are single idempotent
//!   statements.
//! - **`memory`** - `tokio::sync::RwLock` maps; used by tests and when no
//!   `DATABASE_URL` is configured.
//!
//! # Set semantics
//!
//! Every membership write is a set operation: adding an element that is
//! already present and removing one that is absent are both no-ops. The
//! membership synchronizer relies on this to make retries safe.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::models::{
    Comment, Group, GroupMessage, NewGroup, NewGroupMessage, NewNotification, NewPost, NewUser,
    Notification, Post, ProfileUpdate, User,
};

/// In-memory store
pub mod memory;

/// Postgres store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated (username, phone, external uid)
    #[error("{field} already in use")]
    Conflict { field: &'static str },

    /// A stored value could not be decoded into a model
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Offset pagination for list reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    /// Build a page from 1-based page number and limit
    pub fn new(page: u32, limit: u32) -> Self {
        let page = page.max(1) as i64;
        let limit = limit.max(1) as i64;
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

/// Filter for post listings
#[derive(Debug, Clone)]
pub enum PostFilter {
    /// Posts in exactly one group
    Group(Uuid),
    /// Posts in any of these groups
    Groups(Vec<Uuid>),
    /// Posts written by one user
    Author(Uuid),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_external_uid(&self, uid: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;
    /// Users with the given ids; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    /// Case-insensitive substring match on username
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError>;
    /// Returns false when the user does not exist
    async fn set_push_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, StoreError>;
    /// Set-add `group_id` to each listed user's back-references
    async fn add_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError>;
    /// Set-remove `group_id` from each listed user's back-references
    async fn remove_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError>;
    /// Ids of users whose back-references contain `group_id`
    async fn list_group_holders(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    /// Set-remove `group_id` from every user holding it; returns how many changed
    async fn remove_group_ref_everywhere(&self, group_id: Uuid) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn create(&self, new: NewGroup) -> Result<Group, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError>;
    /// Groups whose member list contains `user_id`
    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>, StoreError>;
    /// Overwrite name and member list
    async fn replace(&self, id: Uuid, name: &str, members: &[Uuid]) -> Result<Option<Group>, StoreError>;
    /// Set-union `members` into the group's member list
    async fn add_members(&self, id: Uuid, members: &[Uuid]) -> Result<Option<Group>, StoreError>;
    /// Returns false when the group did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    /// Newest first
    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError>;
    /// Add or remove `user_id` from the likes set; `None` if the post is absent
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, StoreError>;
    /// Append a comment; `None` if the post is absent
    async fn add_comment(&self, post_id: Uuid, comment: Comment) -> Result<Option<Comment>, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError>;
    /// Newest first, at most `limit`
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, StoreError>;
    /// Mark every unread notification of `user_id` as read; returns how many changed
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, new: NewGroupMessage) -> Result<GroupMessage, StoreError>;
    /// Oldest first
    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<GroupMessage>, StoreError>;
    async fn find_in_group(&self, group_id: Uuid, message_id: Uuid) -> Result<Option<GroupMessage>, StoreError>;
    async fn delete(&self, message_id: Uuid) -> Result<bool, StoreError>;
}

/// Handles to every store, shared across the application
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub groups: Arc<dyn GroupStore>,
    pub posts: Arc<dyn PostStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub messages: Arc<dyn MessageStore>,
    backend: &'static str,
}

impl Repositories {
    /// Repositories backed by one in-memory store
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            notifications: store.clone(),
            messages: store,
            backend: "memory",
        }
    }

    /// Repositories backed by a Postgres pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            notifications: store.clone(),
            messages: store,
            backend: "postgres",
        }
    }

    /// Swap the user store (used to inject failures in tests)
    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Swap the post store (used to inject failures in tests)
    pub fn with_posts(mut self, posts: Arc<dyn PostStore>) -> Self {
        self.posts = posts;
        self
    }

    /// Swap the notification store (used to inject failures in tests)
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationStore>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Name of the backing store, reported by the health endpoint
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offsets() {
        assert_eq!(Page::new(1, 10), Page { offset: 0, limit: 10 });
        assert_eq!(Page::new(3, 20), Page { offset: 40, limit: 20 });
        assert_eq!(Page::new(0, 0), Page { offset: 0, limit: 1 });
    }
}
