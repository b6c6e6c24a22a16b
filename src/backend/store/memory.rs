//! In-memory store
//!
//! Implements every store trait over `tokio::sync::RwLock`-guarded maps.
//! Each trait method takes one lock for its whole duration, which gives the
//! same per-statement atomicity the Postgres store has and nothing more.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    GroupStore, MessageStore, NotificationStore, Page, PostFilter, PostStore, StoreError, UserStore,
};
use crate::shared::models::{
    Comment, Group, GroupMessage, NewGroup, NewGroupMessage, NewNotification, NewPost, NewUser,
    Notification, Post, ProfileUpdate, User,
};

/// Store that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    groups: RwLock<HashMap<Uuid, Group>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    notifications: RwLock<Vec<Notification>>,
    messages: RwLock<Vec<GroupMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn set_add(set: &mut Vec<Uuid>, value: Uuid) -> bool {
    if set.contains(&value) {
        false
    } else {
        set.push(value);
        true
    }
}

fn set_remove(set: &mut Vec<Uuid>, value: Uuid) -> bool {
    let before = set.len();
    set.retain(|v| *v != value);
    set.len() != before
}

/// Check the unique columns of `candidate` against every other user
fn check_unique(users: &HashMap<Uuid, User>, candidate: &User) -> Result<(), StoreError> {
    for other in users.values().filter(|u| u.id != candidate.id) {
        if other.username == candidate.username {
            return Err(StoreError::Conflict { field: "username" });
        }
        if other.phone_number == candidate.phone_number {
            return Err(StoreError::Conflict { field: "phone_number" });
        }
        if candidate.external_uid.is_some() && other.external_uid == candidate.external_uid {
            return Err(StoreError::Conflict { field: "external_uid" });
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = User::from_new(new);
        check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_external_uid(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.external_uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.phone_number == phone).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(existing) = users.get(&id) else {
            return Ok(None);
        };
        let mut updated = existing.clone();
        update.apply(&mut updated);
        check_unique(&users, &updated)?;
        users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_push_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.push_token = token.map(str::to_string);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        for id in user_ids {
            if let Some(user) = users.get_mut(id) {
                set_add(&mut user.groups, group_id);
            }
        }
        Ok(())
    }

    async fn remove_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        for id in user_ids {
            if let Some(user) = users.get_mut(id) {
                set_remove(&mut user.groups, group_id);
            }
        }
        Ok(())
    }

    async fn list_group_holders(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|user| user.groups.contains(&group_id))
            .map(|user| user.id)
            .collect())
    }

    async fn remove_group_ref_everywhere(&self, group_id: Uuid) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let changed = users
            .values_mut()
            .map(|user| set_remove(&mut user.groups, group_id))
            .filter(|changed| *changed)
            .count();
        Ok(changed as u64)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn create(&self, new: NewGroup) -> Result<Group, StoreError> {
        let group = Group::from_new(new);
        self.groups.write().await.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>, StoreError> {
        let groups = self.groups.read().await;
        let mut found: Vec<Group> = groups
            .values()
            .filter(|g| g.members.contains(&user_id))
            .cloned()
            .collect();
        found.sort_by_key(|g| g.created_at);
        Ok(found)
    }

    async fn replace(&self, id: Uuid, name: &str, members: &[Uuid]) -> Result<Option<Group>, StoreError> {
        let mut groups = self.groups.write().await;
        Ok(groups.get_mut(&id).map(|group| {
            group.name = name.to_string();
            group.members = members.to_vec();
            group.updated_at = Utc::now();
            group.clone()
        }))
    }

    async fn add_members(&self, id: Uuid, members: &[Uuid]) -> Result<Option<Group>, StoreError> {
        let mut groups = self.groups.write().await;
        Ok(groups.get_mut(&id).map(|group| {
            for member in members {
                set_add(&mut group.members, *member);
            }
            group.updated_at = Utc::now();
            group.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.groups.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError> {
        let post = Post::from_new(new);
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts
            .values()
            .filter(|p| match filter {
                PostFilter::Group(group) => p.group == *group,
                PostFilter::Groups(groups) => groups.contains(&p.group),
                PostFilter::Author(author) => p.user == *author,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, StoreError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&post_id).map(|post| {
            if !set_remove(&mut post.likes, user_id) {
                post.likes.push(user_id);
            }
            post.likes.clone()
        }))
    }

    async fn add_comment(&self, post_id: Uuid, comment: Comment) -> Result<Option<Comment>, StoreError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&post_id).map(|post| {
            post.comments.push(comment.clone());
            comment
        }))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let notification = Notification::from_new(new);
        self.notifications.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, StoreError> {
        let notifications = self.notifications.read().await;
        // Insertion order breaks ties between equal timestamps
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.user == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut notifications = self.notifications.write().await;
        let mut changed = 0;
        for n in notifications.iter_mut().filter(|n| n.user == user_id && !n.read) {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, new: NewGroupMessage) -> Result<GroupMessage, StoreError> {
        let message = GroupMessage::from_new(new);
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<GroupMessage>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|m| m.group_id == group_id).cloned().collect())
    }

    async fn find_in_group(&self, group_id: Uuid, message_id: Uuid) -> Result<Option<GroupMessage>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .find(|m| m.id == message_id && m.group_id == group_id)
            .cloned())
    }

    async fn delete(&self, message_id: Uuid) -> Result<bool, StoreError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.id != message_id);
        Ok(messages.len() != before)
    }
}
