//! Notification Data Structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Closed set of notification kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    GroupInvite,
    NewPost,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::GroupInvite => "group_invite",
            NotificationKind::NewPost => "new_post",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "group_invite" => Ok(NotificationKind::GroupInvite),
            "new_post" => Ok(NotificationKind::NewPost),
            other => Err(SharedError::invalid_value("notification kind", other)),
        }
    }
}

/// A durable notification owned by exactly one recipient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    /// Recipient
    pub user: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub post: Option<Uuid>,
    pub group: Option<Uuid>,
    pub from_user: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: new.user,
            kind: new.kind,
            post: new.post,
            group: new.group,
            from_user: new.from_user,
            message: new.message,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a notification; notifications start unread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user: Uuid,
    pub kind: NotificationKind,
    pub post: Option<Uuid>,
    pub group: Option<Uuid>,
    pub from_user: Uuid,
    pub message: String,
}
