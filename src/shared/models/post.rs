//! Post and Comment Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Kind of media attached to a post
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Classify an upload by its MIME type; anything not `video/*` is an image
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

impl FromStr for MediaType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(SharedError::invalid_value("media type", other)),
        }
    }
}

/// A comment on a post; comments are append-only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A media post in a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    /// Author
    pub user: Uuid,
    pub group: Uuid,
    pub caption: String,
    pub media_url: String,
    pub media_type: MediaType,
    /// Users who liked the post, each at most once
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn from_new(new: NewPost) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: new.user,
            group: new.group,
            caption: new.caption,
            media_url: new.media_url,
            media_type: new.media_type,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user: Uuid,
    pub group: Uuid,
    pub caption: String,
    pub media_url: String,
    pub media_type: MediaType,
}
