//! Group Chat Message Data Structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message posted to a group
///
/// Sender name and avatar are copied at send time so history renders
/// without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl GroupMessage {
    pub fn from_new(new: NewGroupMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id: new.group_id,
            sender_id: new.sender_id,
            sender_name: new.sender_name,
            sender_avatar_url: new.sender_avatar_url,
            text: new.text,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewGroupMessage {
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar_url: String,
    pub text: String,
}
