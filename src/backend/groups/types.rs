//! Group request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::shared::models::{Group, User, UserSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub member_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersRequest {
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupResponse {
    pub group_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub invite_link: String,
    /// Number of SMS messages accepted by the provider
    pub sent: usize,
}

/// A group with admin and members resolved to user summaries
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub admin: UserSummary,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupView {
    /// Resolve member ids against `users`; members without a record are skipped
    pub fn build(group: Group, users: &[User]) -> Self {
        let by_id: HashMap<Uuid, &User> = users.iter().map(|u| (u.id, u)).collect();
        let admin = by_id
            .get(&group.admin)
            .map(|u| u.summary())
            .unwrap_or_else(|| UserSummary {
                id: group.admin,
                username: String::new(),
                profile_picture: String::new(),
            });
        let members = group
            .members
            .iter()
            .filter_map(|id| by_id.get(id).map(|u| u.summary()))
            .collect();

        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            admin,
            members,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}
