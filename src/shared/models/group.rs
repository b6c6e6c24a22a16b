//! Group Data Structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sharing group
///
/// `members` always contains `admin`. It is the authoritative side of the
/// membership relation; `User::groups` mirrors it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub admin: Uuid,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn from_new(new: NewGroup) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: String::new(),
            admin: new.admin,
            members: new.members,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin == user_id
    }

    /// The admin always counts as a member, even if the stored list drifted
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.is_admin(user_id) || self.members.contains(&user_id)
    }
}

/// Input for creating a group; `members` must already include the admin
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub admin: Uuid,
    pub members: Vec<Uuid>,
}
