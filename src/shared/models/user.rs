//! User Data Structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user
///
/// Users are created on first phone sign-in and keyed by the identity
/// provider's uid. `username` and `phone_number` are globally unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Identity provider uid (Firebase `sub`)
    pub external_uid: Option<String>,
    pub username: String,
    pub phone_number: String,
    pub dob: Option<DateTime<Utc>>,
    /// Device token for push delivery; never serialized to clients
    #[serde(skip_serializing, default)]
    pub push_token: Option<String>,
    pub profile_picture: String,
    pub bio: String,
    /// Back-references to the groups this user is a member of
    pub groups: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user record from registration input
    pub fn from_new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_uid: new.external_uid,
            username: new.username,
            phone_number: new.phone_number,
            dob: new.dob,
            push_token: None,
            profile_picture: String::new(),
            bio: String::new(),
            groups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// Public projection of a user embedded in other responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: String,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_uid: Option<String>,
    pub username: String,
    pub phone_number: String,
    pub dob: Option<DateTime<Utc>>,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub dob: Option<DateTime<Utc>>,
    /// Set from an uploaded image, never from request JSON
    #[serde(skip)]
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.phone_number.is_none()
            && self.bio.is_none()
            && self.dob.is_none()
            && self.profile_picture.is_none()
    }

    /// Apply the update to a user record in place
    pub fn apply(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(phone) = &self.phone_number {
            user.phone_number = phone.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = bio.clone();
        }
        if let Some(dob) = self.dob {
            user.dob = Some(dob);
        }
        if let Some(picture) = &self.profile_picture {
            user.profile_picture = picture.clone();
        }
        user.updated_at = Utc::now();
    }
}
