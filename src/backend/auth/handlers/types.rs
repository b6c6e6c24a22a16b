//! Authentication request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::models::User;

/// Register-or-login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// ID token from the identity provider
    pub id_token: String,
    /// Preferred handle; falls back to the provider's display name
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub dob: Option<DateTime<Utc>>,
}

/// Session token plus the signed-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
