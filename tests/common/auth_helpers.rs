//! Authentication and fixture helpers
//!
//! Registers users through the real register-or-login endpoint and builds
//! groups and posts over HTTP.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestResponse;
use serde_json::{json, Value};
use uuid::Uuid;

use spamit::backend::services::VerifiedIdentity;

use super::test_app::TestApp;

/// A registered user and their session token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    pub token: String,
}

pub fn phone_for(username: &str) -> String {
    format!("+1-555-{}", username)
}

pub fn id_token_for(username: &str) -> String {
    format!("id-token-{}", username)
}

impl TestApp {
    /// Make the fake identity provider accept a token for `username`
    pub fn register_identity(&self, username: &str) -> String {
        let id_token = id_token_for(username);
        self.identity.register(
            &id_token,
            VerifiedIdentity {
                uid: format!("uid-{}", username),
                phone_number: Some(phone_for(username)),
                name: Some(username.to_string()),
            },
        );
        id_token
    }

    /// Register a user via `POST /api/auth/register-or-login`
    pub async fn register(&self, username: &str) -> TestUser {
        let id_token = self.register_identity(username);
        let response = self
            .server
            .post("/api/auth/register-or-login")
            .json(&json!({ "idToken": id_token, "username": username }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK, "register failed: {}", response.text());

        let body: Value = response.json();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            username: username.to_string(),
            phone: phone_for(username),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn set_push_token(&self, user: &TestUser, push_token: &str) {
        self.server
            .put("/api/users/push-token")
            .authorization_bearer(&user.token)
            .json(&json!({ "pushToken": push_token }))
            .await
            .assert_status_ok();
    }

    /// Create a group over HTTP and return its id
    pub async fn create_group(&self, admin: &TestUser, name: &str, members: &[&TestUser]) -> Uuid {
        let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let response = self
            .server
            .post("/api/groups")
            .authorization_bearer(&admin.token)
            .json(&json!({ "name": name, "memberIds": member_ids }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "create group failed: {}", response.text());
        let body: Value = response.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Upload a small image post
    pub async fn create_post(&self, author: &TestUser, group_id: Uuid, caption: &str) -> TestResponse {
        let form = MultipartForm::new()
            .add_text("groupId", group_id.to_string())
            .add_text("caption", caption.to_string())
            .add_part(
                "media",
                Part::bytes(b"\x89PNG fake image".to_vec())
                    .file_name("photo.png")
                    .mime_type("image/png"),
            );
        self.server
            .post("/api/posts")
            .authorization_bearer(&author.token)
            .multipart(form)
            .await
    }

    /// Create a post and return its id
    pub async fn post_id(&self, author: &TestUser, group_id: Uuid, caption: &str) -> Uuid {
        let response = self.create_post(author, group_id, caption).await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "create post failed: {}", response.text());
        let body: Value = response.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }
}
