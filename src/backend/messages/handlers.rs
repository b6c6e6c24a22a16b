//! Group Message HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::MAX_MESSAGE_CHARS;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::models::{GroupMessage, NewGroupMessage};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
}

/// Trimmed message text, or a validation error
pub fn validate_text(text: &str) -> BackendResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BackendError::validation("text", "Message text is required"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(BackendError::validation(
            "text",
            format!("Message must be at most {} characters", MAX_MESSAGE_CHARS),
        ));
    }
    Ok(text)
}

/// GET /api/groups/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> BackendResult<Json<Vec<GroupMessage>>> {
    state.membership.require_member(group_id, user.id).await?;
    let messages = state.repos.messages.list_for_group(group_id).await?;
    Ok(Json(messages))
}

/// POST /api/groups/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<GroupMessage>)> {
    let text = validate_text(&request.text)?;
    state.membership.require_member(group_id, user.id).await?;

    let message = state
        .repos
        .messages
        .create(NewGroupMessage {
            group_id,
            sender_id: user.id,
            sender_name: user.username.clone(),
            sender_avatar_url: user.profile_picture.clone(),
            text: text.to_string(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /api/groups/{id}/messages/{messageId}
///
/// Allowed for the sender and the group admin.
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((group_id, message_id)): Path<(Uuid, Uuid)>,
) -> BackendResult<Json<Value>> {
    let group = state.membership.require_member(group_id, user.id).await?;
    let message = state
        .repos
        .messages
        .find_in_group(group_id, message_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Message"))?;

    if message.sender_id != user.id && !group.is_admin(user.id) {
        return Err(BackendError::NotAuthorized);
    }

    state.repos.messages.delete(message.id).await?;
    tracing::debug!("Message {} deleted from group {} by {}", message.id, group_id, user.id);
    Ok(Json(json!({ "message": "Message deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hi  ").unwrap(), "hi");
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"x".repeat(1000)).is_ok());
        assert!(validate_text(&"x".repeat(1001)).is_err());
    }
}
