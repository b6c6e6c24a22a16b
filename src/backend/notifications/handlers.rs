//! Notification HTTP Handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::models::{Notification, NotificationKind, UserSummary};

/// Notifications returned per request
pub const NOTIFICATION_PAGE_SIZE: i64 = 20;

/// A notification with `fromUser` resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub post: Option<Uuid>,
    pub group: Option<Uuid>,
    pub from_user: Option<UserSummary>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    fn build(notification: Notification, senders: &HashMap<Uuid, UserSummary>) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            post: notification.post,
            group: notification.group,
            from_user: senders.get(&notification.from_user).cloned(),
            message: notification.message,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<NotificationView>>> {
    let notifications = state
        .repos
        .notifications
        .list_for_user(user.id, NOTIFICATION_PAGE_SIZE)
        .await?;

    let sender_ids: Vec<Uuid> = notifications
        .iter()
        .map(|n| n.from_user)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let senders: HashMap<Uuid, UserSummary> = state
        .repos
        .users
        .find_many(&sender_ids)
        .await?
        .iter()
        .map(|u| (u.id, u.summary()))
        .collect();

    Ok(Json(
        notifications
            .into_iter()
            .map(|n| NotificationView::build(n, &senders))
            .collect(),
    ))
}

/// PUT /api/notifications/mark-read
pub async fn mark_read(State(state): State<AppState>, AuthUser(user): AuthUser) -> BackendResult<Json<Value>> {
    let updated = state.repos.notifications.mark_all_read(user.id).await?;
    tracing::debug!("Marked {} notification(s) read for {}", updated, user.id);
    Ok(Json(json!({ "updated": updated })))
}
