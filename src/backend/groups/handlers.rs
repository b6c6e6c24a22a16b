//! Group HTTP Handlers
//!
//! Thin wrappers over [`MembershipService`]; every mutating route is
//! admin-gated inside the service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use futures_util::future::join_all;
use serde_json::{json, Value};
use uuid::Uuid;

use super::types::{
    AddMembersRequest, CreateGroupRequest, GroupView, InviteRequest, InviteResponse,
    JoinGroupRequest, JoinGroupResponse, UpdateGroupRequest,
};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::store::Repositories;
use crate::shared::models::Group;

async fn view(repos: &Repositories, group: Group) -> BackendResult<GroupView> {
    let users = repos.users.find_many(&group.members).await?;
    Ok(GroupView::build(group, &users))
}

/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateGroupRequest>,
) -> BackendResult<(StatusCode, Json<GroupView>)> {
    let group = state
        .membership
        .create(user.id, &request.name, &request.member_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(view(&state.repos, group).await?)))
}

/// GET /api/groups
pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<GroupView>>> {
    let groups = state.membership.list_for_user(user.id).await?;
    let mut views = Vec::with_capacity(groups.len());
    for group in groups {
        views.push(view(&state.repos, group).await?);
    }
    Ok(Json(views))
}

/// GET /api/groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> BackendResult<Json<GroupView>> {
    let group = state.membership.require_member(group_id, user.id).await?;
    Ok(Json(view(&state.repos, group).await?))
}

/// POST /api/groups/join
pub async fn join_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<JoinGroupRequest>,
) -> BackendResult<Json<JoinGroupResponse>> {
    if request.token.trim().is_empty() {
        return Err(BackendError::validation("token", "Invite token is required"));
    }
    let group = state.membership.join(request.token.trim(), user.id).await?;
    Ok(Json(JoinGroupResponse {
        group_id: group.id,
        name: group.name,
    }))
}

/// POST /api/groups/{id}/invite
///
/// Every number is attempted; if any send failed the request reports a
/// dependency error afterwards.
pub async fn invite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<InviteRequest>,
) -> BackendResult<Json<InviteResponse>> {
    let (group, token) = state.membership.issue_invite(group_id, user.id).await?;
    let invite_link = format!("{}/invite/{}", state.config.app_url, token);
    let body = format!("Join \"{}\": {}", group.name, invite_link);

    let results = join_all(
        request
            .phone_numbers
            .iter()
            .map(|to| state.sms.send(to, &body)),
    )
    .await;

    let mut sent = 0;
    let mut first_error = None;
    for (to, result) in request.phone_numbers.iter().zip(results) {
        match result {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::warn!("Invite SMS to {} for group {} failed: {}", to, group.id, e);
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err.into());
    }

    tracing::info!("Invite for group {} sent to {} number(s)", group.id, sent);
    Ok(Json(InviteResponse { invite_link, sent }))
}

/// PUT /api/groups/{id}
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> BackendResult<Json<GroupView>> {
    let group = state
        .membership
        .replace(
            group_id,
            user.id,
            request.name.as_deref(),
            request.member_ids.as_deref(),
        )
        .await?;
    Ok(Json(view(&state.repos, group).await?))
}

/// POST /api/groups/{id}/members
pub async fn add_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<AddMembersRequest>,
) -> BackendResult<Json<GroupView>> {
    let group = state
        .membership
        .add_members(group_id, user.id, &request.member_ids)
        .await?;
    Ok(Json(view(&state.repos, group).await?))
}

/// DELETE /api/groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> BackendResult<Json<Value>> {
    state.membership.delete(group_id, user.id).await?;
    Ok(Json(json!({ "message": "Group deleted" })))
}
