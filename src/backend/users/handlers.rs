//! User HTTP Handlers

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::types::{PushTokenRequest, SearchQuery, UserIdResponse};
use super::SEARCH_LIMIT;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::posts::handlers::upload_key;
use crate::backend::server::state::AppState;
use crate::backend::store::Repositories;
use crate::shared::models::{ProfileUpdate, User, UserSummary};

/// GET /api/users/search?q=
pub async fn search_users(
    State(repos): State<Repositories>,
    _caller: AuthUser,
    Query(query): Query<SearchQuery>,
) -> BackendResult<Json<Vec<UserSummary>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let users = repos.users.search(q, SEARCH_LIMIT).await?;
    Ok(Json(users.iter().map(User::summary).collect()))
}

/// GET /api/users/mobile/{phone}
pub async fn find_by_mobile(
    State(repos): State<Repositories>,
    _caller: AuthUser,
    Path(phone): Path<String>,
) -> BackendResult<Json<UserIdResponse>> {
    let user = repos
        .users
        .find_by_phone(phone.trim())
        .await?
        .ok_or_else(|| BackendError::not_found("User"))?;
    Ok(Json(UserIdResponse { id: user.id }))
}

/// GET /api/users/me
pub async fn get_me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// GET /api/users/{userId}
///
/// Accepts either the internal id or the identity provider uid.
pub async fn get_user(
    State(repos): State<Repositories>,
    _caller: AuthUser,
    Path(user_id): Path<String>,
) -> BackendResult<Json<User>> {
    let user = match Uuid::parse_str(&user_id) {
        Ok(id) => repos.users.find_by_id(id).await?,
        Err(_) => repos.users.find_by_external_uid(&user_id).await?,
    };
    user.map(Json).ok_or_else(|| BackendError::not_found("User"))
}

/// PUT /api/users/{userId}
///
/// Users may only edit their own profile. Accepts a JSON body, or a
/// multipart form with the same text fields plus an optional `image` that
/// becomes the profile picture.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    request: Request,
) -> BackendResult<Json<User>> {
    if Uuid::parse_str(&user_id).ok() != Some(caller.id) {
        tracing::warn!("User {} attempted to edit profile {}", caller.id, user_id);
        return Err(BackendError::NotAuthorized);
    }

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));
    let (update, picture_key) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| BackendError::validation("image", e.body_text()))?;
        read_profile_form(&state, caller.id, multipart).await?
    } else {
        let Json(update) = Json::<ProfileUpdate>::from_request(request, &state)
            .await
            .map_err(|e| BackendError::validation("body", e.body_text()))?;
        (update, None)
    };

    if matches!(update.username.as_deref().map(str::trim), Some("")) {
        return Err(BackendError::validation("username", "Username cannot be empty"));
    }
    if update.is_empty() {
        return Ok(Json(caller));
    }

    let updated = state.repos.users.update_profile(caller.id, &update).await;
    if let (Err(_), Some(key)) = (&updated, &picture_key) {
        if let Err(cleanup) = state.blobs.delete(key).await {
            tracing::warn!("Orphaned upload {} after failed profile update: {}", key, cleanup);
        }
    }
    let user = updated?.ok_or_else(|| BackendError::not_found("User"))?;
    Ok(Json(user))
}

fn form_error(e: axum::extract::multipart::MultipartError) -> BackendError {
    BackendError::validation("image", format!("Malformed upload: {}", e))
}

/// Collect a multipart profile form, storing any `image` part
///
/// Empty text fields are treated as absent. Returns the update and the
/// blob key of the stored image, if any.
async fn read_profile_form(
    state: &AppState,
    user_id: Uuid,
    mut multipart: Multipart,
) -> BackendResult<(ProfileUpdate, Option<String>)> {
    let mut update = ProfileUpdate::default();
    let mut picture_key = None;
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(form_error)?;
                if data.is_empty() {
                    continue;
                }
                let key = upload_key(
                    &format!("posts/{}/profile", user_id),
                    file_name.as_deref(),
                    &content_type,
                );
                let url = state.blobs.put(&key, data, &content_type).await?;
                tracing::debug!("Profile picture for {} stored at {}", user_id, key);
                update.profile_picture = Some(url);
                picture_key = Some(key);
            }
            Some(key @ ("username" | "phoneNumber" | "bio")) => {
                let value = field.text().await.map_err(form_error)?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                match key {
                    "username" => update.username = value,
                    "phoneNumber" => update.phone_number = value,
                    _ => update.bio = value,
                }
            }
            _ => {}
        }
    }
    Ok((update, picture_key))
}

/// POST /api/users/push-token
pub async fn register_push_token(
    State(repos): State<Repositories>,
    AuthUser(user): AuthUser,
    Json(request): Json<PushTokenRequest>,
) -> BackendResult<Json<Value>> {
    let token = request.push_token.trim();
    if token.is_empty() {
        return Err(BackendError::validation("pushToken", "Push token is required"));
    }
    repos.users.set_push_token(user.id, Some(token)).await?;
    tracing::debug!("Push token registered for {}", user.id);
    Ok(Json(json!({ "message": "Push token saved" })))
}

/// PUT /api/users/push-token; an empty token clears it
pub async fn update_push_token(
    State(repos): State<Repositories>,
    AuthUser(user): AuthUser,
    Json(request): Json<PushTokenRequest>,
) -> BackendResult<Json<Value>> {
    let token = Some(request.push_token.trim()).filter(|t| !t.is_empty());
    repos.users.set_push_token(user.id, token).await?;
    Ok(Json(json!({ "message": "Push token updated" })))
}

/// DELETE /api/users/push-token
pub async fn clear_push_token(
    State(repos): State<Repositories>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Value>> {
    repos.users.set_push_token(user.id, None).await?;
    Ok(Json(json!({ "message": "Push token removed" })))
}
