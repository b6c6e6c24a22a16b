/**
 * Authentication Extractor
 *
 * Protects routes that require a signed-in user. The session JWT is read
 * from the `Authorization: Bearer` header, verified, and the user record
 * is loaded so handlers receive a full `User`.
 *
 * Every failure is a 401; the reason is logged, never returned.
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::models::User;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            tracing::warn!("Missing or malformed Authorization header");
            BackendError::unauthenticated("missing bearer token")
        })?;

        let user_id = state.sessions.user_id_from_token(token).map_err(|e| {
            tracing::warn!("Invalid token: {}", e);
            BackendError::unauthenticated(e)
        })?;

        let user = state.repos.users.find_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!("Token for unknown user {}", user_id);
            BackendError::unauthenticated("user not found")
        })?;

        Ok(AuthUser(user))
    }
}
