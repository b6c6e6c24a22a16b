/**
 * Register-or-login Handler
 *
 * POST /api/auth/register-or-login
 *
 * # Process
 *
 * 1. Verify the provider ID token
 * 2. Find the user by provider uid, or create one
 * 3. For an existing user, apply a changed username or date of birth
 * 4. Issue a session token
 *
 * New users take the requested username, else the provider display name,
 * else "Anonymous".
 */

use axum::{extract::State, Json};

use crate::backend::auth::handlers::types::{AuthResponse, RegisterRequest};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;
use crate::backend::services::{ServiceError, VerifiedIdentity};
use crate::shared::models::{NewUser, ProfileUpdate, User};

const FALLBACK_USERNAME: &str = "Anonymous";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Map identity failures: bad tokens are the caller's problem, outages are ours
fn identity_error(err: ServiceError) -> BackendError {
    match err {
        ServiceError::Invalid { .. } => {
            tracing::warn!("Rejected identity token: {}", err);
            BackendError::unauthenticated("invalid identity token")
        }
        other => other.into(),
    }
}

async fn find_or_create(
    state: &AppState,
    identity: &VerifiedIdentity,
    request: &RegisterRequest,
) -> BackendResult<User> {
    let requested_name = non_empty(request.username.as_deref());

    if let Some(user) = state.repos.users.find_by_external_uid(&identity.uid).await? {
        let update = ProfileUpdate {
            username: requested_name
                .filter(|name| *name != user.username)
                .map(str::to_string),
            dob: request.dob.filter(|dob| Some(*dob) != user.dob),
            ..Default::default()
        };
        if update.is_empty() {
            return Ok(user);
        }
        tracing::info!("Updating profile of {} on login", user.id);
        return state
            .repos
            .users
            .update_profile(user.id, &update)
            .await?
            .ok_or_else(|| BackendError::not_found("User"));
    }

    let phone_number = non_empty(identity.phone_number.as_deref())
        .ok_or_else(|| BackendError::validation("phoneNumber", "Identity token has no phone number"))?;
    let username = requested_name
        .or_else(|| non_empty(identity.name.as_deref()))
        .unwrap_or(FALLBACK_USERNAME);

    let user = state
        .repos
        .users
        .create(NewUser {
            external_uid: Some(identity.uid.clone()),
            username: username.to_string(),
            phone_number: phone_number.to_string(),
            dob: request.dob,
        })
        .await?;
    tracing::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Register-or-login handler
///
/// # Errors
///
/// * `400 Bad Request` - Missing ID token, or the token carries no phone number
/// * `401 Unauthorized` - The identity provider rejected the token
/// * `409 Conflict` - Username or phone number already taken
/// * `502 Bad Gateway` - The identity provider could not be reached
pub async fn register_or_login(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> BackendResult<Json<AuthResponse>> {
    if request.id_token.trim().is_empty() {
        return Err(BackendError::validation("idToken", "idToken is required"));
    }

    let identity = state
        .identity
        .verify(request.id_token.trim())
        .await
        .map_err(identity_error)?;
    let user = find_or_create(&state, &identity, &request).await?;

    let token = state
        .sessions
        .create_token(user.id, &user.username)
        .map_err(|e| {
            tracing::error!("Failed to create token: {:?}", e);
            BackendError::internal("failed to create session token")
        })?;

    Ok(Json(AuthResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  bob ")), Some("bob"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_invalid_identity_is_unauthenticated() {
        let err = identity_error(ServiceError::invalid("Identity", "bad signature"));
        assert!(matches!(err, BackendError::Unauthenticated { .. }));

        let err = identity_error(ServiceError::NotConfigured { service: "Identity" });
        assert!(matches!(err, BackendError::Dependency { .. }));
    }
}
