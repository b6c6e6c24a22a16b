//! GET /api/auth/exists?phone=

use axum::{
    extract::{Query, State},
    Json,
};

use crate::backend::auth::handlers::types::{ExistsQuery, ExistsResponse};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::Repositories;

/// Whether a user with this phone number is registered
pub async fn phone_exists(
    State(repos): State<Repositories>,
    Query(query): Query<ExistsQuery>,
) -> BackendResult<Json<ExistsResponse>> {
    let phone = query
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| BackendError::validation("phone", "Phone number required"))?;

    let exists = repos.users.find_by_phone(phone).await?.is_some();
    Ok(Json(ExistsResponse { exists }))
}
