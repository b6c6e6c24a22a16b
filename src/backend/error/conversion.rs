/**
 * Error Conversion
 *
 * Conversions from lower-level errors into `BackendError`, and the
 * `IntoResponse` implementation that lets handlers return it directly.
 *
 * # Response Format
 *
 * Error responses are returned as JSON with the following structure:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::backend::error::types::BackendError;
use crate::backend::groups::invite::InviteError;
use crate::backend::services::ServiceError;
use crate::backend::store::StoreError;

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Conflict { .. } => {}
            _ => tracing::error!("Store error: {:?}", err),
        }
        BackendError::Storage(err)
    }
}

impl From<InviteError> for BackendError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::Expired => BackendError::TokenExpired,
            InviteError::Invalid(reason) => {
                tracing::debug!("Rejected invite token: {}", reason);
                BackendError::TokenInvalid
            }
            InviteError::Encode(reason) => BackendError::internal(reason),
        }
    }
}

impl From<ServiceError> for BackendError {
    fn from(err: ServiceError) -> Self {
        tracing::warn!("External service failed: {}", err);
        BackendError::dependency(err.service(), err.to_string())
    }
}

impl IntoResponse for BackendError {
    /// Convert a backend error into a JSON HTTP response
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        let mut response = Response::new(Body::from(body.to_string()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        response
    }
}
