/**
 * Backend Error Types
 *
 * Every failure a handler or service can report, each mapped to one HTTP
 * status. Client-facing messages are fixed strings; storage and dependency
 * details are logged, never returned.
 *
 * # Error Categories
 *
 * ## Request errors (4xx)
 *
 * - Missing or malformed input (`Validation`)
 * - Unknown resource (`NotFound`)
 * - Missing credentials (`Unauthenticated`) or wrong caller (`NotAuthorized`)
 * - Invite problems (`TokenExpired`, `TokenInvalid`, `AlreadyMember`)
 *
 * ## Server errors (5xx)
 *
 * - Persistence failures (`Storage`)
 * - External service failures (`Dependency`)
 * - Anything else (`Internal`)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use spamit::backend::error::BackendError;
///
/// let err = BackendError::not_found("Group");
/// assert_eq!(err.message(), "Group not found");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// The referenced record does not exist
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Caller is authenticated but may not perform the action
    #[error("Not authorized")]
    NotAuthorized,

    /// Missing, malformed or expired session token
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    /// Invite redeemed by someone already in the group
    #[error("Already a member")]
    AlreadyMember,

    /// Invite token past its expiry
    #[error("Invite link expired")]
    TokenExpired,

    /// Invite token that fails signature or structure checks
    #[error("Invalid invite link")]
    TokenInvalid,

    /// Input validation error
    #[error(transparent)]
    Validation(#[from] SharedError),

    /// Duplicate unique value
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// An external service (identity, push, SMS, blob storage) failed
    #[error("{service} error: {message}")]
    Dependency {
        service: &'static str,
        message: String,
    },

    /// Persistence failure
    #[error(transparent)]
    Storage(StoreError),

    /// Any other server-side failure
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BackendError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Shorthand for a single-field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(SharedError::validation(field, message))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn dependency(service: &'static str, message: impl Into<String>) -> Self {
        Self::Dependency {
            service,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::AlreadyMember | Self::TokenExpired | Self::TokenInvalid | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Storage(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Dependency { .. } => StatusCode::BAD_GATEWAY,
            Self::Storage(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message returned to the client
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { .. }
            | Self::NotAuthorized
            | Self::AlreadyMember
            | Self::TokenExpired
            | Self::TokenInvalid => self.to_string(),
            Self::Unauthenticated { .. } => "Authentication required".to_string(),
            Self::Validation(err) => err.client_message(),
            Self::Conflict { message } => message.clone(),
            Self::Storage(StoreError::Conflict { field }) => format!("{} already in use", field),
            Self::Dependency { service, .. } => format!("{} unavailable", service),
            Self::Storage(_) | Self::Internal { .. } => "Server error".to_string(),
        }
    }
}
