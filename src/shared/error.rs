//! Shared Error Types
//!
//! This module defines error types that are shared between the domain models
//! and the backend. These errors represent input that fails validation before
//! it ever reaches persistence.
//!
//! # Error Categories
//!
//! - `ValidationError` - A required field is missing or out of range
//! - `InvalidValue` - A string that does not name a known enum variant
//!
//! # Usage
//!
//! ```rust
//! use spamit::shared::error::SharedError;
//!
//! let error = SharedError::validation("text", "Message text is required");
//! ```
use thiserror::Error;

/// Shared error types that can occur in both the models and the backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A stored or submitted string that does not map to a known variant
    #[error("Invalid {kind}: '{value}'")]
    InvalidValue {
        /// What was being parsed (e.g. "notification kind")
        kind: &'static str,
        /// The offending input
        value: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid-value error
    pub fn invalid_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }

    /// Message suitable for returning to API clients
    pub fn client_message(&self) -> String {
        match self {
            Self::ValidationError { message, .. } => message.clone(),
            Self::InvalidValue { .. } => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = SharedError::validation("mediaUrl", "Missing mediaUrl or groupId");
        match error {
            SharedError::ValidationError { field, message } => {
                assert_eq!(field, "mediaUrl");
                assert_eq!(message, "Missing mediaUrl or groupId");
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_invalid_value_display() {
        let error = SharedError::invalid_value("media type", "gif");
        let display = format!("{}", error);
        assert!(display.contains("media type"));
        assert!(display.contains("gif"));
    }

    #[test]
    fn test_client_message_hides_field_name() {
        let error = SharedError::validation("text", "Comment text missing");
        assert_eq!(error.client_message(), "Comment text missing");
    }
}
