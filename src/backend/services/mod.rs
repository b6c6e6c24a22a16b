//! External Services
//!
//! Adapters for everything the backend talks to outside its own database.
//! Each concern is a trait so handlers and the notification engine hold
//! `Arc<dyn _>` handles and tests can swap in recording fakes.
//!
//! - **`identity`** - Verifies phone sign-in tokens (Firebase)
//! - **`push`** - Mobile push delivery (FCM HTTP v1)
//! - **`sms`** - Invite link delivery by text message (Twilio)
//! - **`blob`** - Media upload storage (local directory served at `/uploads`)

use thiserror::Error;

pub mod identity;
pub mod push;
pub mod sms;
pub mod blob;

pub use blob::{BlobStore, LocalBlobStore};
pub use identity::{FirebaseIdentityVerifier, IdentityVerifier, UnconfiguredIdentityVerifier, VerifiedIdentity};
pub use push::{FcmPushSender, NoopPushSender, PushMessage, PushSender};
pub use sms::{NoopSmsSender, SmsSender, TwilioSmsSender};

/// Errors from external services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure talking to the service
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{service} rejected request with status {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered but the payload was not acceptable
    #[error("{service}: {message}")]
    Invalid {
        service: &'static str,
        message: String,
    },

    /// The service has no configuration in this deployment
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn http(service: &'static str, source: reqwest::Error) -> Self {
        Self::Http { service, source }
    }

    pub fn invalid(service: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            service,
            message: message.into(),
        }
    }

    /// Name of the failing service
    pub fn service(&self) -> &'static str {
        match self {
            Self::Http { service, .. }
            | Self::Rejected { service, .. }
            | Self::Invalid { service, .. }
            | Self::NotConfigured { service } => service,
            Self::Io(_) => "Storage",
        }
    }
}

/// Turn a non-2xx response into `ServiceError::Rejected`
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Rejected {
        service,
        status: status.as_u16(),
        body,
    })
}
