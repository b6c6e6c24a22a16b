//! spamit - Main Library
//!
//! Backend for small private sharing groups: members post photos and
//! videos, comment, like, chat, and invite friends by SMS link.
//!
//! # Module Structure
//!
//! - **`shared`** - Domain models, configuration and validation errors
//!   that do not depend on the server stack
//! - **`backend`** - Axum HTTP server, persistence, external services and
//!   the notification fan-out (only compiled with the `ssr` feature)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the
//!   `spamit-server` binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use spamit::backend::server::{config::load_config, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(load_config()?).await;
//! // Serve with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for model validation
//! - `backend::store::StoreError` for persistence failures
//! - `backend::error::BackendError` for everything surfaced over HTTP

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
