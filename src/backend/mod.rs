//! Backend Module
//!
//! All server-side code for spamit: an Axum HTTP API for small private
//! sharing groups with media posts, group chat and notifications.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`store`** - Repository traits with Postgres and in-memory backends
//! - **`services`** - Outbound adapters (identity, push, SMS, media storage)
//! - **`auth`** - Phone-identity registration and session tokens
//! - **`middleware`** - Request extractors
//! - **`groups`** - Invite tokens and the group/user membership mirror
//! - **`notifications`** - Fan-out engine and notification endpoints
//! - **`posts`**, **`messages`**, **`users`** - Feature endpoints
//! - **`error`** - Backend error type and HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── store/          - Persistence
//! ├── services/       - External providers
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! ├── groups/         - Groups and membership
//! ├── notifications/  - Notification fan-out
//! ├── posts/          - Media posts
//! ├── messages/       - Group chat
//! ├── users/          - User profiles
//! └── error/          - Error types
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use spamit::backend::server::{config::load_config, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! let port = config.port;
//! let app = create_app(config).await;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Authentication and session tokens
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Persistence layer
pub mod store;

/// External service adapters
pub mod services;

/// Groups, invites and membership
pub mod groups;

/// Notification fan-out
pub mod notifications;

/// Media posts, likes and comments
pub mod posts;

/// Group chat messages
pub mod messages;

/// User profiles and push tokens
pub mod users;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::{create_app, AppState};
