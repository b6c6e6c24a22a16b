//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! - **`auth`** - The `AuthUser` extractor guarding authenticated routes

pub mod auth;

pub use auth::{bearer_token, AuthUser};
