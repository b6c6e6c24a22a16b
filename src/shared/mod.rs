//! Shared Module
//!
//! This module contains types and data structures shared by every layer of
//! the service: domain models, shared errors and configuration. None of it
//! depends on the server stack, so it compiles without the `ssr` feature.

/// Domain models (users, groups, posts, notifications, chat messages)
pub mod models;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
