//! Common test utilities and helpers
//!
//! This module provides shared utilities for the API tests including:
//! - An in-process test app over the in-memory store
//! - Fake identity, push and SMS providers
//! - Authentication and fixture helpers
//! - Custom assertion macros

#![allow(dead_code)]

#[macro_use]
pub mod assertions;
pub mod auth_helpers;
pub mod fakes;
pub mod test_app;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use fakes::*;
pub use test_app::*;
