//! Users
//!
//! Profile lookup and editing, username search and push token
//! registration.

pub mod handlers;
pub mod types;

/// Most results returned by a username search
pub const SEARCH_LIMIT: i64 = 20;
