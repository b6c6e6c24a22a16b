//! Posts
//!
//! Media posts inside groups, plus likes and comments. Creating a post or a
//! comment hands a job to the notification fan-out worker once the write
//! is stored.

pub mod handlers;
pub mod types;
