//! Group chat messages
//!
//! Plain request/response chat scoped to a group. Every route requires
//! membership; the admin always counts as a member.

pub mod handlers;

/// Longest accepted message, in characters
pub const MAX_MESSAGE_CHARS: usize = 1000;
