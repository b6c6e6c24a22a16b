//! Groups
//!
//! - **`invite`** - Signed, time-bounded admission tokens
//! - **`membership`** - Keeps `Group::members` and `User::groups` in step
//! - **`handlers`** - `/api/groups` HTTP handlers
//! - **`types`** - Request and response bodies

pub mod invite;
pub mod membership;
pub mod handlers;
pub mod types;

pub use invite::{InviteCodec, InviteError, InviteGrant};
pub use membership::MembershipService;
