//! Domain Models
//!
//! Records persisted by the store and returned over the API. All models
//! serialize with camelCase field names to match the mobile client.
//!
//! # Ownership
//!
//! `Group::members` is authoritative. `User::groups` is a back-reference
//! maintained by the membership synchronizer and must mirror it.

pub mod user;
pub mod group;
pub mod post;
pub mod notification;
pub mod message;

pub use user::{NewUser, ProfileUpdate, User, UserSummary};
pub use group::{Group, NewGroup};
pub use post::{Comment, MediaType, NewPost, Post};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use message::{GroupMessage, NewGroupMessage};
