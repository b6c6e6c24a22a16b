//! Notifications
//!
//! - **`fanout`** - Turns a new post or comment into per-recipient records
//!   and push notices, absorbing every failure
//! - **`dispatcher`** - Background worker that runs fan-out jobs off the
//!   request path
//! - **`handlers`** - `/api/notifications` HTTP handlers

pub mod fanout;
pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{spawn_fanout_worker, FanoutHandle, FANOUT_QUEUE_CAPACITY};
pub use fanout::{truncate_message, FanoutEngine, FanoutJob, FanoutReport};
