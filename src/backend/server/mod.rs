//! Server Module
//!
//! Server setup: application state, configuration loading and
//! initialization.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and its FromRef implementations
//! ├── config.rs - Environment configuration and database loading
//! └── init.rs   - Application assembly
//! ```
//!
//! # Startup
//!
//! `main` loads [`AppConfig`](crate::shared::AppConfig) with
//! [`config::load_config`], then [`init::create_app`] connects the database
//! (falling back to the in-memory store), builds the external service
//! adapters, starts the fan-out worker and returns the router.

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use init::create_app;
pub use state::{AppState, ServiceHandles};
