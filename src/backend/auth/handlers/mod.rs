//! Authentication Handlers Module
//!
//! # Handlers
//!
//! - **`register_or_login`** - POST /api/auth/register-or-login
//! - **`phone_exists`** - GET /api/auth/exists?phone=

/// Request and response types
pub mod types;

/// Register-or-login handler
pub mod register;

/// Phone lookup handler
pub mod exists;

pub use types::{AuthResponse, ExistsQuery, ExistsResponse, RegisterRequest};

pub use exists::phone_exists;
pub use register::register_or_login;
