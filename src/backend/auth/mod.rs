//! Authentication Module
//!
//! Phone sign-in happens with the identity provider on the device. The
//! backend verifies the provider's ID token once, maps it to a user record
//! and hands back its own session token for every later request.
//!
//! # Architecture
//!
//! - **`sessions`** - Session JWT issuing and validation
//! - **`handlers`** - HTTP handlers for authentication endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT token management
//! └── handlers/       - HTTP handlers
//!     ├── mod.rs      - Handler exports
//!     ├── types.rs    - Request/response types
//!     ├── register.rs - Register-or-login handler
//!     └── exists.rs   - Phone lookup handler
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register or login**: Client sends the provider ID token → token verified →
//!    user found by provider uid or created → session JWT returned
//! 2. **Authenticated requests**: `Authorization: Bearer <session>` is checked by
//!    the `AuthUser` extractor, which also loads the user
//!
//! # Security
//!
//! - Session tokens are HS256 JWTs signed with `JWT_SECRET`
//! - Tokens expire after `SESSION_TTL_DAYS` (7 by default)
//! - Any token problem is a 401 with no detail in the body

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{phone_exists, register_or_login};
pub use sessions::{Claims, SessionKeys};
