//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Router assembly, middleware and operational routes
//! └── api_routes.rs - Feature endpoints under /api
//! ```
//!
//! # Route Organization
//!
//! 1. **Operational** - `/api/health`, `/api`
//! 2. **API Routes** - auth, users, groups, group messages, posts, notifications
//! 3. **Uploads** - `/uploads` static media
//! 4. **Fallback** - JSON 404 under `/api`, plain 404 elsewhere

/// Main router creation
pub mod router;

/// API endpoint configuration
pub mod api_routes;

pub use router::create_router;
