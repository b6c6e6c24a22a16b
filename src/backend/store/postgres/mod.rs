//! Postgres store
//!
//! Implements the store traits with `sqlx` against the schema in
//! `migrations/`. Queries are split per aggregate like the rest of the
//! backend's database modules.

use sqlx::PgPool;

use super::StoreError;

mod users;
mod groups;
mod posts;
mod notifications;
mod messages;

/// Store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map unique violations on the users table to `StoreError::Conflict`
pub(crate) fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            let field = if constraint.contains("username") {
                "username"
            } else if constraint.contains("phone") {
                "phone_number"
            } else if constraint.contains("external_uid") {
                "external_uid"
            } else {
                "value"
            };
            return StoreError::Conflict { field };
        }
    }
    StoreError::Database(err)
}
