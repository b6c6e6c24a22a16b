/**
 * Server Configuration
 *
 * Loads [`AppConfig`] from environment variables and connects the optional
 * PostgreSQL database.
 *
 * # Error Handling
 *
 * Missing collaborator settings (Firebase, FCM, Twilio) leave that section
 * unset; the server runs with a no-op adapter instead. Database problems
 * are logged and the server continues on the in-memory store.
 */

use sqlx::PgPool;
use std::env;

use crate::shared::config::{
    AppConfig, ConfigError, FcmConfig, FirebaseConfig, TwilioConfig,
};

const DEV_JWT_SECRET: &str = "spamit-dev-secret-change-me";
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Database configuration result
pub type DatabaseConfig = Option<PgPool>;

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match var(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}

/// Load configuration from the environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut builder = AppConfig::builder();

    if let Some(port) = parse_var::<u16>("SERVER_PORT")?.or(parse_var::<u16>("PORT")?) {
        builder = builder.port(port);
    }
    if let Some(url) = var("DATABASE_URL") {
        builder = builder.database_url(url);
    }

    match var("JWT_SECRET") {
        Some(secret) => builder = builder.jwt_secret(secret),
        None if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set. Using the development secret.");
            builder = builder.jwt_secret(DEV_JWT_SECRET);
        }
        None => return Err(ConfigError::MissingValue("JWT_SECRET")),
    }

    if let Some(url) = var("APP_URL") {
        builder = builder.app_url(url);
    }
    if let Some(url) = var("PUBLIC_BASE_URL") {
        builder = builder.public_base_url(url);
    }
    if let Some(dir) = var("UPLOAD_DIR") {
        builder = builder.upload_dir(dir);
    }
    if let Some(days) = parse_var::<i64>("INVITE_TTL_DAYS")? {
        builder = builder.invite_ttl_days(days);
    }
    if let Some(days) = parse_var::<i64>("SESSION_TTL_DAYS")? {
        builder = builder.session_ttl_days(days);
    }

    if let Some(project_id) = var("FIREBASE_PROJECT_ID") {
        builder = builder.firebase(FirebaseConfig {
            project_id,
            jwks_url: var("FIREBASE_JWKS_URL").unwrap_or_else(|| FIREBASE_JWKS_URL.to_string()),
        });
    }
    if let (Some(project_id), Some(access_token)) = (var("FCM_PROJECT_ID"), var("FCM_ACCESS_TOKEN")) {
        builder = builder.fcm(FcmConfig {
            project_id,
            access_token,
            base_url: var("FCM_BASE_URL").unwrap_or_else(|| FCM_BASE_URL.to_string()),
        });
    }
    if let (Some(account_sid), Some(auth_token), Some(from_number)) =
        (var("TWILIO_SID"), var("TWILIO_TOKEN"), var("TWILIO_PHONE"))
    {
        builder = builder.twilio(TwilioConfig {
            account_sid,
            auth_token,
            from_number,
        });
    }

    builder.build()
}

/// Load and initialize database connection pool
///
/// 1. Connects to `database_url` if one is configured
/// 2. Runs the migrations in `migrations/`
///
/// Returns `None` when no URL is set or the connection fails; the caller
/// then falls back to the in-memory store.
pub async fn load_database(database_url: Option<&str>) -> DatabaseConfig {
    let database_url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DATABASE_URL not set. Using the in-memory store; data will not persist.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory store.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
