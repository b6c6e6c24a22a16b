//! Application configuration module
//!
//! Provides the configuration consumed by the server. Values are assembled
//! through [`AppConfigBuilder`] (normally from environment variables, see
//! `backend::server::config`) and checked with [`AppConfig::validate`].

use std::path::PathBuf;
use thiserror::Error;

/// Default validity window of an invite token, in days
pub const DEFAULT_INVITE_TTL_DAYS: i64 = 7;

/// Default validity window of a session token, in days
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Firebase project settings used to verify phone sign-in tokens
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub jwks_url: String,
}

/// FCM HTTP v1 settings
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    pub access_token: String,
    pub base_url: String,
}

/// Twilio SMS settings
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Postgres connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    /// HMAC secret for session and invite tokens
    pub jwt_secret: String,
    /// Public base URL of the client app, used to build invite links
    pub app_url: String,
    /// Public base URL of this server, used to build media URLs
    pub public_base_url: String,
    /// Directory uploaded media is written to
    pub upload_dir: PathBuf,
    pub invite_ttl_days: i64,
    pub session_ttl_days: i64,
    pub firebase: Option<FirebaseConfig>,
    pub fcm: Option<FcmConfig>,
    pub twilio: Option<TwilioConfig>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.invite_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "INVITE_TTL_DAYS",
                value: self.invite_ttl_days.to_string(),
            });
        }
        if self.session_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_DAYS",
                value: self.session_ttl_days.to_string(),
            });
        }
        for url in [&self.app_url, &self.public_base_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    app_url: Option<String>,
    public_base_url: Option<String>,
    upload_dir: Option<PathBuf>,
    invite_ttl_days: Option<i64>,
    session_ttl_days: Option<i64>,
    firebase: Option<FirebaseConfig>,
    fcm: Option<FcmConfig>,
    twilio: Option<TwilioConfig>,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    pub fn invite_ttl_days(mut self, days: i64) -> Self {
        self.invite_ttl_days = Some(days);
        self
    }

    pub fn session_ttl_days(mut self, days: i64) -> Self {
        self.session_ttl_days = Some(days);
        self
    }

    pub fn firebase(mut self, firebase: FirebaseConfig) -> Self {
        self.firebase = Some(firebase);
        self
    }

    pub fn fcm(mut self, fcm: FcmConfig) -> Self {
        self.fcm = Some(fcm);
        self
    }

    pub fn twilio(mut self, twilio: TwilioConfig) -> Self {
        self.twilio = Some(twilio);
        self
    }

    /// Build the configuration
    ///
    /// Trailing slashes are stripped from URLs so links can be joined with `/`.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let jwt_secret = self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?;
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let public_base_url = self
            .public_base_url
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let config = AppConfig {
            port,
            database_url: self.database_url,
            jwt_secret,
            app_url: trim_url(self.app_url.unwrap_or_else(|| public_base_url.clone())),
            public_base_url: trim_url(public_base_url),
            upload_dir: self.upload_dir.unwrap_or_else(|| PathBuf::from("uploads")),
            invite_ttl_days: self.invite_ttl_days.unwrap_or(DEFAULT_INVITE_TTL_DAYS),
            session_ttl_days: self.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS),
            firebase: self.firebase,
            fcm: self.fcm,
            twilio: self.twilio,
        };
        config.validate()?;
        Ok(config)
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
