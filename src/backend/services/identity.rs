//! Phone sign-in token verification
//!
//! Clients sign in with Firebase phone auth and send the resulting ID token
//! to `register-or-login`. [`FirebaseIdentityVerifier`] checks it against
//! Google's published signing keys, which are cached for an hour.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{check_status, ServiceError};
use crate::shared::config::FirebaseConfig;

const SERVICE: &str = "Identity";
const JWKS_TTL: Duration = Duration::from_secs(60 * 60);

/// Identity established by a verified sign-in token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider-side user id
    pub uid: String,
    pub phone_number: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies Firebase ID tokens (RS256, audience = project id)
pub struct FirebaseIdentityVerifier {
    client: reqwest::Client,
    config: FirebaseConfig,
    keys: RwLock<Option<(Instant, JwkSet)>>,
}

impl FirebaseIdentityVerifier {
    pub fn new(client: reqwest::Client, config: FirebaseConfig) -> Self {
        Self {
            client,
            config,
            keys: RwLock::new(None),
        }
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.config.project_id)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, ServiceError> {
        tracing::debug!("Fetching signing keys from {}", self.config.jwks_url);
        let response = self
            .client
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| ServiceError::http(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ServiceError::http(SERVICE, e))
    }

    /// Find the key for `kid`, refreshing the cache when stale or missing it
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, ServiceError> {
        {
            let cached = self.keys.read().await;
            if let Some((fetched_at, set)) = cached.as_ref() {
                if fetched_at.elapsed() < JWKS_TTL {
                    if let Some(jwk) = set.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| ServiceError::invalid(SERVICE, e.to_string()));
                    }
                }
            }
        }

        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| ServiceError::invalid(SERVICE, e.to_string()))?;
        *self.keys.write().await = Some((Instant::now(), set));
        key.ok_or_else(|| ServiceError::invalid(SERVICE, format!("unknown signing key {}", kid)))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, ServiceError> {
        let header = decode_header(id_token).map_err(|e| ServiceError::invalid(SERVICE, e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| ServiceError::invalid(SERVICE, "token has no key id"))?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);

        let data = decode::<FirebaseClaims>(id_token, &key, &validation)
            .map_err(|e| ServiceError::invalid(SERVICE, e.to_string()))?;

        Ok(VerifiedIdentity {
            uid: data.claims.sub,
            phone_number: data.claims.phone_number,
            name: data.claims.name,
        })
    }
}

/// Used when no identity provider is configured; rejects every token
pub struct UnconfiguredIdentityVerifier;

#[async_trait]
impl IdentityVerifier for UnconfiguredIdentityVerifier {
    async fn verify(&self, _id_token: &str) -> Result<VerifiedIdentity, ServiceError> {
        Err(ServiceError::NotConfigured { service: SERVICE })
    }
}
