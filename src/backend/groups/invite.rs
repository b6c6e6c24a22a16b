/**
 * Invite Tokens
 *
 * Stateless group admission tokens: an HS256 JWT carrying the group id, the
 * inviting user and its validity window. Nothing is stored, so a token stays
 * valid until it expires regardless of later membership changes.
 *
 * Expiry is checked here against an explicit clock rather than inside
 * `jsonwebtoken`, which lets callers (and tests) pick the instant a token is
 * redeemed at.
 */

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// `purpose` claim marking a token as a group invite
const INVITE_PURPOSE: &str = "group_invite";

/// Invite token errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InviteError {
    /// Signature is valid but the token is past its expiry
    #[error("invite token expired")]
    Expired,

    /// Bad signature, malformed payload or wrong purpose
    #[error("invalid invite token: {0}")]
    Invalid(String),

    #[error("failed to sign invite token: {0}")]
    Encode(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteClaims {
    group_id: Uuid,
    inviter: Uuid,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// What a valid invite token grants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteGrant {
    pub group_id: Uuid,
    pub inviter_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and redeems invite tokens
#[derive(Clone)]
pub struct InviteCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl InviteCodec {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, group_id: Uuid, inviter_id: Uuid) -> Result<String, InviteError> {
        self.issue_at(group_id, inviter_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, group_id: Uuid, inviter_id: Uuid, now: DateTime<Utc>) -> Result<String, InviteError> {
        let claims = InviteClaims {
            group_id,
            inviter: inviter_id,
            purpose: INVITE_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| InviteError::Encode(e.to_string()))
    }

    pub fn redeem(&self, token: &str) -> Result<InviteGrant, InviteError> {
        self.redeem_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn redeem_at(&self, token: &str, now: DateTime<Utc>) -> Result<InviteGrant, InviteError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<InviteClaims>(token, &self.decoding, &validation)
            .map_err(|e| InviteError::Invalid(e.to_string()))?
            .claims;

        if claims.purpose != INVITE_PURPOSE {
            return Err(InviteError::Invalid(format!("unexpected purpose '{}'", claims.purpose)));
        }
        if now.timestamp() >= claims.exp {
            return Err(InviteError::Expired);
        }

        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or_else(|| InviteError::Invalid("iat out of range".into()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| InviteError::Invalid("exp out of range".into()))?;

        Ok(InviteGrant {
            group_id: claims.group_id,
            inviter_id: claims.inviter,
            issued_at,
            expires_at,
        })
    }
}
