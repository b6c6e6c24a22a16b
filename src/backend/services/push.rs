//! Push notification delivery
//!
//! [`FcmPushSender`] posts one HTTP v1 `messages:send` request per device
//! token; multicast sends them concurrently and reports how many were
//! accepted.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::json;
use std::collections::BTreeMap;

use super::{check_status, ServiceError};
use crate::shared::config::FcmConfig;

const SERVICE: &str = "Push";

/// A push payload; `data` values are strings as FCM requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver to a single device
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), ServiceError>;

    /// Deliver to many devices; returns how many deliveries succeeded
    ///
    /// Fails only when every delivery failed.
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> Result<usize, ServiceError> {
        if tokens.is_empty() {
            return Ok(0);
        }
        let results = join_all(tokens.iter().map(|token| self.send(token, message))).await;
        let mut delivered = 0;
        let mut last_error = None;
        for result in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!("Push delivery failed: {}", e);
                    last_error = Some(e);
                }
            }
        }
        match (delivered, last_error) {
            (0, Some(e)) => Err(e),
            _ => Ok(delivered),
        }
    }
}

/// FCM HTTP v1 sender
pub struct FcmPushSender {
    client: reqwest::Client,
    config: FcmConfig,
}

impl FcmPushSender {
    pub fn new(client: reqwest::Client, config: FcmConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id
        )
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), ServiceError> {
        let payload = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::http(SERVICE, e))?;
        check_status(SERVICE, response).await?;
        Ok(())
    }
}

/// Drops every message; used when FCM is not configured
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn send(&self, _token: &str, message: &PushMessage) -> Result<(), ServiceError> {
        tracing::debug!("Push disabled, dropping '{}'", message.title);
        Ok(())
    }
}
