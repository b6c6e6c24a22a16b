//! SMS delivery for invite links

use async_trait::async_trait;

use super::{check_status, ServiceError};
use crate::shared::config::TwilioConfig;

const SERVICE: &str = "SMS";
const TWILIO_API: &str = "https://api.twilio.com";

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), ServiceError>;
}

/// Twilio Messages API sender
pub struct TwilioSmsSender {
    client: reqwest::Client,
    config: TwilioConfig,
    base_url: String,
}

impl TwilioSmsSender {
    pub fn new(client: reqwest::Client, config: TwilioConfig) -> Self {
        Self {
            client,
            config,
            base_url: TWILIO_API.to_string(),
        }
    }

    /// Point the sender at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), ServiceError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        );
        let params = [("To", to), ("From", self.config.from_number.as_str()), ("Body", body)];

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::http(SERVICE, e))?;
        check_status(SERVICE, response).await?;
        tracing::info!("Invite SMS sent to {}", to);
        Ok(())
    }
}

/// Logs instead of sending; used when Twilio is not configured
pub struct NoopSmsSender;

#[async_trait]
impl SmsSender for NoopSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), ServiceError> {
        tracing::info!("SMS disabled, would send to {}: {}", to, body);
        Ok(())
    }
}
