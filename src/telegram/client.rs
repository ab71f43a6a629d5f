//! Telegram Bot API client.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::RateLimiter;
use super::types::{ApiRequest, ApiResponse, BotUser, GetMe, SendMessage};
use crate::config::TelegramConfig;

/// Retry delay assumed when a 429 carries no `retry_after`.
const DEFAULT_FLOOD_WAIT_SECS: u32 = 5;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Client for the Telegram Bot API.
pub struct TelegramApi {
    client: reqwest::Client,
    api_url: String,
    token: SecretString,
    rate_limiter: RateLimiter,
}

impl TelegramApi {
    /// Creates a client from configuration, sharing the given HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &TelegramConfig, min_send_interval: Duration) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token: SecretString::from(config.bot_token.expose_secret().to_owned()),
            rate_limiter: RateLimiter::new(min_send_interval),
        }
    }

    fn method_url(&self, command: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), command)
    }

    /// Calls a Bot API method with a JSON payload.
    ///
    /// A 2xx answer without a JSON envelope is treated as success.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::FloodWait`] on 429, [`TelegramError::Api`]
    /// on other failures reported by the server, and
    /// [`TelegramError::Http`] on transport errors.
    pub async fn call<P>(&self, command: &str, params: &P) -> Result<ApiResponse, TelegramError>
    where
        P: Serialize + ?Sized,
    {
        debug!("Calling Telegram method {}", command);

        let response = self
            .client
            .post(self.method_url(command))
            .json(params)
            .send()
            .await
            // reqwest errors carry the URL, which contains the token.
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if status.is_success() {
            return match parsed {
                Some(envelope) if !envelope.ok => Err(TelegramError::Api {
                    code: envelope.error_code.unwrap_or(status.as_u16()),
                    description: envelope.description.unwrap_or_default(),
                }),
                Some(envelope) => Ok(envelope),
                None => Ok(ApiResponse::accepted()),
            };
        }

        let retry_after = parsed.as_ref().and_then(ApiResponse::retry_after);
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || retry_after.is_some() {
            return Err(TelegramError::FloodWait(
                retry_after.unwrap_or(DEFAULT_FLOOD_WAIT_SECS),
            ));
        }

        let description = parsed
            .and_then(|envelope| envelope.description)
            .unwrap_or_else(|| truncate_for_log(&body, 200));

        Err(TelegramError::Api {
            code: status.as_u16(),
            description,
        })
    }

    /// Executes a typed request.
    ///
    /// # Errors
    ///
    /// See [`TelegramApi::call`].
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TelegramError> {
        debug!("Executing {}", request);
        self.call(request.name(), request).await
    }

    /// Returns the bot account; used to check the token at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the result is malformed.
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        let response = self.execute(&ApiRequest::GetMe(GetMe {})).await?;
        let result = response
            .result
            .ok_or_else(|| TelegramError::InvalidResponse("getMe returned no result".to_owned()))?;

        let user: BotUser = serde_json::from_value(result)
            .map_err(|e| TelegramError::InvalidResponse(e.to_string()))?;

        info!(
            "Authorized as bot {} (@{})",
            user.first_name,
            user.username.as_deref().unwrap_or("?")
        );
        Ok(user)
    }

    /// Sends a text message, respecting the send rate limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the message was not accepted.
    pub async fn send_message(&self, message: SendMessage) -> Result<(), TelegramError> {
        let waited = self.rate_limiter.wait_and_acquire().await;
        if !waited.is_zero() {
            debug!("Waited {:?} for rate limit", waited);
        }

        debug!(
            "Sending to {}: \"{}\"",
            message.chat_id,
            truncate_for_log(&message.text, 40)
        );

        match self.execute(&ApiRequest::SendMessage(message)).await {
            Ok(_) => Ok(()),
            Err(TelegramError::FloodWait(seconds)) => {
                self.rate_limiter.handle_flood_wait(seconds).await;
                Err(TelegramError::FloodWait(seconds))
            }
            Err(e) => {
                warn!("sendMessage failed: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApi")
            .field("api_url", &self.api_url)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
