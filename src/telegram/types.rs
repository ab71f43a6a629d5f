//! Bot API request and response types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters of the `sendMessage` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
}

impl SendMessage {
    #[must_use]
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            disable_notification: false,
        }
    }

    /// Sends the message silently.
    #[must_use]
    pub const fn silent(mut self, silent: bool) -> Self {
        self.disable_notification = silent;
        self
    }
}

/// Parameters of the `getMe` method (it takes none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GetMe {}

/// Outbound Bot API requests, one variant per method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiRequest {
    SendMessage(SendMessage),
    GetMe(GetMe),
}

impl ApiRequest {
    /// Returns the Bot API method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "sendMessage",
            Self::GetMe(_) => "getMe",
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendMessage(msg) => write!(f, "{} to {}", self.name(), msg.chat_id),
            Self::GetMe(_) => write!(f, "{}", self.name()),
        }
    }
}

impl From<SendMessage> for ApiRequest {
    fn from(msg: SendMessage) -> Self {
        Self::SendMessage(msg)
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,

    #[serde(default)]
    pub result: Option<serde_json::Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub error_code: Option<u16>,

    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

impl ApiResponse {
    /// Response used when the server answered 2xx without a JSON envelope.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    /// Seconds to wait before retrying, if the server asked for it.
    #[must_use]
    pub fn retry_after(&self) -> Option<u32> {
        self.parameters.as_ref().and_then(|p| p.retry_after)
    }
}

/// Extra information attached to failed responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u32>,
}

/// The bot account, as returned by `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,

    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_send_message_payload() {
        let request = ApiRequest::from(SendMessage::new("@test_chat", "test"));
        assert_eq!(request.name(), "sendMessage");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"chat_id": "@test_chat", "text": "test"})
        );
    }

    #[test]
    fn test_silent_message_payload() {
        let msg = SendMessage::new("@c", "t").silent(true);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"chat_id": "@c", "text": "t", "disable_notification": true})
        );
    }

    #[test]
    fn test_request_display() {
        let request = ApiRequest::from(SendMessage::new("@news", "secret text"));
        assert_eq!(request.to_string(), "sendMessage to @news");
        assert_eq!(ApiRequest::GetMe(GetMe {}).to_string(), "getMe");
    }

    #[test]
    fn test_get_me_payload_is_empty_object() {
        let request = ApiRequest::GetMe(GetMe {});
        assert_eq!(request.name(), "getMe");
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({}));
    }

    #[test]
    fn test_parse_flood_response() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 7","parameters":{"retry_after":7}}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.retry_after(), Some(7));
    }
}
