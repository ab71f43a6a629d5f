//! Announces feed items in a Telegram chat.

use std::sync::Arc;

use super::types::SendMessage;
use super::{TelegramApi, TelegramError};
use crate::feed::FeedItem;
use crate::scheduler::Notifier;

/// Posts feed items to one chat through a shared [`TelegramApi`].
#[derive(Debug, Clone)]
pub struct ChatNotifier {
    api: Arc<TelegramApi>,
    chat_id: String,
    silent: bool,
}

impl ChatNotifier {
    #[must_use]
    pub fn new(api: Arc<TelegramApi>, chat_id: impl Into<String>) -> Self {
        Self {
            api,
            chat_id: chat_id.into(),
            silent: false,
        }
    }

    /// Sends messages without a notification sound.
    #[must_use]
    pub const fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

impl Notifier for ChatNotifier {
    type Error = TelegramError;

    async fn publish(&self, item: &FeedItem) -> Result<(), TelegramError> {
        let message = SendMessage::new(&self.chat_id, format_message(item)).silent(self.silent);
        self.api.send_message(message).await
    }
}

/// Plain-text message for an item: the title on its own line, then the link.
#[must_use]
pub fn format_message(item: &FeedItem) -> String {
    match &item.title {
        Some(title) => format!("{title}\n{}", item.link),
        None => item.link.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::TelegramConfig;

    #[test]
    fn test_format_with_title() {
        let item = FeedItem::new("https://example.com/1").with_title("Hello");
        assert_eq!(format_message(&item), "Hello\nhttps://example.com/1");
    }

    #[test]
    fn test_format_link_only() {
        let item = FeedItem::new("https://example.com/1");
        assert_eq!(format_message(&item), "https://example.com/1");
    }

    #[tokio::test]
    async fn test_publish_posts_to_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottoken/sendMessage"))
            .and(body_json(json!({
                "chat_id": "@news",
                "text": "Title\nhttps://example.com/a",
                "disable_notification": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let config = TelegramConfig::new("token", "@default").with_api_url(server.uri());
        let api = Arc::new(TelegramApi::new(reqwest::Client::new(), &config, Duration::ZERO));
        let notifier = ChatNotifier::new(api, "@news").silent(true);

        let item = FeedItem::new("https://example.com/a").with_title("Title");
        notifier.publish(&item).await.unwrap();
    }
}
