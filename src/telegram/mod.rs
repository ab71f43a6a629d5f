//! Telegram Bot API module.
//!
//! Provides a small client for the Bot API, a send rate limiter, and the
//! [`ChatNotifier`] that announces feed items in a chat.

mod client;
mod notifier;
mod rate_limiter;
mod types;

pub use client::{TelegramApi, TelegramError};
pub use notifier::{ChatNotifier, format_message};
pub use rate_limiter::RateLimiter;
pub use types::{ApiRequest, ApiResponse, BotUser, GetMe, ResponseParameters, SendMessage};
