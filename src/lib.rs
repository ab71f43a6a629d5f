//! RSS Telegram Bot Library
//!
//! Polls RSS feeds and forwards newly published items to Telegram chats.
//!
//! This crate provides the core functionality for:
//! - Loading and validating the feed list and bot settings
//! - Fetching RSS feeds and detecting new items in publication order
//! - Sending items through the Telegram Bot API
//! - Running one poll loop per feed

pub mod config;
pub mod feed;
pub mod scheduler;
pub mod telegram;
