//! RSS Telegram Bot - Main Entry Point
//!
//! Polls the configured RSS feeds and posts every newly published item to
//! Telegram, oldest first.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rss_telegram_bot::config::{BotSettings, FeedSource, FeedsConfig, TelegramConfig};
use rss_telegram_bot::feed::{FeedFetcher, FeedState, PersistentState};
use rss_telegram_bot::scheduler::FeedPoller;
use rss_telegram_bot::telegram::{ChatNotifier, TelegramApi};

/// Telegram bot that forwards new RSS items to chats.
#[derive(Parser, Debug)]
#[command(name = "rssbot")]
#[command(about = "Forward new RSS feed items to Telegram")]
#[command(version)]
struct Args {
    /// Path to the feeds JSON configuration file (overrides FEEDS_PATH).
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate an example configuration file and exit.
    #[arg(long)]
    generate_config: bool,

    /// Run a single poll cycle for every feed and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Handle example config generation
    if args.generate_config {
        return generate_example_config();
    }

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(path) = &args.config {
        settings.feeds_path = path.into();
    }

    let feeds_config = load_feeds(&settings.feeds_path)?;
    feeds_config
        .validate()
        .context("Feed configuration validation failed")?;

    info!(
        "Loaded {} feed(s) (announce_existing: {})",
        feeds_config.len(),
        feeds_config.announce_existing
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("rssbot/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let api = Arc::new(TelegramApi::new(
        http.clone(),
        &tg_config,
        settings.min_send_interval(),
    ));

    api.get_me()
        .await
        .context("Failed to authorize with the Telegram Bot API")?;

    let pollers: Vec<_> = feeds_config
        .feeds
        .iter()
        .map(|feed| {
            build_poller(
                feed,
                &feeds_config,
                &settings,
                &tg_config,
                &http,
                Arc::clone(&api),
            )
        })
        .collect();

    if args.once {
        return run_once(pollers).await;
    }

    info!("Starting {} poller(s)...", pollers.len());
    let handles: Vec<_> = pollers.into_iter().map(FeedPoller::spawn).collect();

    info!("Bot is running. Use Ctrl+C to stop.");

    // Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down...");

    for handle in handles {
        handle.shutdown().await;
    }

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the feed list from file, falling back to `RSS_FEED_URL`.
fn load_feeds(path: &Path) -> Result<FeedsConfig> {
    if path.exists() {
        return FeedsConfig::load_from_file(path)
            .with_context(|| format!("Failed to load feeds from {}", path.display()));
    }

    if let Some(config) = FeedsConfig::from_env() {
        info!("{} not found, using RSS_FEED_URL", path.display());
        return Ok(config);
    }

    bail!(
        "Feeds file {} not found and RSS_FEED_URL is not set (use --generate-config for an example)",
        path.display()
    )
}

/// Builds the poller for one feed, restoring saved state if there is any.
fn build_poller(
    feed: &FeedSource,
    feeds_config: &FeedsConfig,
    settings: &BotSettings,
    tg_config: &TelegramConfig,
    http: &reqwest::Client,
    api: Arc<TelegramApi>,
) -> FeedPoller<ChatNotifier> {
    let state_path = settings.state_path(&feed.id);
    // A lost history must not replay the whole feed into the chat.
    let mut announce_existing = feeds_config.announce_existing;

    let saved = match state_path.as_deref() {
        Some(path) => PersistentState::load(path).unwrap_or_else(|e| {
            warn!(
                feed = %feed.id,
                path = %path.display(),
                "Unreadable state file, starting fresh without announcing existing items: {}",
                e
            );
            announce_existing = false;
            None
        }),
        None => None,
    };

    let state = match saved {
        Some(saved) => {
            info!(feed = %feed.id, "Restored state ({} known links)", saved.history.len());
            FeedState::from_persistent(&feed.url, &saved)
        }
        None => FeedState::new(&feed.url),
    }
    .with_history_limit(settings.history_limit);

    let fetcher =
        FeedFetcher::new(http.clone(), &feed.url).with_timeout(settings.fetch_timeout());

    let notifier =
        ChatNotifier::new(api, feed.chat_or(&tg_config.chat_id)).silent(settings.silent_messages);

    FeedPoller::new(&feed.id, fetcher, state, notifier)
        .with_poll_interval(feed.interval_or(settings.poll_interval()))
        .with_state_path(state_path)
        .with_announce_existing(announce_existing)
}

/// Runs one cycle per feed concurrently and reports the outcomes.
async fn run_once(pollers: Vec<FeedPoller<ChatNotifier>>) -> Result<()> {
    let mut cycles = JoinSet::new();
    for mut poller in pollers {
        cycles.spawn(async move {
            let outcome = poller.poll_once().await;
            (poller.id().to_owned(), outcome)
        });
    }

    let mut delivered = 0;
    while let Some(joined) = cycles.join_next().await {
        let (id, outcome) = joined.context("Poll cycle panicked")?;
        info!(feed = %id, "Cycle finished: {:?}", outcome);
        delivered += outcome.delivered();
    }

    info!("Single run complete, {} item(s) delivered", delivered);
    Ok(())
}

/// Generates an example configuration file.
fn generate_example_config() -> Result<()> {
    let example = FeedsConfig::example();
    example.save_to_file("feeds.example.json")?;

    println!("✓ Example configuration written to: feeds.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy feeds.example.json to feeds.json");
    println!("2. Edit the feed list to your liking");
    println!("3. Create a .env file with TG_BOT_TOKEN and TG_CHAT_ID");
    println!("4. Run: rssbot");

    Ok(())
}
