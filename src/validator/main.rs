//! Standalone validator for feed configuration files.
//!
//! This tool validates JSON feed lists for the RSS bot, checking ids, URLs
//! and intervals, and can optionally fetch every feed to make sure it parses.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

// Import from the main crate
use rss_telegram_bot::config::{DEFAULT_POLL_INTERVAL_SECS, FeedSource, FeedsConfig};
use rss_telegram_bot::feed::{DEFAULT_FETCH_TIMEOUT, FeedFetcher};

/// Intervals below this are allowed but flagged.
const AGGRESSIVE_INTERVAL_SECS: u64 = 60;

/// Feed configuration validator.
#[derive(Parser, Debug)]
#[command(name = "validate_feeds")]
#[command(about = "Validates feed configuration files for the RSS Telegram bot")]
#[command(version)]
struct Args {
    /// Path to the JSON configuration file to validate.
    #[arg(short, long, default_value = "feeds.json")]
    file: String,

    /// Fetch every valid feed and report how many items it has.
    #[arg(long)]
    fetch: bool,

    /// Generate an example configuration file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show detailed information for each feed.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Handle example generation
    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    // Validate the configuration file
    validate_config(&args.file, args.fetch, args.verbose).await
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = FeedsConfig::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example configuration written to: {output_path}");
            println!("\nThe file contains {} example feeds.", example.len());
            println!("Feeds without 'chat_id' are posted to TG_CHAT_ID.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn validate_config(path: &str, fetch: bool, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    // Load the configuration
    let config = match FeedsConfig::load_from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.is_empty() {
        println!("✗ No feeds configured");
        return ExitCode::FAILURE;
    }

    let client = reqwest::Client::new();
    let results = config.validate_all();

    let mut errors = 0;
    let mut warnings = 0;

    for (feed, result) in config.feeds.iter().zip(&results) {
        if verbose {
            println!(
                "[{}] {} (every {}s{})",
                feed.id,
                truncate(&feed.url, 60),
                feed.interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
                feed.chat_id
                    .as_deref()
                    .map(|c| format!(", to {c}"))
                    .unwrap_or_default()
            );
        }

        match result {
            Ok(()) => {
                if feed
                    .interval_secs
                    .is_some_and(|secs| secs < AGGRESSIVE_INTERVAL_SECS)
                {
                    warnings += 1;
                    if verbose {
                        println!(
                            "  ⚠ Warning: polling more often than every {AGGRESSIVE_INTERVAL_SECS}s"
                        );
                    }
                } else if verbose {
                    println!("  ✓ OK");
                }

                if fetch && !check_fetch(&client, feed).await {
                    errors += 1;
                }
            }
            Err(e) => {
                errors += 1;
                println!("  ✗ Error: {e}");
            }
        }
    }

    println!();

    // Summary
    let total = config.len();
    let valid = total - errors.min(total);

    if errors == 0 {
        println!("✓ All {total} feeds are valid!");

        if warnings > 0 {
            println!("  ({warnings} warning(s) - very short poll intervals)");
        }

        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s) in {total} feeds");
        println!("  Valid: {valid}/{total}");

        ExitCode::FAILURE
    }
}

/// Fetches one feed and prints the result. Returns `false` on failure.
async fn check_fetch(client: &reqwest::Client, feed: &FeedSource) -> bool {
    let fetcher = FeedFetcher::new(client.clone(), &feed.url)
        .with_timeout(DEFAULT_FETCH_TIMEOUT.min(Duration::from_secs(15)));

    match fetcher.fetch_links().await {
        Ok(links) => {
            println!(
                "  ✓ Fetched {} item(s){}",
                links.len(),
                links
                    .first()
                    .map(|l| format!(", newest: {}", truncate(l, 50)))
                    .unwrap_or_default()
            );
            true
        }
        Err(e) => {
            println!("  ✗ Fetch failed: {e}");
            false
        }
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
