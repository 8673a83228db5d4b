//! # News Listener
//!
//! Queries the NewsAPI "everything" endpoint for a configured set of news
//! outlets and a fixed set of topic keywords, then dumps the raw results as
//! two JSON files.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... news_listener -c ./config.json
//! ```
//!
//! ## Flow
//!
//! 1. **Config**: Load the outlet list from the config file
//! 2. **Pre-flight**: Make sure both output directories are writable
//! 3. **Headlines**: One request per outlet, written to the headlines dump
//! 4. **Keywords**: One request per keyword across all outlets, written to
//!    the categories dump

use clap::Parser;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod listener;
mod models;
mod outputs;
mod utils;

use api::{NewsApiClient, RetryFetch};
use cli::Cli;
use listener::NewsListener;
use outputs::json::write_envelope;
use utils::ensure_parent_writable;

#[tokio::main]
#[instrument]
async fn main() -> error::Result<()> {
    // .env may carry RUST_LOG, so load it before the subscriber
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_listener starting up");

    if let Err(e) = dotenv {
        debug!(error = %e, "No .env file loaded");
    }

    let args = Cli::parse();
    debug!(?args.config, ?args.headlines_output, ?args.keywords_output, "Parsed CLI arguments");

    let config = config::load_config(&args.config)?;

    // Fail before spending any API quota
    for path in [&args.headlines_output, &args.keywords_output] {
        if let Err(e) = ensure_parent_writable(path).await {
            error!(
                path = %path.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let client = NewsApiClient::new(
        args.base_url.as_str(),
        args.api_key.as_str(),
        args.timeout_secs.map(Duration::from_secs),
    )?;
    let source = RetryFetch::new(client, args.retries, Duration::from_secs(1));
    let listener = NewsListener::new(source, config.outlets);
    info!(
        date = listener.date(),
        outlets = listener.domains().len(),
        keywords = listener.keywords().len(),
        "Listener ready"
    );

    let headlines = listener.get_headlines().await?;
    write_envelope(&headlines, &args.headlines_output).await?;

    let keywords = listener.get_keywords().await?;
    write_envelope(&keywords, &args.keywords_output).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        headlines = headlines.articles.len(),
        keyword_articles = keywords.articles.article_count(),
        "Execution complete"
    );

    Ok(())
}
