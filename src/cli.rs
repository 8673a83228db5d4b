//! Command-line interface definitions for the news listener.
//!
//! Every option can come from a flag or an environment variable (a `.env`
//! file is loaded first). Defaults reproduce the stock deployment, so a bare
//! `news_listener` with `NEWS_API_KEY` set is enough.

use crate::api::DEFAULT_BASE_URL;
use clap::Parser;
use std::path::PathBuf;

/// Dump today's NewsAPI headlines and keyword matches to JSON.
///
/// # Examples
///
/// ```sh
/// # Stock run: ./config.json in, /data/dump_*.json out
/// NEWS_API_KEY=... news_listener
///
/// # Local run with retries
/// news_listener -c ./outlets.json --headlines-output ./out/h.json \
///     --keywords-output ./out/k.json --retries 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the outlets config file
    #[arg(short, long, env = "NEWS_LISTENER_CONFIG", default_value = "./config.json")]
    pub config: PathBuf,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Output path for the headlines dump
    #[arg(
        long,
        env = "NEWS_LISTENER_HEADLINES_OUTPUT",
        default_value = "/data/dump_headlines.json"
    )]
    pub headlines_output: PathBuf,

    /// Output path for the keyword dump
    #[arg(
        long,
        env = "NEWS_LISTENER_KEYWORDS_OUTPUT",
        default_value = "/data/dump_categories.json"
    )]
    pub keywords_output: PathBuf,

    /// NewsAPI "everything" endpoint
    #[arg(long, env = "NEWS_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Retries per request after the first attempt (0 disables retrying)
    #[arg(long, env = "NEWS_LISTENER_RETRIES", default_value_t = 0)]
    pub retries: usize,

    /// Per-request timeout in seconds (unbounded when unset)
    #[arg(long, env = "NEWS_LISTENER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}
