//! Error types for the listener.
//!
//! Config loading has its own [`ConfigError`] so `main` is forced to deal
//! with a missing or malformed config before a listener can be built.
//! Everything else funnels into [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the outlets config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("error parsing JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The upstream answered with a body that is not JSON at all.
    #[error("upstream returned invalid JSON from {url}: {source} (body: {preview})")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
        preview: String,
    },

    /// The upstream answered with JSON that has no `articles` array, which is
    /// what NewsAPI does for quota exhaustion, bad keys and the like.
    #[error(
        "upstream response from {url} has no articles (HTTP {http_status}, status: {}, code: {}, message: {})",
        .status.as_deref().unwrap_or("-"),
        .code.as_deref().unwrap_or("-"),
        .message.as_deref().unwrap_or("-")
    )]
    MissingArticles {
        url: String,
        http_status: u16,
        status: Option<String>,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_articles_message_includes_upstream_fields() {
        let err = Error::MissingArticles {
            url: "https://newsapi.org/v2/everything?apiKey=REDACTED".to_string(),
            http_status: 429,
            status: Some("error".to_string()),
            code: Some("rateLimited".to_string()),
            message: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 429"));
        assert!(msg.contains("code: rateLimited"));
        assert!(msg.contains("message: -"));
    }

    #[test]
    fn test_config_error_wraps_transparently() {
        let err: Error = ConfigError::NotFound {
            path: PathBuf::from("./config.json"),
        }
        .into();
        assert_eq!(err.to_string(), "config file not found at ./config.json");
    }
}
