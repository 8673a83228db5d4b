//! NewsAPI "everything" endpoint client with optional retry logic.
//!
//! # Architecture
//!
//! - [`FetchArticles`]: core trait, one query in, the response's `articles` out
//! - [`NewsApiClient`]: the real HTTP implementation on top of `reqwest`
//! - [`RetryFetch`]: decorator that adds exponential backoff to any
//!   [`FetchArticles`] implementation
//!
//! # Retry Strategy
//!
//! Off by default (zero retries). When enabled:
//! - Exponential backoff starting at the base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to every delay

use crate::error::{Error, Result};
use crate::models::Article;
use crate::utils::{redact_api_key, truncate_for_log};
use rand::{Rng, rng};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Default NewsAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2/everything";

/// One request against the "everything" endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EverythingQuery {
    /// Earliest publication date, as `YY-MM-DD`.
    pub from: String,
    /// One domain, or several joined by `,`.
    pub domains: String,
    /// Optional keyword filter.
    pub q: Option<String>,
}

impl EverythingQuery {
    /// Build the full request URL. Parameter order is `from`, `apiKey`,
    /// `domains`, then `q`.
    pub fn to_url(&self, base_url: &str, api_key: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("from", &self.from)
                .append_pair("apiKey", api_key)
                .append_pair("domains", &self.domains);
            if let Some(q) = &self.q {
                pairs.append_pair("q", q);
            }
        }
        Ok(url)
    }
}

/// Trait for fetching articles from the upstream.
///
/// The listener only depends on this, so tests drive it with a stub and
/// [`RetryFetch`] can wrap any implementation.
pub trait FetchArticles {
    /// Issue one request and return the response's `articles` array.
    async fn fetch(&self, query: &EverythingQuery) -> Result<Vec<Article>>;
}

/// Shape of a NewsAPI response body. Error bodies carry `status`, `code`
/// and `message` but no `articles`.
#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: Option<String>,
    code: Option<String>,
    message: Option<String>,
    articles: Option<Vec<Article>>,
}

/// Turn a raw response body into its articles, or a descriptive error.
fn parse_articles(body: &str, http_status: u16, redacted_url: &str) -> Result<Vec<Article>> {
    let response: EverythingResponse = serde_json::from_str(body).map_err(|e| Error::Json {
        url: redacted_url.to_string(),
        source: e,
        preview: truncate_for_log(body, 300),
    })?;

    match response.articles {
        Some(articles) => Ok(articles),
        None => Err(Error::MissingArticles {
            url: redacted_url.to_string(),
            http_status,
            status: response.status,
            code: response.code,
            message: response.message,
        }),
    }
}

/// `reqwest`-backed NewsAPI client.
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    /// Create a client. `timeout` of `None` keeps reqwest's default, which
    /// waits indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<StdDuration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl FetchArticles for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(domains = %query.domains, q = ?query.q))]
    async fn fetch(&self, query: &EverythingQuery) -> Result<Vec<Article>> {
        let url = query.to_url(&self.base_url, &self.api_key)?;
        let redacted = redact_api_key(&url);
        debug!(url = %redacted, "GET");

        let t0 = Instant::now();
        // reqwest errors carry the request URL, key included
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        let dt = t0.elapsed();

        match parse_articles(&body, http_status.as_u16(), &redacted) {
            Ok(articles) => {
                debug!(
                    elapsed_ms = dt.as_millis(),
                    status = http_status.as_u16(),
                    count = articles.len(),
                    "Fetched articles"
                );
                Ok(articles)
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis(), error = %e, "Upstream request failed");
                Err(e)
            }
        }
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchArticles`]
/// implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    /// Retries after the first attempt; zero means a single attempt.
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchArticles,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift);
        delay.min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchArticles for RetryFetch<T>
where
    T: FetchArticles,
{
    #[instrument(level = "info", skip_all)]
    async fn fetch(&self, query: &EverythingQuery) -> Result<Vec<Article>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(query).await {
                Ok(articles) => {
                    if attempt > 0 {
                        info!(attempt, "fetch() succeeded after retry");
                    }
                    return Ok(articles);
                }
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_dt.as_millis(),
                                error = %e,
                                "fetch() exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.delay_for(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn query(domains: &str, q: Option<&str>) -> EverythingQuery {
        EverythingQuery {
            from: "26-10-18".to_string(),
            domains: domains.to_string(),
            q: q.map(str::to_string),
        }
    }

    #[test]
    fn test_to_url_parameter_order() {
        let url = query("bbc.co.uk", None)
            .to_url(DEFAULT_BASE_URL, "secret")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://newsapi.org/v2/everything?from=26-10-18&apiKey=secret&domains=bbc.co.uk"
        );
    }

    #[test]
    fn test_to_url_with_keyword_and_joined_domains() {
        let url = query("bbc.co.uk,cnn.com", Some("sports"))
            .to_url(DEFAULT_BASE_URL, "secret")
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("from".to_string(), "26-10-18".to_string()),
                ("apiKey".to_string(), "secret".to_string()),
                ("domains".to_string(), "bbc.co.uk,cnn.com".to_string()),
                ("q".to_string(), "sports".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_url_rejects_bad_base() {
        assert!(matches!(
            query("bbc.co.uk", None).to_url("not a url", "secret"),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_parse_articles_ok() {
        let body = r#"{"status":"ok","totalResults":1,"articles":[{"title":"A"}]}"#;
        let articles = parse_articles(body, 200, "u").unwrap();
        assert_eq!(articles, vec![json!({"title": "A"})]);
    }

    #[test]
    fn test_parse_articles_error_body() {
        let body = r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#;
        match parse_articles(body, 429, "u") {
            Err(Error::MissingArticles {
                http_status,
                code,
                message,
                ..
            }) => {
                assert_eq!(http_status, 429);
                assert_eq!(code.as_deref(), Some("rateLimited"));
                assert_eq!(message.as_deref(), Some("Too many requests"));
            }
            other => panic!("expected MissingArticles, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_articles_not_json() {
        assert!(matches!(
            parse_articles("<html>bad gateway</html>", 502, "u"),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn test_client_debug_hides_key() {
        let client = NewsApiClient::new(DEFAULT_BASE_URL, "secret", None).unwrap();
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("secret"));
    }

    /// Serve one canned HTTP response on a local port. The join handle yields
    /// the raw request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v2/everything", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (base_url, handle)
    }

    #[tokio::test]
    async fn test_client_fetches_articles() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"status":"ok","totalResults":2,"articles":[{"title":"A"},{"title":"Ü"}]}"#,
        )
        .await;
        let client = NewsApiClient::new(base_url, "secret", None).unwrap();

        let articles = client.fetch(&query("bbc.co.uk", Some("sports"))).await.unwrap();
        assert_eq!(articles, vec![json!({"title": "A"}), json!({"title": "Ü"})]);

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /v2/everything?from=26-10-18&apiKey=secret&domains=bbc.co.uk&q=sports HTTP/1.1\r\n"
        ));
        let user_agent = format!("user-agent: news_listener/{}", env!("CARGO_PKG_VERSION"));
        assert!(request.to_lowercase().contains(&user_agent));
    }

    #[tokio::test]
    async fn test_client_reports_upstream_error_body() {
        let (base_url, server) = serve_once(
            "429 Too Many Requests",
            r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#,
        )
        .await;
        let client = NewsApiClient::new(base_url, "secret", None).unwrap();

        let err = client.fetch(&query("bbc.co.uk", None)).await.unwrap_err();
        server.await.unwrap();
        match &err {
            Error::MissingArticles {
                url,
                http_status,
                code,
                ..
            } => {
                assert_eq!(*http_status, 429);
                assert_eq!(code.as_deref(), Some("rateLimited"));
                assert!(url.contains("apiKey=REDACTED"));
            }
            other => panic!("expected MissingArticles, got {other:?}"),
        }
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_connection_error_hides_api_key() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base_url = format!("http://{addr}/v2/everything");
        let client = NewsApiClient::new(base_url, "SUPERSECRETKEY", None).unwrap();
        let err = client.fetch(&query("bbc.co.uk", None)).await.unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: usize,
        calls: Mutex<usize>,
    }

    impl FetchArticles for Flaky {
        async fn fetch(&self, _query: &EverythingQuery) -> Result<Vec<Article>> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.failures {
                Err(Error::MissingArticles {
                    url: "u".to_string(),
                    http_status: 500,
                    status: None,
                    code: None,
                    message: None,
                })
            } else {
                Ok(vec![json!({"title": "ok"})])
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let flaky = Flaky {
            failures: 2,
            calls: Mutex::new(0),
        };
        let retry = RetryFetch::new(flaky, 3, StdDuration::from_millis(1));
        let articles = retry.fetch(&query("bbc.co.uk", None)).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(*retry.inner.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let flaky = Flaky {
            failures: 1,
            calls: Mutex::new(0),
        };
        let retry = RetryFetch::new(flaky, 0, StdDuration::from_millis(1));
        assert!(retry.fetch(&query("bbc.co.uk", None)).await.is_err());
        assert_eq!(*retry.inner.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let flaky = Flaky {
            failures: usize::MAX,
            calls: Mutex::new(0),
        };
        let retry = RetryFetch::new(flaky, 2, StdDuration::from_millis(1));
        assert!(retry.fetch(&query("bbc.co.uk", None)).await.is_err());
        assert_eq!(*retry.inner.calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryFetch::new(
            Flaky {
                failures: 0,
                calls: Mutex::new(0),
            },
            10,
            StdDuration::from_secs(1),
        );
        assert_eq!(retry.delay_for(1), StdDuration::from_secs(1));
        assert_eq!(retry.delay_for(3), StdDuration::from_secs(4));
        assert_eq!(retry.delay_for(8), StdDuration::from_secs(30));
    }
}
