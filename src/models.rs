//! Data models for the two JSON dumps.
//!
//! - [`HeadlinesEnvelope`]: every article for every outlet, flattened
//! - [`KeywordsEnvelope`]: articles bucketed by topical keyword
//!
//! Articles themselves are opaque: whatever NewsAPI returns is passed
//! through untouched.

use chrono::Local;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single upstream article, passed through as raw JSON.
pub type Article = serde_json::Value;

/// Version tag stamped into every envelope under the `news_listener` key.
pub const VERSION_TAG: &str = "v0.1.0";

/// Format of `generated_at` / `scraped_at`, e.g. `2026-10-18 09:15:02.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current local time as an envelope timestamp.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Output of the headline fetch.
#[derive(Debug, Serialize)]
pub struct HeadlinesEnvelope {
    pub news_listener: String,
    pub generated_at: String,
    /// Articles from every outlet, in outlet order.
    pub articles: Vec<Article>,
}

impl HeadlinesEnvelope {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            news_listener: VERSION_TAG.to_string(),
            generated_at: timestamp_now(),
            articles,
        }
    }
}

/// Output of the keyword fetch.
#[derive(Debug, Serialize)]
pub struct KeywordsEnvelope {
    pub news_listener: String,
    pub scraped_at: String,
    pub articles: KeywordArticles,
}

impl KeywordsEnvelope {
    pub fn new(articles: KeywordArticles) -> Self {
        Self {
            news_listener: VERSION_TAG.to_string(),
            scraped_at: timestamp_now(),
            articles,
        }
    }
}

/// Keyword to articles mapping that serializes as a JSON object in
/// insertion order.
#[derive(Debug, Default)]
pub struct KeywordArticles(Vec<(String, Vec<Article>)>);

impl KeywordArticles {
    /// Insert or replace the bucket for `keyword`, keeping its original
    /// position when replacing.
    pub fn insert(&mut self, keyword: impl Into<String>, articles: Vec<Article>) {
        let keyword = keyword.into();
        match self.0.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, bucket)) => *bucket = articles,
            None => self.0.push((keyword, articles)),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&[Article]> {
        self.0
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total article count across all keywords.
    pub fn article_count(&self) -> usize {
        self.0.iter().map(|(_, v)| v.len()).sum()
    }
}

impl Serialize for KeywordArticles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (keyword, articles) in &self.0 {
            map.serialize_entry(keyword, articles)?;
        }
        map.end()
    }
}
