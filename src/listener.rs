//! The news listener: today's articles per outlet and per topic keyword.
//!
//! Both operations are strictly sequential; each request is awaited before
//! the next is issued, and the first failure aborts the whole operation.

use crate::api::{EverythingQuery, FetchArticles};
use crate::error::Result;
use crate::models::{Article, HeadlinesEnvelope, KeywordArticles, KeywordsEnvelope};
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use tracing::{info, instrument};

/// Topical keywords, in output order.
pub const KEYWORDS: [&str; 8] = [
    "sports",
    "healthcare",
    "business",
    "media",
    "laws",
    "entertainment",
    "weather",
    "policy",
];

/// Format of the `from` query parameter (two-digit year).
pub const DATE_FORMAT: &str = "%y-%m-%d";

pub struct NewsListener<F> {
    source: F,
    domains: Vec<String>,
    keywords: Vec<String>,
    date: String,
}

impl<F> NewsListener<F>
where
    F: FetchArticles,
{
    /// Build a listener dated today; every request it makes uses that date.
    pub fn new(source: F, domains: Vec<String>) -> Self {
        Self::with_date(source, domains, Local::now().date_naive())
    }

    pub fn with_date(source: F, domains: Vec<String>, date: NaiveDate) -> Self {
        Self {
            source,
            domains,
            keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
            date: date.format(DATE_FORMAT).to_string(),
        }
    }

    /// The `from` date stamp captured at construction.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Fetch today's articles one outlet at a time and flatten them in
    /// outlet order.
    #[instrument(level = "info", skip_all, fields(date = %self.date, outlets = self.domains.len()))]
    pub async fn get_headlines(&self) -> Result<HeadlinesEnvelope> {
        info!("Getting headlines...");

        let per_domain: Vec<Vec<Article>> = stream::iter(self.domains.iter().enumerate())
            .then(move |(i, domain)| async move {
                let query = EverythingQuery {
                    from: self.date.clone(),
                    domains: domain.clone(),
                    q: None,
                };
                let articles = self.source.fetch(&query).await?;
                info!(
                    index = i + 1,
                    total = self.domains.len(),
                    %domain,
                    count = articles.len(),
                    "Fetched outlet headlines"
                );
                Ok::<_, crate::error::Error>(articles)
            })
            .try_collect()
            .await?;

        let articles: Vec<Article> = per_domain.into_iter().flatten().collect();
        info!(count = articles.len(), "Collected headlines");
        Ok(HeadlinesEnvelope::new(articles))
    }

    /// Fetch today's articles across all outlets for each topic keyword.
    #[instrument(level = "info", skip_all, fields(date = %self.date, keywords = self.keywords.len()))]
    pub async fn get_keywords(&self) -> Result<KeywordsEnvelope> {
        info!("Getting relevant articles...");

        let domains = self.domains.iter().join(",");
        let mut buckets = KeywordArticles::default();

        for (i, keyword) in self.keywords.iter().enumerate() {
            let query = EverythingQuery {
                from: self.date.clone(),
                domains: domains.clone(),
                q: Some(keyword.clone()),
            };
            let articles = self.source.fetch(&query).await?;
            info!(
                index = i + 1,
                total = self.keywords.len(),
                %keyword,
                count = articles.len(),
                "Fetched keyword articles"
            );
            buckets.insert(keyword.as_str(), articles);
        }

        info!(
            keywords = buckets.len(),
            count = buckets.article_count(),
            "Collected keyword articles"
        );
        Ok(KeywordsEnvelope::new(buckets))
    }
}
