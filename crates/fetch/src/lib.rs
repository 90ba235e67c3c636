//! Fetcher adapter: a thin wrapper around an HTTP client enforcing a fixed
//! result shape — final URL after redirects, cleaned HTML, and a
//! internal/external link split — or a typed failure.

mod html;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use html::{clean_html, extract_links};

#[derive(Debug, Clone)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    pub internal: Vec<Link>,
    pub external: Vec<Link>,
}

#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub url: String,
    pub redirected_url: String,
    pub cleaned_html: String,
    pub links: LinkSet,
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// Message deliberately contains both "Timeout" and "exceeded" — the
    /// BFS engine classifies failures by matching on that pair of words.
    #[error("Timeout: request exceeded {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed fetch result: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<CrawlResult, FetchError>;
}

/// `reqwest`-backed `Fetcher`. One instance is built before Ingest and
/// shared (via `Arc`) for the lifetime of a Spider run.
pub struct HttpFetcher {
    client: reqwest::Client,
    page_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(page_timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(page_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent("Mozilla/5.0 (compatible; blogcrawler/0.1)")
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            page_timeout: Duration::from_secs(page_timeout_secs),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<CrawlResult, FetchError> {
        tracing::debug!(url, "fetching");

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.page_timeout.as_secs())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let redirected_url = resp.url().to_string();
        let base_domain = blogcrawler_canon::get_domain(&redirected_url);

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let (internal, external) = html::extract_links(&body, &redirected_url, &base_domain);
        let cleaned_html = html::clean_html(&body);

        if cleaned_html.is_empty() {
            return Err(FetchError::Malformed("empty cleaned_html".into()));
        }

        Ok(CrawlResult {
            url: url.to_string(),
            redirected_url,
            cleaned_html,
            links: LinkSet { internal, external },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_matches_the_timeout_predicate() {
        let msg = FetchError::Timeout(5).to_string();
        assert!(msg.contains("Timeout"));
        assert!(msg.contains("exceeded"));
    }

    #[test]
    fn network_error_message_does_not_match_the_timeout_predicate() {
        let msg = FetchError::Network("connection refused".into()).to_string();
        assert!(!(msg.contains("Timeout") && msg.contains("exceeded")));
    }
}
