//! Exa neural search.
//!
//! API: `POST https://api.exa.ai/search`
//! Auth: `x-api-key` header.
//! Results are restricted to the quality domains and the past 24 hours.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, require_key, NewsSearch, RawArticle};

const DEFAULT_BASE_URL: &str = "https://api.exa.ai";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: String,
    num_results: u32,
    start_published_date: String,
    include_domains: &'a [String],
    contents: Contents,
}

#[derive(Debug, Serialize)]
struct Contents {
    text: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawArticle>,
}

pub struct ExaSearch {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    quality_sources: Vec<String>,
}

impl ExaSearch {
    pub fn new(api_key: Option<SecretString>, quality_sources: Vec<String>) -> Result<Self> {
        Ok(Self {
            http: http_client("Exa")?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            quality_sources,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Search phrase used by both primary providers.
pub fn search_query(ticker: &str) -> String {
    format!("{ticker} stock earnings financial news")
}

#[async_trait]
impl NewsSearch for ExaSearch {
    fn name(&self) -> String {
        "Exa".to_string()
    }

    async fn search(&self, ticker: &str) -> Result<Vec<RawArticle>> {
        let key = require_key(&self.api_key, "Exa")?;
        let body = SearchRequest {
            query: search_query(ticker),
            num_results: 10,
            start_published_date: (Utc::now() - Duration::days(1)).to_rfc3339(),
            include_domains: &self.quality_sources,
            contents: Contents { text: true },
        };

        let resp = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", key.expose_secret().as_str())
            .json(&body)
            .send()
            .await
            .context("Exa request failed")?
            .error_for_status()
            .context("Exa returned error status")?;

        let data: SearchResponse = resp.json().await.context("Failed to parse Exa response")?;
        debug!(ticker, count = data.results.len(), "Exa search complete");
        Ok(data.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn quality() -> Vec<String> {
        vec!["ft.com".to_string(), "reuters.com".to_string()]
    }

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("AAPL"), "AAPL stock earnings financial news");
    }

    #[tokio::test]
    async fn test_search_parses_results() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/search").header("x-api-key", "k");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"results":[{
                        "title":"Apple AI",
                        "url":"https://www.reuters.com/a",
                        "text":"Apple unveiled AI plans",
                        "publishedDate":"2024-11-01T14:15:00Z"
                    }]}"#,
                );
        });

        let exa = ExaSearch::new(Some(SecretString::new("k".into())), quality())
            .unwrap()
            .with_base_url(server.base_url());
        let results = exa.search("AAPL").await.unwrap();

        mock.assert();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text.as_deref(), Some("Apple unveiled AI plans"));
        assert_eq!(results[0].published_date.as_deref(), Some("2024-11-01T14:15:00Z"));
    }

    #[tokio::test]
    async fn test_search_without_key_fails() {
        let exa = ExaSearch::new(None, quality()).unwrap();
        assert!(exa.search("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(401);
        });
        let exa = ExaSearch::new(Some(SecretString::new("bad".into())), quality())
            .unwrap()
            .with_base_url(server.base_url());
        assert!(exa.search("AAPL").await.is_err());
    }
}
