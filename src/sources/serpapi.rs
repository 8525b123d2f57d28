//! Google News via SerpApi.
//!
//! API: `https://serpapi.com/search.json?engine=google_news`
//! Auth: `api_key` query param.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::exa::search_query;
use super::normalize::is_quality;
use super::{http_client, require_key, NewsSearch, RawArticle};

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    news_results: Vec<RawArticle>,
}

pub struct GoogleNewsSearch {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    quality_sources: Vec<String>,
}

impl GoogleNewsSearch {
    pub fn new(api_key: Option<SecretString>, quality_sources: Vec<String>) -> Result<Self> {
        Ok(Self {
            http: http_client("SerpApi")?,
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

#[async_trait]
impl NewsSearch for GoogleNewsSearch {
    fn name(&self) -> String {
        "GoogleNews".to_string()
    }

    async fn search(&self, ticker: &str) -> Result<Vec<RawArticle>> {
        let key = require_key(&self.api_key, "SerpApi")?;
        let query = search_query(ticker);
        let url = format!(
            "{}/search.json?engine=google_news&q={}&api_key={}&tbm=nws&tbs=qdr:d",
            self.base_url,
            urlencoding::encode(&query),
            urlencoding::encode(key.expose_secret()),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("SerpApi request failed")?
            .error_for_status()
            .context("SerpApi returned error status")?;

        let data: SerpResponse = resp.json().await.context("Failed to parse SerpApi response")?;
        let total = data.news_results.len();
        let kept: Vec<RawArticle> = data
            .news_results
            .into_iter()
            .filter(|a| is_quality(a.any_url(), &self.quality_sources))
            .collect();
        debug!(ticker, total, kept = kept.len(), "Google News search complete");
        Ok(kept)
    }
}
