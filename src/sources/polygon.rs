//! Polygon reference news.
//!
//! API: `https://api.polygon.io/v2/reference/news`
//! Auth: `apikey` query param.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{http_client, require_key, ValidationSource};
use crate::types::ValidationArticle;

const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

#[derive(Debug, Deserialize)]
struct PolygonResponse {
    #[serde(default)]
    results: Vec<PolygonItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolygonItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub article_url: String,
    #[serde(default)]
    pub published_utc: String,
}

impl From<PolygonItem> for ValidationArticle {
    fn from(item: PolygonItem) -> Self {
        ValidationArticle {
            title: item.title,
            summary: None,
            description: item.description,
            url: item.article_url,
            published: item.published_utc,
        }
    }
}

pub struct PolygonNews {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl PolygonNews {
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            http: http_client("Polygon")?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ValidationSource for PolygonNews {
    fn name(&self) -> String {
        "Polygon".to_string()
    }

    async fn fetch_validation_articles(&self, ticker: &str) -> Result<Vec<ValidationArticle>> {
        let key = require_key(&self.api_key, "Polygon")?;
        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);
        let url = format!(
            "{}/v2/reference/news?ticker={}&published_utc.gte={}&published_utc.lte={}&limit=10&apikey={}",
            self.base_url,
            urlencoding::encode(ticker),
            yesterday.format("%Y-%m-%d"),
            today.format("%Y-%m-%d"),
            urlencoding::encode(key.expose_secret()),
        );

        let data: PolygonResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("Polygon request failed")?
            .error_for_status()
            .context("Polygon returned error status")?
            .json()
            .await
            .context("Failed to parse Polygon response")?;

        debug!(ticker, count = data.results.len(), "Polygon fetch complete");
        Ok(data.results.into_iter().map(ValidationArticle::from).collect())
    }
}
