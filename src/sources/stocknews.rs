//! StockNewsAPI validation source.
//!
//! API: `https://stocknewsapi.com/api/v1?tickers=..&items=10&date=last24hours`
//! Auth: `token` query param.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{http_client, require_key, ValidationSource};
use crate::types::ValidationArticle;

const DEFAULT_BASE_URL: &str = "https://stocknewsapi.com";

#[derive(Debug, Deserialize)]
struct StockNewsResponse {
    #[serde(default)]
    data: Vec<StockNewsItem>,
}

/// One StockNewsAPI item. The live API calls the body `text`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockNewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "text")]
    pub summary: Option<String>,
    #[serde(default, alias = "news_url")]
    pub url: String,
    #[serde(default)]
    pub date: String,
}

impl From<StockNewsItem> for ValidationArticle {
    fn from(item: StockNewsItem) -> Self {
        ValidationArticle {
            title: item.title,
            summary: item.summary,
            description: None,
            url: item.url,
            published: item.date,
        }
    }
}

pub struct StockNewsApi {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl StockNewsApi {
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            http: http_client("StockNewsAPI")?,
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
impl ValidationSource for StockNewsApi {
    fn name(&self) -> String {
        "StockNewsAPI".to_string()
    }

    async fn fetch_validation_articles(&self, ticker: &str) -> Result<Vec<ValidationArticle>> {
        let key = require_key(&self.api_key, "StockNewsAPI")?;
        let url = format!(
            "{}/api/v1?tickers={}&items=10&token={}&date=last24hours",
            self.base_url,
            urlencoding::encode(ticker),
            urlencoding::encode(key.expose_secret()),
        );

        let data: StockNewsResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("StockNewsAPI request failed")?
            .error_for_status()
            .context("StockNewsAPI returned error status")?
            .json()
            .await
            .context("Failed to parse StockNewsAPI response")?;

        debug!(ticker, count = data.data.len(), "StockNewsAPI fetch complete");
        Ok(data.data.into_iter().map(ValidationArticle::from).collect())
    }
}
