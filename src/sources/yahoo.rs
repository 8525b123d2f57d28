//! Yahoo Finance daily price history.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=3mo&interval=1d`
//! Auth: none.
//!
//! The chart endpoint returns parallel arrays; a day with any null field
//! (halted session, partial data) is skipped rather than zero-filled.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{http_client, PriceSource};
use crate::types::{PriceBar, PriceHistory};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooChart {
    http: Client,
    base_url: String,
}

impl YahooChart {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: http_client("Yahoo Finance")?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn bars_from_chart(envelope: ChartEnvelope, symbol: &str) -> Result<PriceHistory> {
    if let Some(err) = envelope.chart.error {
        bail!("Yahoo chart error for {symbol}: {} ({})", err.description, err.code);
    }
    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| anyhow!("Yahoo chart returned no result for {symbol}"))?;

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close))
        else {
            continue;
        };
        let Some(volume) = quote.volume.get(i).copied().flatten() else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };
        bars.push(PriceBar { date: dt.date_naive(), open, high, low, close, volume });
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[async_trait]
impl PriceSource for YahooChart {
    async fn daily_history(&self, ticker: &str, range: &str) -> Result<PriceHistory> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            urlencoding::encode(ticker),
            urlencoding::encode(range),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Yahoo chart request failed for {ticker}"))?;
        let status = resp.status();
        let envelope: ChartEnvelope = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Yahoo chart for {ticker} (HTTP {status})"))?;

        let bars = bars_from_chart(envelope, ticker)?;
        debug!(ticker, range, bars = bars.len(), "Yahoo history fetched");
        Ok(bars)
    }
}
