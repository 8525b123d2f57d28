//! Price metrics.
//!
//! Pure functions over an ascending `PriceHistory`, plus an extractor that
//! fetches one history per ticker and computes every metric from it.
//! Functions return `None` when the history is too short; nothing here
//! rounds, display code does.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::MetricsConfig;
use crate::sources::PriceSource;
use crate::types::{MetricsRow, PriceChange, PriceHistory};

/// Trading days per year used to annualise daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn tail(history: &PriceHistory, n: usize) -> &[crate::types::PriceBar] {
    &history[history.len().saturating_sub(n)..]
}

/// Price range over the trailing `days` rows, as a percentage of the lowest low.
pub fn volatility(history: &PriceHistory, days: usize) -> Option<f64> {
    let window = tail(history, days);
    if window.is_empty() {
        return None;
    }
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    if low <= 0.0 {
        return None;
    }
    Some((high - low) / low * 100.0)
}

/// Mean close of the trailing `window` rows.
pub fn sma(history: &PriceHistory, window: usize) -> Option<f64> {
    if window == 0 || history.len() < window {
        return None;
    }
    let closes = tail(history, window);
    Some(closes.iter().map(|b| b.close).sum::<f64>() / window as f64)
}

/// Close-to-close change over `days` trading days, in percent.
pub fn momentum(history: &PriceHistory, days: usize) -> Option<f64> {
    if history.len() < days + 1 {
        return None;
    }
    let current = history[history.len() - 1].close;
    let past = history[history.len() - 1 - days].close;
    if past == 0.0 {
        return None;
    }
    Some((current - past) / past * 100.0)
}

/// Latest volume relative to the mean volume of the trailing `days` rows.
pub fn volume_ratio(history: &PriceHistory, days: usize) -> Option<f64> {
    if days == 0 || history.len() < days {
        return None;
    }
    let window = tail(history, days);
    let mean = window.iter().map(|b| b.volume as f64).sum::<f64>() / days as f64;
    if mean == 0.0 {
        return None;
    }
    let current = history[history.len() - 1].volume as f64;
    Some(current / mean)
}

/// First-to-last close change over the trailing `days + 1` rows, in percent.
pub fn percentage_change(history: &PriceHistory, days: usize) -> Option<f64> {
    let window = tail(history, days + 1);
    if window.len() < 2 {
        return None;
    }
    let first = window[0].close;
    let last = window[window.len() - 1].close;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Sample standard deviation of daily close returns, annualised.
pub fn annualized_volatility(history: &PriceHistory, days: usize) -> Option<f64> {
    let window = tail(history, days + 1);
    let returns: Vec<f64> = window
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    if returns.len() < 2 {
        // sample std-dev needs two returns
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// All four headline metrics plus the last close, from one history.
pub fn metrics_row(ticker: &str, history: &PriceHistory, cfg: &MetricsConfig) -> MetricsRow {
    MetricsRow {
        ticker: ticker.to_string(),
        volatility: volatility(history, cfg.short_window_days),
        sma: sma(history, cfg.sma_window_days),
        momentum: momentum(history, cfg.short_window_days),
        volume_ratio: volume_ratio(history, cfg.short_window_days),
        last_close: history.last().map(|b| b.close),
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

pub struct MetricsExtractor {
    prices: Arc<dyn PriceSource>,
    cfg: MetricsConfig,
}

impl MetricsExtractor {
    pub fn new(prices: Arc<dyn PriceSource>, cfg: MetricsConfig) -> Self {
        Self { prices, cfg }
    }

    /// One row per ticker, in input order. A failed fetch gives an
    /// all-absent row.
    pub async fn extract(&self, tickers: &[String]) -> Vec<MetricsRow> {
        let mut rows = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let row = match self.prices.daily_history(ticker, &self.cfg.history_range).await {
                Ok(history) => {
                    debug!(ticker, bars = history.len(), "Price history fetched");
                    metrics_row(ticker, &history, &self.cfg)
                }
                Err(e) => {
                    warn!(ticker, error = %e, "Price history unavailable");
                    MetricsRow::absent(ticker)
                }
            };
            rows.push(row);
        }
        info!(tickers = rows.len(), "Metrics extracted");
        rows
    }

    /// Price-change report over `change_window_days`. Tickers whose history
    /// cannot be fetched are left out.
    pub async fn price_changes(&self, tickers: &[String]) -> Vec<PriceChange> {
        let days = self.cfg.change_window_days;
        let mut out = Vec::new();
        for ticker in tickers {
            match self.prices.daily_history(ticker, &self.cfg.history_range).await {
                Ok(history) => {
                    let change = PriceChange {
                        ticker: ticker.clone(),
                        current_price: history.last().map(|b| b.close),
                        percentage_change: percentage_change(&history, days),
                        annualized_volatility: annualized_volatility(&history, days),
                        data_points: tail(&history, days + 1).len(),
                    };
                    out.push(change);
                }
                Err(e) => warn!(ticker, error = %e, "Could not fetch price data"),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
