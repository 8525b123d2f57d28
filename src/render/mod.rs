//! HTML newsletter and metrics tables.
//!
//! The document is a single self-contained HTML page rendered by minijinja
//! with HTML auto-escaping on, so bullet text from news providers or the
//! model can never inject markup. Numbers are formatted here, two decimals,
//! `N/A` for absent values.

use chrono::NaiveDate;
use minijinja::{context, Environment};
use serde::Serialize;

use crate::config::MetricsConfig;
use crate::error::RenderError;
use crate::storage::BulletOutput;
use crate::types::MetricsRow;

const NEWSLETTER_HTML: &str = include_str!("templates/newsletter.html");
const TEMPLATE_NAME: &str = "newsletter.html";

pub const NOT_AVAILABLE: &str = "N/A";

/// Date line format, e.g. `November 01, 2024`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Debug, Serialize)]
struct NewsSection<'a> {
    ticker: &'a str,
    bullets: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Cell {
    text: String,
    class: Option<&'static str>,
}

impl Cell {
    fn plain(value: Option<f64>, suffix: &str) -> Self {
        Self {
            text: value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}{suffix}")),
            class: None,
        }
    }

    fn signed(value: Option<f64>, neutral_at: f64, text: impl Fn(f64) -> String) -> Self {
        match value {
            Some(v) => Self {
                text: text(v),
                class: Some(if v >= neutral_at { "positive" } else { "negative" }),
            },
            None => Self { text: NOT_AVAILABLE.to_string(), class: None },
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricsLine<'a> {
    ticker: &'a str,
    cells: Vec<Cell>,
}

fn metrics_line(row: &MetricsRow) -> MetricsLine<'_> {
    MetricsLine {
        ticker: &row.ticker,
        cells: vec![
            Cell::plain(row.volatility, "%"),
            Cell::signed(row.sma_ratio(), 1.0, |v| format!("{v:.2}x")),
            Cell::signed(row.momentum, 0.0, |v| format!("{v:+.2}%")),
            Cell::plain(row.volume_ratio, "x"),
        ],
    }
}

pub struct Renderer {
    env: Environment<'static>,
    windows: MetricsConfig,
    footer: String,
}

impl Renderer {
    pub fn new(windows: MetricsConfig, footer: impl Into<String>) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        // `.html` name turns on HTML auto-escaping
        env.add_template(TEMPLATE_NAME, NEWSLETTER_HTML)?;
        Ok(Self { env, windows, footer: footer.into() })
    }

    /// Render the newsletter. Tickers missing from `news` get an empty
    /// news section.
    pub fn render(
        &self,
        tickers: &[String],
        news: &BulletOutput,
        metrics: &[MetricsRow],
        generated_on: NaiveDate,
    ) -> Result<String, RenderError> {
        let sections: Vec<NewsSection<'_>> = tickers
            .iter()
            .map(|t| NewsSection {
                ticker: t,
                bullets: news.get(t).map(Vec::as_slice).unwrap_or(&[]),
            })
            .collect();
        let rows: Vec<MetricsLine<'_>> = metrics.iter().map(metrics_line).collect();

        let html = self.env.get_template(TEMPLATE_NAME)?.render(context! {
            tickers,
            generated_on => generated_on.format(DATE_FORMAT).to_string(),
            sections,
            rows,
            short => self.windows.short_window_days,
            sma => self.windows.sma_window_days,
            footer => &self.footer,
        })?;
        Ok(html)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}

/// Markdown table of the raw metrics, for terminal output.
pub fn metrics_to_markdown(rows: &[MetricsRow], windows: &MetricsConfig) -> String {
    let short = windows.short_window_days;
    let mut out = format!(
        "| Ticker | Volatility ({short}d %) | SMA {}d | Momentum ({short}d %) | Volume Ratio ({short}d) |\n",
        windows.sma_window_days
    );
    out.push_str("|:-------|-------:|-------:|-------:|-------:|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            row.ticker,
            fmt_opt(row.volatility),
            fmt_opt(row.sma),
            fmt_opt(row.momentum),
            fmt_opt(row.volume_ratio),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        Renderer::new(MetricsConfig::default(), "Automated newsletter").unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()
    }

    fn row(ticker: &str, momentum: f64, sma_ratio: f64) -> MetricsRow {
        MetricsRow {
            ticker: ticker.into(),
            volatility: Some(4.4811),
            sma: Some(100.0),
            momentum: Some(momentum),
            volume_ratio: Some(0.9349),
            last_close: Some(100.0 * sma_ratio),
        }
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_and_date() {
        let html = renderer().render(&tickers(&["AAPL", "TSLA"]), &BulletOutput::new(), &[], day()).unwrap();
        assert!(html.contains("<h2>Portfolio Newsletter</h2>"));
        assert!(html.contains("Daily portfolio update for: AAPL, TSLA"));
        assert!(html.contains("Generated on November 01, 2024"));
        assert!(html.contains("Automated newsletter"));
        assert!(html.contains("Metrics Definitions"));
    }

    #[test]
    fn test_bullets_are_escaped() {
        let mut news = BulletOutput::new();
        news.insert("AAPL".into(), vec!["<script>alert(1)</script> & more".into()]);
        let html = renderer().render(&tickers(&["AAPL"]), &news, &[], day()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn test_metrics_formatting_and_classes() {
        let rows = vec![row("AAPL", 5.1, 1.05), row("TSLA", -2.5, 0.9)];
        let html = renderer().render(&tickers(&["AAPL", "TSLA"]), &BulletOutput::new(), &rows, day()).unwrap();
        assert!(html.contains("4.48%"));
        assert!(html.contains(r#"<span class="positive">1.05x</span>"#));
        assert!(html.contains(r#"<span class="positive">+5.10%</span>"#));
        assert!(html.contains(r#"<span class="negative">0.90x</span>"#));
        assert!(html.contains(r#"<span class="negative">-2.50%</span>"#));
        assert!(html.contains("0.93x"));
    }

    #[test]
    fn test_absent_metrics_show_na() {
        let html = renderer()
            .render(&tickers(&["XYZ"]), &BulletOutput::new(), &[MetricsRow::absent("XYZ")], day())
            .unwrap();
        assert_eq!(html.matches("<td>N/A</td>").count(), 4);
    }

    #[test]
    fn test_ticker_without_news_gets_section() {
        let mut news = BulletOutput::new();
        news.insert("AAPL".into(), vec!["Apple beat".into()]);
        let html = renderer().render(&tickers(&["AAPL", "GOOGL"]), &news, &[], day()).unwrap();
        assert!(html.contains(r#"<li class="news-item">Apple beat</li>"#));
        assert!(html.contains(r#"<div class="ticker-name">GOOGL</div>"#));
        assert_eq!(html.matches("No news available.").count(), 1);
    }

    #[test]
    fn test_markdown_table() {
        let md = metrics_to_markdown(&[row("AAPL", 5.1, 1.0), MetricsRow::absent("BAD")], &MetricsConfig::default());
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("| Ticker | Volatility (10d %) | SMA 50d |"));
        assert_eq!(lines[2], "| AAPL | 4.48 | 100.00 | 5.10 | 0.93 |");
        assert_eq!(lines[3], "| BAD | N/A | N/A | N/A | N/A |");
    }
}
