//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` (optional; built-in defaults apply when the file is
//! missing) and deserializes into strongly-typed structs. Secrets are
//! referenced by env-var name in the config and resolved at runtime, then
//! held as `SecretString` so they never end up in logs.

use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub newsletter: NewsletterConfig,
    pub email: EmailConfig,
    pub llm: LlmConfig,
    pub news: NewsConfig,
    pub crosscheck: CrossCheckConfig,
    pub metrics: MetricsConfig,
    pub preview: PreviewConfig,
}

/// Which provider implementations to wire in.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Live HTTP providers.
    #[default]
    Live,
    /// Embedded sample data, no network.
    Fixtures,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsletterConfig {
    pub tickers_env: String,
    pub recipients_env: String,
    pub use_llm_env: String,
    pub mode: ProviderMode,
    /// Where `preview` writes the document.
    pub preview_path: String,
    pub footer: String,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            tickers_env: "TICKERS".into(),
            recipients_env: "EMAIL_RECIPIENTS".into(),
            use_llm_env: "USE_LLM_SUMMARIZATION".into(),
            mode: ProviderMode::Live,
            preview_path: "newsletter_preview.html".into(),
            footer: "This is an automated newsletter generated by the portfolio newsletter service".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub user_env: String,
    pub password_env: String,
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 465,
            user_env: "GMAIL_USER".into(),
            password_env: "GMAIL_APP_PASSWORD".into(),
            subject: "Portfolio Newsletter - Daily Update".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub token_env: String,
    pub chat_model: String,
    pub summary_model: String,
    pub sentiment_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            token_env: "HUGGINGFACE_TOKEN".into(),
            chat_model: "meta-llama/Llama-3.2-3B-Instruct".into(),
            summary_model: "facebook/bart-large-cnn".into(),
            sentiment_model: "ProsusAI/finbert".into(),
            max_tokens: 500,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    /// `ticker -> {company_name, raw_info}` consumed by the bullet summariser.
    pub input_path: String,
    /// `ticker -> [bullets]` written by the `summarize` command.
    pub output_path: String,
    pub exa_key_env: String,
    pub serpapi_key_env: String,
    pub newsapi_key_env: String,
    /// Domains accepted from the primary scrape.
    pub quality_sources: Vec<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            input_path: "data/input_news_summary.json".into(),
            output_path: "data/output_news_summary.json".into(),
            exa_key_env: "EXA_API_KEY".into(),
            serpapi_key_env: "SERPAPI_KEY".into(),
            newsapi_key_env: "NEWS_API_KEY".into(),
            quality_sources: vec![
                "ft.com".into(),
                "theguardian.com".into(),
                "bloomberg.com".into(),
                "wsj.com".into(),
                "reuters.com".into(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CrossCheckConfig {
    /// Minimum matching-blocks ratio for a validation article to confirm
    /// a candidate.
    pub similarity_threshold: f64,
    pub stocknews_key_env: String,
    pub polygon_key_env: String,
    pub alphavantage_key_env: String,
    /// Restrict Alpha Vantage articles to trusted outlets with high
    /// ticker relevance before they are used for confirmation.
    pub alphavantage_trusted_only: bool,
    pub alphavantage_min_relevance: f64,
    pub trusted_sources: Vec<String>,
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            stocknews_key_env: "STOCKNEWS_API_KEY".into(),
            polygon_key_env: "POLYGON_API_KEY".into(),
            alphavantage_key_env: "ALPHAVANTAGE_API_KEY".into(),
            alphavantage_trusted_only: false,
            alphavantage_min_relevance: 0.7,
            trusted_sources: [
                "Reuters",
                "Bloomberg",
                "Associated Press",
                "Wall Street Journal",
                "Financial Times",
                "MarketWatch",
                "Yahoo Finance",
                "CNBC",
                "Seeking Alpha",
                "Benzinga",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub short_window_days: usize,
    pub sma_window_days: usize,
    /// Yahoo chart range covering the longest window.
    pub history_range: String,
    /// Window for the `changes` report.
    pub change_window_days: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            short_window_days: 10,
            sma_window_days: 50,
            history_range: "3mo".into(),
            change_window_days: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PreviewConfig {
    pub port: u16,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { port: 8085 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&contents, path)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    fn from_toml(contents: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Resolve an environment variable name to its value. Empty values
    /// count as unset.
    pub fn resolve_env(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Resolve a secret referenced by env-var name.
    pub fn resolve_secret(env_name: &str) -> Option<SecretString> {
        Self::resolve_env(env_name).map(SecretString::new)
    }

    /// Whether LLM summarisation is switched on (`true`, any case).
    pub fn use_llm(&self) -> bool {
        Self::resolve_env(&self.newsletter.use_llm_env)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// The tickers and recipients one run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub tickers: Vec<String>,
    pub recipients: Vec<String>,
}

impl RunSettings {
    /// Read tickers and recipients from the environment. Both are required.
    pub fn from_env(cfg: &NewsletterConfig) -> Result<Self, ConfigError> {
        let tickers = required_list(&cfg.tickers_env)?;
        let recipients = required_list(&cfg.recipients_env)?;
        Ok(Self { tickers, recipients })
    }

    /// Tickers from the environment, or `fallback` when unset.
    pub fn tickers_or(cfg: &NewsletterConfig, fallback: &[&str]) -> Vec<String> {
        AppConfig::resolve_env(&cfg.tickers_env)
            .map(|raw| split_list(&raw))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback.iter().map(|s| s.to_string()).collect())
    }
}

fn required_list(env_name: &str) -> Result<Vec<String>, ConfigError> {
    let raw = std::env::var(env_name).map_err(|_| ConfigError::MissingEnv {
        name: env_name.to_string(),
    })?;
    let items = split_list(&raw);
    if items.is_empty() {
        return Err(ConfigError::Empty { name: env_name.to_string() });
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
