//! Hosted model inference.
//!
//! Defines the `InferenceClient` trait used by the bullet summariser and
//! the summarizer agent, with a HuggingFace implementation. Prompt text
//! lives in `prompts` as minijinja templates.

pub mod huggingface;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::config::{AppConfig, LlmConfig};

/// One classifier label with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

/// Abstraction over hosted text models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Single-turn chat completion; returns the assistant message text.
    async fn chat(&self, prompt: &str) -> Result<String>;

    /// Abstractive summary of `text`.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Sentiment labels for `text`, highest score first.
    async fn classify_sentiment(&self, text: &str) -> Result<Vec<LabelScore>>;
}

/// HuggingFace client when a token is configured, `None` otherwise.
pub fn client_from_config(cfg: &LlmConfig) -> Result<Option<Arc<dyn InferenceClient>>> {
    match AppConfig::resolve_secret(&cfg.token_env) {
        Some(token) => Ok(Some(Arc::new(huggingface::HuggingFaceClient::new(token, cfg)?))),
        None => {
            warn!(env = %cfg.token_env, "No HuggingFace token configured, model calls disabled");
            Ok(None)
        }
    }
}
