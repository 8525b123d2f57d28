//! Error taxonomy for a newsletter run.
//!
//! Only configuration and delivery failures are allowed to end a run.
//! Provider and summarisation failures are absorbed where they happen
//! (adapters return `anyhow::Result` and callers degrade), so they have
//! no variant here.

use thiserror::Error;

/// A required setting is missing or unusable. Fatal before any fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} environment variable is not set")]
    MissingEnv { name: String },

    #[error("{name} is set but contains no usable entries")]
    Empty { name: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// SMTP delivery failure. Never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build email message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP server {host} did not answer the connection test")]
    Unreachable { host: String },
}

/// Rendering the HTML document failed.
#[derive(Debug, Error)]
#[error("failed to render newsletter: {0}")]
pub struct RenderError(#[from] pub minijinja::Error);

/// Outcome of `generate_newsletter` when it cannot finish cleanly.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The newsletter was generated but could not be sent. The content is
    /// carried along so the caller can still preview or persist it.
    #[error("newsletter generated ({} chars) but delivery failed: {source}", content.len())]
    Delivery {
        content: String,
        #[source]
        source: DeliveryError,
    },
}

impl RunError {
    /// Generated content, when generation got that far.
    pub fn content(&self) -> Option<&str> {
        match self {
            RunError::Delivery { content, .. } => Some(content),
            RunError::Render(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_message() {
        let e = ConfigError::MissingEnv { name: "TICKERS".into() };
        assert_eq!(e.to_string(), "TICKERS environment variable is not set");
    }

    #[test]
    fn test_delivery_error_keeps_content() {
        let address = "not an address".parse::<lettre::Address>().unwrap_err();
        let err = RunError::Delivery {
            content: "<html></html>".into(),
            source: DeliveryError::Address { address: "not an address".into(), source: address },
        };
        assert_eq!(err.content(), Some("<html></html>"));
        assert!(err.to_string().contains("delivery failed"));
    }
}
