//! JSON artifacts.
//!
//! Three files, all keyed by ticker symbol:
//! - raw-news input: `ticker -> {company_name, raw_info}`
//! - bullet output: `ticker -> [bullet, ...]`
//! - pipeline summaries: `[TickerSummary, ...]`
//!
//! Maps are `BTreeMap` so the written files are stable across runs.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{RawNews, TickerSummary};

pub type RawNewsInput = BTreeMap<String, RawNews>;
pub type BulletOutput = BTreeMap<String, Vec<String>>;

fn write_json<T: Serialize + ?Sized>(value: &T, path: &str, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialise {what}"))?;
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for {path}"))?;
    }
    std::fs::write(path, json).with_context(|| format!("Failed to write {what} to {path}"))?;
    debug!(path, what, "Saved");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &str, what: &str) -> Result<Option<T>> {
    if !Path::new(path).exists() {
        info!(path, what, "File not found");
        return Ok(None);
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {what} from {path}"))?;
    let value = serde_json::from_str(&json).with_context(|| format!("Failed to parse {what} from {path}"))?;
    Ok(Some(value))
}

/// Load the raw-news input. A missing file is an empty input.
pub fn load_raw_news(path: &str) -> Result<RawNewsInput> {
    let input: Option<RawNewsInput> = read_json(path, "raw news input")?;
    let input = input.unwrap_or_default();
    info!(path, tickers = input.len(), "Raw news input loaded");
    Ok(input)
}

pub fn save_raw_news(input: &RawNewsInput, path: &str) -> Result<()> {
    write_json(input, path, "raw news input")
}

pub fn save_bullets(output: &BulletOutput, path: &str) -> Result<()> {
    write_json(output, path, "news bullets")
}

/// Load bullets written by an earlier `summarize`. A missing file is `None`.
pub fn load_bullets(path: &str) -> Result<Option<BulletOutput>> {
    read_json(path, "news bullets")
}

pub fn save_summaries(summaries: &[TickerSummary], path: &str) -> Result<()> {
    write_json(summaries, path, "ticker summaries")
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
