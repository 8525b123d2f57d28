//! Portfolio newsletter.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod similarity;
pub mod sources;
pub mod agents;
pub mod llm;
pub mod news;
pub mod metrics;
pub mod render;
pub mod delivery;
pub mod storage;
pub mod newsletter;
pub mod preview;
