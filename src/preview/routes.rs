//! Preview route handlers.

use axum::{extract::State, http::StatusCode, response::Html, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::types::MetricsRow;

/// One rendered newsletter and the metrics behind it.
pub struct PreviewState {
    pub html: String,
    pub tickers: Vec<String>,
    pub metrics: Vec<MetricsRow>,
    pub generated_at: String,
}

impl PreviewState {
    pub fn new(html: String, tickers: Vec<String>, metrics: Vec<MetricsRow>) -> Self {
        Self {
            html,
            tickers,
            metrics,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub type AppState = Arc<PreviewState>;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    pub generated_at: String,
    pub tickers: Vec<String>,
    pub rows: Vec<MetricsRow>,
}

/// GET / returns the rendered newsletter.
pub async fn get_newsletter(State(state): State<AppState>) -> Html<String> {
    Html(state.html.clone())
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        generated_at: state.generated_at.clone(),
        tickers: state.tickers.clone(),
        rows: state.metrics.clone(),
    })
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
