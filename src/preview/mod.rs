//! Preview: write the rendered newsletter to disk and optionally serve it.
//!
//! The server is a small Axum app with the document at `/`, the metrics
//! as JSON at `/api/metrics` and a `/health` probe. CORS is open for GET
//! so the JSON can be pulled from a local page.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, PreviewState};

/// Write `html` to `path`, creating the parent directory if needed.
pub fn write_preview(html: &str, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory for {path}"))?;
    }
    std::fs::write(path, html).with_context(|| format!("Failed to write preview to {path}"))?;
    info!(path, bytes = html.len(), "Preview written");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/metrics", get(routes::get_metrics))
        .route("/health", get(routes::health))
        .route("/", get(routes::get_newsletter))
        .layer(cors)
        .with_state(state)
}

/// Serve the preview until Ctrl+C.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind preview port {port}"))?;
    info!(port, "Preview server on http://localhost:{port}/ (Ctrl+C to stop)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("Preview server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
