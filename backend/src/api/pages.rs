//! Static page and health handlers

use axum::{response::Html, Json};
use serde::Serialize;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Health check payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Human-readable message
    pub message: String,
}

/// GET / - Landing page with the upload form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/health - Health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "File combiner is healthy".to_string(),
    })
}
