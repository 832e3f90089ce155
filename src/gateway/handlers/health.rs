//! Health check handler

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;

use super::super::types::HealthResponse;

/// Health check endpoint
///
/// Unauthenticated. Does not touch either upstream.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
    ),
    tag = "System"
)]
pub async fn health_check() -> Json<HealthResponse> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("GIT_HASH").to_string(),
        timestamp_ms,
    })
}
