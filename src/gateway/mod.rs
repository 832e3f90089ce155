//! Dashboard Gateway
//!
//! axum server in front of the disbursement pipeline:
//! - `GET /api/health` (public)
//! - everything else behind HTTP basic auth

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;

use crate::config::GatewayConfig;

pub use state::{AppState, BasicCredentials};

/// Build the full router over shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/preview", get(handlers::get_preview))
        .route("/trigger-disbursements", post(handlers::trigger_disbursements))
        .route(
            "/trigger-custom-disbursements",
            post(handlers::trigger_custom_disbursements),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .layer(from_fn_with_state(
            state.clone(),
            auth::basic_auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .merge(protected)
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        );
    })?;

    info!("Dashboard listening on http://{}", addr);
    info!("OpenAPI document: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await
}
