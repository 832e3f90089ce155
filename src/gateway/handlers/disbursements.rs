//! Preview and trigger handlers

use std::future::Future;
use std::sync::Arc;

use axum::{
    Form,
    extract::{Query, State},
};
use tracing::info;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, CustomTriggerForm, ErrorBody, PreviewQuery, ok};
use crate::error::Result;
use crate::money::parse_custom_amount;
use crate::pipeline::RunResult;
use crate::preview::Preview;

/// Preview the next run without writing anything
///
/// Standard preview when `custom_amount` is absent or empty.
#[utoipa::path(
    get,
    path = "/api/preview",
    params(PreviewQuery),
    responses(
        (status = 200, description = "Planned disbursements", body = Preview),
        (status = 400, description = "Invalid custom amount", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials"),
        (status = 502, description = "Records store unavailable", body = ErrorBody)
    ),
    security(("basic_auth" = [])),
    tag = "Dashboard"
)]
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<Preview> {
    let custom_amount = match query.custom_amount.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_custom_amount(raw)?),
        _ => None,
    };
    ok(state.preview.preview(custom_amount).await?)
}

/// Run the standard disbursement process
#[utoipa::path(
    post,
    path = "/trigger-disbursements",
    responses(
        (status = 200, description = "Run finished", body = RunResult),
        (status = 401, description = "Missing or wrong credentials"),
        (status = 409, description = "Another run is in progress", body = ErrorBody),
        (status = 502, description = "Event fetch failed", body = ErrorBody)
    ),
    security(("basic_auth" = [])),
    tag = "Disbursements"
)]
pub async fn trigger_disbursements(State(state): State<Arc<AppState>>) -> ApiResult<RunResult> {
    info!("Standard disbursement run triggered from dashboard");
    let pipeline = state.pipeline.clone();
    run_detached(async move { pipeline.run_standard().await }).await
}

/// Grant a fixed amount to every event
#[utoipa::path(
    post,
    path = "/trigger-custom-disbursements",
    request_body(content = CustomTriggerForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Run finished", body = RunResult),
        (status = 400, description = "Invalid custom amount", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials"),
        (status = 409, description = "Another run is in progress", body = ErrorBody),
        (status = 502, description = "Event fetch failed", body = ErrorBody)
    ),
    security(("basic_auth" = [])),
    tag = "Disbursements"
)]
pub async fn trigger_custom_disbursements(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CustomTriggerForm>,
) -> ApiResult<RunResult> {
    let amount = parse_custom_amount(&form.custom_amount)?;
    info!(amount = %amount, "Custom disbursement run triggered from dashboard");
    let pipeline = state.pipeline.clone();
    run_detached(async move { pipeline.run_custom(amount).await }).await
}

/// Runs move real money, so they must finish even if the client disconnects.
async fn run_detached<F>(run: F) -> ApiResult<RunResult>
where
    F: Future<Output = Result<RunResult>> + Send + 'static,
{
    match tokio::spawn(run).await {
        Ok(result) => ok(result?),
        Err(e) => ApiError::internal(format!("Disbursement run aborted: {}", e)).into_err(),
    }
}
