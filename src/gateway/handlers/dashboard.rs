//! Dashboard page and statistics

use std::sync::Arc;

use axum::{extract::State, response::Html};

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::money::format_dollars;
use crate::stats::RunStats;

const TEMPLATE: &str = include_str!("../dashboard.html");

/// HTML dashboard: last-run statistics, preview panel, trigger forms
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    let stats = state.stats.snapshot().await;
    Html(render_dashboard(&stats))
}

pub(crate) fn render_dashboard(stats: &RunStats) -> String {
    let last_run = stats
        .last_run
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Never".to_string());

    TEMPLATE
        .replace("{{TOTAL_EVENTS}}", &stats.total_events.to_string())
        .replace("{{EVENTS_WITH_AMOUNT}}", &stats.events_with_amount.to_string())
        .replace("{{TOTAL_AMOUNT_OWED}}", &format_dollars(stats.total_amount_owed))
        .replace(
            "{{DISBURSEMENTS_CREATED}}",
            &stats.disbursements_created.to_string(),
        )
        .replace("{{PROCESSED}}", &stats.processed.to_string())
        .replace("{{FAILED}}", &stats.failed.to_string())
        .replace("{{LAST_RUN}}", &last_run)
}

/// Statistics of the most recent run
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Last run statistics", body = RunStats),
        (status = 401, description = "Missing or wrong credentials")
    ),
    security(("basic_auth" = [])),
    tag = "Dashboard"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<RunStats> {
    ok(state.stats.snapshot().await)
}
