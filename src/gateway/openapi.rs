//! OpenAPI Documentation
//!
//! Served at `/api-docs/openapi.json` (behind basic auth) and exported by the
//! `export_openapi` binary.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::types::{CustomTriggerForm, ErrorBody, HealthResponse};
use crate::pipeline::{Direction, RunResult};
use crate::preview::{Preview, PreviewEvent};
use crate::stats::RunStats;

/// HTTP basic auth with the single dashboard credential pair
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Daydream Cash Cannon API",
        version = "1.0.0",
        description = "Moves money between event organizations and the operating organization, driven by amounts owed in the records store."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::dashboard::get_stats,
        crate::gateway::handlers::disbursements::get_preview,
        crate::gateway::handlers::disbursements::trigger_disbursements,
        crate::gateway::handlers::disbursements::trigger_custom_disbursements,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            CustomTriggerForm,
            RunResult,
            RunStats,
            Preview,
            PreviewEvent,
            Direction,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Dashboard", description = "Statistics and preview (auth required)"),
        (name = "Disbursements", description = "Trigger transfer runs (auth required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
