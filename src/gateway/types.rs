//! Dashboard API response types and error mapping
//!
//! - `ApiError`: status + code + message, rendered as `{"error", "code"}`
//! - `ApiResult<T>`: handler return type
//! - Request/response DTOs for the dashboard routes

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::DisbursementError;

// ============================================================================
// Error Response
// ============================================================================

/// Error body returned by every failing route
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message
    #[schema(example = "Invalid input: custom amount 'abc' is not a number")]
    pub error: String,
    /// Stable error code
    #[schema(example = "INVALID_INPUT")]
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl From<DisbursementError> for ApiError {
    fn from(err: DisbursementError) -> Self {
        let status = match &err {
            DisbursementError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DisbursementError::RunInProgress => StatusCode::CONFLICT,
            DisbursementError::Upstream { .. } | DisbursementError::Transport { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "Request failed: {}", self.msg);
        } else {
            tracing::warn!(code = self.code, "Request rejected: {}", self.msg);
        }
        let body = ErrorBody {
            error: self.msg,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[inline]
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

// ============================================================================
// Request DTOs
// ============================================================================

/// `GET /api/preview` query
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// Fixed amount for a custom preview; omit or leave empty for standard
    pub custom_amount: Option<String>,
}

/// `POST /trigger-custom-disbursements` form body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CustomTriggerForm {
    /// Dollars granted to every event, e.g. `25.00`
    #[serde(default)]
    pub custom_amount: String,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Build commit
    #[schema(example = "a1b2c3d")]
    pub version: String,
    #[schema(example = 1751634309000_u64)]
    pub timestamp_ms: u64,
}
