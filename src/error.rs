//! Error types shared by the upstream clients and the disbursement pipeline.

use thiserror::Error;

/// Which upstream a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Airtable,
    Hcb,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Airtable => "airtable",
            Upstream::Hcb => "hcb",
        }
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DisbursementError {
    /// Non-2xx status or malformed body from an upstream API.
    /// `status` is `None` when the status was fine but the body did not parse.
    #[error("{service} API error{}: {body}", status_suffix(.status))]
    Upstream {
        service: Upstream,
        status: Option<u16>,
        body: String,
    },

    /// The request never produced a response (DNS, connect, timeout)
    #[error("{service} request failed: {message}")]
    Transport { service: Upstream, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A disbursement run is already in progress")]
    RunInProgress,
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl DisbursementError {
    pub fn upstream(service: Upstream, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status,
            body: body.into(),
        }
    }

    pub fn transport(service: Upstream, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }

    /// Stable code for logs and API consumers
    pub fn code(&self) -> &'static str {
        match self {
            DisbursementError::Upstream { .. } => "UPSTREAM_ERROR",
            DisbursementError::Transport { .. } => "UPSTREAM_UNREACHABLE",
            DisbursementError::InvalidInput(_) => "INVALID_INPUT",
            DisbursementError::RunInProgress => "RUN_IN_PROGRESS",
        }
    }
}

pub type Result<T> = std::result::Result<T, DisbursementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_message_includes_status_and_body() {
        let err = DisbursementError::upstream(Upstream::Hcb, Some(422), "insufficient funds");
        assert_eq!(
            err.to_string(),
            "hcb API error (status 422): insufficient funds"
        );
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_malformed_body_error_has_no_status() {
        let err = DisbursementError::upstream(Upstream::Airtable, None, "expected value");
        assert_eq!(err.to_string(), "airtable API error: expected value");
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            DisbursementError::InvalidInput("x".into()).code(),
            "INVALID_INPUT"
        );
        assert_eq!(DisbursementError::RunInProgress.code(), "RUN_IN_PROGRESS");
    }
}
