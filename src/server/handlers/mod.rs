//! HTTP handlers for the server.

pub mod label;
pub mod printer;

use axum::http::StatusCode;
use serde::Serialize;

use crate::error::{ErrorKind, TapeprintError};
use crate::orchestrator::JobError;

/// Error as reported to the browser.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    /// Copy that failed, for batch failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printed: Option<u32>,
}

impl From<&TapeprintError> for ErrorBody {
    fn from(error: &TapeprintError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            copy: None,
            printed: None,
        }
    }
}

impl From<&JobError> for ErrorBody {
    fn from(error: &JobError) -> Self {
        Self {
            kind: error.error().kind(),
            message: error.to_string(),
            copy: error.failed_copy(),
            printed: error.failed_copy().map(|_| error.printed()),
        }
    }
}

/// HTTP status for a failed print.
pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Connection | ErrorKind::StatusRead => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::DeviceFault | ErrorKind::NotReady => StatusCode::CONFLICT,
        ErrorKind::Render | ErrorKind::Config => StatusCode::BAD_REQUEST,
        ErrorKind::ProtocolSequence => StatusCode::BAD_GATEWAY,
    }
}
