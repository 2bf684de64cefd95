//! Printer and font catalog handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::protocol::DeviceStatus;
use crate::session::SessionState;

use super::super::state::AppState;
use super::ErrorBody;

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub connected: bool,
    pub state: SessionState,
    pub status: Option<DeviceStatus>,
    /// Human-readable fault bits
    pub faults: Vec<&'static str>,
    pub error: Option<ErrorBody>,
}

/// GET /api/status - Query the printer.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let printer = state.printer.clone();
    let report = tokio::task::spawn_blocking(move || printer.status())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?;

    Ok(Json(StatusResponse {
        connected: report.is_connected(),
        state: report.state,
        status: report.status,
        faults: report
            .status
            .map(|s| s.fault_descriptions())
            .unwrap_or_default(),
        error: report.error.as_ref().map(ErrorBody::from),
    }))
}

/// GET /api/fonts - List font names.
pub async fn fonts(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.fonts.families())
}
