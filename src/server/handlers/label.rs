//! Label preview and print handlers.
//!
//! Both endpoints take the same parameters, as a query string for the
//! preview and as a JSON body for printing:
//!
//! | Field | Meaning | Fallback |
//! |-------|---------|----------|
//! | `label` | text to print | empty label |
//! | `font` | font name looked up in the catalog | builtin face |
//! | `fontsize` | size in points | tape-derived default, clamped to the ceiling |
//! | `count` | copies | 1 when missing or not a number |
//! | `chain` | `checked`, `true`, `on` or `1` | no chain |

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::fonts::FontCatalog;
use crate::orchestrator::{LabelRequest, PrintJob};
use crate::preview;
use crate::protocol::DeviceStatus;
use crate::session::SessionState;

use super::super::state::AppState;
use super::{ErrorBody, status_code};

/// Label parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LabelQuery {
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub font: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub fontsize: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub count: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub chain: Option<String>,
}

/// Accept strings, numbers and booleans alike (form values arrive as
/// strings, JSON clients send numbers).
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Copies requested; anything unparsable or zero prints one.
pub fn parse_count(count: Option<&str>) -> u32 {
    count
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Checkbox-style flag.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "checked" | "true" | "on" | "1"
        )
    })
}

struct Resolved {
    request: LabelRequest,
    font: String,
    note: Option<String>,
    job: PrintJob,
}

fn resolve(fonts: &FontCatalog, query: &LabelQuery) -> Resolved {
    let requested_font = query.font.as_deref().map(str::trim).unwrap_or_default();
    let mut request = LabelRequest {
        text: query.label.clone(),
        font_path: None,
        font_size: query.fontsize.clone(),
    };
    let mut font = requested_font.to_string();
    let mut note = None;

    if !requested_font.is_empty() {
        match fonts.find(requested_font) {
            Some(entry) => {
                debug!(font = %entry.name, path = %entry.path.display(), "font found");
                request.font_path = Some(entry.path.clone());
                font = entry.name.clone();
            }
            None => {
                note = Some(format!(
                    "Font '{}' not found, using the builtin font",
                    requested_font
                ));
            }
        }
    }

    Resolved {
        request,
        font,
        note,
        job: PrintJob::new(
            parse_count(query.count.as_deref()),
            parse_flag(query.chain.as_deref()),
        ),
    }
}

/// Preview response.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub connected: bool,
    pub state: SessionState,
    pub status: Option<DeviceStatus>,
    pub label: String,
    pub font: String,
    pub fonts: Vec<String>,
    pub fontsize: u32,
    pub count: u32,
    pub chain: bool,
    /// `data:image/png;base64,...`
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub error: Option<ErrorBody>,
}

/// GET /api/label - Render the label and report the printer state.
///
/// Always answers 200; a missing printer or a bad font shows up in `error`.
pub async fn preview(State(state): State<Arc<AppState>>, Query(query): Query<LabelQuery>) -> Response {
    let resolved = resolve(&state.fonts, &query);
    let printer = state.printer.clone();
    let request = resolved.request.clone();

    let result = tokio::task::spawn_blocking(move || {
        let outcome = printer.preview(&request);
        let image = match &outcome.label {
            Ok(label) => preview::to_data_url(label).map(Some),
            Err(_) => Ok(None),
        };
        (outcome, image)
    })
    .await;

    let (outcome, image) = match result {
        Ok(done) => done,
        Err(e) => return task_error(e),
    };

    let error = match (&outcome.label, &image, &outcome.session_error) {
        (Err(e), _, _) | (Ok(_), Err(e), _) => Some(ErrorBody::from(e)),
        (Ok(_), Ok(_), Some(e)) => Some(ErrorBody::from(e)),
        _ => None,
    };

    Json(PreviewResponse {
        connected: matches!(outcome.state, SessionState::Ready | SessionState::Faulted),
        state: outcome.state,
        status: outcome.status,
        label: query.label,
        font: resolved.font,
        fonts: state.fonts.families(),
        fontsize: outcome.font_size,
        count: resolved.job.copies,
        chain: resolved.job.chain,
        image: image.ok().flatten(),
        note: resolved.note,
        error,
    })
    .into_response()
}

/// Print response.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    pub copies_printed: u32,
    pub status: Option<DeviceStatus>,
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub error: Option<ErrorBody>,
}

/// POST /api/label/print - Print `count` copies.
pub async fn print(State(state): State<Arc<AppState>>, Json(query): Json<LabelQuery>) -> Response {
    let resolved = resolve(&state.fonts, &query);
    let printer = state.printer.clone();
    let request = resolved.request;
    let job = resolved.job;

    info!(label = %request.text, copies = job.copies, chain = job.chain, "print requested");
    let result = tokio::task::spawn_blocking(move || printer.print(&request, job)).await;

    match result {
        Ok(Ok(report)) => {
            let image = preview::to_data_url(&report.label).ok();
            Json(PrintResponse {
                success: true,
                copies_printed: report.copies_printed,
                status: Some(report.status),
                image,
                note: resolved.note,
                error: None,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            let body = ErrorBody::from(&e);
            (
                status_code(body.kind),
                Json(PrintResponse {
                    success: false,
                    copies_printed: e.printed(),
                    status: None,
                    image: None,
                    note: resolved.note,
                    error: Some(body),
                }),
            )
                .into_response()
        }
        Err(e) => task_error(e),
    }
}

fn task_error(e: tokio::task::JoinError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "error": { "kind": "internal", "message": format!("Task error: {}", e) },
        })),
    )
        .into_response()
}
