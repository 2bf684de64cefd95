//! # HTTP Server for Label Printing
//!
//! A small web front end: type a label, see the preview rendered for the
//! loaded tape, print it.
//!
//! ## Usage
//!
//! ```bash
//! tapeprint serve --listen 0.0.0.0:8080 --device usb
//! ```
//!
//! ## Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | label form |
//! | `GET /api/status` | printer state and status reply |
//! | `GET /api/fonts` | installed font names |
//! | `GET /api/label` | preview as JSON with a PNG data URL |
//! | `POST /api/label/print` | print copies |
//!
//! Every device call runs on the blocking pool; the session lock serializes
//! concurrent requests.

mod handlers;
mod state;
mod static_files;

pub use crate::config::ServerConfig;
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::LabelSettings;
use crate::error::TapeprintError;
use crate::fonts::FontCatalog;
use crate::orchestrator::LabelPrinter;
use crate::session::{PrinterSession, SharedSession};
use crate::transport::SerialConnector;

/// Build the router for `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(static_files::index_handler))
        .route("/api/status", get(handlers::printer::status))
        .route("/api/fonts", get(handlers::printer::fonts))
        .route("/api/label", get(handlers::label::preview))
        .route("/api/label/print", post(handlers::label::print))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server against the printer at `config.device`.
///
/// ## Example
///
/// ```no_run
/// use tapeprint::config::LabelSettings;
/// use tapeprint::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), tapeprint::error::TapeprintError> {
/// let config = ServerConfig {
///     device: "/dev/rfcomm0".to_string(),
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config, LabelSettings::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, settings: LabelSettings) -> Result<(), TapeprintError> {
    let session = PrinterSession::new(config.device.clone(), Arc::new(SerialConnector));
    let printer = LabelPrinter::new(SharedSession::new(session), settings);
    let fonts = tokio::task::spawn_blocking(FontCatalog::system)
        .await
        .map_err(|e| TapeprintError::Config(format!("Font scan failed: {}", e)))?;

    let app = router(Arc::new(AppState::new(printer, fonts)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            TapeprintError::Connection(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen = %config.listen_addr, device = %config.device, "tapeprint server started");

    axum::serve(listener, app)
        .await
        .map_err(|e| TapeprintError::Connection(format!("Server error: {}", e)))?;

    Ok(())
}
