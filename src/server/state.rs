//! Server state.

use crate::fonts::FontCatalog;
use crate::orchestrator::LabelPrinter;

/// Application state shared across handlers.
pub struct AppState {
    pub printer: LabelPrinter,
    /// Scanned once at startup
    pub fonts: FontCatalog,
}

impl AppState {
    pub fn new(printer: LabelPrinter, fonts: FontCatalog) -> Self {
        Self { printer, fonts }
    }
}
