//! # Print Orchestrator
//!
//! Runs a print job against the shared printer session:
//!
//! ```text
//! lock session ─► connect / refresh ─► render once ─► send copy 1..N ─► unlock
//!                     │ faulted, no tape     │ render error    │ first failure
//!                     ▼                      ▼                 ▼
//!                  abort (no I/O)         abort            stop, report copy
//! ```
//!
//! ## Chaining
//!
//! Every copy but the last is sent chained (no cut between copies). The last
//! copy is chained only when the caller asked for chaining, so the strip keeps
//! going into a following job.
//!
//! ## Locking
//!
//! The session lock is held for the whole job, rendering included, so the
//! label is always sized from the tape width read inside the same lock.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LabelSettings;
use crate::error::TapeprintError;
use crate::protocol::DeviceStatus;
use crate::render::{self, LabelSpec, RenderedLabel, sizing};
use crate::session::{PrinterSession, SessionState, SharedSession};
use crate::transmit;

/// Copies and chaining for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrintJob {
    pub copies: u32,
    /// Leave the last copy uncut as well
    pub chain: bool,
}

impl Default for PrintJob {
    fn default() -> Self {
        Self {
            copies: 1,
            chain: false,
        }
    }
}

impl PrintJob {
    /// At least one copy is always printed.
    pub fn new(copies: u32, chain: bool) -> Self {
        Self {
            copies: copies.max(1),
            chain,
        }
    }

    /// Whether copy `copy` (1-based) is followed by another label without a cut.
    pub fn chain_next(&self, copy: u32) -> bool {
        copy != self.copies || self.chain
    }
}

/// What to put on the label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRequest {
    pub text: String,
    pub font_path: Option<PathBuf>,
    /// Raw requested size; `None` or unparsable uses the tape default
    pub font_size: Option<String>,
}

/// Result of a successful job.
#[derive(Debug, Clone)]
pub struct PrintReport {
    pub copies_printed: u32,
    pub status: DeviceStatus,
    pub label: RenderedLabel,
}

/// Why a job stopped.
#[derive(Debug, Error)]
pub enum JobError {
    /// Nothing was sent: connection, fault, missing tape or render failure
    #[error("Print aborted: {0}")]
    Aborted(#[source] TapeprintError),

    /// Copy `copy` failed after `printed` copies went out
    #[error("Copy {copy} failed after {printed} printed: {error}")]
    CopyFailed {
        copy: u32,
        printed: u32,
        #[source]
        error: TapeprintError,
    },
}

impl JobError {
    pub fn printed(&self) -> u32 {
        match self {
            JobError::Aborted(_) => 0,
            JobError::CopyFailed { printed, .. } => *printed,
        }
    }

    pub fn failed_copy(&self) -> Option<u32> {
        match self {
            JobError::Aborted(_) => None,
            JobError::CopyFailed { copy, .. } => Some(*copy),
        }
    }

    pub fn error(&self) -> &TapeprintError {
        match self {
            JobError::Aborted(error) | JobError::CopyFailed { error, .. } => error,
        }
    }

    pub fn into_error(self) -> TapeprintError {
        match self {
            JobError::Aborted(error) | JobError::CopyFailed { error, .. } => error,
        }
    }
}

/// Printer state after a status request.
#[derive(Debug)]
pub struct StatusReport {
    pub state: SessionState,
    /// Last status read; kept when the printer reports a fault
    pub status: Option<DeviceStatus>,
    pub error: Option<TapeprintError>,
}

impl StatusReport {
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Faulted)
    }
}

/// Result of a preview: the label is rendered even when the printer is away.
#[derive(Debug)]
pub struct PreviewOutcome {
    pub status: Option<DeviceStatus>,
    pub state: SessionState,
    /// Connect error, if the printer could not be reached or is faulted
    pub session_error: Option<TapeprintError>,
    pub font_size: u32,
    pub label: Result<RenderedLabel, TapeprintError>,
}

/// Coordinates session, renderer and transmitter for label requests.
#[derive(Clone)]
pub struct LabelPrinter {
    session: SharedSession,
    settings: LabelSettings,
}

impl LabelPrinter {
    pub fn new(session: SharedSession, settings: LabelSettings) -> Self {
        Self { session, settings }
    }

    pub fn settings(&self) -> &LabelSettings {
        &self.settings
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Connect (or refresh an open link) and report what the printer says.
    pub fn status(&self) -> StatusReport {
        let mut session = self.session.lock();
        let error = session.connect().err();
        StatusReport {
            state: session.state(),
            status: session.status().copied(),
            error,
        }
    }

    /// Build the render input for the given tape width.
    pub fn label_spec(&self, request: &LabelRequest, tape_width_mm: u8) -> LabelSpec {
        let default = sizing::default_font_size(tape_width_mm, &self.settings);
        LabelSpec {
            text: request.text.clone(),
            font_path: request.font_path.clone(),
            font_size_pt: sizing::resolve_font_size(request.font_size.as_deref(), default, &self.settings),
            canvas_height_px: sizing::canvas_height(tape_width_mm, &self.settings),
            max_width_px: self.settings.max_label_length_px,
        }
    }

    /// Render a label for preview.
    ///
    /// The printer is contacted for its tape width; if that fails, or the
    /// printer is faulted, the label is still rendered.
    pub fn preview(&self, request: &LabelRequest) -> PreviewOutcome {
        let mut session = self.session.lock();
        let session_error = session.connect().err();
        if let Some(e) = &session_error {
            warn!(error = %e, "previewing without a ready printer");
        }

        let status = session.status().copied();
        let tape_width_mm = status.map(|s| s.tape_width_mm).unwrap_or(0);
        let spec = self.label_spec(request, tape_width_mm);

        PreviewOutcome {
            status,
            state: session.state(),
            session_error,
            font_size: spec.font_size_pt,
            label: render::render(&spec),
        }
    }

    /// Print `job.copies` copies of one label.
    pub fn print(&self, request: &LabelRequest, job: PrintJob) -> Result<PrintReport, JobError> {
        let mut session = self.session.lock();

        let status = session.connect().map_err(JobError::Aborted)?;
        if !session.is_print_eligible() {
            return Err(JobError::Aborted(TapeprintError::NotReady(
                "Cannot print without tape detected".into(),
            )));
        }

        let spec = self.label_spec(request, status.tape_width_mm);
        let label = render::render(&spec).map_err(JobError::Aborted)?;

        info!(
            copies = job.copies,
            chain = job.chain,
            tape_width_mm = status.tape_width_mm,
            "printing label"
        );
        let copies_printed = self.print_copies(&mut session, &label, status.tape_width_mm, job)?;

        Ok(PrintReport {
            copies_printed,
            status,
            label,
        })
    }

    /// Send every copy of an already rendered label.
    ///
    /// The caller holds the session lock and has connected it.
    pub fn print_copies(
        &self,
        session: &mut PrinterSession,
        label: &RenderedLabel,
        tape_width_mm: u8,
        job: PrintJob,
    ) -> Result<u32, JobError> {
        let mut printed = 0;

        for copy in 1..=job.copies {
            if copy > 1
                && self.settings.refresh_between_copies
                && let Err(error) = session.refresh_status()
            {
                warn!(copy, error = %error, "status check between copies failed");
                return Err(JobError::CopyFailed {
                    copy,
                    printed,
                    error,
                });
            }

            let chain_next = job.chain_next(copy);
            if let Err(error) =
                transmit::send(session, label, tape_width_mm, chain_next, self.settings.strip_height)
            {
                warn!(copy, printed, error = %error, "copy failed");
                if error.requires_reconnect() {
                    session.disconnect();
                }
                return Err(JobError::CopyFailed {
                    copy,
                    printed,
                    error,
                });
            }
            printed += 1;
        }

        info!(printed, "job complete");
        Ok(printed)
    }
}
