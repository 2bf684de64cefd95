//! # Printer Session
//!
//! Owns the single connection to the physical printer and the last status it
//! reported.
//!
//! ## Connect Sequence
//!
//! The link frames data by tape width, but the width is only known after the
//! first status read, so connecting is two explicit phases:
//!
//! ```text
//!  Disconnected ──probe()──► Probing ──commit(w)──► Reconnecting ──► Ready
//!       ▲                       │                        │            │ fault byte set
//!       └──── any I/O error ────┴────────────────────────┘            ▼
//!                                                                  Faulted
//! ```
//!
//! - [`PrinterSession::probe`] opens at width 0 (reusing an open link) and
//!   reads the status.
//! - [`PrinterSession::commit`] closes and reopens at the discovered width.
//!
//! A faulted session stays connected; a later refresh with clear fault bytes
//! moves it back to `Ready`.
//!
//! ## Sharing
//!
//! There is one session per process. [`SharedSession`] is the lock around it;
//! holding its guard is what entitles a caller to drive the printer.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FaultCode, TapeprintError};
use crate::protocol::DeviceStatus;
use crate::transport::{Connector, PrinterLink};

/// Where the session is in its connect sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Probing,
    Reconnecting,
    Ready,
    /// Connected, but a fault byte is set: status and preview only.
    Faulted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Probing => "probing",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Ready => "ready",
            SessionState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// The process-wide printer handle.
pub struct PrinterSession {
    address: String,
    connector: Arc<dyn Connector>,
    link: Option<Box<dyn PrinterLink>>,
    status: Option<DeviceStatus>,
    state: SessionState,
}

impl PrinterSession {
    /// Create a disconnected session for `address`.
    pub fn new(address: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            address: address.into(),
            connector,
            link: None,
            status: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Last successfully read status.
    pub fn status(&self) -> Option<&DeviceStatus> {
        self.status.as_ref()
    }

    /// Connected, tape loaded and no fault bit set.
    pub fn is_print_eligible(&self) -> bool {
        self.state == SessionState::Ready
            && self.link.is_some()
            && self.status.is_some_and(|s| s.has_tape() && s.fault().is_none())
    }

    /// Run the full connect sequence: probe, reopen at the discovered tape
    /// width, then check the fault bytes.
    ///
    /// Returns the fresh status, or `DeviceFault` if the printer reports a
    /// fault (the session stays connected in that case).
    pub fn connect(&mut self) -> Result<DeviceStatus, TapeprintError> {
        let width = self.probe()?;
        self.commit(width)?;
        self.check_faults()
    }

    /// Phase one: make sure a link is open and read the status through it.
    ///
    /// An already open link is reused. Returns the reported tape width.
    pub fn probe(&mut self) -> Result<u8, TapeprintError> {
        if self.link.is_none() {
            debug!(address = %self.address, "opening at provisional width");
            match self.connector.open(&self.address, 0) {
                Ok(link) => self.link = Some(link),
                Err(e) => {
                    warn!(address = %self.address, error = %e, "open failed");
                    self.drop_link();
                    return Err(as_connection_error(e));
                }
            }
        }
        self.state = SessionState::Probing;

        let status = self.read_status()?;
        Ok(status.tape_width_mm)
    }

    /// Phase two: close the provisional link and reopen at `tape_width_mm`.
    pub fn commit(&mut self, tape_width_mm: u8) -> Result<(), TapeprintError> {
        self.state = SessionState::Reconnecting;

        if let Some(mut link) = self.link.take()
            && let Err(e) = link.close()
        {
            warn!(error = %e, "close before reopen failed");
            self.drop_link();
            return Err(as_connection_error(e));
        }

        match self.connector.open(&self.address, tape_width_mm) {
            Ok(link) => {
                self.link = Some(link);
                self.state = SessionState::Ready;
                info!(address = %self.address, tape_width_mm, "printer connected");
                Ok(())
            }
            Err(e) => {
                warn!(address = %self.address, tape_width_mm, error = %e, "reopen failed");
                self.drop_link();
                Err(as_connection_error(e))
            }
        }
    }

    /// Re-read the status over the open link without reopening it.
    pub fn refresh_status(&mut self) -> Result<DeviceStatus, TapeprintError> {
        if self.link.is_none() {
            return Err(TapeprintError::NotReady("printer is not connected".into()));
        }
        self.read_status()?;
        self.check_faults()
    }

    /// Close the link. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                warn!(error = %e, "close failed");
            }
            info!(address = %self.address, "printer disconnected");
        }
        self.state = SessionState::Disconnected;
    }

    /// The open link, for the raster transmitter.
    pub fn link_mut(&mut self) -> Option<&mut (dyn PrinterLink + 'static)> {
        self.link.as_deref_mut()
    }

    fn read_status(&mut self) -> Result<DeviceStatus, TapeprintError> {
        let Some(link) = self.link.as_mut() else {
            return Err(TapeprintError::NotReady("printer is not connected".into()));
        };

        let result = link
            .request_status()
            .and_then(|_| link.read_status())
            .map_err(|e| match e {
                TapeprintError::StatusRead(_) => e,
                other => TapeprintError::StatusRead(other.to_string()),
            });

        match result {
            Ok(status) => {
                if !status.is_known_model() {
                    warn!("status reply carries no model id");
                }
                debug!(
                    model = status.model,
                    tape_width_mm = status.tape_width_mm,
                    error1 = status.error_code1,
                    error2 = status.error_code2,
                    "status read"
                );
                self.status = Some(status);
                Ok(status)
            }
            Err(e) => {
                warn!(error = %e, "status read failed");
                self.drop_link();
                Err(e)
            }
        }
    }

    fn check_faults(&mut self) -> Result<DeviceStatus, TapeprintError> {
        let status = self
            .status
            .ok_or_else(|| TapeprintError::StatusRead("no status available".into()))?;

        match status.fault() {
            Some((code, value)) => {
                self.state = SessionState::Faulted;
                warn!(%code, value, faults = ?status.fault_descriptions(), "printer reports fault");
                Err(TapeprintError::DeviceFault { code, value })
            }
            None => {
                self.state = SessionState::Ready;
                Ok(status)
            }
        }
    }

    /// Forget the link and the cached status after an I/O failure.
    fn drop_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            let _ = link.close();
        }
        self.status = None;
        self.state = SessionState::Disconnected;
    }
}

fn as_connection_error(e: TapeprintError) -> TapeprintError {
    match e {
        TapeprintError::Connection(_) => e,
        other => TapeprintError::Connection(other.to_string()),
    }
}

/// Exclusive-access handle to the process-wide [`PrinterSession`].
///
/// `lock` blocks without timeout until the current holder is done.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<PrinterSession>>,
}

impl SharedSession {
    pub fn new(session: PrinterSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Acquire the session for one complete job.
    pub fn lock(&self) -> MutexGuard<'_, PrinterSession> {
        // A panic mid-job leaves the link in an unknown mode; start over.
        self.inner.lock().unwrap_or_else(|poisoned| {
            let mut session = poisoned.into_inner();
            session.disconnect();
            session
        })
    }
}
