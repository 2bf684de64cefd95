//! In-memory printer that records every command.
//!
//! Each call is logged together with the calling thread, so tests can check
//! both the exact command order and that concurrent jobs never interleave.
//! Status replies are scripted with [`RecordingConnector::push_status`] and
//! failures injected with [`RecordingConnector::fail_on`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use super::{Connector, PrinterLink};
use crate::error::TapeprintError;
use crate::protocol::{DeviceStatus, ExtendedMode};

/// One recorded link call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open { address: String, tape_width_mm: u8 },
    RequestStatus,
    ReadStatus,
    SetPrintProperty(u32),
    SetRasterMode,
    SetFeedAmount(u16),
    SetCompression(bool),
    SetPrintMode { auto_cut: bool, mirror: bool },
    SetExtendedMode(ExtendedMode),
    SendImage(usize),
    PrintAndEject,
    Reset,
    Close,
}

/// Call discriminant used to target failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Open,
    RequestStatus,
    ReadStatus,
    SetPrintProperty,
    SetRasterMode,
    SetFeedAmount,
    SetCompression,
    SetPrintMode,
    SetExtendedMode,
    SendImage,
    PrintAndEject,
    Reset,
    Close,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Open { .. } => CallKind::Open,
            Call::RequestStatus => CallKind::RequestStatus,
            Call::ReadStatus => CallKind::ReadStatus,
            Call::SetPrintProperty(_) => CallKind::SetPrintProperty,
            Call::SetRasterMode => CallKind::SetRasterMode,
            Call::SetFeedAmount(_) => CallKind::SetFeedAmount,
            Call::SetCompression(_) => CallKind::SetCompression,
            Call::SetPrintMode { .. } => CallKind::SetPrintMode,
            Call::SetExtendedMode(_) => CallKind::SetExtendedMode,
            Call::SendImage(_) => CallKind::SendImage,
            Call::PrintAndEject => CallKind::PrintAndEject,
            Call::Reset => CallKind::Reset,
            Call::Close => CallKind::Close,
        }
    }
}

/// A logged call and the thread that made it.
#[derive(Debug, Clone)]
pub struct Record {
    pub thread: ThreadId,
    pub call: Call,
}

#[derive(Default)]
struct Shared {
    log: Vec<Record>,
    statuses: VecDeque<DeviceStatus>,
    failures: Vec<(CallKind, usize)>,
    delay: Duration,
}

impl Shared {
    /// Log the call; fail if it is the targeted occurrence of its kind.
    fn record(&mut self, call: Call) -> Result<(), TapeprintError> {
        let kind = call.kind();
        self.log.push(Record {
            thread: thread::current().id(),
            call,
        });
        let seen = self.log.iter().filter(|r| r.call.kind() == kind).count();
        if self.failures.contains(&(kind, seen)) {
            return Err(TapeprintError::Connection(format!(
                "injected failure on {:?} #{}",
                kind, seen
            )));
        }
        Ok(())
    }

    fn next_status(&mut self) -> DeviceStatus {
        if self.statuses.len() > 1 {
            self.statuses.pop_front().unwrap_or_default()
        } else {
            self.statuses.front().copied().unwrap_or_default()
        }
    }
}

/// [`Connector`] whose links record into a shared log.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingConnector {
    /// A printer that always reports `status`.
    pub fn with_status(status: DeviceStatus) -> Self {
        let connector = Self::default();
        connector.push_status(status);
        connector
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Queue a status reply. The last queued reply repeats forever.
    pub fn push_status(&self, status: DeviceStatus) {
        self.shared().statuses.push_back(status);
    }

    /// Fail the `nth` (1-based, counted across all links) call of `kind`.
    pub fn fail_on(&self, kind: CallKind, nth: usize) {
        self.shared().failures.push((kind, nth));
    }

    /// Sleep this long inside every call, widening race windows in tests.
    pub fn set_delay(&self, delay: Duration) {
        self.shared().delay = delay;
    }

    pub fn records(&self) -> Vec<Record> {
        self.shared().log.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared().log.iter().map(|r| r.call.clone()).collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.shared().log.iter().filter(|r| r.call.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.shared().log.clear();
    }
}

impl Connector for RecordingConnector {
    fn open(&self, address: &str, tape_width_mm: u8) -> Result<Box<dyn PrinterLink>, TapeprintError> {
        self.shared().record(Call::Open {
            address: address.to_string(),
            tape_width_mm,
        })?;
        Ok(Box::new(RecordingLink {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct RecordingLink {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingLink {
    fn record(&self, call: Call) -> Result<(), TapeprintError> {
        let delay = {
            let mut shared = self.shared.lock().unwrap_or_else(|p| p.into_inner());
            shared.record(call)?;
            shared.delay
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }
}

impl PrinterLink for RecordingLink {
    fn request_status(&mut self) -> Result<(), TapeprintError> {
        self.record(Call::RequestStatus)
    }

    fn read_status(&mut self) -> Result<DeviceStatus, TapeprintError> {
        self.record(Call::ReadStatus)
            .map_err(|e| TapeprintError::StatusRead(e.to_string()))?;
        Ok(self.shared.lock().unwrap_or_else(|p| p.into_inner()).next_status())
    }

    fn set_print_property(&mut self, raster_lines: u32) -> Result<(), TapeprintError> {
        self.record(Call::SetPrintProperty(raster_lines))
    }

    fn set_raster_mode(&mut self) -> Result<(), TapeprintError> {
        self.record(Call::SetRasterMode)
    }

    fn set_feed_amount(&mut self, dots: u16) -> Result<(), TapeprintError> {
        self.record(Call::SetFeedAmount(dots))
    }

    fn set_compression_mode_enabled(&mut self, enabled: bool) -> Result<(), TapeprintError> {
        self.record(Call::SetCompression(enabled))
    }

    fn set_print_mode(&mut self, auto_cut: bool, mirror: bool) -> Result<(), TapeprintError> {
        self.record(Call::SetPrintMode { auto_cut, mirror })
    }

    fn set_extended_mode(&mut self, mode: ExtendedMode) -> Result<(), TapeprintError> {
        self.record(Call::SetExtendedMode(mode))
    }

    fn send_image(&mut self, payload: &[u8]) -> Result<(), TapeprintError> {
        self.record(Call::SendImage(payload.len()))
    }

    fn print_and_eject(&mut self) -> Result<(), TapeprintError> {
        self.record(Call::PrintAndEject)
    }

    fn reset(&mut self) -> Result<(), TapeprintError> {
        self.record(Call::Reset)
    }

    fn close(&mut self) -> Result<(), TapeprintError> {
        self.record(Call::Close)
    }
}
