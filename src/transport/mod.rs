//! # Printer Transport Layer
//!
//! The session and transmitter never touch bytes directly; they drive a
//! [`PrinterLink`], one method per protocol command, obtained from a
//! [`Connector`].
//!
//! ## Available Transports
//!
//! - [`serial`]: device-file connection (`/dev/rfcomm0`, `/dev/usb/lp0`)
//! - `recording`: in-memory link that records every call, for tests
//!   (`testing` feature)
//!
//! ## Layering
//!
//! ```text
//! PrinterSession / transmit
//!          │  PrinterLink (commands)
//!          ▼
//!      ByteLink ── protocol::commands encoding
//!          │  Channel (bytes)
//!          ▼
//!    SerialChannel ── raw TTY / usblp device file
//! ```

pub mod link;
#[cfg(any(test, feature = "testing"))]
pub mod recording;
pub mod serial;

pub use link::{ByteLink, Channel};
#[cfg(any(test, feature = "testing"))]
pub use recording::RecordingConnector;
pub use serial::{SerialChannel, SerialConnector};

use crate::error::TapeprintError;
use crate::protocol::{DeviceStatus, ExtendedMode};

/// An open connection to the printer, exposing the raster command set.
///
/// Every call is fallible; none is retried.
pub trait PrinterLink: Send {
    fn request_status(&mut self) -> Result<(), TapeprintError>;
    fn read_status(&mut self) -> Result<DeviceStatus, TapeprintError>;
    fn set_print_property(&mut self, raster_lines: u32) -> Result<(), TapeprintError>;
    fn set_raster_mode(&mut self) -> Result<(), TapeprintError>;
    fn set_feed_amount(&mut self, dots: u16) -> Result<(), TapeprintError>;
    fn set_compression_mode_enabled(&mut self, enabled: bool) -> Result<(), TapeprintError>;
    fn set_print_mode(&mut self, auto_cut: bool, mirror: bool) -> Result<(), TapeprintError>;
    fn set_extended_mode(&mut self, mode: ExtendedMode) -> Result<(), TapeprintError>;
    /// Send an already encoded `G`/`Z` raster payload.
    fn send_image(&mut self, payload: &[u8]) -> Result<(), TapeprintError>;
    fn print_and_eject(&mut self) -> Result<(), TapeprintError>;
    fn reset(&mut self) -> Result<(), TapeprintError>;
    fn close(&mut self) -> Result<(), TapeprintError>;
}

/// Opens links to a printer address.
///
/// `tape_width_mm` is only used for framing inside the link; 0 means the
/// width is not known yet.
pub trait Connector: Send + Sync {
    fn open(&self, address: &str, tape_width_mm: u8) -> Result<Box<dyn PrinterLink>, TapeprintError>;
}
