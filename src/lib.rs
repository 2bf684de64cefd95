//! # tapeprint - Label Printing for Brother P-touch Tape Printers
//!
//! tapeprint renders a line of text to a bitmap sized for the loaded tape and
//! prints it over a serial or USB device file. It provides:
//!
//! - **Protocol implementation**: P-touch raster command builders and status parsing
//! - **Rendering**: two-pass text layout with cap-height vertical centring
//! - **Session**: connect, probe and reconnect at the discovered tape width
//! - **Batch printing**: copies, chaining and first-failure reporting
//! - **HTTP front end**: preview and print from a browser
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tapeprint::{
//!     LabelPrinter, LabelRequest, LabelSettings, PrintJob,
//!     session::{PrinterSession, SharedSession},
//!     transport::SerialConnector,
//! };
//!
//! let session = PrinterSession::new("/dev/rfcomm0", Arc::new(SerialConnector));
//! let printer = LabelPrinter::new(SharedSession::new(session), LabelSettings::default());
//!
//! let request = LabelRequest {
//!     text: "Spare fuses".to_string(),
//!     ..Default::default()
//! };
//! let report = printer.print(&request, PrintJob::new(2, false))?;
//! println!("printed {} labels", report.copies_printed);
//!
//! # Ok::<(), tapeprint::orchestrator::JobError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Raster command builders, status reply, PackBits |
//! | [`transport`] | Printer links: device file, recording (`testing`) |
//! | [`session`] | The process-wide printer session |
//! | [`render`] | Text → label bitmap |
//! | [`transmit`] | One label → raster command sequence |
//! | [`orchestrator`] | Print jobs and previews |
//! | [`preview`] | PNG / data URL encoding |
//! | [`fonts`] | Installed font lookup |
//! | [`config`] | Label settings and server configuration |
//! | [`server`] | HTTP front end |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Models speaking the P-touch raster protocol with a 128-pin head
//! (PT-P300BT, PT-P700, PT-P710BT, PT-E550W) on 3.5 to 24 mm tape.

pub mod config;
pub mod error;
pub mod fonts;
pub mod orchestrator;
pub mod preview;
pub mod protocol;
pub mod render;
pub mod server;
pub mod session;
pub mod transmit;
pub mod transport;

// Re-exports for convenience
pub use config::LabelSettings;
pub use error::TapeprintError;
pub use orchestrator::{LabelPrinter, LabelRequest, PrintJob};
