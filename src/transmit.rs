//! # Raster Transmitter
//!
//! Sends one rendered label to the printer as a raster job.
//!
//! ## Command Sequence
//!
//! The strip is composed, packed and compressed before the first command;
//! a label that cannot be encoded for the loaded tape is refused as
//! `NotReady` and the link is left untouched. The command order is a
//! protocol requirement:
//!
//! | # | Step | Command |
//! |---|------|---------|
//! | 1 | `PrintProperty` | raster line count |
//! | 2 | `RasterMode` | enter raster transfer |
//! | 3 | `FeedAmount` | 0, feeding is left to eject |
//! | 4 | `Compression` | PackBits on |
//! | 5 | `PrintMode` | auto cut on, mirror off |
//! | 6 | `ExtendedMode` | no half cut, chain = `chain_next`, high resolution |
//! | 7 | `Image` | raster payload |
//! | 8 | `PrintAndEject` | print and feed out |
//!
//! The first failing step aborts the send and is reported as
//! `ProtocolSequence { step, .. }`. Nothing is retried: after a partial
//! stream the printer is in an unknown mode and must be reconnected.

use std::fmt;

use image::{GrayImage, Luma, imageops};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::TapeprintError;
use crate::protocol::{ExtendedMode, raster};
use crate::render::RenderedLabel;
use crate::session::PrinterSession;
use crate::transport::PrinterLink;

/// One step of the raster send sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStep {
    PrintProperty,
    RasterMode,
    FeedAmount,
    Compression,
    PrintMode,
    ExtendedMode,
    Image,
    PrintAndEject,
}

impl SendStep {
    /// Device commands in the order they must be issued.
    pub const SEQUENCE: [SendStep; 8] = [
        SendStep::PrintProperty,
        SendStep::RasterMode,
        SendStep::FeedAmount,
        SendStep::Compression,
        SendStep::PrintMode,
        SendStep::ExtendedMode,
        SendStep::Image,
        SendStep::PrintAndEject,
    ];
}

impl fmt::Display for SendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendStep::PrintProperty => "print property",
            SendStep::RasterMode => "raster mode",
            SendStep::FeedAmount => "feed amount",
            SendStep::Compression => "compression",
            SendStep::PrintMode => "print mode",
            SendStep::ExtendedMode => "extended mode",
            SendStep::Image => "image",
            SendStep::PrintAndEject => "print and eject",
        };
        f.write_str(name)
    }
}

/// Encoded job data, prepared before any command is sent.
#[derive(Debug, Clone)]
pub struct RasterJob {
    pub raster_lines: u32,
    pub payload: Vec<u8>,
}

impl RasterJob {
    /// Compose the strip and encode it for `tape_width_mm`.
    pub fn prepare(label: &RenderedLabel, tape_width_mm: u8, strip_height: u32) -> Result<Self, TapeprintError> {
        let strip = compose_strip(label, strip_height);
        let (data, bytes_per_row) = raster::load_raw_image(&strip, tape_width_mm)?;
        let raster_lines = (data.len() / bytes_per_row) as u32;
        let payload = raster::compress_image(&data, bytes_per_row)?;
        Ok(Self {
            raster_lines,
            payload,
        })
    }
}

/// Centre the label vertically on a white strip of the print head's height.
pub fn compose_strip(label: &RenderedLabel, strip_height: u32) -> GrayImage {
    let mut strip = GrayImage::from_pixel(label.width(), strip_height, Luma([255]));
    let top = (strip_height as i64 - label.height() as i64) / 2;
    imageops::overlay(&mut strip, label.image(), 0, top);
    strip
}

/// Extended mode flags for one label.
///
/// `chain_next` means the next label follows without a cut.
pub fn extended_mode_for(chain_next: bool) -> ExtendedMode {
    ExtendedMode {
        half_cut: false,
        no_chain_printing: !chain_next,
        special_tape: false,
        high_resolution: true,
        no_buffer_clearing: false,
    }
}

/// Send one label through the session's link.
///
/// Refused with `NotReady` when the session has no link or no tape width.
pub fn send(
    session: &mut PrinterSession,
    label: &RenderedLabel,
    tape_width_mm: u8,
    chain_next: bool,
    strip_height: u32,
) -> Result<(), TapeprintError> {
    if tape_width_mm == 0 {
        return Err(TapeprintError::NotReady("Cannot print without tape detected".into()));
    }
    let Some(link) = session.link_mut() else {
        return Err(TapeprintError::NotReady("Cannot print without printer".into()));
    };

    let job = RasterJob::prepare(label, tape_width_mm, strip_height).map_err(|e| {
        TapeprintError::NotReady(format!("Cannot encode label for {} mm tape: {}", tape_width_mm, e))
    })?;
    debug!(
        raster_lines = job.raster_lines,
        payload = job.payload.len(),
        tape_width_mm,
        chain_next,
        "raster job prepared"
    );

    send_job(link, &job, chain_next)
}

/// Issue the command sequence for a prepared job.
pub fn send_job(link: &mut dyn PrinterLink, job: &RasterJob, chain_next: bool) -> Result<(), TapeprintError> {
    for step in SendStep::SEQUENCE {
        run_step(link, step, job, chain_next).map_err(|e| e.at_step(step))?;
        debug!(%step, "step done");
    }
    info!(raster_lines = job.raster_lines, chain_next, "label sent");
    Ok(())
}

fn run_step(link: &mut dyn PrinterLink, step: SendStep, job: &RasterJob, chain_next: bool) -> Result<(), TapeprintError> {
    match step {
        SendStep::PrintProperty => link.set_print_property(job.raster_lines),
        SendStep::RasterMode => link.set_raster_mode(),
        SendStep::FeedAmount => link.set_feed_amount(0),
        SendStep::Compression => link.set_compression_mode_enabled(true),
        SendStep::PrintMode => link.set_print_mode(true, false),
        SendStep::ExtendedMode => link.set_extended_mode(extended_mode_for(chain_next)),
        SendStep::Image => link.send_image(&job.payload),
        SendStep::PrintAndEject => link.print_and_eject(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::protocol::DeviceStatus;
    use crate::render::{LabelSpec, render};
    use crate::transport::recording::{Call, CallKind, RecordingConnector};

    fn label(height: u32) -> RenderedLabel {
        render(&LabelSpec {
            text: "Hi".into(),
            font_path: None,
            font_size_pt: 32,
            canvas_height_px: height,
            max_width_px: 7000,
        })
        .unwrap()
    }

    fn connected(tape_width_mm: u8) -> (RecordingConnector, PrinterSession) {
        let connector = RecordingConnector::with_status(DeviceStatus {
            model: 0x71,
            tape_width_mm,
            ..Default::default()
        });
        let mut session = PrinterSession::new("usb", Arc::new(connector.clone()));
        session.connect().unwrap();
        connector.clear();
        (connector, session)
    }

    #[test]
    fn test_sequence_order() {
        let (connector, mut session) = connected(12);
        let label = label(64);
        send(&mut session, &label, 12, false, 128).unwrap();

        let calls = connector.calls();
        assert_eq!(calls.len(), 8);
        assert_eq!(calls[0], Call::SetPrintProperty(label.width()));
        assert_eq!(
            &calls[1..6],
            &[
                Call::SetRasterMode,
                Call::SetFeedAmount(0),
                Call::SetCompression(true),
                Call::SetPrintMode {
                    auto_cut: true,
                    mirror: false
                },
                Call::SetExtendedMode(extended_mode_for(false)),
            ]
        );
        assert!(matches!(calls[6], Call::SendImage(n) if n > 0));
        assert_eq!(calls[7], Call::PrintAndEject);
    }

    #[test]
    fn test_chain_next_clears_no_chain_bit() {
        assert!(!extended_mode_for(true).no_chain_printing);
        assert!(extended_mode_for(false).no_chain_printing);
        assert!(extended_mode_for(true).high_resolution);
        assert!(!extended_mode_for(true).half_cut);
    }

    #[test]
    fn test_failure_names_step_and_stops() {
        let (connector, mut session) = connected(12);
        connector.fail_on(CallKind::SetCompression, 1);

        let err = send(&mut session, &label(64), 12, false, 128).unwrap_err();
        assert_eq!(err.failed_step(), Some(SendStep::Compression));
        assert_eq!(connector.count(CallKind::SendImage), 0);
        assert_eq!(connector.count(CallKind::PrintAndEject), 0);
    }

    #[test]
    fn test_refuses_without_tape() {
        let (connector, mut session) = connected(12);
        let err = send(&mut session, &label(64), 0, false, 128).unwrap_err();
        assert!(matches!(err, TapeprintError::NotReady(_)));
        assert!(connector.calls().is_empty());
    }

    #[test]
    fn test_refuses_without_link() {
        let connector = RecordingConnector::default();
        let mut session = PrinterSession::new("usb", Arc::new(connector.clone()));
        let err = send(&mut session, &label(64), 12, false, 128).unwrap_err();
        assert!(matches!(err, TapeprintError::NotReady(_)));
        assert!(connector.calls().is_empty());
    }

    #[test]
    fn test_unsupported_tape_refused_without_io() {
        let (connector, mut session) = connected(12);
        let err = send(&mut session, &label(64), 36, false, 128).unwrap_err();
        assert!(matches!(err, TapeprintError::NotReady(_)));
        assert_eq!(err.failed_step(), None);
        assert!(!err.requires_reconnect());
        assert!(connector.calls().is_empty());
        assert!(session.is_connected());
    }

    #[test]
    fn test_strip_centres_label() {
        let label = label(64);
        let strip = compose_strip(&label, 128);
        assert_eq!(strip.height(), 128);
        assert_eq!(strip.width(), label.width());
        // Rows above and below the label stay white
        for x in 0..strip.width() {
            assert_eq!(strip.get_pixel(x, 0).0[0], 255);
            assert_eq!(strip.get_pixel(x, 127).0[0], 255);
        }
        let ink_rows: Vec<u32> = (0..128)
            .filter(|&y| (0..strip.width()).any(|x| strip.get_pixel(x, y).0[0] < 128))
            .collect();
        assert!(ink_rows.iter().all(|&y| (32..96).contains(&y)));
    }

    #[test]
    fn test_raster_lines_follow_label_width() {
        let label = label(64);
        let job = RasterJob::prepare(&label, 12, 128).unwrap();
        assert_eq!(job.raster_lines, label.width());
        assert!(!job.payload.is_empty());
    }
}
