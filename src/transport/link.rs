//! Command encoding on top of a byte channel.

use tracing::trace;

use super::PrinterLink;
use crate::error::TapeprintError;
use crate::protocol::status::STATUS_LEN;
use crate::protocol::{DeviceStatus, ExtendedMode, commands};

/// A bidirectional byte pipe to the printer.
pub trait Channel: Send {
    fn write_all(&mut self, data: &[u8]) -> Result<(), TapeprintError>;
    /// Fill `buf` completely or fail.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TapeprintError>;
    fn close(&mut self) -> Result<(), TapeprintError> {
        Ok(())
    }
}

/// [`PrinterLink`] that encodes each command with [`commands`] and writes it
/// to a [`Channel`].
pub struct ByteLink<C: Channel> {
    channel: C,
    tape_width_mm: u8,
}

impl<C: Channel> ByteLink<C> {
    pub fn new(channel: C, tape_width_mm: u8) -> Self {
        Self {
            channel,
            tape_width_mm,
        }
    }

    pub fn tape_width_mm(&self) -> u8 {
        self.tape_width_mm
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn send(&mut self, what: &str, data: &[u8]) -> Result<(), TapeprintError> {
        trace!(command = what, bytes = data.len(), "write");
        self.channel.write_all(data)
    }
}

impl<C: Channel> PrinterLink for ByteLink<C> {
    fn request_status(&mut self) -> Result<(), TapeprintError> {
        self.send("status request", &commands::request_status())
    }

    fn read_status(&mut self) -> Result<DeviceStatus, TapeprintError> {
        let mut reply = [0u8; STATUS_LEN];
        self.channel
            .read_exact(&mut reply)
            .map_err(|e| TapeprintError::StatusRead(e.to_string()))?;
        DeviceStatus::parse(&reply)
    }

    fn set_print_property(&mut self, raster_lines: u32) -> Result<(), TapeprintError> {
        let cmd = commands::print_information(self.tape_width_mm, raster_lines);
        self.send("print information", &cmd)
    }

    fn set_raster_mode(&mut self) -> Result<(), TapeprintError> {
        self.send("raster mode", &commands::raster_mode())
    }

    fn set_feed_amount(&mut self, dots: u16) -> Result<(), TapeprintError> {
        self.send("feed amount", &commands::feed_amount(dots))
    }

    fn set_compression_mode_enabled(&mut self, enabled: bool) -> Result<(), TapeprintError> {
        self.send("compression", &commands::compression(enabled))
    }

    fn set_print_mode(&mut self, auto_cut: bool, mirror: bool) -> Result<(), TapeprintError> {
        self.send("print mode", &commands::print_mode(auto_cut, mirror))
    }

    fn set_extended_mode(&mut self, mode: ExtendedMode) -> Result<(), TapeprintError> {
        self.send("extended mode", &commands::extended_mode(mode))
    }

    fn send_image(&mut self, payload: &[u8]) -> Result<(), TapeprintError> {
        self.send("raster data", payload)
    }

    fn print_and_eject(&mut self) -> Result<(), TapeprintError> {
        self.send("print and eject", &commands::print_and_eject())
    }

    fn reset(&mut self) -> Result<(), TapeprintError> {
        let mut data = commands::invalidate();
        data.extend(commands::initialize());
        self.send("reset", &data)
    }

    fn close(&mut self) -> Result<(), TapeprintError> {
        self.channel.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct MemoryChannel {
        written: Vec<u8>,
        reply: Vec<u8>,
    }

    impl Channel for MemoryChannel {
        fn write_all(&mut self, data: &[u8]) -> Result<(), TapeprintError> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TapeprintError> {
            if self.reply.len() < buf.len() {
                return Err(TapeprintError::Connection("read timed out".into()));
            }
            let rest = self.reply.split_off(buf.len());
            buf.copy_from_slice(&self.reply);
            self.reply = rest;
            Ok(())
        }
    }

    #[test]
    fn test_print_property_uses_open_width() {
        let mut link = ByteLink::new(MemoryChannel::default(), 12);
        link.set_print_property(90).unwrap();
        assert_eq!(link.channel().written, commands::print_information(12, 90));
    }

    #[test]
    fn test_status_round_trip() {
        let status = DeviceStatus {
            model: 0x71,
            tape_width_mm: 24,
            ..Default::default()
        };
        let channel = MemoryChannel {
            reply: status.to_bytes().to_vec(),
            ..Default::default()
        };
        let mut link = ByteLink::new(channel, 0);
        link.request_status().unwrap();
        assert_eq!(link.read_status().unwrap(), status);
        assert_eq!(link.channel().written, vec![0x1B, b'i', b'S']);
    }

    #[test]
    fn test_missing_reply_is_status_error() {
        let mut link = ByteLink::new(MemoryChannel::default(), 0);
        assert!(matches!(
            link.read_status(),
            Err(TapeprintError::StatusRead(_))
        ));
    }

    #[test]
    fn test_reset_invalidates_then_initializes() {
        let mut link = ByteLink::new(MemoryChannel::default(), 0);
        link.reset().unwrap();
        let written = &link.channel().written;
        assert_eq!(written.len(), 102);
        assert_eq!(&written[100..], &[0x1B, 0x40]);
    }
}
