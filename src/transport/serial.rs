//! # Serial / USB Device Transport
//!
//! Talks to the printer through a character device:
//!
//! - Bluetooth SPP bound with `rfcomm bind` (`/dev/rfcomm0`)
//! - USB printer class via the kernel `usblp` driver (`/dev/usb/lp0`)
//!
//! The address `usb` selects the first USB printer.
//!
//! ## TTY Configuration
//!
//! When the device is a TTY it is switched to raw mode so binary raster data
//! passes unmodified:
//!
//! - **No input processing**, including XON/XOFF (0x11/0x13 occur in raster data)
//! - **No output processing**: OPOST off
//! - **8-bit characters**, no parity
//! - **Non-canonical reads** with a 100 ms inter-byte timeout
//!
//! `usblp` devices are not TTYs and are used as-is.
//!
//! ## Chunked Writes
//!
//! Raster payloads are written in 4096-byte chunks with a small delay so the
//! Bluetooth buffer does not overflow.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::link::{ByteLink, Channel};
use super::{Connector, PrinterLink};
use crate::error::TapeprintError;

/// Address alias for the first USB printer.
pub const USB_ALIAS: &str = "usb";

/// Device path the `usb` alias resolves to.
pub const DEFAULT_USB_DEVICE: &str = "/dev/usb/lp0";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// How long to wait for a complete status reply.
const READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause between empty reads while waiting for the reply.
const READ_POLL: Duration = Duration::from_millis(20);

/// Map an address to a device path.
pub fn resolve_address(address: &str) -> PathBuf {
    if address.eq_ignore_ascii_case(USB_ALIAS) {
        PathBuf::from(DEFAULT_USB_DEVICE)
    } else {
        PathBuf::from(address)
    }
}

/// # Serial Printer Channel
///
/// An open read/write handle on the printer device.
pub struct SerialChannel {
    file: Option<File>,
    path: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
    read_timeout: Duration,
}

impl SerialChannel {
    /// Open the device for reading and writing.
    ///
    /// ## Errors
    ///
    /// Returns a connection error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the dialout or lp group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, TapeprintError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                TapeprintError::Connection(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let fd = file.as_raw_fd();
        if unsafe { libc::isatty(fd) } == 1 {
            configure_tty_raw(fd)?;
        }

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            read_timeout: READ_TIMEOUT,
        })
    }

    /// Set the chunk size for large writes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }

    /// Set how long [`Channel::read_exact`] waits for data.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> Result<&mut File, TapeprintError> {
        self.file
            .as_mut()
            .ok_or_else(|| TapeprintError::Connection(format!("{} is closed", self.path.display())))
    }
}

impl Channel for SerialChannel {
    fn write_all(&mut self, data: &[u8]) -> Result<(), TapeprintError> {
        if data.is_empty() {
            return Ok(());
        }
        let chunk_size = self.chunk_size;
        let chunk_delay = self.chunk_delay;
        let file = self.file()?;

        if data.len() <= chunk_size {
            file.write_all(data)
                .map_err(|e| TapeprintError::Connection(format!("Write failed: {}", e)))?;
        } else {
            for chunk in data.chunks(chunk_size) {
                file.write_all(chunk)
                    .map_err(|e| TapeprintError::Connection(format!("Write failed: {}", e)))?;

                if !chunk_delay.is_zero() {
                    thread::sleep(chunk_delay);
                }
            }
        }

        file.flush()
            .map_err(|e| TapeprintError::Connection(format!("Flush failed: {}", e)))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TapeprintError> {
        let deadline = Instant::now() + self.read_timeout;
        let file = self.file()?;
        let mut filled = 0;

        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {}
                Ok(n) => {
                    filled += n;
                    continue;
                }
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
                Err(e) => {
                    return Err(TapeprintError::Connection(format!("Read failed: {}", e)));
                }
            }
            if Instant::now() >= deadline {
                return Err(TapeprintError::Connection(format!(
                    "Timed out after {} of {} bytes",
                    filled,
                    buf.len()
                )));
            }
            thread::sleep(READ_POLL);
        }

        Ok(())
    }

    fn close(&mut self) -> Result<(), TapeprintError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|e| TapeprintError::Connection(format!("Flush on close failed: {}", e)))?;
            debug!(device = %self.path.display(), "closed");
        }
        Ok(())
    }
}

/// Opens [`SerialChannel`]s and wraps them in a [`ByteLink`].
///
/// Every open resets the printer (invalidate + initialize) so a job aborted
/// mid-stream cannot leak into the next one.
#[derive(Debug, Clone, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(&self, address: &str, tape_width_mm: u8) -> Result<Box<dyn PrinterLink>, TapeprintError> {
        let path = resolve_address(address);
        info!(device = %path.display(), tape_width_mm, "opening printer");

        let channel = SerialChannel::open(&path)?;
        let mut link = ByteLink::new(channel, tape_width_mm);
        link.reset()?;
        Ok(Box::new(link))
    }
}

/// Configure a file descriptor for raw TTY mode.
///
/// Disables all input/output processing so binary data passes through
/// unmodified, and sets VMIN=0 / VTIME=1 so reads return after 100 ms of
/// silence instead of blocking forever.
fn configure_tty_raw(fd: i32) -> Result<(), TapeprintError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TapeprintError::Connection(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 1;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TapeprintError::Connection(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_alias() {
        assert_eq!(resolve_address("usb"), PathBuf::from(DEFAULT_USB_DEVICE));
        assert_eq!(resolve_address("USB"), PathBuf::from(DEFAULT_USB_DEVICE));
        assert_eq!(resolve_address("/dev/rfcomm0"), PathBuf::from("/dev/rfcomm0"));
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialChannel::open("/nonexistent/tapeprint0").err().unwrap();
        assert!(matches!(err, TapeprintError::Connection(_)));
        assert!(SerialConnector.open("/nonexistent/tapeprint0", 0).is_err());
    }

    #[test]
    fn test_plain_file_round_trip() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut channel = SerialChannel::open(file.path()).unwrap();
        channel.set_chunk_size(4);
        channel.set_chunk_delay(Duration::ZERO);
        channel.write_all(b"0123456789").unwrap();
        channel.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"0123456789");
    }

    #[test]
    fn test_closed_channel_rejects_writes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut channel = SerialChannel::open(file.path()).unwrap();
        channel.close().unwrap();
        channel.close().unwrap();
        assert!(channel.write_all(b"x").is_err());
    }

    #[test]
    fn test_read_times_out_at_eof() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut channel = SerialChannel::open(file.path()).unwrap();
        channel.set_read_timeout(Duration::from_millis(50));
        let mut buf = [0u8; 32];
        assert!(channel.read_exact(&mut buf).is_err());
    }
}
