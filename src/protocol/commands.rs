//! # P-touch Raster Commands
//!
//! Command builders for the raster protocol spoken by Brother P-touch tape
//! printers (PT-P300BT, PT-P710BT, PT-E550W and relatives).
//!
//! ## Escape Sequence Structure
//!
//! Most configuration commands share the `ESC i` prefix followed by a single
//! letter and fixed-size parameters:
//!
//! | Command | Bytes | Purpose |
//! |---------|-------|---------|
//! | Initialize | `ESC @` | clear settings and buffers |
//! | Status request | `ESC i S` | ask for a 32-byte status reply |
//! | Raster mode | `ESC i a 01` | switch to dynamic raster mode |
//! | Print information | `ESC i z n1..n10` | media and raster line count |
//! | Mode | `ESC i M n` | auto cut / mirror |
//! | Advanced mode | `ESC i K n` | half cut, chain, high resolution |
//! | Margin | `ESC i d n1 n2` | feed amount in dots |
//! | Compression | `M n` | 0 = none, 2 = TIFF PackBits |
//! | Raster line | `G n1 n2 data` | one line of print data |
//! | Zero line | `Z` | one blank line |
//! | Print and eject | `SUB` | print, feed and cut |
//!
//! ## Byte Order
//!
//! Multi-byte integers are **little-endian**.

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// SUB (Substitute) - print the buffered page and eject
pub const SUB: u8 = 0x1A;

/// Number of zero bytes that flush any half-received command.
pub const INVALIDATE_LEN: usize = 100;

// ============================================================================
// INITIALIZATION AND STATUS
// ============================================================================

/// # Invalidate (100 × NUL)
///
/// Sent before `ESC @` so a printer left mid-command by an aborted job
/// treats the rest of that command as padding.
pub fn invalidate() -> Vec<u8> {
    vec![0x00; INVALIDATE_LEN]
}

/// # Initialize (ESC @)
///
/// ```
/// use tapeprint::protocol::commands;
///
/// assert_eq!(commands::initialize(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn initialize() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Status Information Request (ESC i S)
///
/// The printer answers with exactly 32 bytes, see [`super::status`].
#[inline]
pub fn request_status() -> Vec<u8> {
    vec![ESC, b'i', b'S']
}

// ============================================================================
// JOB SETUP
// ============================================================================

/// # Switch Dynamic Command Mode to Raster (ESC i a 01)
#[inline]
pub fn raster_mode() -> Vec<u8> {
    vec![ESC, b'i', b'a', 0x01]
}

/// Print information flag: media width field is valid.
const PI_WIDTH: u8 = 0x04;
/// Print information flag: printer recovery always on.
const PI_RECOVER: u8 = 0x80;

/// # Print Information (ESC i z n1..n10)
///
/// | Byte | Meaning |
/// |------|---------|
/// | n1 | valid-field flags |
/// | n2 | media type (0, not validated) |
/// | n3 | media width in mm |
/// | n4 | media length (0 for continuous tape) |
/// | n5..n8 | raster line count, little-endian u32 |
/// | n9 | page index (0 = starting page) |
/// | n10 | fixed 0 |
///
/// ```
/// use tapeprint::protocol::commands;
///
/// let cmd = commands::print_information(12, 300);
/// assert_eq!(&cmd[..3], &[0x1B, b'i', b'z']);
/// assert_eq!(cmd[5], 12);
/// assert_eq!(&cmd[7..11], &[0x2C, 0x01, 0x00, 0x00]);
/// ```
pub fn print_information(tape_width_mm: u8, raster_lines: u32) -> Vec<u8> {
    let mut cmd = vec![ESC, b'i', b'z', PI_WIDTH | PI_RECOVER, 0x00, tape_width_mm, 0x00];
    cmd.extend_from_slice(&raster_lines.to_le_bytes());
    cmd.extend_from_slice(&[0x00, 0x00]);
    cmd
}

/// # Various Mode Settings (ESC i M n)
///
/// - bit 6: auto cut after each label
/// - bit 7: mirror printing
pub fn print_mode(auto_cut: bool, mirror: bool) -> Vec<u8> {
    let mut n = 0u8;
    if auto_cut {
        n |= 1 << 6;
    }
    if mirror {
        n |= 1 << 7;
    }
    vec![ESC, b'i', b'M', n]
}

/// Flags for the advanced mode command (`ESC i K`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtendedMode {
    /// Half cut (backing paper stays whole)
    pub half_cut: bool,
    /// Do not chain: feed and cut after the last label of the job
    pub no_chain_printing: bool,
    /// Special tape, cutting disabled
    pub special_tape: bool,
    /// 180 × 360 dpi instead of 180 × 180
    pub high_resolution: bool,
    /// Keep the print buffer after printing
    pub no_buffer_clearing: bool,
}

impl ExtendedMode {
    /// Encode as the `n` parameter of `ESC i K`.
    pub fn bits(&self) -> u8 {
        let mut n = 0u8;
        if self.half_cut {
            n |= 1 << 2;
        }
        if self.no_chain_printing {
            n |= 1 << 3;
        }
        if self.special_tape {
            n |= 1 << 4;
        }
        if self.high_resolution {
            n |= 1 << 6;
        }
        if self.no_buffer_clearing {
            n |= 1 << 7;
        }
        n
    }
}

/// # Advanced Mode Settings (ESC i K n)
pub fn extended_mode(mode: ExtendedMode) -> Vec<u8> {
    vec![ESC, b'i', b'K', mode.bits()]
}

/// # Specify Margin Amount (ESC i d n1 n2)
///
/// Feed amount in dots before and after the printed area.
pub fn feed_amount(dots: u16) -> Vec<u8> {
    let [lo, hi] = u16_le(dots);
    vec![ESC, b'i', b'd', lo, hi]
}

/// # Select Compression Mode (M n)
///
/// `true` selects TIFF PackBits (n = 2), `false` no compression (n = 0).
#[inline]
pub fn compression(enabled: bool) -> Vec<u8> {
    vec![b'M', if enabled { 0x02 } else { 0x00 }]
}

// ============================================================================
// RASTER DATA
// ============================================================================

/// # Raster Graphics Transfer (G n1 n2 d1..dk)
///
/// `data` is one raster line, compressed or raw depending on the mode
/// selected with [`compression`].
pub fn raster_line(data: &[u8]) -> Vec<u8> {
    let [lo, hi] = u16_le(data.len() as u16);
    let mut cmd = Vec::with_capacity(3 + data.len());
    cmd.push(b'G');
    cmd.push(lo);
    cmd.push(hi);
    cmd.extend_from_slice(data);
    cmd
}

/// # Zero Raster Graphics (Z)
///
/// One blank raster line. Only valid while compression is enabled.
#[inline]
pub fn zero_line() -> Vec<u8> {
    vec![b'Z']
}

// ============================================================================
// PRINTING
// ============================================================================

/// # Print Command with Feeding (SUB)
#[inline]
pub fn print_and_eject() -> Vec<u8> {
    vec![SUB]
}

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use tapeprint::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}
