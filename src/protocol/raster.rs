//! # Raster Packing
//!
//! Converts a print strip into the printer's native raster lines.
//!
//! ## Geometry
//!
//! The print head has 128 pins across the tape. The strip is laid out
//! horizontally, so every bitmap **column** becomes one raster line and every
//! bitmap **row** drives one pin:
//!
//! ```text
//!  strip (W × 128)                 raster stream
//!  x →                             line 0: pins 0..127 of column 0
//!  ┌──────────────────┐            line 1: pins 0..127 of column 1
//!  │      LABEL       │  ───────►  ...
//!  └──────────────────┘            line W-1
//! ```
//!
//! Narrow tapes only sit under a centred window of pins; pixels outside that
//! window are dropped so nothing is printed onto the backing.
//!
//! ## Bit Packing
//!
//! 16 bytes per line, MSB first, 1 = black.

use image::GrayImage;

use super::commands;
use super::compression::pack_bits;
use crate::error::TapeprintError;

/// Pins on the print head.
pub const HEAD_PINS: u32 = 128;

/// Bytes per uncompressed raster line.
pub const LINE_BYTES: usize = (HEAD_PINS / 8) as usize;

/// Luma values below this print as black.
const BLACK_THRESHOLD: u8 = 128;

/// Printable pin window for one tape width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeGeometry {
    pub tape_width_mm: u8,
    /// Number of pins over the tape
    pub pins: u32,
    /// First pin over the tape
    pub offset: u32,
}

/// Look up the pin window for a tape width.
///
/// 3.5 mm tape reports itself as 4 mm.
pub fn tape_geometry(tape_width_mm: u8) -> Option<TapeGeometry> {
    let pins = match tape_width_mm {
        4 => 24,
        6 => 32,
        9 => 50,
        12 => 70,
        18 => 112,
        24 => 128,
        _ => return None,
    };
    Some(TapeGeometry {
        tape_width_mm,
        pins,
        offset: (HEAD_PINS - pins) / 2,
    })
}

/// Pack a 128-row print strip into raw raster lines.
///
/// Returns the packed bytes and the stride (bytes per raster line); the
/// number of lines is `data.len() / stride`.
pub fn load_raw_image(strip: &GrayImage, tape_width_mm: u8) -> Result<(Vec<u8>, usize), TapeprintError> {
    if strip.height() != HEAD_PINS {
        return Err(TapeprintError::Encode(format!(
            "print strip must be {} px high, got {}",
            HEAD_PINS,
            strip.height()
        )));
    }
    let geometry = tape_geometry(tape_width_mm).ok_or_else(|| {
        TapeprintError::Encode(format!("unsupported tape width {} mm", tape_width_mm))
    })?;

    let lines = strip.width() as usize;
    let mut data = vec![0u8; lines * LINE_BYTES];

    for x in 0..strip.width() {
        let line = &mut data[x as usize * LINE_BYTES..(x as usize + 1) * LINE_BYTES];
        for pin in geometry.offset..geometry.offset + geometry.pins {
            if strip.get_pixel(x, pin).0[0] < BLACK_THRESHOLD {
                line[(pin / 8) as usize] |= 0x80 >> (pin % 8);
            }
        }
    }

    Ok((data, LINE_BYTES))
}

/// Turn packed raster lines into the `G`/`Z` command stream.
///
/// With `compressed` set each line is PackBits-encoded and blank lines
/// collapse to a single `Z`.
pub fn encode_lines(data: &[u8], bytes_per_row: usize, compressed: bool) -> Result<Vec<u8>, TapeprintError> {
    if bytes_per_row == 0 || data.len() % bytes_per_row != 0 {
        return Err(TapeprintError::Encode(format!(
            "{} bytes is not a whole number of {}-byte lines",
            data.len(),
            bytes_per_row
        )));
    }

    let mut out = Vec::with_capacity(data.len() / 2);
    for line in data.chunks(bytes_per_row) {
        if !compressed {
            out.extend(commands::raster_line(line));
        } else if line.iter().all(|&b| b == 0) {
            out.extend(commands::zero_line());
        } else {
            out.extend(commands::raster_line(&pack_bits(line)));
        }
    }
    Ok(out)
}

/// PackBits-compress packed raster lines into a ready-to-send payload.
pub fn compress_image(data: &[u8], bytes_per_row: usize) -> Result<Vec<u8>, TapeprintError> {
    encode_lines(data, bytes_per_row, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white_strip(width: u32) -> GrayImage {
        GrayImage::from_pixel(width, HEAD_PINS, Luma([255]))
    }

    #[test]
    fn test_geometry_is_centred() {
        let g = tape_geometry(12).unwrap();
        assert_eq!(g.pins, 70);
        assert_eq!(g.offset, 29);
        assert_eq!(tape_geometry(24).unwrap().offset, 0);
        assert!(tape_geometry(0).is_none());
        assert!(tape_geometry(36).is_none());
    }

    #[test]
    fn test_lines_follow_columns() {
        let mut strip = white_strip(5);
        strip.put_pixel(2, 64, Luma([0]));
        let (data, stride) = load_raw_image(&strip, 24).unwrap();
        assert_eq!(stride, LINE_BYTES);
        assert_eq!(data.len() / stride, 5);
        assert_eq!(data[2 * LINE_BYTES + 8], 0x80);
        assert_eq!(data.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_pins_outside_tape_are_cleared() {
        let strip = GrayImage::from_pixel(1, HEAD_PINS, Luma([0]));
        let (data, _) = load_raw_image(&strip, 12).unwrap();
        let set: u32 = data.iter().map(|b| b.count_ones()).sum();
        assert_eq!(set, 70);
        assert_eq!(data[0], 0x00);
        assert_eq!(data[15], 0x00);
    }

    #[test]
    fn test_rejects_wrong_strip_height() {
        let strip = GrayImage::from_pixel(4, 64, Luma([255]));
        assert!(matches!(
            load_raw_image(&strip, 12),
            Err(TapeprintError::Encode(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_tape() {
        assert!(load_raw_image(&white_strip(4), 0).is_err());
    }

    #[test]
    fn test_compress_blank_lines_to_zero() {
        let data = vec![0u8; LINE_BYTES * 3];
        assert_eq!(compress_image(&data, LINE_BYTES).unwrap(), b"ZZZ".to_vec());
    }

    #[test]
    fn test_compress_line_header() {
        let mut data = vec![0u8; LINE_BYTES];
        data[0] = 0xFF;
        let payload = compress_image(&data, LINE_BYTES).unwrap();
        assert_eq!(payload, vec![b'G', 4, 0, 0x00, 0xFF, 0xF2, 0x00]);
    }

    #[test]
    fn test_uncompressed_keeps_blank_lines() {
        let data = vec![0u8; LINE_BYTES];
        let payload = encode_lines(&data, LINE_BYTES, false).unwrap();
        assert_eq!(payload.len(), 3 + LINE_BYTES);
    }

    #[test]
    fn test_rejects_partial_line() {
        assert!(compress_image(&[0u8; 17], LINE_BYTES).is_err());
        assert!(compress_image(&[0u8; 16], 0).is_err());
    }
}
