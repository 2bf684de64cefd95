//! TIFF PackBits run-length encoding for raster lines.
//!
//! Each output block starts with a signed header byte:
//!
//! | Header | Meaning |
//! |--------|---------|
//! | 0..=127 | copy the next `header + 1` bytes literally |
//! | -127..=-1 | repeat the next byte `1 - header` times |

/// Longest run or literal block one header byte can describe.
const MAX_BLOCK: usize = 128;

/// Compress one raster line.
///
/// ```
/// use tapeprint::protocol::compression::pack_bits;
///
/// assert_eq!(pack_bits(&[0x00; 16]), vec![0xF1, 0x00]);
/// ```
pub fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_BLOCK + 1);
    let mut i = 0;

    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < MAX_BLOCK && data[i + run] == data[i] {
            run += 1;
        }

        if run >= 2 {
            out.push((1 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        // Literal block ends where the next repeat starts
        let start = i;
        while i < data.len() && i - start < MAX_BLOCK {
            if i + 1 < data.len() && data[i] == data[i + 1] {
                break;
            }
            i += 1;
        }
        let len = i - start;
        out.push((len - 1) as u8);
        out.extend_from_slice(&data[start..i]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpack_bits(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let header = data[i] as i8;
            i += 1;
            if header >= 0 {
                let len = header as usize + 1;
                out.extend_from_slice(&data[i..i + len]);
                i += len;
            } else {
                let count = (1 - header as i16) as usize;
                out.extend(std::iter::repeat_n(data[i], count));
                i += 1;
            }
        }
        out
    }

    #[test]
    fn test_empty_line() {
        assert!(pack_bits(&[]).is_empty());
    }

    #[test]
    fn test_single_byte_is_literal() {
        assert_eq!(pack_bits(&[0x42]), vec![0x00, 0x42]);
    }

    #[test]
    fn test_all_same_line() {
        assert_eq!(pack_bits(&[0xFF; 16]), vec![0xF1, 0xFF]);
    }

    #[test]
    fn test_mixed_line() {
        let line = [0x00, 0x00, 0x00, 0x12, 0x34, 0xFF, 0xFF];
        let packed = pack_bits(&line);
        assert_eq!(packed, vec![0xFE, 0x00, 0x01, 0x12, 0x34, 0xFF, 0xFF]);
        assert_eq!(unpack_bits(&packed), line);
    }

    #[test]
    fn test_long_literal_splits_at_block_limit() {
        let line: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let packed = pack_bits(&line);
        assert_eq!(packed[0], 127);
        assert_eq!(unpack_bits(&packed), line);
    }

    #[test]
    fn test_long_run_splits_at_block_limit() {
        let line = vec![0x55; 200];
        let packed = pack_bits(&line);
        assert_eq!(packed[0] as i8, -127);
        assert_eq!(unpack_bits(&packed), line);
    }
}
