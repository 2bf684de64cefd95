//! # Status Reply
//!
//! The printer answers `ESC i S` with a fixed 32-byte record:
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0..4 | header `0x80 0x20 'B' '0'` |
//! | 4 | model code |
//! | 8 | error information 1 |
//! | 9 | error information 2 |
//! | 10 | media width (mm) |
//! | 11 | media type |
//! | 15 | mode |
//! | 18 | status type |
//! | 19 | phase type |
//! | 22 | notification number |
//! | 24 | tape colour |
//! | 25 | text colour |

use serde::Serialize;

use crate::error::{FaultCode, TapeprintError};

/// Length of a status reply in bytes.
pub const STATUS_LEN: usize = 32;

const HEADER: [u8; 4] = [0x80, 0x20, b'B', b'0'];

const ERROR1_FLAGS: [&str; 8] = [
    "no media",
    "end of media",
    "cutter jam",
    "reserved",
    "printer in use",
    "printer turned off",
    "high-voltage adapter",
    "fan motor error",
];

const ERROR2_FLAGS: [&str; 8] = [
    "replace media",
    "expansion buffer full",
    "communication error",
    "communication buffer full",
    "cover open",
    "overheating",
    "black marking not detected",
    "system error",
];

/// Snapshot of the device as reported by one status reply.
///
/// `model == 0` means nothing answered, `tape_width_mm == 0` means no tape
/// is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceStatus {
    pub model: u8,
    pub tape_width_mm: u8,
    pub error_code1: u8,
    pub error_code2: u8,
    pub media_type: u8,
    pub mode: u8,
    pub status_type: u8,
    pub phase: u8,
    pub notification: u8,
    pub tape_colour: u8,
    pub text_colour: u8,
}

impl DeviceStatus {
    /// Parse a 32-byte status reply.
    pub fn parse(reply: &[u8]) -> Result<Self, TapeprintError> {
        if reply.len() != STATUS_LEN {
            return Err(TapeprintError::StatusRead(format!(
                "expected {} status bytes, got {}",
                STATUS_LEN,
                reply.len()
            )));
        }
        if reply[..4] != HEADER {
            return Err(TapeprintError::StatusRead(format!(
                "unexpected status header {:02X?}",
                &reply[..4]
            )));
        }

        Ok(Self {
            model: reply[4],
            error_code1: reply[8],
            error_code2: reply[9],
            tape_width_mm: reply[10],
            media_type: reply[11],
            mode: reply[15],
            status_type: reply[18],
            phase: reply[19],
            notification: reply[22],
            tape_colour: reply[24],
            text_colour: reply[25],
        })
    }

    /// Encode back into the wire layout (reserved bytes zeroed).
    pub fn to_bytes(&self) -> [u8; STATUS_LEN] {
        let mut reply = [0u8; STATUS_LEN];
        reply[..4].copy_from_slice(&HEADER);
        reply[4] = self.model;
        reply[5] = b'0';
        reply[8] = self.error_code1;
        reply[9] = self.error_code2;
        reply[10] = self.tape_width_mm;
        reply[11] = self.media_type;
        reply[15] = self.mode;
        reply[18] = self.status_type;
        reply[19] = self.phase;
        reply[22] = self.notification;
        reply[24] = self.tape_colour;
        reply[25] = self.text_colour;
        reply
    }

    /// Whether a printer answered at all.
    pub fn is_known_model(&self) -> bool {
        self.model != 0
    }

    pub fn has_tape(&self) -> bool {
        self.tape_width_mm != 0
    }

    /// The first fault byte that is set, error code 1 taking precedence.
    pub fn fault(&self) -> Option<(FaultCode, u8)> {
        if self.error_code1 != 0 {
            Some((FaultCode::Error1, self.error_code1))
        } else if self.error_code2 != 0 {
            Some((FaultCode::Error2, self.error_code2))
        } else {
            None
        }
    }

    /// Human-readable names of every fault bit that is set.
    pub fn fault_descriptions(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for (byte, names) in [(self.error_code1, &ERROR1_FLAGS), (self.error_code2, &ERROR2_FLAGS)] {
            for (bit, name) in names.iter().enumerate() {
                if byte & (1 << bit) != 0 {
                    out.push(*name);
                }
            }
        }
        out
    }
}
