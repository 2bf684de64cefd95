//! # Error Types
//!
//! This module defines the error taxonomy shared by the session, rendering,
//! transmission and orchestration layers.
//!
//! | Variant | Recovery |
//! |---------|----------|
//! | `Connection` | session reverts to disconnected, next request reconnects |
//! | `StatusRead` | same as `Connection` |
//! | `DeviceFault` | session stays connected but is not print-eligible |
//! | `Render` | local to the request, session untouched |
//! | `Encode` | same as `Render` |
//! | `ProtocolSequence` | batch aborted, session must reconnect |
//! | `NotReady` | rejected before any device I/O |

use std::fmt;

use thiserror::Error;

use crate::transmit::SendStep;

/// Which of the two status fault bytes reported a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    Error1,
    Error2,
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCode::Error1 => f.write_str("error1"),
            FaultCode::Error2 => f.write_str("error2"),
        }
    }
}

/// Main error type for tapeprint operations
#[derive(Debug, Error)]
pub enum TapeprintError {
    /// Transport open/close/write failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Status request or reply failure after a successful open
    #[error("Status read error: {0}")]
    StatusRead(String),

    /// A valid status reply carried a nonzero fault byte
    #[error("Printer {code} state: {value}")]
    DeviceFault { code: FaultCode, value: u8 },

    /// Font loading or glyph layout failure
    #[error("Render error: {0}")]
    Render(String),

    /// Bitmap could not be packed into raster lines or a PNG
    #[error("Raster encoding error: {0}")]
    Encode(String),

    /// A raster transmission step failed; the device is in an unknown mode
    #[error("Print sequence failed at {step}: {source}")]
    ProtocolSequence {
        step: SendStep,
        source: Box<TapeprintError>,
    },

    /// Printing refused before touching the device
    #[error("Printer not ready: {0}")]
    NotReady(String),

    /// Invalid settings or arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers that only need to branch on the
/// recovery policy (HTTP status codes, CLI exit messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    StatusRead,
    DeviceFault,
    Render,
    ProtocolSequence,
    NotReady,
    Config,
}

impl TapeprintError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TapeprintError::Connection(_) | TapeprintError::Io(_) => ErrorKind::Connection,
            TapeprintError::StatusRead(_) => ErrorKind::StatusRead,
            TapeprintError::DeviceFault { .. } => ErrorKind::DeviceFault,
            TapeprintError::Render(_) | TapeprintError::Encode(_) => ErrorKind::Render,
            TapeprintError::ProtocolSequence { .. } => ErrorKind::ProtocolSequence,
            TapeprintError::NotReady(_) => ErrorKind::NotReady,
            TapeprintError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the session must be torn down and reopened after this error.
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connection | ErrorKind::StatusRead | ErrorKind::ProtocolSequence
        )
    }

    /// Wrap this error as the failure of one raster transmission step.
    pub fn at_step(self, step: SendStep) -> Self {
        TapeprintError::ProtocolSequence {
            step,
            source: Box::new(self),
        }
    }

    /// The step a protocol sequence failure happened at, if any.
    pub fn failed_step(&self) -> Option<SendStep> {
        match self {
            TapeprintError::ProtocolSequence { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_message_names_code() {
        let err = TapeprintError::DeviceFault {
            code: FaultCode::Error2,
            value: 16,
        };
        assert_eq!(err.to_string(), "Printer error2 state: 16");
        assert_eq!(err.kind(), ErrorKind::DeviceFault);
        assert!(!err.requires_reconnect());
    }

    #[test]
    fn test_at_step_keeps_source() {
        let err = TapeprintError::Connection("broken pipe".into()).at_step(SendStep::Image);
        assert_eq!(err.failed_step(), Some(SendStep::Image));
        assert_eq!(err.kind(), ErrorKind::ProtocolSequence);
        assert!(err.requires_reconnect());
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_encode_does_not_force_reconnect() {
        let err = TapeprintError::Encode("unsupported tape width 36 mm".into());
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(!err.requires_reconnect());
    }

    #[test]
    fn test_io_counts_as_connection() {
        let err: TapeprintError = std::io::Error::other("gone").into();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
