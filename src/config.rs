//! # Configuration
//!
//! [`LabelSettings`] holds the tunable constants of label sizing and batch
//! printing; [`ServerConfig`] the addresses the service binds to.
//!
//! Settings can be loaded from a JSON file; missing fields keep their
//! defaults:
//!
//! ```json
//! { "max_font_size": 180, "refresh_between_copies": true }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TapeprintError;

/// Label sizing and batch behaviour.
///
/// The font size and canvas height rules are proportional to tape width
/// with one hardcoded exception for narrow tape:
///
/// | Tape | Default font size | Canvas height |
/// |------|-------------------|---------------|
/// | none | 32 | 64 px (12 mm assumed) |
/// | 9 mm | 32 | 48 px |
/// | 12 mm | 48 | 64 px |
/// | 24 mm | 96 | 128 px |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    /// Ceiling for requested font sizes (points)
    pub max_font_size: u32,
    /// Font size when no tape is detected
    pub default_font_size: u32,
    /// Font size per millimetre of tape width
    pub font_size_per_mm: u32,
    /// Tape width that gets `narrow_font_size` instead of the linear rule
    pub narrow_tape_mm: u8,
    pub narrow_font_size: u32,
    /// Tape width that spans the full print strip
    pub reference_tape_mm: u8,
    /// Tape width assumed for previews while no tape is detected
    pub fallback_tape_mm: u8,
    /// Height of the strip sent to the print head (px)
    pub strip_height: u32,
    /// Longest label the renderer will draw (px, padding included)
    pub max_label_length_px: u32,
    /// Re-read the status before every copy after the first
    pub refresh_between_copies: bool,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            max_font_size: 240,
            default_font_size: 32,
            font_size_per_mm: 4,
            narrow_tape_mm: 9,
            narrow_font_size: 32,
            reference_tape_mm: 24,
            fallback_tape_mm: 12,
            strip_height: 128,
            // About one metre of tape at 180 dpi
            max_label_length_px: 7000,
            refresh_between_copies: false,
        }
    }
}

impl LabelSettings {
    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TapeprintError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TapeprintError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| {
            TapeprintError::Config(format!("Invalid settings in {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), TapeprintError> {
        if self.max_font_size == 0 {
            return Err(TapeprintError::Config("max_font_size must be positive".into()));
        }
        if self.reference_tape_mm == 0 || self.fallback_tape_mm == 0 {
            return Err(TapeprintError::Config("tape widths must be positive".into()));
        }
        if self.strip_height == 0 {
            return Err(TapeprintError::Config("strip_height must be positive".into()));
        }
        if self.max_label_length_px == 0 {
            return Err(TapeprintError::Config("max_label_length_px must be positive".into()));
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Printer address: a device path or `usb`
    pub device: String,
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_font_size": 120}}"#).unwrap();
        let settings = LabelSettings::load(file.path()).unwrap();
        assert_eq!(settings.max_font_size, 120);
        assert_eq!(settings.strip_height, 128);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            LabelSettings::load(file.path()),
            Err(TapeprintError::Config(_))
        ));
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let settings = LabelSettings {
            max_font_size: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_label_length_rejected() {
        let settings = LabelSettings {
            max_label_length_px: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(TapeprintError::Config(_))));
    }
}
