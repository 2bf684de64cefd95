//! Tape-width-derived sizing for labels.

use crate::config::LabelSettings;

/// Default font size for the loaded tape.
///
/// Proportional to tape width, except the narrow tape which gets its own
/// size. 0 (no tape) uses the configured default.
pub fn default_font_size(tape_width_mm: u8, settings: &LabelSettings) -> u32 {
    match tape_width_mm {
        0 => settings.default_font_size,
        w if w == settings.narrow_tape_mm => settings.narrow_font_size,
        w => settings.font_size_per_mm * w as u32,
    }
}

/// Height of the rendered label for the loaded tape.
///
/// The reference tape spans the whole print strip; narrower tapes get a
/// proportional share. With no tape the fallback width is assumed.
pub fn canvas_height(tape_width_mm: u8, settings: &LabelSettings) -> u32 {
    let width = if tape_width_mm == 0 {
        settings.fallback_tape_mm
    } else {
        tape_width_mm
    };
    (settings.strip_height * width as u32 / settings.reference_tape_mm as u32).max(1)
}

/// Resolve a requested font size.
///
/// Missing or unparsable values fall back to `default`; values above the
/// ceiling are clamped to it. The result is at least 1.
pub fn resolve_font_size(requested: Option<&str>, default: u32, settings: &LabelSettings) -> u32 {
    let size = requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(default as i64);
    size.clamp(1, settings.max_font_size as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font_sizes() {
        let settings = LabelSettings::default();
        assert_eq!(default_font_size(0, &settings), 32);
        assert_eq!(default_font_size(9, &settings), 32);
        assert_eq!(default_font_size(12, &settings), 48);
        assert_eq!(default_font_size(18, &settings), 72);
        assert_eq!(default_font_size(24, &settings), 96);
    }

    #[test]
    fn test_canvas_heights() {
        let settings = LabelSettings::default();
        assert_eq!(canvas_height(0, &settings), 64);
        assert_eq!(canvas_height(6, &settings), 32);
        assert_eq!(canvas_height(12, &settings), 64);
        assert_eq!(canvas_height(24, &settings), 128);
    }

    #[test]
    fn test_resolve_font_size() {
        let settings = LabelSettings::default();
        assert_eq!(resolve_font_size(None, 48, &settings), 48);
        assert_eq!(resolve_font_size(Some(""), 48, &settings), 48);
        assert_eq!(resolve_font_size(Some("abc"), 48, &settings), 48);
        assert_eq!(resolve_font_size(Some(" 60 "), 48, &settings), 60);
        assert_eq!(resolve_font_size(Some("999"), 48, &settings), 240);
        assert_eq!(resolve_font_size(Some("-5"), 48, &settings), 1);
    }
}
