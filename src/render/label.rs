//! # Label Rendering
//!
//! Turns one line of text into a white canvas with black glyphs, sized to the
//! text and to the height derived from the loaded tape.
//!
//! ## Two Passes
//!
//! ```text
//! 1. measure:  lay the text out with the face → advance width w
//! 2. draw:     canvas (w + PADDING) × height, white
//!              text centred horizontally,
//!              baseline at height/2 + cap_height/2
//! ```
//!
//! Centring on the cap height instead of the full ascent keeps labels with
//! and without descenders at the same optical position.

use std::path::PathBuf;

use image::{GrayImage, Luma};
use tracing::debug;

use super::face::Face;
use crate::error::TapeprintError;

/// Horizontal padding added to the measured text width (px, split evenly).
pub const PADDING_PX: u32 = 40;

/// Everything the renderer needs for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub text: String,
    /// `None` selects the builtin face
    pub font_path: Option<PathBuf>,
    /// Already clamped by the caller
    pub font_size_pt: u32,
    pub canvas_height_px: u32,
    /// Labels wider than this are refused before the canvas is allocated
    pub max_width_px: u32,
}

/// A fully drawn label.
#[derive(Debug, Clone)]
pub struct RenderedLabel {
    image: GrayImage,
    /// Width reported by the measuring pass
    pub text_width: f32,
    pub cap_height: f32,
    /// y coordinate of the text baseline
    pub baseline_y: f32,
}

impl RenderedLabel {
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Baseline that vertically centres capital letters on a canvas.
#[inline]
pub fn baseline_offset(canvas_height: u32, cap_height: f32) -> f32 {
    canvas_height as f32 / 2.0 + cap_height / 2.0
}

/// Render a label.
///
/// Empty text yields a blank canvas of padding width. Text that would not
/// fit in `max_width_px` is a `Render` error. Nothing is returned unless the
/// canvas was drawn completely.
pub fn render(spec: &LabelSpec) -> Result<RenderedLabel, TapeprintError> {
    if spec.canvas_height_px == 0 {
        return Err(TapeprintError::Render("canvas height must be positive".into()));
    }

    let face = Face::load(spec.font_path.as_deref(), spec.font_size_pt)?;

    let text_width = face.measure(&spec.text);
    if !text_width.is_finite() {
        return Err(TapeprintError::Render(format!(
            "could not measure {:?}",
            spec.text
        )));
    }

    let total_width = text_width + PADDING_PX as f32;
    if total_width > spec.max_width_px as f32 {
        return Err(TapeprintError::Render(format!(
            "label is {} px long, limit is {} px",
            total_width.ceil() as u64,
            spec.max_width_px
        )));
    }
    let width = (total_width as u32).max(1);
    let height = spec.canvas_height_px;

    let mut image = GrayImage::from_pixel(width, height, Luma([255]));
    let cap_height = face.cap_height();
    let baseline_y = baseline_offset(height, cap_height);
    // Anchored at the horizontal centre of the padded width
    let left = total_width / 2.0 - text_width / 2.0;
    face.draw(&mut image, &spec.text, left, baseline_y);

    debug!(
        width,
        height,
        text_width,
        cap_height,
        baseline_y,
        builtin = face.is_builtin(),
        "label rendered"
    );

    Ok(RenderedLabel {
        image,
        text_width,
        cap_height,
        baseline_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str, height: u32) -> LabelSpec {
        LabelSpec {
            text: text.to_string(),
            font_path: None,
            font_size_pt: 32,
            canvas_height_px: height,
            max_width_px: 7000,
        }
    }

    #[test]
    fn test_height_matches_canvas_height() {
        for height in [24, 48, 64, 128] {
            for text in ["", "a", "Hello, World", "gjpqy"] {
                let label = render(&spec(text, height)).unwrap();
                assert_eq!(label.height(), height);
            }
        }
    }

    #[test]
    fn test_width_is_measure_plus_padding() {
        let label = render(&spec("Label", 64)).unwrap();
        let face = Face::load(None, 32).unwrap();
        assert_eq!(label.text_width, face.measure("Label"));
        assert_eq!(label.width(), (label.text_width + PADDING_PX as f32) as u32);
    }

    #[test]
    fn test_empty_text_is_blank_padding() {
        let label = render(&spec("", 64)).unwrap();
        assert_eq!(label.width(), PADDING_PX);
        assert!(label.image().pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_baseline_formula() {
        let label = render(&spec("HELLO", 64)).unwrap();
        assert_eq!(label.baseline_y, 64.0 / 2.0 + label.cap_height / 2.0);
        assert_eq!(baseline_offset(100, 20.0), 60.0);
    }

    #[test]
    fn test_text_is_drawn() {
        let label = render(&spec("HI", 64)).unwrap();
        assert!(label.image().pixels().any(|p| p.0[0] < 128));
    }

    #[test]
    fn test_zero_height_rejected() {
        assert!(matches!(
            render(&spec("x", 0)),
            Err(TapeprintError::Render(_))
        ));
    }

    #[test]
    fn test_overlong_label_rejected() {
        let spec = LabelSpec {
            font_size_pt: 240,
            ..spec(&"W".repeat(20_000), 64)
        };
        match render(&spec) {
            Err(TapeprintError::Render(msg)) => assert!(msg.contains("limit is 7000 px")),
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[test]
    fn test_label_at_limit_is_drawn() {
        let face = Face::load(None, 32).unwrap();
        let exact = (face.measure("Edge") + PADDING_PX as f32).ceil() as u32;
        let fits = LabelSpec {
            max_width_px: exact,
            ..spec("Edge", 64)
        };
        assert!(render(&fits).is_ok());

        let too_small = LabelSpec {
            max_width_px: exact - 1,
            ..spec("Edge", 64)
        };
        assert!(matches!(render(&too_small), Err(TapeprintError::Render(_))));
    }

    #[test]
    fn test_bad_font_is_render_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a font").unwrap();
        let spec = LabelSpec {
            font_path: Some(file.path().to_path_buf()),
            ..spec("x", 64)
        };
        assert!(matches!(render(&spec), Err(TapeprintError::Render(_))));
    }
}
