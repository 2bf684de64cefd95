//! # Label Preview
//!
//! Encodes a [`RenderedLabel`] for display. The preview is made from the same
//! bitmap that is sent to the printer, so what the browser shows is what
//! comes out of the tape.
//!
//! ## Example
//!
//! ```
//! use tapeprint::preview;
//! use tapeprint::render::{self, LabelSpec};
//!
//! let label = render::render(&LabelSpec {
//!     text: "Shelf 3".to_string(),
//!     font_path: None,
//!     font_size_pt: 32,
//!     canvas_height_px: 64,
//!     max_width_px: 7000,
//! })
//! .unwrap();
//!
//! let url = preview::to_data_url(&label).unwrap();
//! assert!(url.starts_with("data:image/png;base64,"));
//! ```

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::TapeprintError;
use crate::render::RenderedLabel;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode the label as PNG.
pub fn to_png(label: &RenderedLabel) -> Result<Vec<u8>, TapeprintError> {
    let mut png_bytes = Vec::new();
    label
        .image()
        .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| TapeprintError::Encode(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

/// Encode the label as an inline `data:` URL for an `<img src>`.
pub fn to_data_url(label: &RenderedLabel) -> Result<String, TapeprintError> {
    let png = to_png(label)?;
    Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{LabelSpec, render};

    fn label() -> RenderedLabel {
        render(&LabelSpec {
            text: "Preview".into(),
            font_path: None,
            font_size_pt: 32,
            canvas_height_px: 64,
            max_width_px: 7000,
        })
        .unwrap()
    }

    #[test]
    fn test_png_decodes_to_same_pixels() {
        let label = label();
        let png = to_png(&label).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (label.width(), label.height()));
        assert_eq!(decoded.as_raw(), label.image().as_raw());
    }

    #[test]
    fn test_data_url_carries_png() {
        let label = label();
        let url = to_data_url(&label).unwrap();
        let encoded = url.strip_prefix(DATA_URL_PREFIX).unwrap();
        let png = STANDARD.decode(encoded).unwrap();
        assert_eq!(png, to_png(&label).unwrap());
    }
}
