//! # Rendering Module
//!
//! Text → bitmap conversion, independent of the printer.
//!
//! ## Modules
//!
//! - [`face`]: TTF faces via ab_glyph and the builtin Spleen face
//! - [`label`]: The two-pass label renderer
//! - [`sizing`]: Font size and canvas height from tape width
//!
//! ## Usage Example
//!
//! ```
//! use tapeprint::config::LabelSettings;
//! use tapeprint::render::{self, LabelSpec, sizing};
//!
//! let settings = LabelSettings::default();
//! let spec = LabelSpec {
//!     text: "Cables".to_string(),
//!     font_path: None,
//!     font_size_pt: sizing::default_font_size(12, &settings),
//!     canvas_height_px: sizing::canvas_height(12, &settings),
//!     max_width_px: settings.max_label_length_px,
//! };
//! let label = render::render(&spec).unwrap();
//! assert_eq!(label.height(), 64);
//! ```

pub mod face;
pub mod label;
pub mod sizing;

pub use label::{LabelSpec, PADDING_PX, RenderedLabel, render};
