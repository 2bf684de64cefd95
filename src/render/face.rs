//! Glyph faces used by the label renderer.
//!
//! - **Outline**: a TTF/OTF file rasterized with ab_glyph, anti-aliased
//! - **Builtin**: the embedded Spleen 12×24 bitmap font, scaled nearest-neighbour
//!
//! Both are sized in points at a fixed 72 DPI, so one point is one pixel of
//! em height. Neither applies hinting, so metrics do not depend on the host.

use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::GrayImage;
use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::TapeprintError;

/// Rendering resolution. At 72 DPI point size equals pixel size.
pub const DPI: f32 = 72.0;

const CELL_W: usize = 12;
const CELL_H: usize = 24;

/// A font bound to a size, able to measure and draw a line of text.
pub enum Face {
    Outline(OutlineFace),
    Builtin(BuiltinFace),
}

impl Face {
    /// Load `font_path`, or the builtin face when no path is given.
    pub fn load(font_path: Option<&Path>, size_pt: u32) -> Result<Self, TapeprintError> {
        match font_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    TapeprintError::Render(format!("Could not read font {}: {}", path.display(), e))
                })?;
                Self::from_bytes(bytes, size_pt)
            }
            None => Ok(Face::Builtin(BuiltinFace::new(size_pt)?)),
        }
    }

    /// Parse TTF/OTF data.
    pub fn from_bytes(bytes: Vec<u8>, size_pt: u32) -> Result<Self, TapeprintError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| TapeprintError::Render(format!("Could not parse font: {}", e)))?;
        Ok(Face::Outline(OutlineFace::new(font, size_pt)?))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin(_))
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&self, text: &str) -> f32 {
        match self {
            Face::Outline(face) => face.layout(text).1,
            Face::Builtin(face) => face.measure(text),
        }
    }

    /// Height of a capital letter above the baseline, in pixels.
    pub fn cap_height(&self) -> f32 {
        match self {
            Face::Outline(face) => face.cap_height(),
            Face::Builtin(face) => face.cap_height(),
        }
    }

    /// Draw `text` in black with its left edge at `x` and baseline at `baseline`.
    pub fn draw(&self, canvas: &mut GrayImage, text: &str, x: f32, baseline: f32) {
        match self {
            Face::Outline(face) => face.draw(canvas, text, x, baseline),
            Face::Builtin(face) => face.draw(canvas, text, x, baseline),
        }
    }
}

/// Darken a pixel by `coverage` (0.0 = untouched, 1.0 = black).
fn darken(canvas: &mut GrayImage, x: i32, y: i32, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let value = ((1.0 - coverage.clamp(0.0, 1.0)) * 255.0).round() as u8;
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    pixel.0[0] = pixel.0[0].min(value);
}

// ============================================================================
// OUTLINE FACE
// ============================================================================

pub struct OutlineFace {
    font: FontArc,
    scale: PxScale,
}

impl OutlineFace {
    fn new(font: FontArc, size_pt: u32) -> Result<Self, TapeprintError> {
        let units_per_em = font
            .units_per_em()
            .ok_or_else(|| TapeprintError::Render("Font has no units-per-em".into()))?;
        // ab_glyph scales by ascent - descent; convert from em size.
        let px_per_em = size_pt as f32 * DPI / 72.0;
        let scale = PxScale::from(px_per_em * font.height_unscaled() / units_per_em);
        Ok(Self { font, scale })
    }

    fn layout(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars().filter(|c| !c.is_control()) {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        (glyphs, caret)
    }

    fn cap_height(&self) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        match self.font.outline(self.font.glyph_id('H')) {
            // Unscaled bounds are y-up; one of min.y/max.y holds the top of the H
            Some(outline) => outline.bounds.min.y.max(outline.bounds.max.y) * scaled.v_scale_factor(),
            None => scaled.ascent() * 0.7,
        }
    }

    fn draw(&self, canvas: &mut GrayImage, text: &str, x: f32, baseline: f32) {
        let (glyphs, _) = self.layout(text);
        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(self.scale, point(x + offset, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let gx = px as i32 + bounds.min.x as i32;
                    let gy = py as i32 + bounds.min.y as i32;
                    darken(canvas, gx, gy, coverage);
                });
            }
        }
    }
}

// ============================================================================
// BUILTIN FACE
// ============================================================================

/// Spleen 12×24 scaled so the 24-row cell is one em.
pub struct BuiltinFace {
    scale: f32,
    /// Cell row just below the capital H
    baseline_row: usize,
    /// Rows covered by the capital H
    cap_rows: usize,
}

impl BuiltinFace {
    fn new(size_pt: u32) -> Result<Self, TapeprintError> {
        let h = spleen_glyph('H')
            .ok_or_else(|| TapeprintError::Render("Builtin font has no 'H' glyph".into()))?;
        let rows: Vec<usize> = (0..CELL_H)
            .filter(|&y| h[y * CELL_W..(y + 1) * CELL_W].iter().any(|&on| on))
            .collect();
        let (top, bottom) = match (rows.first(), rows.last()) {
            (Some(&top), Some(&bottom)) => (top, bottom),
            _ => return Err(TapeprintError::Render("Builtin 'H' glyph is empty".into())),
        };

        Ok(Self {
            scale: size_pt as f32 * DPI / 72.0 / CELL_H as f32,
            baseline_row: bottom + 1,
            cap_rows: bottom - top + 1,
        })
    }

    fn advance(&self) -> f32 {
        CELL_W as f32 * self.scale
    }

    fn measure(&self, text: &str) -> f32 {
        text.chars().filter(|c| !c.is_control()).count() as f32 * self.advance()
    }

    fn cap_height(&self) -> f32 {
        self.cap_rows as f32 * self.scale
    }

    fn draw(&self, canvas: &mut GrayImage, text: &str, x: f32, baseline: f32) {
        if self.scale <= 0.0 {
            return;
        }
        let top = baseline - self.baseline_row as f32 * self.scale;
        let width = (CELL_W as f32 * self.scale).ceil() as usize;
        let height = (CELL_H as f32 * self.scale).ceil() as usize;

        for (i, ch) in text.chars().filter(|c| !c.is_control()).enumerate() {
            let cells = spleen_glyph(ch).unwrap_or_else(box_glyph);
            let left = x + i as f32 * self.advance();

            for dy in 0..height {
                let sy = ((dy as f32 / self.scale) as usize).min(CELL_H - 1);
                for dx in 0..width {
                    let sx = ((dx as f32 / self.scale) as usize).min(CELL_W - 1);
                    if cells[sy * CELL_W + sx] {
                        darken(canvas, (left + dx as f32) as i32, (top + dy as f32) as i32, 1.0);
                    }
                }
            }
        }
    }
}

/// Rasterize one character from Spleen 12×24.
fn spleen_glyph(ch: char) -> Option<Vec<bool>> {
    let mut spleen = PSF2Font::new(FONT_12X24).ok()?;
    let utf8_bytes = ch.to_string();
    let glyph = spleen.glyph_for_utf8(utf8_bytes.as_bytes())?;

    let mut cells = vec![false; CELL_W * CELL_H];
    for (row_y, row) in glyph.enumerate() {
        for (col_x, on) in row.enumerate() {
            if row_y < CELL_H && col_x < CELL_W {
                cells[row_y * CELL_W + col_x] = on;
            }
        }
    }
    Some(cells)
}

/// Box outline for characters the builtin font lacks.
fn box_glyph() -> Vec<bool> {
    let mut cells = vec![false; CELL_W * CELL_H];
    for x in 1..CELL_W - 1 {
        cells[4 * CELL_W + x] = true;
        cells[(CELL_H - 5) * CELL_W + x] = true;
    }
    for y in 4..CELL_H - 4 {
        cells[y * CELL_W + 1] = true;
        cells[y * CELL_W + CELL_W - 2] = true;
    }
    cells
}
