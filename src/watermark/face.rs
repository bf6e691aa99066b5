//! Font faces used to measure and draw the watermark text.
//!
//! The renderer only needs two things from a font: the pixel extent of a
//! string and a way to rasterize it onto a canvas. [`TextFace`] captures that
//! so the production TrueType face can be swapped for the deterministic
//! [`BlockFace`] in tests.
//!
//! Metrics follow the usual "text box at the origin" convention: the string
//! is laid out with the top of the line at `y = 0` and the first pen position
//! at `x = 0`, and the reported bounds are the right and bottom edges of the
//! inked area. Drawing at `(x, y)` therefore inks the rectangle ending at
//! `(x + width, y + height)`.

use super::compositor::blend_pixels;
use super::position::PlacementPosition;
use super::FontError;
use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Pixel extent of a string drawn at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBounds {
    pub width: u32,
    pub height: u32,
}

/// A loaded font at a fixed size.
pub trait TextFace: Send + Sync {
    /// Right and bottom edge of `text` when drawn at `(0, 0)`.
    fn measure(&self, text: &str) -> TextBounds;

    /// Rasterize `text` onto `canvas` with its box starting at `origin`.
    ///
    /// Anything outside the canvas is clipped.
    fn draw(&self, canvas: &mut RgbaImage, origin: PlacementPosition, text: &str, color: Rgba<u8>);
}

/// TrueType/OpenType face backed by `ab_glyph`.
pub struct TrueTypeFace {
    font: FontVec,
    scale: PxScale,
    origin: String,
}

impl std::fmt::Debug for TrueTypeFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFace")
            .field("origin", &self.origin)
            .field("scale", &(self.scale.x, self.scale.y))
            .finish()
    }
}

impl TrueTypeFace {
    /// Load a font file and size it to `size` pixels per em.
    pub fn from_file(path: impl AsRef<Path>, size: f32) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data, size, path.display().to_string())
    }

    /// Build a face from font bytes already in memory.
    ///
    /// `origin` only labels the font in errors and logs.
    pub fn from_bytes(
        data: Vec<u8>,
        size: f32,
        origin: impl Into<String>,
    ) -> Result<Self, FontError> {
        let origin = origin.into();
        if !size.is_finite() || size <= 0.0 {
            return Err(FontError::InvalidSize { size });
        }

        let font = FontVec::try_from_vec(data).map_err(|e| FontError::Parse {
            origin: origin.clone(),
            message: e.to_string(),
        })?;
        let scale = em_scale(&font, size);

        Ok(Self {
            font,
            scale,
            origin,
        })
    }

    /// Lay out `text` on one line, top of the line at `(x, y)`.
    fn layout(&self, text: &str, x: f32, y: f32) -> (Vec<Glyph>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y + scaled.ascent();

        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor_x = x;
        let mut prev: Option<ab_glyph::GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor_x += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, point(cursor_x, baseline)));
            cursor_x += scaled.h_advance(id);
            prev = Some(id);
        }

        (glyphs, cursor_x - x)
    }
}

/// ab_glyph scales by line height; configured sizes are pixels per em.
fn em_scale(font: &FontVec, px_per_em: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(px_per_em * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(px_per_em),
    }
}

impl TextFace for TrueTypeFace {
    fn measure(&self, text: &str) -> TextBounds {
        if text.is_empty() {
            return TextBounds::default();
        }

        let (glyphs, advance) = self.layout(text, 0.0, 0.0);
        let mut right = 0.0f32;
        let mut bottom = 0.0f32;
        let mut inked = false;

        for glyph in glyphs {
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                right = right.max(bounds.max.x);
                bottom = bottom.max(bounds.max.y);
                inked = true;
            }
        }

        if !inked {
            // Whitespace only: fall back to pen advance and line height.
            let scaled = self.font.as_scaled(self.scale);
            right = advance;
            bottom = scaled.height();
        }

        TextBounds {
            width: right.max(0.0).ceil() as u32,
            height: bottom.max(0.0).ceil() as u32,
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: PlacementPosition, text: &str, color: Rgba<u8>) {
        let (width, height) = (canvas.width() as i64, canvas.height() as i64);
        let (glyphs, _) = self.layout(text, origin.x as f32, origin.y as f32);

        for glyph in glyphs {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x as i64 + i64::from(px);
                let y = bounds.min.y as i64 + i64::from(py);
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }

                let alpha = (coverage.clamp(0.0, 1.0) * f32::from(color[3])).round() as u8;
                if alpha == 0 {
                    return;
                }
                let ink = Rgba([color[0], color[1], color[2], alpha]);
                let existing = *canvas.get_pixel(x as u32, y as u32);
                canvas.put_pixel(x as u32, y as u32, blend_pixels(existing, ink));
            });
        }
    }
}

/// Monospaced face that draws every non-whitespace character as a solid
/// `glyph_width` x `glyph_height` block.
///
/// Its metrics are exact and font-file independent, which makes placement
/// and compositing checkable pixel by pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFace {
    pub glyph_width: u32,
    pub glyph_height: u32,
}

impl BlockFace {
    pub fn new(glyph_width: u32, glyph_height: u32) -> Self {
        Self {
            glyph_width,
            glyph_height,
        }
    }
}

impl TextFace for BlockFace {
    fn measure(&self, text: &str) -> TextBounds {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return TextBounds::default();
        }
        TextBounds {
            width: chars.saturating_mul(self.glyph_width),
            height: self.glyph_height,
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: PlacementPosition, text: &str, color: Rgba<u8>) {
        let (width, height) = (canvas.width() as i64, canvas.height() as i64);
        let top = i64::from(origin.y).max(0);
        let bottom = (i64::from(origin.y) + i64::from(self.glyph_height)).min(height);

        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let glyph_left = i64::from(origin.x) + i as i64 * i64::from(self.glyph_width);
            let left = glyph_left.max(0);
            let right = (glyph_left + i64::from(self.glyph_width)).min(width);

            for y in top..bottom {
                for x in left..right {
                    let existing = *canvas.get_pixel(x as u32, y as u32);
                    canvas.put_pixel(x as u32, y as u32, blend_pixels(existing, color));
                }
            }
        }
    }
}
