//! Watermark renderer: decode, overlay text, re-encode.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use watermark_worker::watermark::{RenderOptions, TrueTypeFace, WatermarkRenderer};
//!
//! let face = TrueTypeFace::from_file("./Roboto/Roboto-Regular.ttf", 36.0)?;
//! let renderer = WatermarkRenderer::new(Arc::new(face), RenderOptions::default());
//!
//! let rendered = renderer.render(&png_bytes, "photo.png")?;
//! assert_eq!(rendered.format, image::ImageFormat::Png);
//! ```

use super::compositor::composite_over;
use super::face::{TextBounds, TextFace};
use super::format::{format_name, supports_alpha};
use super::position::{anchor_bottom_right, is_visible, ImageDimensions, PlacementPosition};
use super::{EncodeError, RenderError};
use crate::constants::DEFAULT_WATERMARK_ALPHA;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::warn;

/// Rendering settings that stay fixed for the life of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Ink color including alpha.
    pub color: Rgba<u8>,
    /// Drop the alpha channel for formats that cannot store it instead of
    /// failing the record.
    pub flatten_opaque_formats: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, DEFAULT_WATERMARK_ALPHA]),
            flatten_opaque_formats: false,
        }
    }
}

/// Output of a successful render.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Encoded bytes in `format`.
    pub bytes: Vec<u8>,
    /// Format of both the input and the output.
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Where the text box was drawn.
    pub origin: PlacementPosition,
    pub text_bounds: TextBounds,
}

/// Composites a text watermark onto encoded images.
#[derive(Clone)]
pub struct WatermarkRenderer {
    face: Arc<dyn TextFace>,
    options: RenderOptions,
}

impl std::fmt::Debug for WatermarkRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkRenderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl WatermarkRenderer {
    pub fn new(face: Arc<dyn TextFace>, options: RenderOptions) -> Self {
        Self { face, options }
    }

    /// Watermark `input` with `text` and re-encode it in its original format.
    pub fn render(&self, input: &[u8], text: &str) -> Result<RenderedImage, RenderError> {
        let format = image::guess_format(input)
            .map_err(|e| RenderError::Decode(format!("unrecognized image data: {}", e)))?;
        let source = image::load_from_memory_with_format(input, format)
            .map_err(|e| RenderError::Decode(e.to_string()))?;

        let (width, height) = source.dimensions();
        let (watermarked, origin, text_bounds) = self.composite(&source, text);

        let bytes = encode(watermarked, format, self.options.flatten_opaque_formats)?;

        Ok(RenderedImage {
            bytes,
            format,
            width,
            height,
            origin,
            text_bounds,
        })
    }

    /// Draw `text` onto a transparent overlay and lay it over `source`.
    ///
    /// The result is RGBA regardless of the source color type.
    pub fn composite(
        &self,
        source: &DynamicImage,
        text: &str,
    ) -> (RgbaImage, PlacementPosition, TextBounds) {
        let (width, height) = source.dimensions();
        let text_bounds = self.face.measure(text);
        let dims = ImageDimensions { width, height };
        let origin = anchor_bottom_right(&dims, &text_bounds);
        if !is_visible(origin, &text_bounds, &dims) {
            warn!(
                text,
                width,
                height,
                text_width = text_bounds.width,
                text_height = text_bounds.height,
                "Watermark falls outside the image"
            );
        }

        let mut overlay = RgbaImage::new(width, height);
        self.face.draw(&mut overlay, origin, text, self.options.color);

        let mut watermarked = source.to_rgba8();
        composite_over(&mut watermarked, &overlay);

        (watermarked, origin, text_bounds)
    }
}

fn encode(image: RgbaImage, format: ImageFormat, flatten: bool) -> Result<Vec<u8>, EncodeError> {
    let output = if supports_alpha(format) {
        DynamicImage::ImageRgba8(image)
    } else if flatten {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8())
    } else {
        return Err(EncodeError::UnsupportedColorMode {
            format: format_name(format),
        });
    };

    let mut cursor = Cursor::new(Vec::new());
    output
        .write_to(&mut cursor, ImageOutputFormat::from(format))
        .map_err(|e| EncodeError::Encoder {
            format: format_name(format),
            message: e.to_string(),
        })?;

    Ok(cursor.into_inner())
}
