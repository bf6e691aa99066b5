//! Watermark error types.
//!
//! Defines errors that can occur while loading the watermark font and while
//! decoding, compositing and re-encoding an image.

use thiserror::Error;

/// Errors loading the font asset. These are fatal at startup.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Font {origin} is not a valid TrueType/OpenType font: {message}")]
    Parse { origin: String, message: String },

    #[error("Font size must be a positive number, got {size}")]
    InvalidSize { size: f32 },
}

/// Errors writing the watermarked image back out in its original format.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The source format cannot hold the RGBA result (e.g. JPEG).
    #[error("Cannot write an RGBA image as {format}")]
    UnsupportedColorMode { format: String },

    #[error("Failed to encode image as {format}: {message}")]
    Encoder { format: String, message: String },
}

/// Invalid watermark settings (color, alpha, size) caught at startup.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Watermark configuration error: {0}")]
pub struct WatermarkConfigError(String);

impl WatermarkConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors from a single render call.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
