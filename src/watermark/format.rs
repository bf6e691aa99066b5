//! Encoded format helpers.
//!
//! The watermarked image is always RGBA, so re-encoding in the source format
//! only works for formats with an alpha channel.

use image::ImageFormat;

/// Whether `format` can store an RGBA image.
pub fn supports_alpha(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Tiff
            | ImageFormat::Tga
            | ImageFormat::Bmp
            | ImageFormat::Ico
            | ImageFormat::Qoi
            | ImageFormat::Farbfeld
            | ImageFormat::OpenExr
            | ImageFormat::Avif
    )
}

/// Content-Type for storing an object of this format.
pub fn content_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Human readable name for logs and errors.
pub fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format)
}
