//! Position calculation for watermark placement.
//!
//! The watermark is anchored to the bottom-right corner, inset by the text's
//! own bounding box and nothing else. When the text is larger than the image
//! the coordinates go negative and the compositor clips whatever falls
//! outside the canvas.
//!
//! # Example
//!
//! ```
//! use watermark_worker::watermark::position::{anchor_bottom_right, ImageDimensions};
//! use watermark_worker::watermark::TextBounds;
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let text = TextBounds { width: 120, height: 40 };
//!
//! let origin = anchor_bottom_right(&image, &text);
//! assert_eq!((origin.x, origin.y), (680, 560));
//! ```

use super::face::TextBounds;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left draw origin for the watermark text. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Calculate the draw origin that puts the text flush with the bottom-right
/// corner: `(width - text_width, height - text_height)`.
pub fn anchor_bottom_right(image: &ImageDimensions, text: &TextBounds) -> PlacementPosition {
    let x = i64::from(image.width) - i64::from(text.width);
    let y = i64::from(image.height) - i64::from(text.height);
    PlacementPosition::new(saturate(x), saturate(y))
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Whether any part of a `text`-sized box drawn at `origin` lands on the image.
pub fn is_visible(origin: PlacementPosition, text: &TextBounds, image: &ImageDimensions) -> bool {
    let right = i64::from(origin.x) + i64::from(text.width);
    let bottom = i64::from(origin.y) + i64::from(text.height);
    right > 0
        && bottom > 0
        && i64::from(origin.x) < i64::from(image.width)
        && i64::from(origin.y) < i64::from(image.height)
}
