//! Watermark module for burning a text label into images.
//!
//! The worker stamps every processed image with its own file name in the
//! bottom-right corner, in semi-transparent black.
//!
//! # Pieces
//!
//! - [`face`]: font loading and text metrics ([`TextFace`], [`TrueTypeFace`])
//! - [`position`]: bottom-right anchoring of the text box
//! - [`compositor`]: Porter-Duff "over" blending of the text overlay
//! - [`format`]: which encoded formats can carry the RGBA result
//! - [`renderer`]: decode, composite and re-encode ([`WatermarkRenderer`])

pub mod color;
pub mod compositor;
pub mod error;
pub mod face;
pub mod format;
pub mod position;
pub mod renderer;

pub use color::parse_hex_color;
pub use compositor::{blend_pixels, composite_over};
pub use error::{EncodeError, FontError, RenderError, WatermarkConfigError};
pub use face::{BlockFace, TextBounds, TextFace, TrueTypeFace};
pub use format::{content_type, supports_alpha};
pub use position::{anchor_bottom_right, ImageDimensions, PlacementPosition};
pub use renderer::{RenderOptions, RenderedImage, WatermarkRenderer};
