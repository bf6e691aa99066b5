//! Watermark rendering configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE, DEFAULT_WATERMARK_ALPHA, DEFAULT_WATERMARK_COLOR,
};
use crate::watermark::{parse_hex_color, RenderOptions, WatermarkConfigError};

fn default_font_path() -> PathBuf {
    PathBuf::from(DEFAULT_FONT_PATH)
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_WATERMARK_COLOR.to_string()
}

fn default_alpha() -> u8 {
    DEFAULT_WATERMARK_ALPHA
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatermarkConfig {
    /// TrueType/OpenType font file (default: ./Roboto/Roboto-Regular.ttf)
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,

    /// Font size in pixels per em (default: 36)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Ink color as #RGB or #RRGGBB (default: #000000)
    #[serde(default = "default_color")]
    pub color: String,

    /// Ink alpha, 0-255 (default: 128)
    #[serde(default = "default_alpha")]
    pub alpha: u8,

    /// Write formats without alpha (JPEG) as RGB instead of failing
    #[serde(default)]
    pub flatten_opaque_formats: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            font_size: DEFAULT_FONT_SIZE,
            color: default_color(),
            alpha: DEFAULT_WATERMARK_ALPHA,
            flatten_opaque_formats: false,
        }
    }
}

impl WatermarkConfig {
    /// Resolve into renderer options, validating the color.
    pub fn render_options(&self) -> Result<RenderOptions, WatermarkConfigError> {
        Ok(RenderOptions {
            color: parse_hex_color(&self.color, self.alpha)?,
            flatten_opaque_formats: self.flatten_opaque_formats,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.font_path.as_os_str().is_empty() {
            return Err("watermark.font_path cannot be empty".to_string());
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(format!(
                "watermark.font_size must be positive, got {}",
                self.font_size
            ));
        }
        self.render_options().map_err(|e| e.to_string())?;
        Ok(())
    }
}
