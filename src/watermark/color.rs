//! Watermark ink color.

use super::WatermarkConfigError;
use image::Rgba;

/// Parse a `#RGB` or `#RRGGBB` string and attach `alpha`.
///
/// ```
/// use watermark_worker::watermark::parse_hex_color;
/// use image::Rgba;
///
/// assert_eq!(parse_hex_color("#000", 128).unwrap(), Rgba([0, 0, 0, 128]));
/// assert_eq!(parse_hex_color("#FF8000", 255).unwrap(), Rgba([255, 128, 0, 255]));
/// ```
pub fn parse_hex_color(hex: &str, alpha: u8) -> Result<Rgba<u8>, WatermarkConfigError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkConfigError::new(format!("Color '{}' must start with '#'", hex)))?;

    let component = |s: &str| -> Result<u8, WatermarkConfigError> {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkConfigError::new(format!("Invalid hex digit in color '{}'", hex)))
    };

    if !digits.is_ascii() {
        return Err(WatermarkConfigError::new(format!(
            "Invalid hex digit in color '{}'",
            hex
        )));
    }

    match digits.len() {
        // #RGB: each digit doubled, 0xF -> 0xFF
        3 => Ok(Rgba([
            component(&digits[0..1])? * 17,
            component(&digits[1..2])? * 17,
            component(&digits[2..3])? * 17,
            alpha,
        ])),
        6 => Ok(Rgba([
            component(&digits[0..2])?,
            component(&digits[2..4])?,
            component(&digits[4..6])?,
            alpha,
        ])),
        n => Err(WatermarkConfigError::new(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            n
        ))),
    }
}
