//! Alpha compositing of the text overlay onto the source image.
//!
//! The overlay is a full-size RGBA canvas that starts fully transparent. Text
//! is drawn into it, then the whole overlay is laid over the source with the
//! Porter-Duff "over" operator. Pixels the text never touched stay
//! transparent, so they leave the source untouched.

use image::{Rgba, RgbaImage};

/// Blend `foreground` over `background`.
///
/// `out_a = fg_a + bg_a * (1 - fg_a)`, channels weighted by their alpha and
/// un-premultiplied by `out_a`.
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    if foreground[3] == 0 {
        return background;
    }
    if foreground[3] == 255 {
        return foreground;
    }

    let fg_alpha = f32::from(foreground[3]) / 255.0;
    let bg_alpha = f32::from(background[3]) / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = f32::from(fg) / 255.0;
        let bg_f = f32::from(bg) / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Composite an overlay of the same size over `target`, in place.
///
/// If the sizes differ only the overlapping top-left region is blended.
pub fn composite_over(target: &mut RgbaImage, overlay: &RgbaImage) {
    let width = target.width().min(overlay.width());
    let height = target.height().min(overlay.height());

    for y in 0..height {
        for x in 0..width {
            let top = *overlay.get_pixel(x, y);
            if top[3] == 0 {
                continue;
            }
            let bottom = *target.get_pixel(x, y);
            target.put_pixel(x, y, blend_pixels(bottom, top));
        }
    }
}
