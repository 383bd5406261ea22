//! Flattening transparency for formats without alpha.
//!
//! JPEG has no alpha channel. Encoding an RGBA buffer straight to JPEG drops
//! the channel and exposes whatever color the transparent pixels happened to
//! hold (often black). Compositing onto a solid background first gives the
//! result a person would expect from "save as JPEG".

use image::{DynamicImage, Rgb, RgbImage};

/// Default flatten color.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Composite `image` over a solid `background`, producing opaque RGB8.
///
/// Buffers without alpha are converted to RGB8 unchanged (a no-op for RGB8).
/// Idempotent: the output never carries alpha, so a second call only
/// re-wraps the same pixels.
pub fn ensure_opaque(image: DynamicImage, background: Rgb<u8>) -> DynamicImage {
    if !image.color().has_alpha() {
        return match image {
            DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
    }

    let rgba = image.to_rgba8();
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend(r, background[0], a),
            blend(g, background[1], a),
            blend(b, background[2], a),
        ])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// `fg·a + bg·(255 − a)`, divided by 255 and rounded to nearest.
#[inline]
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    let value = fg as u32 * a + bg as u32 * (255 - a);
    ((value + 127) / 255) as u8
}
