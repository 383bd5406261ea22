//! High-level image operations.
//!
//! These functions combine calculations with backend execution: plan the
//! geometry, let the backend resample, crop, flatten, encode.

use super::backend::{BackendError, ImageBackend};
use super::calculations::plan_cover;
use super::color::ensure_opaque;
use super::params::{CoverParams, OutputFormat};
use image::{DynamicImage, Rgb};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Cover-fit `image` into exactly `target.width × target.height`.
///
/// Resamples to the smallest size that covers the target on both axes, then
/// takes the centred crop. Never letterboxes; the overflowing axis is
/// trimmed. Zero-sized targets are clamped to one pixel.
pub fn resize_cover(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    target: CoverParams,
) -> Result<DynamicImage> {
    let target = (target.width.max(1), target.height.max(1));
    let plan = plan_cover((image.width(), image.height()), target);
    debug!(
        source_w = image.width(),
        source_h = image.height(),
        resized_w = plan.resized.0,
        resized_h = plan.resized.1,
        "Cover resize"
    );

    let resized = backend.resample(image, plan.resized.0, plan.resized.1)?;
    if plan.resized == target {
        return Ok(resized);
    }
    Ok(resized.crop_imm(plan.offset.0, plan.offset.1, target.0, target.1))
}

/// Produce the encoded bytes of one derivative.
///
/// `source` must already be oriented. JPEG output is flattened onto
/// `background`; PNG keeps its alpha.
pub fn render_target(
    backend: &impl ImageBackend,
    source: &DynamicImage,
    target: CoverParams,
    format: OutputFormat,
    background: Rgb<u8>,
) -> Result<Vec<u8>> {
    let covered = resize_cover(backend, source, target)?;
    let ready = if format.supports_alpha() {
        covered
    } else {
        ensure_opaque(covered, background)
    };
    backend.encode(&ready, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::color::WHITE;
    use crate::imaging::{Quality, RustBackend};
    use image::{GenericImageView, Rgba, RgbaImage};

    fn cover(width: u32, height: u32) -> CoverParams {
        CoverParams { width, height }
    }

    #[test]
    fn resize_cover_plans_then_crops() {
        let backend = MockBackend::new();
        let src = DynamicImage::new_rgb8(4000, 2000);

        let out = resize_cover(&backend, &src, cover(600, 350)).unwrap();
        assert_eq!(out.dimensions(), (600, 350));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Resample {
                from: (4000, 2000),
                to: (700, 350)
            }]
        );
    }

    #[test]
    fn resize_cover_exact_for_many_targets() {
        let backend = MockBackend::new();
        let src = DynamicImage::new_rgb8(640, 480);
        for (w, h) in [(1, 1), (600, 350), (1920, 440), (250, 250), (3, 1000), (1000, 3)] {
            let out = resize_cover(&backend, &src, cover(w, h)).unwrap();
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn resize_cover_zero_target_is_clamped() {
        let backend = MockBackend::new();
        let src = DynamicImage::new_rgb8(10, 10);
        let out = resize_cover(&backend, &src, cover(0, 5)).unwrap();
        assert_eq!(out.dimensions(), (1, 5));
    }

    #[test]
    fn resize_cover_real_pixels_center_crop() {
        // Left third red, middle third green, right third blue. Cropping
        // 300x100 → 100x100 keeps only the green middle.
        let src = DynamicImage::ImageRgba8(RgbaImage::from_fn(300, 100, |x, _| match x {
            0..100 => Rgba([255, 0, 0, 255]),
            100..200 => Rgba([0, 255, 0, 255]),
            _ => Rgba([0, 0, 255, 255]),
        }));
        let out = resize_cover(&RustBackend::new(), &src, cover(100, 100)).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        let center = out.get_pixel(50, 50);
        assert!(center[1] > 200 && center[0] < 50 && center[2] < 50, "{center:?}");
    }

    #[test]
    fn render_jpeg_flattens_before_encode() {
        let backend = MockBackend::new();
        let src = DynamicImage::new_rgba8(100, 100);
        let format = OutputFormat::Jpeg {
            quality: Quality::new(70),
        };

        let bytes = render_target(&backend, &src, cover(50, 40), format, WHITE).unwrap();
        assert_eq!(bytes, b"jpg:50x40");

        let ops = backend.get_operations();
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Encode {
                size: (50, 40),
                has_alpha: false,
                ..
            })
        ));
    }

    #[test]
    fn render_png_keeps_alpha() {
        let backend = MockBackend::new();
        let src = DynamicImage::new_rgba8(100, 100);

        render_target(&backend, &src, cover(20, 20), OutputFormat::Png, WHITE).unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Encode {
                has_alpha: true,
                format: OutputFormat::Png,
                ..
            })
        ));
    }

    #[test]
    fn render_propagates_encode_failure() {
        let backend = MockBackend::failing_at(20, 20);
        let src = DynamicImage::new_rgb8(100, 100);
        let result = render_target(&backend, &src, cover(20, 20), OutputFormat::Png, WHITE);
        assert!(matches!(result, Err(BackendError::EncodeFailed(_))));
    }

    #[test]
    fn render_real_jpeg_roundtrips_dimensions() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(320, 240, Rgba([0, 128, 255, 0])));
        let bytes = render_target(
            &RustBackend::new(),
            &src,
            cover(120, 90),
            OutputFormat::default(),
            WHITE,
        )
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (120, 90));
        // Fully transparent source flattened onto white
        let px = decoded.to_rgb8().get_pixel(60, 45).0;
        assert!(px.iter().all(|&c| c > 240), "{px:?}");
    }
}
