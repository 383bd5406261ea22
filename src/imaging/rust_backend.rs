//! Pure Rust image processing backend.
//!
//! Everything runs in memory; nothing touches the filesystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image` crate (pure Rust decoders) |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `jpeg_encoder::Encoder` at the configured quality, optimized Huffman tables |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, best compression + adaptive filtering |

use super::backend::{BackendError, ImageBackend};
use super::params::OutputFormat;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use jpeg_encoder::{ColorType, Encoder as JpegEncoder};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Extensions the source file may carry, paired with the decoder they need.
const SOURCE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    SOURCE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of source file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `ext` (without the dot, any case) is a supported source extension.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    supported_input_extensions().contains(&ext.as_str())
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG takes 8-bit luma or RGB only.
fn jpeg_samples(img: &DynamicImage) -> (Cow<'_, [u8]>, ColorType) {
    match img {
        DynamicImage::ImageLuma8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), ColorType::Luma),
        DynamicImage::ImageRgb8(buf) => (Cow::Borrowed(buf.as_raw().as_slice()), ColorType::Rgb),
        other => (Cow::Owned(other.to_rgb8().into_raw()), ColorType::Rgb),
    }
}

/// PNG has no float samples; those are narrowed to 16-bit.
fn png_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb16(img.to_rgb16())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
        _ => Cow::Borrowed(img),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    write_jpeg(img, quality, true)
}

/// The second pass over the coefficients builds Huffman tables fitted to
/// this image instead of the stock Annex K ones.
fn write_jpeg(
    img: &DynamicImage,
    quality: u8,
    optimize_huffman: bool,
) -> Result<Vec<u8>, BackendError> {
    let (width, height) = (img.width(), img.height());
    let too_large = || {
        BackendError::EncodeFailed(format!(
            "JPEG encode failed: {}x{} exceeds the 65535 pixel limit",
            width, height
        ))
    };
    let w = u16::try_from(width).map_err(|_| too_large())?;
    let h = u16::try_from(height).map_err(|_| too_large())?;

    let (samples, color) = jpeg_samples(img);
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new(&mut bytes, quality);
    encoder.set_optimized_huffman_tables(optimize_huffman);
    encoder
        .encode(&samples, w, h, color)
        .map_err(|e| BackendError::EncodeFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(bytes)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive);
    png_compatible(img)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::EncodeFailed(format!("PNG encode failed: {}", e)))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn resample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        match format {
            OutputFormat::Jpeg { quality } => encode_jpeg(image, quality.value()),
            OutputFormat::Png => encode_png(image),
        }
    }
}
