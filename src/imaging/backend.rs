//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between "what to produce" (the
//! export engine and [`operations`](super::operations)) and the pixel work:
//! resampling and encoding.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): the `image` crate's
//! Lanczos3 filter and its JPEG/PNG encoders, all in memory.

use super::params::OutputFormat;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Trait for image processing backends.
///
/// `Sync` because targets are rendered in parallel against one backend.
pub trait ImageBackend: Sync {
    /// Resample `image` to exactly `width × height`, ignoring aspect ratio.
    ///
    /// Callers compute the covering size first; see
    /// [`plan_cover`](super::calculations::plan_cover).
    fn resample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError>;

    /// Encode `image` into the bytes of one output file.
    fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, BackendError>;
}
