//! Source decoding and orientation normalization.
//!
//! Cameras and phones store pixels in sensor order and record the intended
//! display rotation in EXIF. All geometry downstream assumes top-left origin
//! with no pending rotation, so the orientation is read at decode time and
//! applied exactly once, before any width/height is looked at.

use super::backend::BackendError;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// A decoded source image that has not yet been oriented.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    /// Orientation recorded in the file's metadata.
    pub orientation: Orientation,
    /// File stem of the source, when it came from a named file.
    pub stem: Option<String>,
}

impl SourceImage {
    /// Wrap an already-decoded buffer. No orientation is pending.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: Orientation::NoTransforms,
            stem: None,
        }
    }

    /// Decode an encoded image held in memory, keeping its orientation tag.
    pub fn decode(bytes: &[u8]) -> Result<Self, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::DecodeFailed(e.to_string()))?;
        // A malformed EXIF block is not worth failing the run over.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| BackendError::DecodeFailed(e.to_string()))?;

        Ok(Self {
            image,
            orientation,
            stem: None,
        })
    }

    /// Read and decode a source file.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path)?;
        let mut source = Self::decode(&bytes).map_err(|e| match e {
            BackendError::DecodeFailed(msg) => {
                BackendError::DecodeFailed(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        source.stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        Ok(source)
    }

    /// Apply the pending orientation and return the display-ready buffer.
    pub fn into_oriented(self) -> DynamicImage {
        normalize_orientation(self.image, self.orientation)
    }
}

/// Re-render `image` so that `orientation` no longer applies.
///
/// `NoTransforms` returns the image untouched.
pub fn normalize_orientation(mut image: DynamicImage, orientation: Orientation) -> DynamicImage {
    if orientation == Orientation::NoTransforms {
        return image;
    }
    debug!(
        ?orientation,
        width = image.width(),
        height = image.height(),
        "Applying EXIF orientation"
    );
    image.apply_orientation(orientation);
    image
}
