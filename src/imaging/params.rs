//! Parameter types for image operations.
//!
//! These describe *what* to produce, not how. They sit between the export
//! engine (which decides what each target needs) and the
//! [`backend`](super::backend) (which does the pixel work and encoding).
//!
//! - [`Quality`]: JPEG quality, 60–100, default 88.
//! - [`OutputFormat`]: closed set of encodable formats.
//! - [`CoverParams`]: the exact box one derivative must fill.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported output format: {0:?} (expected jpg, jpeg or png)")]
    Unsupported(String),
}

/// JPEG encoding quality (60-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 60;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 88;

    /// Out-of-range values fall back to the default rather than being
    /// clamped: a quality of 5 is a typo, not a request for quality 60.
    pub fn new(value: u32) -> Self {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Self(v),
            _ => Self::default(),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossy, no alpha. Sources are flattened before encoding.
    Jpeg { quality: Quality },
    /// Lossless, keeps transparency.
    Png,
}

impl OutputFormat {
    /// Parse a user-facing format name. `jpg` and `jpeg` are the same format.
    pub fn parse(name: &str, quality: Quality) -> Result<Self, FormatError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg { quality }),
            "png" => Ok(Self::Png),
            _ => Err(FormatError::Unsupported(name.to_string())),
        }
    }

    /// File extension used for archive entries.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    /// Whether the encoded form can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: Quality::default(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    /// Parses with the default JPEG quality.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, Quality::default())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg { quality } => write!(f, "jpeg (quality {})", quality.value()),
            Self::Png => write!(f, "png"),
        }
    }
}

/// Exact box a derivative must fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverParams {
    pub width: u32,
    pub height: u32,
}
