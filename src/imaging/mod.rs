//! Image processing, pure Rust and in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orientation** | `image::ImageReader` + `ImageDecoder::orientation` |
//! | **Cover resize** | `plan_cover` + Lanczos3 `resize_exact` + `crop_imm` |
//! | **Flatten alpha** | per-pixel composite onto a solid background |
//! | **Encode** | `JpegEncoder` / `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Orientation**: [`SourceImage`] decoding and [`normalize_orientation`]
//! - **Color**: [`ensure_opaque`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod color;
pub mod operations;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{CoverPlan, plan_cover, scale_dimension};
pub use color::{WHITE, ensure_opaque};
pub use operations::{render_target, resize_cover};
pub use orientation::{SourceImage, normalize_orientation};
pub use params::{CoverParams, FormatError, OutputFormat, Quality};
pub use rust_backend::{RustBackend, is_supported_extension, supported_input_extensions};
