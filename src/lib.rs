//! # Cover-Crop
//!
//! Batch image resizing for marketing placements. One source image goes in;
//! a ZIP of exactly-sized derivatives comes out, one per target placement
//! (landing page thumbnails, banners, speaker cards, email headers, plus any
//! custom `label, WxH` sizes).
//!
//! # Pipeline
//!
//! ```text
//! decode ─→ orient (once) ─┬→ cover resize → flatten → encode ─┐
//!                          ├→ cover resize → flatten → encode ─┼→ ZIP
//!                          └→ ...                              ─┘
//! ```
//!
//! Every derivative fills its target box completely: the source is scaled
//! until it covers both axes, then center-cropped. Aspect ratio is never
//! distorted and nothing is letterboxed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`targets`] | Preset catalog, custom size parsing, scale factor application |
//! | [`export`] | Batch engine: orientation, parallel per-target rendering, progress, cancellation |
//! | [`imaging`] | Pure-Rust image operations: decode, orient, cover resize, flatten, encode |
//! | [`archive`] | In-memory ZIP assembly and writing results to disk |
//! | [`naming`] | Label sanitizing and entry/archive file names |
//! | [`config`] | `cover-crop.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## All or Nothing
//!
//! A run either produces an archive containing every requested target or
//! fails.
//!
//! ## Closed Format Set
//!
//! Output is JPEG or PNG. Format strings are parsed once at the boundary
//! into [`imaging::OutputFormat`]; everything downstream matches on the enum.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and encoding all go through the `image`
//! crate. The binary has no system library dependencies.
//!
//! ## No Session State
//!
//! Settings and targets are plain immutable values passed into
//! [`export::export`]. Two runs never share anything.

pub mod archive;
pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod targets;
