//! Batch export: one source image, every target, one archive.
//!
//! ```text
//! Start → Normalize orientation (once)
//!       → per target: resize cover → flatten (JPEG only) → encode
//!       → assemble archive
//! ```
//!
//! ## Sharing the source
//!
//! The oriented source buffer is computed once and only ever borrowed. Every
//! target resamples from it into a buffer of its own, so targets are
//! independent and run in parallel on the rayon pool. Results are collected
//! back in target order before the archive is assembled.
//!
//! ## Failure policy
//!
//! All or nothing. The first target that fails to encode aborts the run and
//! no archive is produced; callers never see a partial result. An empty
//! target list is rejected before any pixel work starts.
//!
//! ## Cancellation
//!
//! A [`CancelToken`] is checked before each target starts. Targets already
//! encoding finish, the rest are skipped, and the run returns
//! [`ExportError::Cancelled`].

use crate::archive::{Archive, ArchiveError, ExportEntry};
use crate::imaging::{
    BackendError, CoverParams, ImageBackend, OutputFormat, RustBackend, SourceImage,
    WHITE, render_target,
};
use crate::naming;
use crate::targets::{ScaledTarget, TargetError, TargetSet};
use image::Rgb;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Targets(#[from] TargetError),
    #[error("Failed to encode {entry}: {source}")]
    Encode {
        entry: String,
        #[source]
        source: BackendError,
    },
    #[error("Archive assembly failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Export cancelled")]
    Cancelled,
}

/// Settings for one run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub format: OutputFormat,
    /// Requested base name. Sanitized at export time; when nothing usable
    /// is left, the source file stem is used instead.
    pub base_name: String,
    /// Flatten color for formats without alpha.
    pub background: Rgb<u8>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            base_name: String::new(),
            background: WHITE,
        }
    }
}

/// Cooperative cancellation flag, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress reported while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Started {
        /// Source size after orientation.
        width: u32,
        height: u32,
        /// Whether an EXIF orientation was applied.
        reoriented: bool,
        target_count: usize,
    },
    /// One target finished. Arrives in completion order, not target order.
    TargetEncoded {
        /// 1-based position in the target list.
        index: usize,
        name: String,
        width: u32,
        height: u32,
        bytes: usize,
    },
    Finished {
        file_name: String,
        entry_count: usize,
        total_bytes: usize,
    },
}

/// Optional observers of a run.
#[derive(Debug, Clone, Default)]
pub struct ExportHooks {
    pub events: Option<Sender<ExportEvent>>,
    pub cancel: CancelToken,
}

impl ExportHooks {
    fn emit(&self, event: ExportEvent) {
        if let Some(tx) = &self.events {
            // A receiver that has gone away only loses progress lines.
            let _ = tx.send(event);
        }
    }
}

/// Export every target with the pure Rust backend.
pub fn export(
    source: SourceImage,
    targets: &[ScaledTarget],
    settings: &ExportSettings,
) -> Result<Archive, ExportError> {
    export_with_backend(
        &RustBackend::new(),
        source,
        targets,
        settings,
        &ExportHooks::default(),
    )
}

/// Export using a specific backend (allows testing with mock).
pub fn export_with_backend(
    backend: &impl ImageBackend,
    source: SourceImage,
    targets: &[ScaledTarget],
    settings: &ExportSettings,
    hooks: &ExportHooks,
) -> Result<Archive, ExportError> {
    if targets.is_empty() {
        return Err(TargetError::EmptyTargetSet.into());
    }
    if hooks.cancel.is_cancelled() {
        return Err(ExportError::Cancelled);
    }

    let base = naming::base_name(Some(&settings.base_name), source.stem.as_deref());
    let reoriented = source.orientation != image::metadata::Orientation::NoTransforms;
    let oriented = source.into_oriented();

    info!(
        base = %base,
        width = oriented.width(),
        height = oriented.height(),
        targets = targets.len(),
        format = %settings.format,
        "Starting export"
    );
    hooks.emit(ExportEvent::Started {
        width: oriented.width(),
        height: oriented.height(),
        reoriented,
        target_count: targets.len(),
    });

    let names = naming::dedupe_names(
        &targets
            .iter()
            .map(|t| {
                naming::entry_name(
                    &base,
                    &t.label,
                    t.width,
                    t.height,
                    settings.format.extension(),
                )
            })
            .collect::<Vec<_>>(),
    );

    let entries: Vec<ExportEntry> = targets
        .par_iter()
        .zip(names)
        .enumerate()
        .map(|(i, (target, name))| {
            if hooks.cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            let cover = CoverParams {
                width: target.width,
                height: target.height,
            };
            let bytes = render_target(
                backend,
                &oriented,
                cover,
                settings.format,
                settings.background,
            )
            .map_err(|source| ExportError::Encode {
                entry: name.clone(),
                source,
            })?;

            debug!(entry = %name, bytes = bytes.len(), "Encoded target");
            hooks.emit(ExportEvent::TargetEncoded {
                index: i + 1,
                name: name.clone(),
                width: target.width,
                height: target.height,
                bytes: bytes.len(),
            });

            Ok(ExportEntry {
                name,
                label: target.label.clone(),
                width: target.width,
                height: target.height,
                bytes,
            })
        })
        .collect::<Result<_, _>>()?;

    let archive = Archive::assemble(naming::archive_name(&base), entries)?;
    hooks.emit(ExportEvent::Finished {
        file_name: archive.file_name.clone(),
        entry_count: archive.entries.len(),
        total_bytes: archive.bytes.len(),
    });
    Ok(archive)
}

/// JSON summary of a finished run, written by `--manifest`.
#[derive(Debug, Serialize)]
pub struct ExportManifest<'a> {
    pub source: String,
    pub format: String,
    pub scale: f64,
    #[serde(flatten)]
    pub archive: &'a Archive,
    /// Custom lines that were skipped while building targets.
    pub skipped: Vec<String>,
}

impl<'a> ExportManifest<'a> {
    /// `targets` is the set the archive was exported from; its scale and
    /// skipped lines are reported as-is.
    pub fn new(
        source: &Path,
        settings: &ExportSettings,
        targets: &TargetSet,
        archive: &'a Archive,
    ) -> Self {
        Self {
            source: source.display().to_string(),
            format: settings.format.to_string(),
            scale: targets.scale.value(),
            archive,
            skipped: targets.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}
