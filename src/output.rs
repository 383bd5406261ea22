//! CLI output formatting for the export command.
//!
//! # Output Format
//!
//! ## Presets
//!
//! ```text
//! Presets (scale 2x)
//! 001 Landing Page_Thumbnail    600x350 → 1200x700
//! 002 Landing Page_banner      1920x440 → 3840x880
//! ...
//! Common scales: 0.5x 1x 1.5x 2x 2.5x 3x
//! ```
//!
//! ## Export
//!
//! ```text
//! Skipped custom sizes
//!     line 3: ignored "Hero 1920" (missing comma; expected "label, WxH")
//! Source 4000x2000 (reoriented), 7 targets
//!     003 Campaign_Speaker_500x500.jpg (38.2 KB)
//!     001 Campaign_Landing_Page_Thumbnail_1200x700.jpg (96.0 KB)
//!     ...
//! Packed Campaign_resized.zip: 7 entries, 1.3 MB
//! Wrote 1 file (1.4 MB of images)
//!     → out/Campaign_resized.zip
//! ```
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::archive::Archive;
use crate::export::ExportEvent;
use crate::targets::{PRESETS, ParseWarning, SCALE_OPTIONS, ScaleFactor, ScaledTarget, TargetSpec};
use std::path::PathBuf;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Format the preset catalog with base and scaled sizes.
pub fn format_presets(scale: ScaleFactor) -> Vec<String> {
    let width = PRESETS.iter().map(|p| p.label.len()).max().unwrap_or(0);
    let mut lines = vec![format!("Presets (scale {})", scale)];
    for (i, preset) in PRESETS.iter().enumerate() {
        let scaled = ScaledTarget::new(&TargetSpec::from(preset), scale);
        let base = format!("{}x{}", preset.width, preset.height);
        lines.push(format!(
            "{} {:<width$} {:>9} → {}x{}",
            format_index(i + 1),
            preset.label,
            base,
            scaled.width,
            scaled.height,
        ));
    }
    let options: Vec<String> = SCALE_OPTIONS
        .iter()
        .filter_map(|&v| ScaleFactor::new(v).ok())
        .map(|s| s.to_string())
        .collect();
    lines.push(format!("Common scales: {}", options.join(" ")));
    lines
}

pub fn print_presets(scale: ScaleFactor) {
    for line in format_presets(scale) {
        println!("{}", line);
    }
}

// ============================================================================
// Target parsing
// ============================================================================

/// Format skipped custom lines. Empty when there is nothing to report.
pub fn format_warnings(warnings: &[ParseWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Skipped custom sizes".to_string()];
    lines.extend(warnings.iter().map(|w| format!("{}{}", indent(1), w)));
    lines
}

pub fn print_warnings(warnings: &[ParseWarning]) {
    for line in format_warnings(warnings) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Export progress
// ============================================================================

/// Format a single export progress event as display lines.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Started {
            width,
            height,
            reoriented,
            target_count,
        } => {
            let note = if *reoriented { " (reoriented)" } else { "" };
            let noun = if *target_count == 1 { "target" } else { "targets" };
            vec![format!(
                "Source {}x{}{}, {} {}",
                width, height, note, target_count, noun
            )]
        }
        ExportEvent::TargetEncoded {
            index, name, bytes, ..
        } => vec![format!(
            "{}{} {} ({})",
            indent(1),
            format_index(*index),
            name,
            format_size(*bytes)
        )],
        ExportEvent::Finished {
            file_name,
            entry_count,
            total_bytes,
        } => vec![format!(
            "Packed {}: {} entries, {}",
            file_name,
            entry_count,
            format_size(*total_bytes)
        )],
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format where the results ended up.
pub fn format_summary(archive: &Archive, written: &[PathBuf]) -> Vec<String> {
    let total: usize = archive.entries.iter().map(|e| e.size()).sum();
    let mut lines = vec![format!(
        "Wrote {} {} ({} of images)",
        written.len(),
        if written.len() == 1 { "file" } else { "files" },
        format_size(total)
    )];
    lines.extend(
        written
            .iter()
            .map(|p| format!("{}→ {}", indent(1), p.display())),
    );
    lines
}

pub fn print_summary(archive: &Archive, written: &[PathBuf]) {
    for line in format_summary(archive, written) {
        println!("{}", line);
    }
}
