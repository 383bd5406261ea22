//! Output file naming.
//!
//! Every archive entry is named from three parts, each passed through
//! [`sanitize`] first:
//!
//! ```text
//! {base}_{label}_{width}x{height}.{ext}
//! Campaign_Email_Header_1200x560.jpg
//! ```
//!
//! The archive itself is named `{base}_resized.zip`.
//!
//! ## Sanitizing
//!
//! Labels are free text typed by a person ("Landing Page_banner",
//! "SNS / Square"). [`sanitize`] turns them into a token that is safe as a
//! filename on common platforms: surrounding whitespace is trimmed, inner
//! whitespace runs become a single `_`, and the reserved characters
//! `\ / : * ? " < > |` are dropped.

/// Characters reserved by common filesystems.
pub const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Base name used when neither the requested name nor the source stem
/// survives sanitizing.
pub const FALLBACK_BASE_NAME: &str = "image";

/// Convert a free-text label into a filesystem-safe token.
///
/// Total over any input. An empty result is possible (`"  "`, `"???"`);
/// callers decide what to substitute.
pub fn sanitize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_gap = false;

    for ch in label.trim().chars() {
        if ch.is_whitespace() {
            pending_gap = true;
            continue;
        }
        if pending_gap {
            out.push('_');
            pending_gap = false;
        }
        if !RESERVED_CHARS.contains(&ch) {
            out.push(ch);
        }
    }
    out
}

/// Resolve the base name for a run.
///
/// Uses the sanitized `requested` name when it is non-empty after sanitizing,
/// otherwise the sanitized stem of the source file, otherwise
/// [`FALLBACK_BASE_NAME`].
pub fn base_name(requested: Option<&str>, source_stem: Option<&str>) -> String {
    [requested, source_stem]
        .into_iter()
        .flatten()
        .map(sanitize)
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string())
}

/// Build the archive entry name for one scaled target.
///
/// `base` is expected to be sanitized already (see [`base_name`]); the label
/// is sanitized here.
pub fn entry_name(base: &str, label: &str, width: u32, height: u32, extension: &str) -> String {
    format!(
        "{}_{}_{}x{}.{}",
        base,
        sanitize(label),
        width,
        height,
        extension
    )
}

/// Suggested file name for the finished archive.
pub fn archive_name(base: &str) -> String {
    format!("{}_resized.zip", base)
}

/// Make entry names unique within one run.
///
/// The first occurrence keeps its name; later duplicates get `_2`, `_3`, …
/// inserted before the extension, skipping any suffix already taken. Names
/// are claimed in order, so a later original that matches an earlier
/// generated name is itself the duplicate and gets a suffix of its own
/// (`a_2.png` becomes `a_2_2.png`). The result never contains duplicates.
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name.clone());
            continue;
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (name.as_str(), None),
        };
        let mut n = 2;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{}_{}.{}", stem, n, ext),
                None => format!("{}_{}", stem, n),
            };
            if seen.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }
    out
}
