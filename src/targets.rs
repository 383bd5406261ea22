//! Output targets: the preset catalog, custom size lines, and scaling.
//!
//! A run exports one derivative per target. Targets come from two places:
//!
//! - **Presets**: a fixed, ordered catalog of named sizes. The caller picks
//!   which ones to include.
//! - **Custom lines**: free text, one target per line:
//!
//! ```text
//! SNS, 1080x1080
//! Banner 2, 1200 × 630
//! ```
//!
//! Every included target is then multiplied by the run's [`ScaleFactor`]
//! (2.0 for retina-density exports, for example). Scaled dimensions round
//! half away from zero and never drop below one pixel.
//!
//! Malformed custom lines are not fatal: each becomes a [`ParseWarning`] and
//! the rest of the batch goes ahead. An empty result is fatal
//! ([`TargetError::EmptyTargetSet`]).

use crate::imaging::scale_dimension;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("No targets: select at least one preset or add a custom size")]
    EmptyTargetSet,
    #[error("Unknown preset: {0:?}")]
    UnknownPreset(String),
    #[error("Scale factor must be a positive finite number, got {0}")]
    InvalidScale(f64),
}

/// One entry of the fixed preset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

/// The preset catalog, in display and export order.
pub const PRESETS: &[Preset] = &[
    Preset {
        label: "Landing Page_Thumbnail",
        width: 600,
        height: 350,
    },
    Preset {
        label: "Landing Page_banner",
        width: 1920,
        height: 440,
    },
    Preset {
        label: "Speaker",
        width: 250,
        height: 250,
    },
    Preset {
        label: "List Thumbnail",
        width: 720,
        height: 420,
    },
    Preset {
        label: "Carousel Banner",
        width: 1200,
        height: 370,
    },
    Preset {
        label: "Email Header",
        width: 600,
        height: 280,
    },
];

/// Scale multipliers offered to users. Any positive value is valid.
pub const SCALE_OPTIONS: &[f64] = &[0.5, 1.0, 1.5, 2.0, 2.5, 3.0];

/// Look up a preset by label, ignoring case and surrounding whitespace.
pub fn find_preset(label: &str) -> Option<&'static Preset> {
    let wanted = label.trim();
    PRESETS.iter().find(|p| p.label.eq_ignore_ascii_case(wanted))
}

/// Resolve preset names to catalog entries.
///
/// The result follows catalog order regardless of the order names were
/// given in, and lists each preset once.
pub fn select_presets<S: AsRef<str>>(names: &[S]) -> Result<Vec<&'static Preset>, TargetError> {
    let mut selected = Vec::new();
    for name in names {
        let preset = find_preset(name.as_ref())
            .ok_or_else(|| TargetError::UnknownPreset(name.as_ref().to_string()))?;
        selected.push(preset);
    }
    Ok(PRESETS
        .iter()
        .filter(|p| selected.iter().any(|s| s.label == p.label))
        .collect())
}

/// A named output size before the scale factor is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl TargetSpec {
    /// Returns `None` when either dimension is zero.
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then(|| Self {
            label: label.into(),
            width,
            height,
        })
    }
}

impl From<&Preset> for TargetSpec {
    fn from(preset: &Preset) -> Self {
        Self {
            label: preset.label.to_string(),
            width: preset.width,
            height: preset.height,
        }
    }
}

/// Uniform multiplier applied to every target's base dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(value: f64) -> Result<Self, TargetError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(TargetError::InvalidScale(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// `2x`, `1.5x`. Whole factors print without a fraction.
impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// A target after scaling: the pixel-exact size that will be exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaledTarget {
    pub label: String,
    pub base_width: u32,
    pub base_height: u32,
    pub width: u32,
    pub height: u32,
}

impl ScaledTarget {
    pub fn new(spec: &TargetSpec, scale: ScaleFactor) -> Self {
        Self {
            label: spec.label.clone(),
            base_width: spec.width,
            base_height: spec.height,
            width: scale_dimension(spec.width, scale.value()),
            height: scale_dimension(spec.height, scale.value()),
        }
    }
}

/// A custom size line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number within the custom text.
    pub line_number: usize,
    pub line: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: ignored {:?} ({}; expected \"label, WxH\")",
            self.line_number, self.line, self.reason
        )
    }
}

/// Parse one `label, WxH` line.
pub fn parse_custom_line(line: &str) -> Result<TargetSpec, &'static str> {
    let (label, size) = line.split_once(',').ok_or("missing comma")?;
    let size: String = size
        .to_lowercase()
        .replace('×', "x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let (w, h) = size.split_once('x').ok_or("missing 'x' between width and height")?;
    let width: u32 = w.parse().map_err(|_| "width is not a whole number")?;
    let height: u32 = h.parse().map_err(|_| "height is not a whole number")?;
    TargetSpec::new(label.trim(), width, height).ok_or("width and height must be positive")
}

/// Parse free-form custom size text, one target per line.
///
/// Blank lines are ignored. Every other line either yields a target or a
/// warning; nothing here is fatal.
pub fn parse_custom_sizes(text: &str) -> (Vec<TargetSpec>, Vec<ParseWarning>) {
    let mut specs = Vec::new();
    let mut warnings = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_custom_line(line) {
            Ok(spec) => specs.push(spec),
            Err(reason) => {
                let warning = ParseWarning {
                    line_number: index + 1,
                    line: line.to_string(),
                    reason,
                };
                warn!(%warning, "Skipping custom size");
                warnings.push(warning);
            }
        }
    }
    (specs, warnings)
}

/// The final target list for one run, plus anything skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSet {
    pub targets: Vec<ScaledTarget>,
    pub warnings: Vec<ParseWarning>,
    /// Multiplier every target was scaled by.
    pub scale: ScaleFactor,
}

/// Merge selected presets and custom lines, then apply the scale factor.
///
/// Presets come first in the order given, then custom entries in line order.
pub fn build_targets(
    selected_presets: &[&Preset],
    custom_text: &str,
    scale: ScaleFactor,
) -> Result<TargetSet, TargetError> {
    let (custom, warnings) = parse_custom_sizes(custom_text);

    let targets: Vec<ScaledTarget> = selected_presets
        .iter()
        .map(|&p| TargetSpec::from(p))
        .chain(custom)
        .map(|spec| ScaledTarget::new(&spec, scale))
        .collect();

    if targets.is_empty() {
        return Err(TargetError::EmptyTargetSet);
    }
    Ok(TargetSet {
        targets,
        warnings,
        scale,
    })
}
