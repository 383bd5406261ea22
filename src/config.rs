//! Export configuration module.
//!
//! Handles loading, validating, and merging `cover-crop.toml`. Stock defaults
//! are overridden by the user file, and command-line flags override both.
//!
//! ## Config File Location
//!
//! `cover-crop.toml` is looked up in the working directory, or passed
//! explicitly with `--config <FILE>`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "jpg"            # jpg | jpeg | png
//! quality = 88              # JPEG quality (60-100)
//! scale = 2.0               # Multiplier applied to every target
//! background = "#ffffff"    # Flatten color for JPEG output
//!
//! [targets]
//! presets = ["Landing Page_Thumbnail", "Landing Page_banner", "Speaker",
//!            "List Thumbnail", "Carousel Banner", "Email Header"]
//! custom = []               # Extra "label, WxH" lines
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! format = "png"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality};
use crate::targets::{PRESETS, Preset, ScaleFactor, select_presets};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "cover-crop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration loaded from `cover-crop.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Output encoding and naming settings.
    pub output: OutputConfig,
    /// Which sizes to produce.
    pub targets: TargetsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output_format()?;
        if !(u32::from(Quality::MIN)..=u32::from(Quality::MAX)).contains(&self.output.quality) {
            return Err(ConfigError::Validation(format!(
                "output.quality must be {}-{}",
                Quality::MIN,
                Quality::MAX
            )));
        }
        self.scale_factor()?;
        self.background()?;
        self.presets()?;
        Ok(())
    }

    /// The configured output format with its quality applied.
    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        OutputFormat::parse(&self.output.format, Quality::new(self.output.quality))
            .map_err(|e| ConfigError::Validation(format!("output.format: {e}")))
    }

    pub fn scale_factor(&self) -> Result<ScaleFactor, ConfigError> {
        ScaleFactor::new(self.output.scale)
            .map_err(|e| ConfigError::Validation(format!("output.scale: {e}")))
    }

    pub fn background(&self) -> Result<Rgb<u8>, ConfigError> {
        parse_hex_color(&self.output.background).ok_or_else(|| {
            ConfigError::Validation(format!(
                "output.background must be #rgb or #rrggbb, got {:?}",
                self.output.background
            ))
        })
    }

    /// Selected presets, in catalog order.
    pub fn presets(&self) -> Result<Vec<&'static Preset>, ConfigError> {
        select_presets(&self.targets.presets)
            .map_err(|e| ConfigError::Validation(format!("targets.presets: {e}")))
    }

    /// Custom lines joined into the text form the target builder parses.
    pub fn custom_text(&self) -> String {
        self.targets.custom.join("\n")
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// `jpg`, `jpeg` or `png`.
    pub format: String,
    /// JPEG quality (60-100). Ignored for PNG.
    pub quality: u32,
    /// Multiplier applied to every target's base size.
    pub scale: f64,
    /// Color transparent pixels are flattened onto for JPEG.
    pub background: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "jpg".to_string(),
            quality: u32::from(Quality::DEFAULT),
            scale: 2.0,
            background: "#ffffff".to_string(),
        }
    }
}

/// Target selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetsConfig {
    /// Preset labels to include. Matched case-insensitively.
    pub presets: Vec<String>,
    /// Extra `label, WxH` lines.
    pub custom: Vec<String>,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            presets: PRESETS.iter().map(|p| p.label.to_string()).collect(),
            custom: Vec::new(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel encoding workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Some(Rgb(rgb))
        }
        6 => Some(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        _ => None,
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ExportConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `cover-crop.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<ExportConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load config from an explicit file path. The file must exist.
pub fn load_config_file(path: &Path) -> Result<ExportConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `cover-crop.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Cover-Crop Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Encoding: "jpg" (or "jpeg") for JPEG, "png" for lossless PNG.
format = "jpg"

# JPEG quality, 60 (smallest) to 100 (best). Ignored for PNG.
quality = 88

# Multiplier applied to every target size, e.g. 2.0 for retina exports.
scale = 2.0

# Transparent pixels are flattened onto this color for JPEG output.
background = "#ffffff"

# ---------------------------------------------------------------------------
# Targets
# ---------------------------------------------------------------------------
[targets]
# Presets to export. Remove entries you don't need.
presets = [
    "Landing Page_Thumbnail", # 600x350
    "Landing Page_banner",    # 1920x440
    "Speaker",                # 250x250
    "List Thumbnail",         # 720x420
    "Carousel Banner",        # 1200x370
    "Email Header",           # 600x280
]

# Extra sizes as "label, WxH". Labels may contain spaces.
custom = []
# custom = ["Square, 1080x1080", "Story, 1080x1920"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encoding workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_output_settings() {
        let config = ExportConfig::default();
        assert_eq!(config.output.format, "jpg");
        assert_eq!(config.output.quality, 88);
        assert_eq!(config.output.scale, 2.0);
        assert_eq!(config.output.background, "#ffffff");
    }

    #[test]
    fn default_config_selects_every_preset() {
        let config = ExportConfig::default();
        assert_eq!(config.targets.presets.len(), PRESETS.len());
        assert!(config.targets.custom.is_empty());
        assert_eq!(config.presets().unwrap().len(), 6);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[output]
format = "png"
"##;
        let config: ExportConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.format, "png");
        // Defaults preserved
        assert_eq!(config.output.quality, 88);
        assert_eq!(config.targets.presets.len(), 6);
    }

    #[test]
    fn derived_values() {
        let toml = r##"
[output]
format = "jpeg"
quality = 70
scale = 1.5
background = "#000"

[targets]
presets = ["speaker", "Email Header"]
custom = ["Square, 1080x1080", "Story, 1080x1920"]
"##;
        let config: ExportConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.output_format().unwrap(),
            OutputFormat::Jpeg {
                quality: Quality::new(70)
            }
        );
        assert_eq!(config.scale_factor().unwrap().value(), 1.5);
        assert_eq!(config.background().unwrap(), Rgb([0, 0, 0]));

        let labels: Vec<_> = config.presets().unwrap().iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Speaker", "Email Header"]);
        assert_eq!(config.custom_text(), "Square, 1080x1080\nStory, 1080x1920");
    }

    // =========================================================================
    // Hex colors
    // =========================================================================

    #[test]
    fn hex_color_long_and_short() {
        assert_eq!(parse_hex_color("#ffffff"), Some(Rgb([255, 255, 255])));
        assert_eq!(parse_hex_color("#1a2B3c"), Some(Rgb([0x1a, 0x2b, 0x3c])));
        assert_eq!(parse_hex_color("#f80"), Some(Rgb([255, 136, 0])));
        assert_eq!(parse_hex_color("000000"), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn hex_color_rejects_garbage() {
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ffff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
        assert_eq!(parse_hex_color("white"), None);
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn default_processing_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_processes, None);
    }

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let threads = effective_threads(&config);
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(threads, cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn parse_processing_config() {
        let toml = r#"
[processing]
max_processes = 4
"#;
        let config: ExportConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.processing.max_processes, Some(4));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[output]
format = "jpg"
quality = 88
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[output]
quality = 95
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["output"]["format"].as_str(), Some("jpg"));
        assert_eq!(merged["output"]["quality"].as_integer(), Some(95));
    }

    #[test]
    fn merge_toml_arrays_replace_not_append() {
        let base: toml::Value = toml::from_str(r#"presets = ["a", "b"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"presets = ["c"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        let arr = merged["presets"].as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0].as_str(), Some("c"));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[output]
fromat = "png"
"#;
        let result: Result<ExportConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml_str = r#"
[typo_section]
foo = "bar"
"#;
        let result: Result<ExportConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[targets]\nsizes = []\n",
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_boundary_ok() {
        let mut config = ExportConfig::default();
        config.output.quality = 60;
        assert!(config.validate().is_ok());
        config.output.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_quality_out_of_range() {
        let mut config = ExportConfig::default();
        config.output.quality = 59;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.output.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_unknown_format() {
        let mut config = ExportConfig::default();
        config.output.format = "gif".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gif"), "{err}");
    }

    #[test]
    fn validate_scale_must_be_positive() {
        let mut config = ExportConfig::default();
        config.output.scale = 0.0;
        assert!(config.validate().is_err());
        config.output.scale = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bad_background() {
        let mut config = ExportConfig::default();
        config.output.background = "ivory".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_unknown_preset() {
        let mut config = ExportConfig::default();
        config.targets.presets = vec!["Billboard".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Billboard"), "{err}");
    }

    #[test]
    fn validate_allows_no_presets() {
        let mut config = ExportConfig::default();
        config.targets.presets.clear();
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Loading tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.format, "jpg");
        assert_eq!(config.output.scale, 2.0);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[output]
scale = 1.0

[targets]
custom = ["Square, 1080x1080"]
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.scale, 1.0);
        assert_eq!(config.targets.custom, vec!["Square, 1080x1080"]);
        // Unspecified values should be defaults
        assert_eq!(config.output.quality, 88);
        assert_eq!(config.targets.presets.len(), 6);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[output]\nquality = 10\n").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_file_requires_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_file_any_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("campaign.toml");
        fs::write(&path, "[output]\nformat = \"png\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.output_format().unwrap(), OutputFormat::Png);
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[output]\nscale = 0.0").unwrap();
        let result = resolve_config(base, Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value =
            toml::from_str(stock_config_toml()).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ExportConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ExportConfig::default();
        assert_eq!(config.output.format, defaults.output.format);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.output.scale, defaults.output.scale);
        assert_eq!(config.output.background, defaults.output.background);
        assert_eq!(config.targets.presets, defaults.targets.presets);
        assert_eq!(config.targets.custom, defaults.targets.custom);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        let table = val.as_table().unwrap();
        assert!(table.contains_key("output"));
        assert!(table.contains_key("targets"));
        assert!(table.contains_key("processing"));
    }
}
