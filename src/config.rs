//! Configuration module.
//!
//! Handles loading, validating, and merging `easel.toml`. Stock defaults are
//! the base layer; the user's file is merged on top, so it only needs the
//! keys it wants to change. Command-line flags override both.
//!
//! ## Config File Location
//!
//! `easel.toml` in the working directory, or any file passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [filter]
//! intensity = 0.5           # Filter strength, 0.0-1.0
//!
//! [export]
//! format = "jpeg"           # jpeg, png or gif
//! quality = 95              # JPEG quality (1-100)
//! output_dir = "outputs"    # Created on first export
//! filename = "easel"        # Base name; a timestamp and extension are appended
//!
//! [generation]
//! width = 768
//! height = 768
//! steps = 50
//! guidance_scale = 7.5
//! count = 1
//! # seed = 42               # Omit for a random seed
//!
//! [processing]
//! max_processes = 4         # Max worker threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ExportFormat, ExportSpec, GenerationRequest, Intensity, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "easel.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `easel.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EaselConfig {
    /// Default filter settings.
    pub filter: FilterConfig,
    /// Where and how results are written.
    pub export: ExportConfig,
    /// Parameters sent to the image source.
    pub generation: GenerationConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl EaselConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.filter.intensity) {
            return Err(ConfigError::Validation(
                "filter.intensity must be 0.0-1.0".into(),
            ));
        }
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        if self.export.format.parse::<ExportFormat>().is_err() {
            return Err(ConfigError::Validation(format!(
                "export.format must be jpeg, png or gif, got \"{}\"",
                self.export.format
            )));
        }
        if self.export.filename.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.filename must not be empty".into(),
            ));
        }
        if self.generation.width == 0 || self.generation.height == 0 {
            return Err(ConfigError::Validation(
                "generation.width and generation.height must be non-zero".into(),
            ));
        }
        if self.generation.count == 0 {
            return Err(ConfigError::Validation(
                "generation.count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The configured export as a typed spec. Call after [`validate`](Self::validate).
    pub fn export_spec(&self) -> ExportSpec {
        ExportSpec {
            format: self.export.format.parse().unwrap_or(ExportFormat::Jpeg),
            quality: Quality::new(self.export.quality),
            filename: self.export.filename.clone(),
        }
    }

    pub fn filter_intensity(&self) -> Intensity {
        Intensity::new(self.filter.intensity)
    }

    /// A generation request for `prompt` using the configured parameters.
    pub fn generation_request(&self, prompt: &str) -> GenerationRequest {
        let g = &self.generation;
        GenerationRequest {
            prompt: prompt.to_string(),
            width: g.width,
            height: g.height,
            steps: g.steps,
            guidance_scale: g.guidance_scale,
            seed: g.seed,
            count: g.count,
        }
    }
}

/// Default filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Strength used when a filter is requested without `--intensity`.
    pub intensity: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { intensity: 0.5 }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// `jpeg`, `png` or `gif`.
    pub format: String,
    /// JPEG quality (1 = worst, 100 = best). Ignored by PNG and GIF.
    pub quality: u32,
    /// Output directory, created if missing.
    pub output_dir: String,
    /// Base filename without timestamp or extension.
    pub filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 95,
            output_dir: "outputs".to_string(),
            filename: "easel".to_string(),
        }
    }
}

/// Image source parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
    /// Diffusion steps.
    pub steps: u32,
    /// Prompt adherence.
    pub guidance_scale: f32,
    /// Fixed seed for reproducible output; absent means random.
    pub seed: Option<u64>,
    /// Images per request.
    pub count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 768,
            height: 768,
            steps: 50,
            guidance_scale: 7.5,
            seed: None,
            count: 1,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for pixel loops.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EaselConfig::default())?)
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
) -> Result<EaselConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EaselConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or from `easel.toml` in the working directory.
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load_config(path: Option<&Path>) -> Result<EaselConfig, ConfigError> {
    let overlay = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", p.display()),
            )));
        }
        Some(p) => load_raw_config(p)?,
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `easel.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Easel Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Filters
# ---------------------------------------------------------------------------
[filter]
# Strength used when --intensity is not given (0.0 = no effect, 1.0 = full).
# For blur this sets the radius, for sharpen the enhancement factor.
intensity = 0.5

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Output format: "jpeg", "png" or "gif".
format = "jpeg"

# JPEG quality (1 = worst, 100 = best). PNG and GIF ignore it.
quality = 95

# Directory for exported files. Created if it does not exist.
output_dir = "outputs"

# Base filename. Files are written as <filename>_<YYYYmmdd_HHMMSS>.<ext>.
filename = "easel"

# ---------------------------------------------------------------------------
# Generation
# ---------------------------------------------------------------------------
[generation]
# Size of generated images in pixels.
width = 768
height = 768

# Diffusion steps and prompt adherence.
steps = 50
guidance_scale = 7.5

# Images per request.
count = 1

# Fixed seed for reproducible results. Omit for a random seed.
# seed = 42

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for pixel processing.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
