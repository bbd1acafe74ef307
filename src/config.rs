//! Service configuration.
//!
//! Loaded from a JSON file (`config.json` by default, overridable with
//! `KIOSK_CONFIG`). Every field has a default, and unknown keys are ignored so
//! the kiosk's shared config file (PIN, rotation intervals, ...) can be reused
//! as-is. A couple of deployment knobs can also be overridden from the
//! environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Top-level configuration for the chart service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Everything the spreadsheet pipeline needs to know about its input and how
/// to present the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Spreadsheet the upload handler overwrites; re-read on every request.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    /// Sheet names tried in order before falling back to the first sheet.
    /// Upstream exporters disagree on naming, so the order matters.
    #[serde(default = "default_sheet_candidates")]
    pub sheet_candidates: Vec<String>,
    /// Zero-based row holding the day headers. Rows above it are ignored,
    /// rows below it are data.
    #[serde(default)]
    pub header_row: usize,
    #[serde(default)]
    pub record_types: RecordTypeLabels,
    /// Prefix for line series names, e.g. "Narastająco A".
    #[serde(default = "default_cumulative_prefix")]
    pub cumulative_prefix: String,
    /// Canonical shift order; drives legend order and color assignment.
    #[serde(default = "default_shift_order")]
    pub shift_order: Vec<String>,
    #[serde(default)]
    pub palette: ShiftPalette,
    /// Code charted when `/api/chart-data` is called without `kod`.
    #[serde(default = "default_code")]
    pub default_code: String,
    /// Default number of days in a chart window.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            sheet_candidates: default_sheet_candidates(),
            header_row: 0,
            record_types: RecordTypeLabels::default(),
            cumulative_prefix: default_cumulative_prefix(),
            shift_order: default_shift_order(),
            palette: ShiftPalette::default(),
            default_code: default_code(),
            window_days: default_window_days(),
        }
    }
}

/// Exact `RecordType` cell texts for the two series kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTypeLabels {
    #[serde(default = "default_daily_label")]
    pub daily: String,
    #[serde(default = "default_cumulative_label")]
    pub cumulative: String,
}

impl Default for RecordTypeLabels {
    fn default() -> Self {
        Self {
            daily: default_daily_label(),
            cumulative: default_cumulative_label(),
        }
    }
}

/// Per-shift colors for bars (daily) and lines (cumulative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftPalette {
    #[serde(default = "default_bar_colors")]
    pub bar: BTreeMap<String, String>,
    #[serde(default = "default_line_colors")]
    pub line: BTreeMap<String, String>,
    #[serde(default = "default_fallback_bar")]
    pub fallback_bar: String,
    #[serde(default = "default_fallback_line")]
    pub fallback_line: String,
}

impl ShiftPalette {
    pub fn bar_color(&self, shift: &str) -> &str {
        self.bar.get(shift).map(String::as_str).unwrap_or(&self.fallback_bar)
    }

    pub fn line_color(&self, shift: &str) -> &str {
        self.line.get(shift).map(String::as_str).unwrap_or(&self.fallback_line)
    }
}

impl Default for ShiftPalette {
    fn default() -> Self {
        Self {
            bar: default_bar_colors(),
            line: default_line_colors(),
            fallback_bar: default_fallback_bar(),
            fallback_line: default_fallback_line(),
        }
    }
}

impl AppConfig {
    /// Load the config file named by `KIOSK_CONFIG` (or `config.json`), then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("KIOSK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load_from_file(Path::new(&path))?;

        if let Ok(source) = std::env::var("KIOSK_SOURCE_PATH") {
            config.pipeline.source_path = PathBuf::from(source);
        }
        if let Ok(bind) = std::env::var("KIOSK_BIND") {
            config.bind_addr = bind;
        }

        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_source_path() -> PathBuf {
    PathBuf::from("Export.xlsx")
}

fn default_sheet_candidates() -> Vec<String> {
    vec!["Export".to_string(), "Eksport".to_string(), "Arkusz1".to_string()]
}

fn default_daily_label() -> String {
    "Dzienne".to_string()
}

fn default_cumulative_label() -> String {
    "Narastające".to_string()
}

fn default_cumulative_prefix() -> String {
    "Narastająco".to_string()
}

fn default_shift_order() -> Vec<String> {
    vec!["A".to_string(), "B".to_string(), "C".to_string()]
}

fn default_code() -> String {
    "1310".to_string()
}

fn default_window_days() -> u32 {
    7
}

fn colors(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(shift, color)| (shift.to_string(), color.to_string()))
        .collect()
}

fn default_bar_colors() -> BTreeMap<String, String> {
    colors(&[("A", "#0ea5e9"), ("B", "#FF6B35"), ("C", "#6b7280")])
}

fn default_line_colors() -> BTreeMap<String, String> {
    colors(&[("A", "#0284c7"), ("B", "#f97316"), ("C", "#4b5563")])
}

fn default_fallback_bar() -> String {
    "#999999".to_string()
}

fn default_fallback_line() -> String {
    "#666666".to_string()
}
