//! Chart series for one code, grouped by shift and record type.
//!
//! Two views share the grouping rules but not the presentation:
//! the windowed view (`/api/chart-data`) rounds values for bar labels and
//! omits axis assignment, the full-range view (`/api/series`) keeps full
//! precision and tells the renderer which Y axis each series belongs to.

use crate::config::PipelineConfig;
use crate::normalizer::LongRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Y-axis ceiling when a code has no data.
const DEFAULT_AXIS_CEILING: i64 = 10_000;

/// Headroom above the largest value so bar labels stay inside the plot.
const AXIS_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    #[serde(rename = "y")]
    Primary,
    #[serde(rename = "y2")]
    Secondary,
}

/// One plot-ready trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    pub name: String,
    /// Days, ascending.
    pub x: Vec<u32>,
    pub y: Vec<f64>,
    pub color: String,
    /// Only set in the full-range view.
    #[serde(rename = "yaxis", skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

/// Inclusive day range `[start_day, start_day + days - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start_day: u32,
    pub days: u32,
}

impl DayWindow {
    pub fn new(start_day: u32, days: u32) -> Self {
        Self { start_day, days }
    }

    pub fn end_day(&self) -> Option<u32> {
        if self.days == 0 {
            return None;
        }
        Some(self.start_day.saturating_add(self.days - 1))
    }

    pub fn contains(&self, day: u32) -> bool {
        self.end_day()
            .map(|end| (self.start_day..=end).contains(&day))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy)]
enum Precision {
    Rounded,
    Full,
}

/// Series for `code` restricted to `window`, values rounded to whole units.
pub fn windowed_series(
    records: &[LongRecord],
    code: &str,
    window: DayWindow,
    cfg: &PipelineConfig,
) -> Vec<ChartSeries> {
    build_series(records, code, Some(window), Precision::Rounded, cfg)
}

/// Every day for `code`, full precision, with axis assignment.
pub fn full_series(records: &[LongRecord], code: &str, cfg: &PipelineConfig) -> Vec<ChartSeries> {
    build_series(records, code, None, Precision::Full, cfg)
}

fn build_series(
    records: &[LongRecord],
    code: &str,
    window: Option<DayWindow>,
    precision: Precision,
    cfg: &PipelineConfig,
) -> Vec<ChartSeries> {
    let selected: Vec<&LongRecord> = records
        .iter()
        .filter(|r| r.code == code)
        .filter(|r| window.map(|w| w.contains(r.day)).unwrap_or(true))
        .collect();

    if selected.is_empty() {
        return Vec::new();
    }

    let shifts = shift_order(&selected, &cfg.shift_order);
    let axis = |a: Axis| match precision {
        Precision::Full => Some(a),
        Precision::Rounded => None,
    };

    let mut series = Vec::new();

    for shift in &shifts {
        if let Some((x, y)) = points(&selected, &cfg.record_types.daily, shift, precision) {
            series.push(ChartSeries {
                kind: SeriesKind::Bar,
                name: shift.clone(),
                x,
                y,
                color: cfg.palette.bar_color(shift).to_string(),
                axis: axis(Axis::Primary),
            });
        }
    }

    for shift in &shifts {
        if let Some((x, y)) = points(&selected, &cfg.record_types.cumulative, shift, precision) {
            series.push(ChartSeries {
                kind: SeriesKind::Line,
                name: format!("{} {}", cfg.cumulative_prefix, shift),
                x,
                y,
                color: cfg.palette.line_color(shift).to_string(),
                axis: axis(Axis::Secondary),
            });
        }
    }

    series
}

/// Canonical shifts first, then any others present in the data, sorted.
fn shift_order(records: &[&LongRecord], canonical: &[String]) -> Vec<String> {
    let extra: BTreeSet<&str> = records
        .iter()
        .map(|r| r.shift.as_str())
        .filter(|s| !canonical.iter().any(|c| c.as_str() == *s))
        .collect();

    canonical
        .iter()
        .cloned()
        .chain(extra.into_iter().map(str::to_string))
        .collect()
}

fn points(
    records: &[&LongRecord],
    record_type: &str,
    shift: &str,
    precision: Precision,
) -> Option<(Vec<u32>, Vec<f64>)> {
    let mut matching: Vec<&LongRecord> = records
        .iter()
        .copied()
        .filter(|r| r.record_type == record_type && r.shift == shift)
        .collect();

    if matching.is_empty() {
        return None;
    }

    // Stable, so repeated days keep sheet order
    matching.sort_by_key(|r| r.day);

    let x = matching.iter().map(|r| r.day).collect();
    let y = matching
        .iter()
        .map(|r| match precision {
            Precision::Rounded => r.value.round_ties_even(),
            Precision::Full => r.value,
        })
        .collect();
    Some((x, y))
}

/// Name shown next to `code`: the first one recorded for it, or "".
pub fn display_name(records: &[LongRecord], code: &str) -> String {
    records
        .iter()
        .find(|r| r.code == code)
        .map(|r| r.name.clone())
        .unwrap_or_default()
}

/// Shared ceiling for both Y axes so bars and lines use the same scale.
pub fn axis_ceiling(records: &[LongRecord], code: &str) -> i64 {
    records
        .iter()
        .filter(|r| r.code == code)
        .map(|r| r.value)
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
        .map(|max| (max * AXIS_HEADROOM).trunc() as i64)
        .unwrap_or(DEFAULT_AXIS_CEILING)
}
