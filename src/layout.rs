//! Column layout detection for day-per-column production exports.
//!
//! Two export variants exist in the wild and carry no schema marker:
//!
//! ```text
//! Typ | Kod | Brygada | 1 | 2 | ...          (no Name column)
//! Typ | Kod | Nazwa | Brygada | 1 | 2 | ...  (with Name column)
//! ```
//!
//! The fourth header cell decides: numeric means the days already started.

use crate::error::PipelineError;
use crate::sheet_parser::{RawCell, RawGrid};
use std::collections::HashSet;
use tracing::debug;

/// Minimum width of a usable export: three identifier columns plus one day.
const MIN_COLUMNS: usize = 4;

/// Column probed to tell the two export variants apart.
const PROBE_COLUMN: usize = 3;

/// Where each field lives in the raw grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub record_type: usize,
    pub code: usize,
    /// `None` for exports without a Name column; names then default to "".
    pub name: Option<usize>,
    pub shift: usize,
    pub first_day_column: usize,
    /// Columns holding per-day values, in sheet order. Days are unique.
    pub day_columns: Vec<DayColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayColumn {
    pub index: usize,
    pub day: u32,
}

impl ColumnLayout {
    pub fn has_name_column(&self) -> bool {
        self.name.is_some()
    }
}

/// Inspect the header row of `grid` and work out the column layout.
pub fn resolve_layout(grid: &RawGrid, header_row: usize) -> Result<ColumnLayout, PipelineError> {
    let width = grid.column_count();
    if width < MIN_COLUMNS {
        return Err(PipelineError::MalformedLayout(format!(
            "expected at least {} columns, found {}",
            MIN_COLUMNS, width
        )));
    }
    if grid.rows.len() <= header_row {
        return Err(PipelineError::MalformedLayout(format!(
            "header row {} missing ({} rows in sheet)",
            header_row,
            grid.rows.len()
        )));
    }

    let (name, shift, first_day_column) = if looks_numeric(grid.cell(header_row, PROBE_COLUMN)) {
        (None, 2, 3)
    } else {
        (Some(2), 3, 4)
    };

    let mut seen = HashSet::new();
    let mut day_columns = Vec::new();
    for index in first_day_column..width {
        let header = grid.cell(header_row, index);
        match parse_day_header(header) {
            Some(day) if seen.insert(day) => day_columns.push(DayColumn { index, day }),
            Some(day) => debug!("Column {} repeats day {}, skipping", index, day),
            None => debug!("Column {} header {:?} is not a day, skipping", index, header),
        }
    }

    let layout = ColumnLayout {
        record_type: 0,
        code: 1,
        name,
        shift,
        first_day_column,
        day_columns,
    };
    debug!(
        "Resolved layout: name column {}, {} day columns from column {}",
        if layout.has_name_column() { "present" } else { "absent" },
        layout.day_columns.len(),
        layout.first_day_column
    );
    Ok(layout)
}

/// A number cell, text that parses to a finite float, or text that is all
/// digits once a single `.` is removed.
pub fn looks_numeric(cell: &RawCell) -> bool {
    match cell {
        RawCell::Number(f) => f.is_finite(),
        RawCell::Text(s) => {
            if s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                return true;
            }
            let stripped = s.replacen('.', "", 1);
            !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
        }
        RawCell::Empty => false,
    }
}

/// Day of month encoded in a header cell (`5`, `5.0`, `"5"`, `"5.0"`), if it
/// falls within 1..=31.
pub fn parse_day_header(cell: &RawCell) -> Option<u32> {
    let day = match cell {
        RawCell::Number(f) if f.is_finite() => f.trunc() as i64,
        RawCell::Text(s) => {
            let s = s.trim();
            let whole = s.split('.').next().unwrap_or(s);
            whole.parse::<i64>().ok()?
        }
        _ => return None,
    };
    (1..=31).contains(&day).then_some(day as u32)
}
