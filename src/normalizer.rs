//! Wide-to-long reshaping: one record per (row, day column) with a usable value.

use crate::layout::ColumnLayout;
use crate::sheet_parser::{RawCell, RawGrid};
use tracing::debug;

/// One observation: a single value for one code, shift and day.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub record_type: String,
    pub code: String,
    pub name: String,
    pub shift: String,
    pub day: u32,
    /// Always finite; cells without a usable number never become records.
    pub value: f64,
}

/// Reshape every data row below `header_row` into long records.
pub fn normalize(grid: &RawGrid, layout: &ColumnLayout, header_row: usize) -> Vec<LongRecord> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (offset, row) in grid.rows.iter().enumerate().skip(header_row + 1) {
        let record_type = cell_to_text(grid.cell(offset, layout.record_type));
        let code = cell_to_text(grid.cell(offset, layout.code));
        let name = layout
            .name
            .map(|col| cell_to_text(grid.cell(offset, col)))
            .unwrap_or_default();
        let shift = cell_to_text(grid.cell(offset, layout.shift));

        for column in &layout.day_columns {
            let Some(value) = row.get(column.index).and_then(cell_to_value) else {
                dropped += 1;
                continue;
            };
            records.push(LongRecord {
                record_type: record_type.clone(),
                code: code.clone(),
                name: name.clone(),
                shift: shift.clone(),
                day: column.day,
                value,
            });
        }
    }

    debug!(
        "Normalized {} records ({} empty or non-numeric cells dropped)",
        records.len(),
        dropped
    );
    records
}

/// Identifier fields keep their exact text; whole numbers lose the `.0`.
pub fn cell_to_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(s) => s.clone(),
        RawCell::Number(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        RawCell::Empty => String::new(),
    }
}

/// Numeric value of a day cell, or `None` when nothing usable was recorded.
pub fn cell_to_value(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Number(f) => *f,
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCell::Empty => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::resolve_layout;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn num(f: f64) -> RawCell {
        RawCell::Number(f)
    }

    fn no_name_grid() -> RawGrid {
        RawGrid::new(vec![
            vec![text("Typ"), text("Kod"), text("Brygada"), text("1"), text("2"), text("3")],
            vec![text("Dzienne"), text("1310"), text("A"), num(100.0), num(150.0), num(200.0)],
            vec![text("Narastające"), text("1310"), text("A"), num(100.0), num(250.0), num(450.0)],
        ])
    }

    #[test]
    fn test_no_name_scenario() {
        let grid = no_name_grid();
        let layout = resolve_layout(&grid, 0).unwrap();
        let records = normalize(&grid, &layout, 0);

        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.name.is_empty() && r.code == "1310" && r.shift == "A"));
        assert_eq!(
            records[0],
            LongRecord {
                record_type: "Dzienne".to_string(),
                code: "1310".to_string(),
                name: String::new(),
                shift: "A".to_string(),
                day: 1,
                value: 100.0,
            }
        );
        assert_eq!(records[5].record_type, "Narastające");
        assert_eq!(records[5].day, 3);
        assert_eq!(records[5].value, 450.0);
    }

    #[test]
    fn test_name_column_and_numeric_code() {
        let grid = RawGrid::new(vec![
            vec![text("Typ"), text("Kod"), text("Nazwa"), text("Brygada"), num(1.0), num(2.0)],
            vec![text("Dzienne"), num(20.0), text("Line20"), text("B"), num(5.5), text("7")],
        ]);
        let layout = resolve_layout(&grid, 0).unwrap();
        let records = normalize(&grid, &layout, 0);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "20");
        assert_eq!(records[0].name, "Line20");
        assert_eq!(records[0].shift, "B");
        assert_eq!(records[0].value, 5.5);
        assert_eq!(records[1].value, 7.0);
    }

    #[test]
    fn test_unusable_values_are_dropped_not_zeroed() {
        let grid = RawGrid::new(vec![
            vec![text("Typ"), text("Kod"), text("Brygada"), text("1"), text("2"), text("3"), text("4")],
            vec![text("Dzienne"), text("1"), text("C"), RawCell::Empty, text("n/a"), text("NaN"), num(f64::INFINITY)],
            vec![text("Dzienne"), text("1"), text("C"), text(" 42 ")],
        ]);
        let layout = resolve_layout(&grid, 0).unwrap();
        let records = normalize(&grid, &layout, 0);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day, 1);
        assert_eq!(records[0].value, 42.0);
        assert!(records.iter().all(|r| r.value.is_finite()));
    }

    #[test]
    fn test_identifier_text_is_not_trimmed() {
        let grid = RawGrid::new(vec![
            vec![text("Typ"), text("Kod"), text("Brygada"), text("1")],
            vec![text("Dzienne "), text("1310"), text(" A"), num(1.0)],
        ]);
        let layout = resolve_layout(&grid, 0).unwrap();
        let records = normalize(&grid, &layout, 0);
        assert_eq!(records[0].record_type, "Dzienne ");
        assert_eq!(records[0].shift, " A");
    }

    #[test]
    fn test_rows_above_header_are_ignored() {
        let mut rows = vec![vec![text("Eksport z systemu MES")]];
        rows.extend(no_name_grid().rows);
        let grid = RawGrid::new(rows);

        let layout = resolve_layout(&grid, 1).unwrap();
        let records = normalize(&grid, &layout, 1);
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.record_type != "Typ"));
    }

    #[test]
    fn test_header_only_grid_yields_nothing() {
        let grid = RawGrid::new(vec![vec![text("Typ"), text("Kod"), text("Brygada"), text("1")]]);
        let layout = resolve_layout(&grid, 0).unwrap();
        assert!(normalize(&grid, &layout, 0).is_empty());
    }

    #[test]
    fn test_cell_to_text() {
        assert_eq!(cell_to_text(&num(1310.0)), "1310");
        assert_eq!(cell_to_text(&num(12.5)), "12.5");
        assert_eq!(cell_to_text(&text("A")), "A");
        assert_eq!(cell_to_text(&RawCell::Empty), "");
    }

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&num(3.25)), Some(3.25));
        assert_eq!(cell_to_value(&text("1e3")), Some(1000.0));
        assert_eq!(cell_to_value(&text("")), None);
        assert_eq!(cell_to_value(&text("inf")), None);
        assert_eq!(cell_to_value(&num(f64::NAN)), None);
        assert_eq!(cell_to_value(&RawCell::Empty), None);
    }
}
