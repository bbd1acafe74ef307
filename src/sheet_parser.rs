//! Spreadsheet ingestion: workbook (via calamine) or CSV into an untyped grid.

use crate::error::PipelineError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, info};

/// A single untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Empty,
}

/// All rows of the resolved sheet, header row included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<RawCell>>,
}

static EMPTY_CELL: RawCell = RawCell::Empty;

impl RawGrid {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    /// Cell at `(row, col)`; out-of-range positions of ragged rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Read the grid at `path`.
///
/// Workbooks are resolved against `sheet_candidates` in order, falling back
/// to the first sheet. CSV files are read as a single sheet.
pub fn load_grid(path: &Path, sheet_candidates: &[String]) -> Result<RawGrid, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::SourceUnavailable {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet_candidates),
        _ => Err(PipelineError::UnsupportedFormat(ext)),
    }
}

fn load_workbook(path: &Path, sheet_candidates: &[String]) -> Result<RawGrid, PipelineError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PipelineError::Workbook(e.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet = resolve_sheet_name(&sheet_names, sheet_candidates).ok_or_else(|| {
        PipelineError::Workbook(format!("no worksheets in {}", path.display()))
    })?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PipelineError::Workbook(format!("sheet '{}': {}", sheet, e)))?;

    let grid = range_to_grid(&range);
    info!(
        "Read sheet '{}' from {:?}: {} rows x {} columns",
        sheet,
        path,
        grid.rows.len(),
        grid.column_count()
    );
    Ok(grid)
}

/// First candidate present in the workbook, else the workbook's first sheet.
fn resolve_sheet_name(sheet_names: &[String], candidates: &[String]) -> Option<String> {
    for candidate in candidates {
        if sheet_names.iter().any(|name| name == candidate) {
            return Some(candidate.clone());
        }
        debug!("Sheet '{}' not present, trying next candidate", candidate);
    }
    sheet_names.first().cloned()
}

fn load_csv(path: &Path) -> Result<RawGrid, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .map_err(|e| PipelineError::Csv(e.to_string()))?;

    // Invalid UTF-8 is replaced per field, never per file
    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result.map_err(|e| PipelineError::Csv(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| text_cell(&String::from_utf8_lossy(field)))
                .collect(),
        );
    }

    info!("Read {} CSV rows from {:?}", rows.len(), path);
    Ok(RawGrid::new(rows))
}

fn text_cell(field: &str) -> RawCell {
    if field.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(field.to_string())
    }
}

fn range_to_grid(range: &Range<Data>) -> RawGrid {
    RawGrid::new(
        range
            .rows()
            .map(|row| row.iter().map(data_to_cell).collect())
            .collect(),
    )
}

/// Convert a calamine cell into a [`RawCell`].
fn data_to_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        // Date-formatted cells keep their Excel serial value
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::String(s) if s.is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTimeIso(s) => RawCell::Text(s.clone()),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) => RawCell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn candidates() -> Vec<String> {
        vec!["Export".to_string(), "Eksport".to_string(), "Arkusz1".to_string()]
    }

    fn temp_with_suffix(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = load_grid(Path::new("/nonexistent/Export.xlsx"), &candidates()).unwrap_err();
        assert!(err.is_missing_source());
    }

    #[test]
    fn test_parse_csv_keeps_header_row() {
        let file = temp_with_suffix(".csv", "Typ,Kod,Brygada,1,2\nDzienne,1310,A,100,\n".as_bytes());
        let grid = load_grid(file.path(), &candidates()).unwrap();

        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.cell(0, 0), &RawCell::Text("Typ".to_string()));
        assert_eq!(grid.cell(1, 3), &RawCell::Text("100".to_string()));
        assert_eq!(grid.cell(1, 4), &RawCell::Empty);
    }

    #[test]
    fn test_parse_csv_flexible() {
        let file = temp_with_suffix(".csv", b"a,b,c,d\n1,2\n");
        let grid = load_grid(file.path(), &candidates()).unwrap();
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.cell(1, 3), &RawCell::Empty);
        assert_eq!(grid.cell(7, 0), &RawCell::Empty);
    }

    #[test]
    fn test_parse_csv_invalid_utf8_cell() {
        // Latin-2 "ł" (0xB3) saved from a legacy export
        let file = temp_with_suffix(
            ".csv",
            b"Typ,Kod,Nazwa,Brygada,1\nDzienne,20,Linia \xb3,A,5\nDzienne,21,X,A,7\n",
        );
        let grid = load_grid(file.path(), &candidates()).unwrap();

        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.cell(1, 2), &RawCell::Text("Linia \u{FFFD}".to_string()));
        assert_eq!(grid.cell(1, 4), &RawCell::Text("5".to_string()));
        assert_eq!(grid.cell(2, 1), &RawCell::Text("21".to_string()));
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let file = temp_with_suffix(".xlsx", b"this is not a zip archive");
        let err = load_grid(file.path(), &candidates()).unwrap_err();
        assert!(matches!(err, PipelineError::Workbook(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_with_suffix(".txt", b"data");
        let err = load_grid(file.path(), &candidates()).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn test_resolve_sheet_name_order() {
        let names = vec!["Arkusz1".to_string(), "Eksport".to_string()];
        assert_eq!(resolve_sheet_name(&names, &candidates()), Some("Eksport".to_string()));

        let names = vec!["Sheet1".to_string(), "Notes".to_string()];
        assert_eq!(resolve_sheet_name(&names, &candidates()), Some("Sheet1".to_string()));

        assert_eq!(resolve_sheet_name(&[], &candidates()), None);
    }

    #[test]
    fn test_data_to_cell() {
        assert_eq!(data_to_cell(&Data::Int(5)), RawCell::Number(5.0));
        assert_eq!(data_to_cell(&Data::Float(2.5)), RawCell::Number(2.5));
        assert_eq!(data_to_cell(&Data::String(String::new())), RawCell::Empty);
        assert_eq!(
            data_to_cell(&Data::String("A".to_string())),
            RawCell::Text("A".to_string())
        );
        assert_eq!(data_to_cell(&Data::Bool(true)), RawCell::Text("true".to_string()));
        assert_eq!(data_to_cell(&Data::Empty), RawCell::Empty);
    }
}
