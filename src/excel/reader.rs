//! Workbook reader - first sheet of an .xlsx file → header row + raw rows

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, open_workbook_from_rs, Data, Range, Reader, Xlsx};

use crate::error::{IntakeError, IntakeResult};

/// Value read for columns a row does not have
pub static EMPTY_CELL: Data = Data::Empty;

/// One data row keyed by the literal header of each column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, Data>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell under `header`; missing columns read as `Data::Empty`
    pub fn get(&self, header: &str) -> &Data {
        self.cells.get(header).unwrap_or(&EMPTY_CELL)
    }

    /// Set a cell, keeping the first value when a header repeats
    pub fn insert(&mut self, header: impl Into<String>, value: Data) {
        self.cells.entry(header.into()).or_insert(value);
    }

    /// True when every cell is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|cell| cell_to_string(cell).trim().is_empty())
    }
}

/// Header row and data rows of the first worksheet
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Reader for the first worksheet of an uploaded workbook
pub struct WorkbookReader;

impl WorkbookReader {
    /// Read the first sheet of the .xlsx file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> IntakeResult<SheetData> {
        let workbook: Xlsx<_> = open_workbook(path.as_ref())
            .map_err(|e| IntakeError::Workbook(format!("Failed to open Excel file: {}", e)))?;
        Self::first_sheet(workbook)
    }

    /// Read the first sheet of an in-memory .xlsx workbook
    pub fn from_bytes(bytes: Vec<u8>) -> IntakeResult<SheetData> {
        let workbook: Xlsx<_> = open_workbook_from_rs(std::io::Cursor::new(bytes))
            .map_err(|e| IntakeError::Workbook(format!("Failed to read Excel data: {}", e)))?;
        Self::first_sheet(workbook)
    }

    fn first_sheet<RS: Read + Seek>(mut workbook: Xlsx<RS>) -> IntakeResult<SheetData> {
        let sheet_names = workbook.sheet_names().to_vec();
        let name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IntakeError::EmptyWorkbook("the workbook contains no sheet".into()))?;

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IntakeError::Workbook(format!("Failed to read sheet '{}': {}", name, e)))?;

        Self::process_sheet(&name, &range)
    }

    /// Split a worksheet range into its header row and non-blank data rows
    fn process_sheet(name: &str, range: &Range<Data>) -> IntakeResult<SheetData> {
        if range.is_empty() {
            return Err(IntakeError::EmptyWorkbook(format!(
                "sheet '{}' is empty or malformed",
                name
            )));
        }

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(cell_to_string).collect())
            .unwrap_or_default();

        let mut data_rows = Vec::new();
        for row in rows {
            let mut raw = RawRow::new();
            for (col, cell) in row.iter().enumerate() {
                // Columns without a header cannot be addressed by any mapping
                let Some(header) = headers.get(col).filter(|h| !h.trim().is_empty()) else {
                    continue;
                };
                raw.insert(header.clone(), cell.clone());
            }
            if !raw.is_blank() {
                data_rows.push(raw);
            }
        }

        Ok(SheetData {
            name: name.to_string(),
            headers,
            rows: data_rows,
        })
    }
}

/// Render a cell the way a user reads it.
///
/// Whole floats print without a fractional part so numeric identifiers
/// such as `123456789.0` become `"123456789"`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(123456789.0)), "123456789");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::String(" x ".to_string())), " x ");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
    }

    #[test]
    fn test_raw_row_missing_column_is_empty() {
        let row = RawRow::new();
        assert_eq!(row.get("NIF"), &Data::Empty);
        assert!(row.is_blank());
    }

    #[test]
    fn test_raw_row_first_value_wins() {
        let mut row = RawRow::new();
        row.insert("NIF", Data::String("1".to_string()));
        row.insert("NIF", Data::String("2".to_string()));
        assert_eq!(row.get("NIF"), &Data::String("1".to_string()));
        assert!(!row.is_blank());
    }

    #[test]
    fn test_garbage_bytes_are_a_workbook_error() {
        let err = WorkbookReader::from_bytes(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, IntakeError::Workbook(_)));
    }
}
