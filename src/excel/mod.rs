//! Excel side of the intake pipeline
//!
//! - Reader: first worksheet → header row + raw rows
//! - Headers: literal headers → canonical fields
//! - Dates: tolerant cell → date conversion
//! - Template: blank workbook with the expected header row

pub mod dates;
pub mod headers;
mod reader;
mod template;

pub use dates::parse_cell_date;
pub use headers::{normalize_header, resolve_headers, CanonicalField, HeaderMapping};
pub use reader::{cell_to_string, RawRow, SheetData, WorkbookReader, EMPTY_CELL};
pub use template::TemplateWriter;
