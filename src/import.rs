//! Import orchestration - workbook → validated records → store
//!
//! ```text
//! upload bytes → temp file → first sheet → header mapping
//!              → per-row transform → drop blank NIFs → batch insert
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::RowTransformer;
use crate::error::{IntakeError, IntakeResult};
use crate::excel::{resolve_headers, CanonicalField, HeaderMapping, SheetData, WorkbookReader};
use crate::store::RecordStore;
use crate::types::{ImportSummary, TaxpayerRecord};

/// Records ready for persistence, with the counts that produced them
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub sheet_name: String,
    pub mapping: HeaderMapping,
    pub records: Vec<TaxpayerRecord>,
    /// Non-blank data rows in the sheet
    pub rows_read: usize,
}

impl PreparedImport {
    /// Rows dropped for lack of a NIF
    pub fn dropped_count(&self) -> usize {
        self.rows_read - self.records.len()
    }
}

/// Resolve headers and transform every row of a sheet.
///
/// Fails before touching any row when a canonical header is missing, and
/// after transformation when no row survived.
pub fn prepare(sheet: SheetData, processed_on: NaiveDate) -> IntakeResult<PreparedImport> {
    let mapping = resolve_headers(&sheet.headers)?;
    for field in CanonicalField::ALL {
        if let Some(header) = mapping.get(field) {
            debug!(field = %field, header = %header, "Header mapped");
        }
    }

    let rows_read = sheet.rows.len();
    let transformer = RowTransformer::new(&mapping, processed_on);
    let records: Vec<TaxpayerRecord> = sheet
        .rows
        .iter()
        .filter_map(|row| transformer.transform(row))
        .collect();

    if records.is_empty() {
        return Err(IntakeError::NoValidRows);
    }

    Ok(PreparedImport {
        sheet_name: sheet.name,
        mapping,
        records,
        rows_read,
    })
}

/// Runs whole-workbook imports against a record store
pub struct ImportOrchestrator<'s, S: RecordStore> {
    store: &'s mut S,
    upload_dir: PathBuf,
    processed_on: Option<NaiveDate>,
}

impl<'s, S: RecordStore> ImportOrchestrator<'s, S> {
    pub fn new(store: &'s mut S, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
            processed_on: None,
        }
    }

    /// Fix the default filing date instead of using today's date
    pub fn with_processing_date(mut self, date: NaiveDate) -> Self {
        self.processed_on = Some(date);
        self
    }

    /// Import an uploaded workbook.
    ///
    /// The upload is staged in a temp file under the upload directory; the
    /// file is removed whichever way the import ends.
    pub fn import_upload(&mut self, upload: Option<Vec<u8>>) -> IntakeResult<ImportSummary> {
        let bytes = upload.ok_or(IntakeError::MissingFile)?;

        fs::create_dir_all(&self.upload_dir)?;
        let mut temp = tempfile::Builder::new()
            .prefix("temp-")
            .suffix(".xlsx")
            .tempfile_in(&self.upload_dir)?;
        let result = stage(&mut temp, &bytes).and_then(|()| self.import_path(temp.path()));

        let temp_path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!("Failed to remove temp upload {}: {}", temp_path.display(), e);
        }

        result
    }

    /// Import a workbook already on disk
    pub fn import_path(&mut self, path: &Path) -> IntakeResult<ImportSummary> {
        debug!("Reading workbook {}", path.display());
        let sheet = WorkbookReader::open(path)?;
        self.import_sheet(sheet)
    }

    /// Import an already-read sheet
    pub fn import_sheet(&mut self, sheet: SheetData) -> IntakeResult<ImportSummary> {
        let processed_on = self
            .processed_on
            .unwrap_or_else(|| Utc::now().date_naive());
        let prepared = prepare(sheet, processed_on)?;
        if prepared.dropped_count() > 0 {
            warn!("{} row(s) skipped without NIF", prepared.dropped_count());
        }

        let outcome = self.store.insert_batch(&prepared.records)?;
        let summary = ImportSummary::new(
            outcome.inserted_count,
            outcome.total_count,
            prepared.rows_read,
        );
        info!(
            sheet = %prepared.sheet_name,
            inserted = summary.inserted_count,
            total = summary.total_count,
            rows = summary.rows_read,
            "Import complete"
        );
        Ok(summary)
    }
}

fn stage(temp: &mut NamedTempFile, bytes: &[u8]) -> IntakeResult<()> {
    temp.write_all(bytes)?;
    temp.flush()?;
    debug!("Upload staged at {}", temp.path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::RawRow;
    use crate::store::BatchOutcome;
    use calamine::Data;

    /// Store that only records what it was asked to insert
    #[derive(Default)]
    struct RecordingStore {
        batches: Vec<Vec<TaxpayerRecord>>,
    }

    impl RecordStore for RecordingStore {
        fn insert_batch(&mut self, records: &[TaxpayerRecord]) -> IntakeResult<BatchOutcome> {
            self.batches.push(records.to_vec());
            Ok(BatchOutcome {
                inserted_count: records.len(),
                total_count: records.len(),
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn headers() -> Vec<String> {
        CanonicalField::ALL
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn sheet(nifs: &[&str]) -> SheetData {
        let rows = nifs
            .iter()
            .map(|nif| {
                let mut row = RawRow::new();
                row.insert("NIF", Data::String(nif.to_string()));
                row.insert("RAISON SOCIALE", Data::String("X".to_string()));
                row
            })
            .collect();
        SheetData {
            name: "Sheet1".to_string(),
            headers: headers(),
            rows,
        }
    }

    #[test]
    fn test_prepare_drops_blank_nifs() {
        let prepared = prepare(sheet(&["1", "", "  ", "2"]), date(2024, 1, 1)).unwrap();
        assert_eq!(prepared.rows_read, 4);
        assert_eq!(prepared.records.len(), 2);
        assert_eq!(prepared.dropped_count(), 2);
    }

    #[test]
    fn test_prepare_fails_when_no_row_survives() {
        let err = prepare(sheet(&["", " "]), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, IntakeError::NoValidRows));

        let err = prepare(sheet(&[]), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, IntakeError::NoValidRows));
    }

    #[test]
    fn test_missing_headers_fail_before_rows() {
        let mut data = sheet(&["1"]);
        data.headers.retain(|h| h != "NIF");
        let err = prepare(data, date(2024, 1, 1)).unwrap_err();
        match err {
            IntakeError::MissingHeaders { missing, .. } => assert_eq!(missing, vec!["NIF"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_import_sheet_uses_processing_date() {
        let mut store = RecordingStore::default();
        let summary = ImportOrchestrator::new(&mut store, "unused")
            .with_processing_date(date(2024, 2, 3))
            .import_sheet(sheet(&["1", ""]))
            .unwrap();

        assert_eq!(summary.inserted_count, 1);
        assert_eq!(summary.total_count, 1);
        assert_eq!(summary.rows_read, 2);
        assert_eq!(store.batches.len(), 1);
        assert_eq!(store.batches[0][0].filing_date, date(2024, 2, 3));
    }

    #[test]
    fn test_missing_upload() {
        let mut store = RecordingStore::default();
        let err = ImportOrchestrator::new(&mut store, "unused")
            .import_upload(None)
            .unwrap_err();
        assert!(matches!(err, IntakeError::MissingFile));
        assert!(store.batches.is_empty());
    }
}
