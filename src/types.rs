use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::metrics;

//==============================================================================
// Taxpayer Record
//==============================================================================

/// A taxpayer filing as persisted by the import pipeline
///
/// `processing_days` is derived: it is `Some` exactly when both
/// `registry_arrival_date` and `delivery_date` are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerRecord {
    /// Natural key (NIF), never blank
    pub tax_identifier: String,
    pub legal_name: String,
    pub filing_date: NaiveDate,
    pub up_to_date_at_filing: bool,
    pub requested_documents: String,
    pub quantity_requested: u32,
    pub managing_center: String,
    pub registry_arrival_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub processing_days: Option<i64>,
    pub rejected: bool,
    pub rejection_reason: Option<String>,
    pub observation: Option<String>,
}

impl TaxpayerRecord {
    /// Create a record with only the required fields set
    pub fn new(tax_identifier: impl Into<String>, filing_date: NaiveDate) -> Self {
        Self {
            tax_identifier: tax_identifier.into(),
            legal_name: String::new(),
            filing_date,
            up_to_date_at_filing: false,
            requested_documents: String::new(),
            quantity_requested: 0,
            managing_center: String::new(),
            registry_arrival_date: None,
            delivery_date: None,
            processing_days: None,
            rejected: false,
            rejection_reason: None,
            observation: None,
        }
    }

    /// Replace both tracking dates and recompute `processing_days`
    pub fn set_dates(&mut self, arrival: Option<NaiveDate>, delivery: Option<NaiveDate>) {
        self.registry_arrival_date = arrival;
        self.delivery_date = delivery;
        self.processing_days = metrics::processing_days(arrival, delivery);
    }
}

//==============================================================================
// Import Summary
//==============================================================================

/// Outcome of one import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImportSummary {
    /// Records actually written (duplicates excluded)
    pub inserted_count: usize,
    /// Valid candidate records handed to the store
    pub total_count: usize,
    /// Non-blank data rows read from the sheet, dropped rows included
    pub rows_read: usize,
    pub message: String,
}

impl ImportSummary {
    pub fn new(inserted_count: usize, total_count: usize, rows_read: usize) -> Self {
        Self {
            inserted_count,
            total_count,
            rows_read,
            message: format!(
                "Import succeeded: {}/{} records inserted.",
                inserted_count, total_count
            ),
        }
    }

    /// Candidates skipped because their NIF was already stored
    pub fn duplicate_count(&self) -> usize {
        self.total_count.saturating_sub(self.inserted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let record = TaxpayerRecord::new("123456789", date(2024, 3, 1));
        assert_eq!(record.tax_identifier, "123456789");
        assert_eq!(record.quantity_requested, 0);
        assert!(record.processing_days.is_none());
        assert!(!record.rejected);
    }

    #[test]
    fn test_set_dates_recomputes_processing_days() {
        let mut record = TaxpayerRecord::new("123456789", date(2024, 3, 1));
        record.set_dates(Some(date(2023, 1, 5)), Some(date(2023, 1, 10)));
        assert_eq!(record.processing_days, Some(5));

        record.set_dates(Some(date(2023, 1, 5)), None);
        assert_eq!(record.processing_days, None);
    }

    #[test]
    fn test_summary_message() {
        let summary = ImportSummary::new(3, 5, 6);
        assert_eq!(summary.message, "Import succeeded: 3/5 records inserted.");
        assert_eq!(summary.duplicate_count(), 2);
    }

    #[test]
    fn test_duplicate_count_never_underflows() {
        let summary = ImportSummary::new(4, 2, 2);
        assert_eq!(summary.duplicate_count(), 0);
    }

    #[test]
    fn test_record_serializes_dates_as_iso() {
        let mut record = TaxpayerRecord::new("42", date(2024, 2, 29));
        record.set_dates(Some(date(2024, 3, 1)), Some(date(2024, 2, 28)));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"filing_date\":\"2024-02-29\""));
        assert!(json.contains("\"processing_days\":-2"));
    }
}
