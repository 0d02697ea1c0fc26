//! Row transformation - raw row + header mapping → validated record
//!
//! Only a blank NIF drops a row. Every other irregularity (blank optional
//! fields, unreadable dates, non-numeric quantities) is normalized silently.

use calamine::Data;
use chrono::NaiveDate;
use tracing::warn;

use crate::core::metrics;
use crate::excel::{
    cell_to_string, parse_cell_date, CanonicalField, HeaderMapping, RawRow, EMPTY_CELL,
};
use crate::types::TaxpayerRecord;

/// Cell value read as "yes" for boolean columns (case-insensitive)
pub const AFFIRMATIVE_TOKEN: &str = "oui";

/// Turns raw rows into taxpayer records for one import run
pub struct RowTransformer<'a> {
    mapping: &'a HeaderMapping,
    /// Filing date used when the row carries none
    processed_on: NaiveDate,
}

impl<'a> RowTransformer<'a> {
    pub fn new(mapping: &'a HeaderMapping, processed_on: NaiveDate) -> Self {
        Self {
            mapping,
            processed_on,
        }
    }

    /// Transform one row, or `None` when its NIF is blank
    pub fn transform(&self, row: &RawRow) -> Option<TaxpayerRecord> {
        let tax_identifier = self.text(row, CanonicalField::TaxIdentifier);
        if tax_identifier.is_empty() {
            warn!("Skipping row without NIF");
            return None;
        }

        let filing_date = parse_cell_date(self.cell(row, CanonicalField::FilingDate))
            .unwrap_or(self.processed_on);
        let registry_arrival_date =
            parse_cell_date(self.cell(row, CanonicalField::RegistryArrivalDate));
        let delivery_date = parse_cell_date(self.cell(row, CanonicalField::DeliveryDate));

        Some(TaxpayerRecord {
            tax_identifier,
            legal_name: self.text(row, CanonicalField::LegalName),
            filing_date,
            up_to_date_at_filing: is_affirmative(self.cell(row, CanonicalField::UpToDateAtFiling)),
            requested_documents: self.text(row, CanonicalField::RequestedDocuments),
            quantity_requested: coerce_quantity(self.cell(row, CanonicalField::QuantityRequested)),
            managing_center: self.text(row, CanonicalField::ManagingCenter),
            registry_arrival_date,
            delivery_date,
            processing_days: metrics::processing_days(registry_arrival_date, delivery_date),
            rejected: is_affirmative(self.cell(row, CanonicalField::Rejected)),
            rejection_reason: None,
            observation: optional_text(self.cell(row, CanonicalField::Observation)),
        })
    }

    fn cell<'r>(&self, row: &'r RawRow, field: CanonicalField) -> &'r Data {
        match self.mapping.get(field) {
            Some(header) => row.get(header),
            None => &EMPTY_CELL,
        }
    }

    fn text(&self, row: &RawRow, field: CanonicalField) -> String {
        cell_to_string(self.cell(row, field)).trim().to_string()
    }
}

/// True iff the trimmed cell equals the affirmative token, ignoring case
pub fn is_affirmative(cell: &Data) -> bool {
    cell_to_string(cell).trim().to_lowercase() == AFFIRMATIVE_TOKEN
}

/// Numeric coercion for quantities; anything unusable becomes 0
pub fn coerce_quantity(cell: &Data) -> u32 {
    let value = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return 0;
            }
            match s.parse::<f64>() {
                Ok(v) => v,
                Err(_) => return 0,
            }
        }
        _ => return 0,
    };

    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        value.trunc() as u32
    } else {
        0
    }
}

/// Trimmed text, `None` only when the cell is absent.
///
/// A present but blank cell reads as `""`.
pub fn optional_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        other => Some(cell_to_string(other).trim().to_string()),
    }
}
