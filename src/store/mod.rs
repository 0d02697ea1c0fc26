//! Record persistence
//!
//! The pipeline only ever appends. A record whose NIF is already stored is
//! skipped, which keeps repeated and overlapping imports idempotent.

mod sqlite;

pub use sqlite::SqliteStore;

use serde::Serialize;

use crate::error::IntakeResult;
use crate::types::TaxpayerRecord;

/// Result of one batch insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct BatchOutcome {
    pub inserted_count: usize,
    pub total_count: usize,
}

/// Storage seam used by the import pipeline
pub trait RecordStore {
    /// Insert all records in one all-or-nothing batch.
    ///
    /// Records colliding with an existing NIF (stored or earlier in the same
    /// batch) are skipped silently. Any other constraint failure aborts the
    /// whole batch and nothing is committed.
    fn insert_batch(&mut self, records: &[TaxpayerRecord]) -> IntakeResult<BatchOutcome>;
}
