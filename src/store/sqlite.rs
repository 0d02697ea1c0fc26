use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{BatchOutcome, RecordStore};
use crate::error::IntakeResult;
use crate::types::TaxpayerRecord;

/// Concurrent API imports each hold their own connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_taxpayers.sql"))];

const INSERT_SQL: &str = "INSERT INTO taxpayers
     (tax_identifier, legal_name, filing_date, up_to_date_at_filing, requested_documents,
      quantity_requested, managing_center, registry_arrival_date, delivery_date,
      processing_days, rejected, rejection_reason, observation)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
     ON CONFLICT(tax_identifier) DO NOTHING";

const SELECT_COLUMNS: &str = "tax_identifier, legal_name, filing_date, up_to_date_at_filing,
     requested_documents, quantity_requested, managing_center, registry_arrival_date,
     delivery_date, processing_days, rejected, rejection_reason, observation";

/// SQLite-backed taxpayer store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations
    pub fn open(path: &Path) -> IntakeResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> IntakeResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> IntakeResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> IntakeResult<()> {
        let current_version = self.current_version();
        for (version, sql) in MIGRATIONS {
            if *version > current_version {
                info!("Running migration v{version}");
                self.conn.execute_batch(sql)?;
            }
        }
        Ok(())
    }

    /// Current schema version (0 before the first migration)
    fn current_version(&self) -> i64 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Number of stored records
    pub fn count(&self) -> IntakeResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM taxpayers", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Look up a record by its natural key
    pub fn find_by_tax_identifier(&self, nif: &str) -> IntakeResult<Option<TaxpayerRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM taxpayers WHERE tax_identifier = ?1");
        let record = self
            .conn
            .query_row(&sql, params![nif], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// All records in insertion order
    pub fn all(&self) -> IntakeResult<Vec<TaxpayerRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM taxpayers ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl RecordStore for SqliteStore {
    fn insert_batch(&mut self, records: &[TaxpayerRecord]) -> IntakeResult<BatchOutcome> {
        let tx = self.conn.transaction()?;
        let mut inserted_count = 0;

        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for record in records {
                let changed = stmt.execute(params![
                    record.tax_identifier,
                    record.legal_name,
                    record.filing_date,
                    record.up_to_date_at_filing,
                    record.requested_documents,
                    record.quantity_requested,
                    record.managing_center,
                    record.registry_arrival_date,
                    record.delivery_date,
                    record.processing_days,
                    record.rejected,
                    record.rejection_reason,
                    record.observation,
                ])?;
                if changed == 0 {
                    debug!(nif = %record.tax_identifier, "Skipping duplicate NIF");
                }
                inserted_count += changed;
            }
        }

        // Dropping `tx` on an early return rolls the batch back
        tx.commit()?;

        Ok(BatchOutcome {
            inserted_count,
            total_count: records.len(),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TaxpayerRecord> {
    Ok(TaxpayerRecord {
        tax_identifier: row.get(0)?,
        legal_name: row.get(1)?,
        filing_date: row.get::<_, NaiveDate>(2)?,
        up_to_date_at_filing: row.get(3)?,
        requested_documents: row.get(4)?,
        quantity_requested: row.get(5)?,
        managing_center: row.get(6)?,
        registry_arrival_date: row.get(7)?,
        delivery_date: row.get(8)?,
        processing_days: row.get(9)?,
        rejected: row.get(10)?,
        rejection_reason: row.get(11)?,
        observation: row.get(12)?,
    })
}
