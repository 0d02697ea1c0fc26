//! Intake - taxpayer spreadsheet import
//!
//! This library turns an uploaded, human-authored workbook into validated
//! taxpayer records and stores them without creating duplicates.
//!
//! # Features
//!
//! - Header aliasing that ignores stray whitespace
//! - Dates from serial numbers, date cells, or several text layouts
//! - Derived processing days (registry arrival → delivery)
//! - Idempotent batch loading keyed on the NIF
//!
//! # Example
//!
//! ```no_run
//! use royalbit_intake::import::ImportOrchestrator;
//! use royalbit_intake::store::SqliteStore;
//! use std::path::Path;
//!
//! let mut store = SqliteStore::open(Path::new("intake.db"))?;
//! let summary = ImportOrchestrator::new(&mut store, "./uploads")
//!     .import_path(Path::new("depots.xlsx"))?;
//!
//! println!("{}", summary.message);
//! # Ok::<(), royalbit_intake::error::IntakeError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod import;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{IntakeError, IntakeResult};
pub use types::{ImportSummary, TaxpayerRecord};
