//! Intake API Server module
//!
//! Provides an HTTP REST API for workbook uploads.
//! Run with `intake-server`.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_api_server};
