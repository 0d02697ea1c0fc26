//! Intake API Server binary
//!
//! HTTP REST API for taxpayer workbook imports.

use clap::Parser;
use royalbit_intake::api::{run_api_server, server::ApiConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "intake-server")]
#[command(version)]
#[command(author = "RoyalBit Inc. <admin@royalbit.ca>")]
#[command(about = "Intake API Server - HTTP REST API for taxpayer workbook imports")]
#[command(long_about = r#"
Intake API Server - HTTP REST API

Endpoints:
  - POST /api/v1/import    - Import an .xlsx upload (multipart field "file")
  - GET  /api/v1/template  - Download a blank import template
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Features:
  - Duplicate-safe imports (already stored NIFs are skipped)
  - Every missing header reported in one response
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs

Example usage:
  intake-server                           # Start on localhost:8080
  intake-server --host 0.0.0.0 --port 3000 --database /var/lib/intake.db

  curl -X POST http://localhost:8080/api/v1/import \
    -F "file=@depots-2024.xlsx"
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "INTAKE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "INTAKE_PORT")]
    port: u16,

    /// SQLite database file
    #[arg(short, long, default_value = "intake.db", env = "INTAKE_DATABASE")]
    database: PathBuf,

    /// Directory for temporary upload files
    #[arg(long, default_value = "./uploads", env = "INTAKE_UPLOAD_DIR")]
    upload_dir: PathBuf,

    /// Deployment environment; "production" hides internal error detail
    #[arg(short, long, default_value = "development", env = "INTAKE_ENV")]
    environment: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        database_path: args.database,
        upload_dir: args.upload_dir,
        environment: args.environment,
    };

    run_api_server(config).await
}
