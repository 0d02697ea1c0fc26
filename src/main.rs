use clap::{Parser, Subcommand};
use royalbit_intake::cli;
use royalbit_intake::error::IntakeResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Taxpayer spreadsheet intake: validate, derive, load. Re-imports are safe.")]
#[command(long_about = "Intake - Taxpayer spreadsheet import
Header aliasing | Tolerant date parsing | Duplicate-safe bulk loading

COMMANDS:
  import    - Load the first sheet of a workbook into the database
  check     - Validate a workbook without writing anything
  template  - Write a blank workbook with the expected headers

EXAMPLES:
  intake import depots-2024.xlsx                # Load into ./intake.db
  intake import depots-2024.xlsx -d records.db  # Load into another database
  intake check depots-2024.xlsx --verbose       # Show the header mapping
  intake template modele.xlsx

Rows without a NIF are skipped. Rows whose NIF is already stored are left
untouched, so the same workbook (or a superset of it) can be imported again.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a workbook into the database
    Import {
        /// Path to the .xlsx workbook (first sheet is read)
        file: PathBuf,

        /// SQLite database file (created if missing)
        #[arg(short, long, default_value = "intake.db", env = "INTAKE_DATABASE")]
        database: PathBuf,

        /// Show verbose import steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Validate a workbook without importing it.

Resolves the header row against the accepted header variants and
transforms every row, then reports how many records would be loaded.
Fails with the full list of missing headers if any are absent.")]
    /// Validate a workbook without importing it
    Check {
        /// Path to the .xlsx workbook
        file: PathBuf,

        /// Show the resolved header mapping
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a blank import template
    Template {
        /// Output .xlsx path
        output: PathBuf,
    },
}

fn main() -> IntakeResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            file,
            database,
            verbose,
        } => cli::import(file, database, verbose),

        Commands::Check { file, verbose } => cli::check(file, verbose),

        Commands::Template { output } => cli::template(output),
    }
}
