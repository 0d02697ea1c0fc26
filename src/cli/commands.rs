use crate::error::{IntakeError, IntakeResult};
use crate::excel::{CanonicalField, TemplateWriter, WorkbookReader};
use crate::import::{self, ImportOrchestrator};
use crate::store::SqliteStore;
use chrono::Utc;
use colored::Colorize;
use std::path::PathBuf;

/// Print every missing canonical header, then the headers actually found
fn report_missing_headers(err: &IntakeError) {
    if let IntakeError::MissingHeaders { missing, found } = err {
        println!("{}", "❌ Missing headers:".bold().red());
        for header in missing {
            println!("   - {}", header.red());
        }
        println!("\n   Headers found in the first row:");
        for header in found {
            println!("   - {:?}", header);
        }
        println!(
            "\n{}",
            "💡 Check the headers for extra spaces".bold().yellow()
        );
    }
}

/// Execute the import command
pub fn import(file: PathBuf, database: PathBuf, verbose: bool) -> IntakeResult<()> {
    println!("{}", "📥 Intake - Excel Import".bold().green());
    println!("   Input:    {}", file.display());
    println!("   Database: {}\n", database.display());

    if verbose {
        println!("{}", "💾 Opening database...".cyan());
    }
    let mut store = SqliteStore::open(&database)?;
    let before = store.count()?;

    if verbose {
        println!("{}", "📖 Reading Excel file...".cyan());
    }
    let result = ImportOrchestrator::new(&mut store, std::env::temp_dir()).import_path(&file);

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            report_missing_headers(&e);
            return Err(e);
        }
    };

    println!("{}", "✅ Import Complete!".bold().green());
    println!("   {}", summary.message);
    println!("   Rows read:          {}", summary.rows_read);
    println!(
        "   Skipped (no NIF):   {}",
        summary.rows_read - summary.total_count
    );
    println!("   Already present:    {}", summary.duplicate_count());

    if verbose {
        println!(
            "   Records in store:   {} → {}",
            before,
            store.count()?
        );
    }
    println!();

    Ok(())
}

/// Execute the check command (read + validate, never persist)
pub fn check(file: PathBuf, verbose: bool) -> IntakeResult<()> {
    println!("{}", "🔍 Intake - Checking workbook".bold().green());
    println!("   File: {}\n", file.display());

    let sheet = WorkbookReader::open(&file)?;
    let sheet_name = sheet.name.clone();

    let prepared = match import::prepare(sheet, Utc::now().date_naive()) {
        Ok(prepared) => prepared,
        Err(e) => {
            report_missing_headers(&e);
            return Err(e);
        }
    };

    if verbose {
        println!("   📊 Sheet: {}", sheet_name.bright_blue());
        for field in CanonicalField::ALL {
            if let Some(header) = prepared.mapping.get(field) {
                println!("      {:<45} ← {:?}", field.name(), header);
            }
        }
        println!();
    }

    let with_days = prepared
        .records
        .iter()
        .filter(|r| r.processing_days.is_some())
        .count();

    println!("{}", "✅ Workbook is importable".bold().green());
    println!("   Rows read:              {}", prepared.rows_read);
    println!("   Valid records:          {}", prepared.records.len());
    println!("   Skipped (no NIF):       {}", prepared.dropped_count());
    println!("   With processing days:   {}\n", with_days);

    Ok(())
}

/// Execute the template command
pub fn template(output: PathBuf) -> IntakeResult<()> {
    println!("{}", "📄 Intake - Import Template".bold().green());

    let writer = TemplateWriter::new();
    writer.write(&output)?;

    println!("{}", "✅ Template written!".bold().green());
    println!("   Excel file: {}", output.display());
    println!("   Columns:    {}\n", writer.headers().len());

    Ok(())
}
