//! JSON backup commands (export, import)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tally_core::db::Database;
use tally_core::export::{default_export_name, ExportDocument, ImportMode};
use tally_core::period::local_now;

/// Export every record to a JSON file, returning the path written
pub fn cmd_export(db: &Database, output: Option<PathBuf>, user: &str) -> Result<PathBuf> {
    let path = output.unwrap_or_else(|| PathBuf::from(default_export_name(local_now().date())));

    let doc = db
        .export_json(user, Utc::now())
        .context("Failed to export records")?;
    doc.write_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Exported {} records to {}", doc.record_count(), path.display());
    println!("   Expenses:    {}", doc.expenses.len());
    println!("   Incomes:     {}", doc.incomes.len());
    println!("   Investments: {}", doc.investments.len());
    println!("   Lent money:  {}", doc.lent_money.len());

    Ok(path)
}

/// Import a JSON backup, optionally replacing existing records
pub fn cmd_import(db: &Database, file: &Path, replace: bool) -> Result<()> {
    let doc = ExportDocument::read_from(file)
        .with_context(|| format!("Failed to read backup {}", file.display()))?;

    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Append
    };

    println!(
        "Importing backup from {} ({}, exported {})...",
        file.display(),
        doc.user,
        doc.export_date.format("%Y-%m-%d %H:%M")
    );

    let stats = db
        .import_json(&doc, mode)
        .context("Import failed; no records were changed")?;

    if stats.replaced {
        println!("   Existing records removed");
    }
    println!("✅ Imported {} records", stats.total());
    println!("   Expenses:    {}", stats.expenses);
    println!("   Incomes:     {}", stats.incomes);
    println!("   Investments: {}", stats.investments);
    println!("   Lent money:  {}", stats.lent_money);

    Ok(())
}
