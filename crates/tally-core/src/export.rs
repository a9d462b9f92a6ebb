//! JSON backup export and import
//!
//! The backup document carries every money record with its id and
//! timestamps:
//!
//! ```json
//! {
//!   "exportDate": "2024-03-15T10:00:00Z",
//!   "user": "Demo User",
//!   "expenses": [...], "incomes": [...], "investments": [...], "lentMoney": [...]
//! }
//! ```
//!
//! Import accepts exactly this shape. Ids are reassigned; `createdAt` and
//! `updatedAt` are kept.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{
    clear_table, fetch_all, insert_expense, insert_income, insert_investment, insert_lent_money,
    ChangeKind, Database, Table,
};
use crate::error::Result;
use crate::models::{
    Expense, Income, Investment, LentMoney, NewExpense, NewIncome, NewInvestment, NewLentMoney,
};

/// Full backup document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: DateTime<Utc>,
    /// Display name of the user who exported
    pub user: String,
    pub expenses: Vec<Expense>,
    pub incomes: Vec<Income>,
    pub investments: Vec<Investment>,
    pub lent_money: Vec<LentMoney>,
}

impl ExportDocument {
    /// Total number of records in the document
    pub fn record_count(&self) -> usize {
        self.expenses.len() + self.incomes.len() + self.investments.len() + self.lent_money.len()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// How an import treats existing records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing records and add the imported ones
    #[default]
    Append,
    /// Empty the four money tables first
    Replace,
}

/// Import statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub expenses: usize,
    pub incomes: usize,
    pub investments: usize,
    pub lent_money: usize,
    /// Whether existing records were removed first
    pub replaced: bool,
}

impl ImportStats {
    pub fn total(&self) -> usize {
        self.expenses + self.incomes + self.investments + self.lent_money
    }
}

/// Backup file name for a given day: `tally-backup-YYYY-MM-DD.json`
pub fn default_export_name(date: NaiveDate) -> String {
    format!("tally-backup-{}.json", date.format("%Y-%m-%d"))
}

impl Database {
    /// Snapshot all four money tables, read in a single transaction
    pub fn export_json(&self, user_name: &str, now: DateTime<Utc>) -> Result<ExportDocument> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let doc = ExportDocument {
            export_date: now,
            user: user_name.to_string(),
            expenses: fetch_all(&tx)?,
            incomes: fetch_all(&tx)?,
            investments: fetch_all(&tx)?,
            lent_money: fetch_all(&tx)?,
        };
        tx.commit()?;

        info!("Exported {} records", doc.record_count());
        Ok(doc)
    }

    /// Import a backup document. The whole import is one transaction: any
    /// invalid record leaves the store untouched.
    pub fn import_json(&self, doc: &ExportDocument, mode: ImportMode) -> Result<ImportStats> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut stats = ImportStats {
            replaced: mode == ImportMode::Replace,
            ..Default::default()
        };

        if mode == ImportMode::Replace {
            for table in Table::TRANSACTIONAL {
                clear_table(&tx, table)?;
            }
        }

        for expense in &doc.expenses {
            insert_expense(
                &tx,
                &NewExpense::from(expense),
                expense.created_at,
                expense.updated_at,
            )?;
            stats.expenses += 1;
        }
        for income in &doc.incomes {
            insert_income(
                &tx,
                &NewIncome::from(income),
                income.created_at,
                income.updated_at,
            )?;
            stats.incomes += 1;
        }
        for investment in &doc.investments {
            insert_investment(
                &tx,
                &NewInvestment::from(investment),
                investment.created_at,
                investment.updated_at,
            )?;
            stats.investments += 1;
        }
        for lent in &doc.lent_money {
            insert_lent_money(
                &tx,
                &NewLentMoney::from(lent),
                lent.created_at,
                lent.updated_at,
            )?;
            stats.lent_money += 1;
        }

        tx.commit()?;

        for table in Table::TRANSACTIONAL {
            let kind = if stats.replaced {
                ChangeKind::Cleared
            } else {
                ChangeKind::Inserted
            };
            self.notify(table, kind, None);
        }

        info!(
            "Imported {} records ({})",
            stats.total(),
            if stats.replaced { "replace" } else { "append" }
        );
        Ok(stats)
    }
}
