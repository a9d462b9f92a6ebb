//! Expense operations

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use super::changes::ChangeKind;
use super::schema::{IndexedField, Table};
use super::store::{
    encode_amount, encode_date, encode_timestamp, fetch_one, get_amount, get_date,
    get_timestamp, now_timestamp, Record,
};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseCategory, ExpensePatch, NewExpense, PaymentMethod};

impl Record for Expense {
    const TABLE: Table = Table::Expenses;
    const COLUMNS: &'static str =
        "id, date, payment_method, title, description, amount, category, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let method: String = row.get(2)?;
        let category: String = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            date: get_date(row, 1)?,
            payment_method: PaymentMethod::from_stored(&method),
            title: row.get(3)?,
            description: row.get(4)?,
            amount: get_amount(row, 5)?,
            category: ExpenseCategory::from_stored(&category),
            created_at: get_timestamp(row, 7)?,
            updated_at: get_timestamp(row, 8)?,
        })
    }
}

/// Validate and insert with explicit timestamps (shared with import and cloud pull)
pub(crate) fn insert_expense(
    conn: &Connection,
    expense: &NewExpense,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<i64> {
    expense.validate()?;
    conn.execute(
        r#"
        INSERT INTO expenses (date, payment_method, title, description, amount, category, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            encode_date(expense.date),
            expense.payment_method.as_str(),
            expense.title.trim(),
            expense.description.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            encode_amount(expense.amount)?,
            expense.category.as_str(),
            encode_timestamp(created_at),
            encode_timestamp(updated_at),
        ],
    )
    .map_err(|e| Error::from_write(e, "expense"))?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Add an expense, returning its id
    pub fn add_expense(&self, expense: &NewExpense) -> Result<i64> {
        let now = now_timestamp();
        let conn = self.conn()?;
        let id = insert_expense(&conn, expense, now, now)?;

        debug!("Added expense {} ({})", id, expense.amount);
        self.notify(Table::Expenses, ChangeKind::Inserted, Some(id));
        Ok(id)
    }

    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        self.get(id)
    }

    pub fn list_expenses(&self) -> Result<Vec<Expense>> {
        self.all()
    }

    /// Apply a patch and return the updated expense
    pub fn update_expense(&self, id: i64, patch: &ExpensePatch) -> Result<Expense> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut expense = fetch_one::<Expense>(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))?;
        patch.apply(&mut expense);
        expense.updated_at = now_timestamp().max(expense.updated_at);

        tx.execute(
            r#"
            UPDATE expenses
            SET date = ?, payment_method = ?, title = ?, description = ?, amount = ?, category = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                encode_date(expense.date),
                expense.payment_method.as_str(),
                expense.title,
                expense.description,
                encode_amount(expense.amount)?,
                expense.category.as_str(),
                encode_timestamp(expense.updated_at),
                id,
            ],
        )
        .map_err(|e| Error::from_write(e, "expense"))?;
        tx.commit()?;

        debug!("Updated expense {}", id);
        self.notify(Table::Expenses, ChangeKind::Updated, Some(id));
        Ok(expense)
    }

    /// Delete an expense. Deleting a missing id is not an error.
    pub fn delete_expense(&self, id: i64) -> Result<bool> {
        self.delete_row(Table::Expenses, id)
    }

    /// Expenses dated within `[start, end]`, inclusive
    pub fn get_expenses_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Expense>> {
        self.range(IndexedField::EXPENSE_DATE, start, end)
    }

    pub fn get_expenses_by_category(&self, category: ExpenseCategory) -> Result<Vec<Expense>> {
        self.equal(IndexedField::EXPENSE_CATEGORY, category.as_str())
    }

    pub fn get_expenses_by_payment_method(&self, method: PaymentMethod) -> Result<Vec<Expense>> {
        self.equal(IndexedField::EXPENSE_PAYMENT_METHOD, method.as_str())
    }
}
