//! Income operations

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
use crate::models::{Income, IncomeCategory, IncomePatch, NewIncome};

impl Record for Income {
    const TABLE: Table = Table::Incomes;
    const COLUMNS: &'static str =
        "id, date, source, description, amount, category, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            date: get_date(row, 1)?,
            source: row.get(2)?,
            description: row.get(3)?,
            amount: get_amount(row, 4)?,
            category: IncomeCategory::from_stored(&category),
            created_at: get_timestamp(row, 6)?,
            updated_at: get_timestamp(row, 7)?,
        })
    }
}

pub(crate) fn insert_income(
    conn: &Connection,
    income: &NewIncome,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<i64> {
    income.validate()?;
    conn.execute(
        r#"
        INSERT INTO incomes (date, source, description, amount, category, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            encode_date(income.date),
            income.source.trim(),
            income.description.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            encode_amount(income.amount)?,
            income.category.as_str(),
            encode_timestamp(created_at),
            encode_timestamp(updated_at),
        ],
    )
    .map_err(|e| Error::from_write(e, "income"))?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    pub fn add_income(&self, income: &NewIncome) -> Result<i64> {
        let now = now_timestamp();
        let conn = self.conn()?;
        let id = insert_income(&conn, income, now, now)?;

        debug!("Added income {} ({})", id, income.amount);
        self.notify(Table::Incomes, ChangeKind::Inserted, Some(id));
        Ok(id)
    }

    pub fn get_income(&self, id: i64) -> Result<Option<Income>> {
        self.get(id)
    }

    pub fn list_incomes(&self) -> Result<Vec<Income>> {
        self.all()
    }

    pub fn update_income(&self, id: i64, patch: &IncomePatch) -> Result<Income> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut income = fetch_one::<Income>(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("income {}", id)))?;
        patch.apply(&mut income);
        income.updated_at = now_timestamp().max(income.updated_at);

        tx.execute(
            r#"
            UPDATE incomes
            SET date = ?, source = ?, description = ?, amount = ?, category = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                encode_date(income.date),
                income.source,
                income.description,
                encode_amount(income.amount)?,
                income.category.as_str(),
                encode_timestamp(income.updated_at),
                id,
            ],
        )
        .map_err(|e| Error::from_write(e, "income"))?;
        tx.commit()?;

        debug!("Updated income {}", id);
        self.notify(Table::Incomes, ChangeKind::Updated, Some(id));
        Ok(income)
    }

    pub fn delete_income(&self, id: i64) -> Result<bool> {
        self.delete_row(Table::Incomes, id)
    }

    /// Incomes dated within `[start, end]`, inclusive
    pub fn get_incomes_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Income>> {
        self.range(IndexedField::INCOME_DATE, start, end)
    }

    pub fn get_incomes_by_category(&self, category: IncomeCategory) -> Result<Vec<Income>> {
        self.equal(IndexedField::INCOME_CATEGORY, category.as_str())
    }
}
