//! Lent money operations
//!
//! Status transitions follow one rule: a record that becomes `returned`
//! without a return date gets "now"; going back to `pending` keeps the
//! recorded return date as history.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use super::changes::ChangeKind;
use super::schema::{IndexedField, Table};
use super::store::{
    encode_amount, encode_date, encode_timestamp, fetch_one, get_amount, get_date,
    get_opt_date, get_timestamp, now_timestamp, Record,
};
use super::Database;
use crate::error::{Error, Result};
use crate::insights::{self, LentTotals};
use crate::models::{LentMoney, LentMoneyPatch, LentStatus, NewLentMoney};
use crate::period::local_now;

impl Record for LentMoney {
    const TABLE: Table = Table::LentMoney;
    const COLUMNS: &'static str = "id, name, amount, reason, given_date, return_date, comment, status, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(7)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            amount: get_amount(row, 2)?,
            reason: row.get(3)?,
            given_date: get_date(row, 4)?,
            return_date: get_opt_date(row, 5)?,
            comment: row.get(6)?,
            status: LentStatus::from_stored(&status),
            created_at: get_timestamp(row, 8)?,
            updated_at: get_timestamp(row, 9)?,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn insert_lent_money(
    conn: &Connection,
    lent: &NewLentMoney,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<i64> {
    lent.validate()?;

    // A loan recorded as already returned still needs its return date
    let return_date = match (lent.status, lent.return_date) {
        (LentStatus::Returned, None) => Some(local_now()),
        (_, date) => date,
    };

    conn.execute(
        r#"
        INSERT INTO lent_money (name, amount, reason, given_date, return_date, comment, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            lent.name.trim(),
            encode_amount(lent.amount)?,
            non_blank(&lent.reason),
            encode_date(lent.given_date),
            return_date.map(encode_date),
            non_blank(&lent.comment),
            lent.status.as_str(),
            encode_timestamp(created_at),
            encode_timestamp(updated_at),
        ],
    )
    .map_err(|e| Error::from_write(e, "lent money"))?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    pub fn add_lent_money(&self, lent: &NewLentMoney) -> Result<i64> {
        let now = now_timestamp();
        let conn = self.conn()?;
        let id = insert_lent_money(&conn, lent, now, now)?;

        debug!("Added lent money {} ({} to {})", id, lent.amount, lent.name);
        self.notify(Table::LentMoney, ChangeKind::Inserted, Some(id));
        Ok(id)
    }

    pub fn get_lent_money(&self, id: i64) -> Result<Option<LentMoney>> {
        self.get(id)
    }

    pub fn list_lent_money(&self) -> Result<Vec<LentMoney>> {
        self.all()
    }

    pub fn update_lent_money(&self, id: i64, patch: &LentMoneyPatch) -> Result<LentMoney> {
        self.update_lent_money_at(id, patch, local_now())
    }

    /// Update with an explicit "now" for the return-date rule
    pub fn update_lent_money_at(
        &self,
        id: i64,
        patch: &LentMoneyPatch,
        now: NaiveDateTime,
    ) -> Result<LentMoney> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut lent = fetch_one::<LentMoney>(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("lent money {}", id)))?;
        patch.apply(&mut lent, now);
        lent.updated_at = now_timestamp().max(lent.updated_at);

        tx.execute(
            r#"
            UPDATE lent_money
            SET name = ?, amount = ?, reason = ?, given_date = ?, return_date = ?,
                comment = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                lent.name,
                encode_amount(lent.amount)?,
                lent.reason,
                encode_date(lent.given_date),
                lent.return_date.map(encode_date),
                lent.comment,
                lent.status.as_str(),
                encode_timestamp(lent.updated_at),
                id,
            ],
        )
        .map_err(|e| Error::from_write(e, "lent money"))?;
        tx.commit()?;

        debug!("Updated lent money {}", id);
        self.notify(Table::LentMoney, ChangeKind::Updated, Some(id));
        Ok(lent)
    }

    /// Mark a loan as paid back. `at` defaults to now when not given.
    pub fn mark_lent_money_returned(
        &self,
        id: i64,
        at: Option<NaiveDateTime>,
    ) -> Result<LentMoney> {
        let now = local_now();
        let patch = LentMoneyPatch {
            status: Some(LentStatus::Returned),
            return_date: Some(Some(at.unwrap_or(now))),
            ..Default::default()
        };
        let lent = self.update_lent_money_at(id, &patch, now)?;
        info!("Lent money {} marked returned", id);
        Ok(lent)
    }

    /// Reopen a loan. The recorded return date is kept.
    pub fn mark_lent_money_pending(&self, id: i64) -> Result<LentMoney> {
        let patch = LentMoneyPatch {
            status: Some(LentStatus::Pending),
            ..Default::default()
        };
        self.update_lent_money(id, &patch)
    }

    pub fn delete_lent_money(&self, id: i64) -> Result<bool> {
        self.delete_row(Table::LentMoney, id)
    }

    /// Loans given within `[start, end]`, inclusive
    pub fn get_lent_money_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<LentMoney>> {
        self.range(IndexedField::LENT_GIVEN_DATE, start, end)
    }

    pub fn get_lent_money_by_status(&self, status: LentStatus) -> Result<Vec<LentMoney>> {
        self.equal(IndexedField::LENT_STATUS, status.as_str())
    }

    /// Sum of pending and returned loans
    pub fn get_lent_money_totals(&self) -> Result<LentTotals> {
        Ok(insights::lent_totals(&self.list_lent_money()?))
    }

    /// Loans to a borrower (exact name match)
    pub fn get_lent_money_by_borrower(&self, name: &str) -> Result<Vec<LentMoney>> {
        self.equal(IndexedField::LENT_NAME, name.trim())
    }
}
