//! Investment operations

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::debug;

use super::changes::ChangeKind;
use super::schema::{IndexedField, Table};
use super::store::{
    decode_amount, encode_amount, encode_date, encode_timestamp, fetch_one, get_amount, get_date,
    get_opt_decimal, get_timestamp, now_timestamp, Record,
};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{Investment, InvestmentPatch, InvestmentType, NewInvestment, RiskLevel};

impl Record for Investment {
    const TABLE: Table = Table::Investments;
    const COLUMNS: &'static str = "id, date, name, type, amount, description, return_percentage, risk_level, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: String = row.get(3)?;
        let risk: Option<String> = row.get(7)?;
        Ok(Self {
            id: row.get(0)?,
            date: get_date(row, 1)?,
            name: row.get(2)?,
            investment_type: InvestmentType::from_stored(&kind),
            amount: get_amount(row, 4)?,
            description: row.get(5)?,
            return_percentage: get_opt_decimal(row, 6)?,
            risk_level: risk.as_deref().map(RiskLevel::from_stored),
            created_at: get_timestamp(row, 8)?,
            updated_at: get_timestamp(row, 9)?,
        })
    }
}

pub(crate) fn insert_investment(
    conn: &Connection,
    investment: &NewInvestment,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<i64> {
    investment.validate()?;
    conn.execute(
        r#"
        INSERT INTO investments (date, name, type, amount, description, return_percentage, risk_level, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            encode_date(investment.date),
            investment.resolved_name(),
            investment.investment_type.as_str(),
            encode_amount(investment.amount)?,
            investment.description.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            investment.return_percentage.map(|r| r.normalize().to_string()),
            investment.risk_level.map(|r| r.as_str()),
            encode_timestamp(created_at),
            encode_timestamp(updated_at),
        ],
    )
    .map_err(|e| Error::from_write(e, "investment"))?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    pub fn add_investment(&self, investment: &NewInvestment) -> Result<i64> {
        let now = now_timestamp();
        let conn = self.conn()?;
        let id = insert_investment(&conn, investment, now, now)?;

        debug!("Added investment {} ({})", id, investment.amount);
        self.notify(Table::Investments, ChangeKind::Inserted, Some(id));
        Ok(id)
    }

    pub fn get_investment(&self, id: i64) -> Result<Option<Investment>> {
        self.get(id)
    }

    pub fn list_investments(&self) -> Result<Vec<Investment>> {
        self.all()
    }

    pub fn update_investment(&self, id: i64, patch: &InvestmentPatch) -> Result<Investment> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut investment = fetch_one::<Investment>(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("investment {}", id)))?;
        patch.apply(&mut investment);
        investment.updated_at = now_timestamp().max(investment.updated_at);

        tx.execute(
            r#"
            UPDATE investments
            SET date = ?, name = ?, type = ?, amount = ?, description = ?,
                return_percentage = ?, risk_level = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                encode_date(investment.date),
                investment.name,
                investment.investment_type.as_str(),
                encode_amount(investment.amount)?,
                investment.description,
                investment.return_percentage.map(|r| r.normalize().to_string()),
                investment.risk_level.map(|r| r.as_str()),
                encode_timestamp(investment.updated_at),
                id,
            ],
        )
        .map_err(|e| Error::from_write(e, "investment"))?;
        tx.commit()?;

        debug!("Updated investment {}", id);
        self.notify(Table::Investments, ChangeKind::Updated, Some(id));
        Ok(investment)
    }

    pub fn delete_investment(&self, id: i64) -> Result<bool> {
        self.delete_row(Table::Investments, id)
    }

    /// Investments dated within `[start, end]`, inclusive
    pub fn get_investments_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Investment>> {
        self.range(IndexedField::INVESTMENT_DATE, start, end)
    }

    pub fn get_investments_by_type(&self, kind: InvestmentType) -> Result<Vec<Investment>> {
        self.equal(IndexedField::INVESTMENT_TYPE, kind.as_str())
    }

    /// Sum of every investment ever recorded
    pub fn total_investments(&self) -> Result<Decimal> {
        let conn = self.conn()?;
        let units: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM investments",
            [],
            |row| row.get(0),
        )?;
        Ok(decode_amount(units))
    }
}
