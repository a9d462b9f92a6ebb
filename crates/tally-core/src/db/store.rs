//! Generic table access: get, all, range, equality, delete, clear, count
//!
//! Per-entity modules implement `Record` and build their typed operations on
//! top of these. Lookups are only allowed on fields declared in
//! `schema::INDEXED_FIELDS`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::changes::ChangeKind;
use super::schema::{IndexedField, Table};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{round_amount, AMOUNT_SCALE};

/// Stored form of entity dates; fixed width so text order is time order
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DATE_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A row type stored in one table
pub trait Record: Sized {
    const TABLE: Table;

    /// Column list, in the order `from_row` reads them
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// A value to compare an indexed field against
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Text(String),
    Timestamp(NaiveDateTime),
    Amount(Decimal),
}

impl IndexValue {
    fn to_sql(&self) -> Result<Value> {
        Ok(match self {
            Self::Text(s) => Value::Text(s.clone()),
            Self::Timestamp(dt) => Value::Text(encode_date(*dt)),
            Self::Amount(d) => Value::Integer(encode_amount(*d)?),
        })
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDateTime> for IndexValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Timestamp(dt)
    }
}

impl From<Decimal> for IndexValue {
    fn from(d: Decimal) -> Self {
        Self::Amount(d)
    }
}

// =============================================================================
// Column codecs
// =============================================================================

pub(crate) fn encode_date(dt: NaiveDateTime) -> String {
    dt.format(DATE_FORMAT).to_string()
}

pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision timestamps are stored with
pub(crate) fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Convert an amount to integer minor units, rounding half-even to 2 places
pub(crate) fn encode_amount(amount: Decimal) -> Result<i64> {
    let mut rounded = round_amount(amount);
    rounded.rescale(AMOUNT_SCALE);
    i64::try_from(rounded.mantissa())
        .map_err(|_| Error::Validation(format!("amount {} is out of range", amount)))
}

pub(crate) fn decode_amount(units: i64) -> Decimal {
    Decimal::new(units, AMOUNT_SCALE)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATE_PARSE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDateTime::parse_from_str(&s, DATE_PARSE_FORMAT).map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub(crate) fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_amount(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    Ok(decode_amount(row.get(idx)?))
}

/// Decimal stored as text (unindexed, sign allowed)
pub(crate) fn get_opt_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse::<Decimal>().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

// =============================================================================
// Connection-level helpers (usable inside transactions)
// =============================================================================

fn check_field<T: Record>(field: IndexedField) -> Result<()> {
    if field.table != T::TABLE || !field.is_indexed() {
        return Err(Error::InvalidData(format!(
            "{}.{} is not an indexed field of {}",
            field.table,
            field.column,
            T::TABLE
        )));
    }
    Ok(())
}

pub(crate) fn fetch_one<T: Record>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", T::COLUMNS, T::TABLE);
    Ok(conn.query_row(&sql, params![id], T::from_row).optional()?)
}

pub(crate) fn fetch_all<T: Record>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!("SELECT {} FROM {} ORDER BY id", T::COLUMNS, T::TABLE);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn fetch_range<T: Record>(
    conn: &Connection,
    field: IndexedField,
    lower: &IndexValue,
    upper: &IndexValue,
) -> Result<Vec<T>> {
    check_field::<T>(field)?;
    let sql = format!(
        "SELECT {cols} FROM {table} WHERE {col} BETWEEN ?1 AND ?2 ORDER BY {col}, id",
        cols = T::COLUMNS,
        table = T::TABLE,
        col = field.column,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter([lower.to_sql()?, upper.to_sql()?]), T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn fetch_equal<T: Record>(
    conn: &Connection,
    field: IndexedField,
    value: &IndexValue,
) -> Result<Vec<T>> {
    check_field::<T>(field)?;
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1 ORDER BY id",
        T::COLUMNS,
        T::TABLE,
        field.column
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter([value.to_sql()?]), T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn clear_table(conn: &Connection, table: Table) -> Result<usize> {
    Ok(conn.execute(&format!("DELETE FROM {}", table), [])?)
}

// =============================================================================
// Database-level operations
// =============================================================================

impl Database {
    /// Fetch a row by id; `None` when it does not exist
    pub fn get<T: Record>(&self, id: i64) -> Result<Option<T>> {
        let conn = self.conn()?;
        fetch_one(&conn, id)
    }

    /// Every row of a table, oldest id first
    pub fn all<T: Record>(&self) -> Result<Vec<T>> {
        let conn = self.conn()?;
        fetch_all(&conn)
    }

    /// Rows whose indexed `field` lies in `[lower, upper]`, ordered by that field
    pub fn range<T: Record>(
        &self,
        field: IndexedField,
        lower: impl Into<IndexValue>,
        upper: impl Into<IndexValue>,
    ) -> Result<Vec<T>> {
        let conn = self.conn()?;
        fetch_range(&conn, field, &lower.into(), &upper.into())
    }

    /// Rows whose indexed `field` equals `value`
    pub fn equal<T: Record>(&self, field: IndexedField, value: impl Into<IndexValue>) -> Result<Vec<T>> {
        let conn = self.conn()?;
        fetch_equal(&conn, field, &value.into())
    }

    /// Delete a row. Returns whether a row was removed; a missing id is not an error.
    pub fn delete_row(&self, table: Table, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(&format!("DELETE FROM {} WHERE id = ?", table), params![id])?;
        if affected > 0 {
            self.notify(table, ChangeKind::Deleted, Some(id));
        }
        Ok(affected > 0)
    }

    /// Remove every row of a table
    pub fn clear(&self, table: Table) -> Result<usize> {
        let conn = self.conn()?;
        let removed = clear_table(&conn, table)?;
        self.notify(table, ChangeKind::Cleared, None);
        Ok(removed)
    }

    pub fn count(&self, table: Table) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?)
    }
}
