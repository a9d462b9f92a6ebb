//! Tables, indexed fields and versioned schema migrations
//!
//! The schema version lives in SQLite's `PRAGMA user_version`. Each entry in
//! `MIGRATIONS` runs exactly once, inside its own transaction, and bumps the
//! version. Migrations are additive only: new tables, indexes or columns with
//! defaults. Existing rows are never rewritten or dropped.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Expenses,
    Incomes,
    Investments,
    LentMoney,
}

impl Table {
    /// Tables holding money records (everything except users)
    pub const TRANSACTIONAL: [Table; 4] = [
        Table::Expenses,
        Table::Incomes,
        Table::Investments,
        Table::LentMoney,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Expenses => "expenses",
            Self::Incomes => "incomes",
            Self::Investments => "investments",
            Self::LentMoney => "lent_money",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A column that carries an index and may be used for range or equality lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexedField {
    pub table: Table,
    pub column: &'static str,
}

impl IndexedField {
    const fn new(table: Table, column: &'static str) -> Self {
        Self { table, column }
    }

    pub const USER_EMAIL: Self = Self::new(Table::Users, "email");

    pub const EXPENSE_DATE: Self = Self::new(Table::Expenses, "date");
    pub const EXPENSE_PAYMENT_METHOD: Self = Self::new(Table::Expenses, "payment_method");
    pub const EXPENSE_CATEGORY: Self = Self::new(Table::Expenses, "category");
    pub const EXPENSE_AMOUNT: Self = Self::new(Table::Expenses, "amount");

    pub const INCOME_DATE: Self = Self::new(Table::Incomes, "date");
    pub const INCOME_CATEGORY: Self = Self::new(Table::Incomes, "category");
    pub const INCOME_AMOUNT: Self = Self::new(Table::Incomes, "amount");

    pub const INVESTMENT_DATE: Self = Self::new(Table::Investments, "date");
    pub const INVESTMENT_TYPE: Self = Self::new(Table::Investments, "type");
    pub const INVESTMENT_AMOUNT: Self = Self::new(Table::Investments, "amount");

    pub const LENT_STATUS: Self = Self::new(Table::LentMoney, "status");
    pub const LENT_GIVEN_DATE: Self = Self::new(Table::LentMoney, "given_date");
    pub const LENT_AMOUNT: Self = Self::new(Table::LentMoney, "amount");
    pub const LENT_NAME: Self = Self::new(Table::LentMoney, "name");

    /// Whether this field is declared in `INDEXED_FIELDS`
    pub fn is_indexed(&self) -> bool {
        INDEXED_FIELDS.contains(self)
    }
}

/// Every field usable for lookups
pub const INDEXED_FIELDS: &[IndexedField] = &[
    IndexedField::USER_EMAIL,
    IndexedField::EXPENSE_DATE,
    IndexedField::EXPENSE_PAYMENT_METHOD,
    IndexedField::EXPENSE_CATEGORY,
    IndexedField::EXPENSE_AMOUNT,
    IndexedField::INCOME_DATE,
    IndexedField::INCOME_CATEGORY,
    IndexedField::INCOME_AMOUNT,
    IndexedField::INVESTMENT_DATE,
    IndexedField::INVESTMENT_TYPE,
    IndexedField::INVESTMENT_AMOUNT,
    IndexedField::LENT_STATUS,
    IndexedField::LENT_GIVEN_DATE,
    IndexedField::LENT_AMOUNT,
    IndexedField::LENT_NAME,
];

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial tables and indexes",
        sql: r#"
            -- Users (single device; email is the login key)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                settings TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Amounts are stored in minor units (hundredths)
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                amount INTEGER NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_payment_method ON expenses(payment_method);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);
            CREATE INDEX IF NOT EXISTS idx_expenses_amount ON expenses(amount);
            CREATE INDEX IF NOT EXISTS idx_expenses_date_category ON expenses(date, category);

            CREATE TABLE IF NOT EXISTS incomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                source TEXT NOT NULL,
                description TEXT,
                amount INTEGER NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_incomes_date ON incomes(date);
            CREATE INDEX IF NOT EXISTS idx_incomes_category ON incomes(category);
            CREATE INDEX IF NOT EXISTS idx_incomes_amount ON incomes(amount);
            CREATE INDEX IF NOT EXISTS idx_incomes_date_category ON incomes(date, category);

            CREATE TABLE IF NOT EXISTS investments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                type TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_investments_date ON investments(date);
            CREATE INDEX IF NOT EXISTS idx_investments_type ON investments(type);
            CREATE INDEX IF NOT EXISTS idx_investments_amount ON investments(amount);

            CREATE TABLE IF NOT EXISTS lent_money (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                reason TEXT,
                given_date TEXT NOT NULL,
                return_date TEXT,
                comment TEXT,
                status TEXT NOT NULL CHECK (status IN ('pending', 'returned')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_lent_money_status ON lent_money(status);
            CREATE INDEX IF NOT EXISTS idx_lent_money_given_date ON lent_money(given_date);
            CREATE INDEX IF NOT EXISTS idx_lent_money_amount ON lent_money(amount);
            CREATE INDEX IF NOT EXISTS idx_lent_money_name ON lent_money(name);
        "#,
    },
    Migration {
        version: 2,
        description: "investment details and date+type index",
        sql: r#"
            ALTER TABLE investments ADD COLUMN name TEXT NOT NULL DEFAULT 'Investment';
            ALTER TABLE investments ADD COLUMN return_percentage TEXT;
            ALTER TABLE investments ADD COLUMN risk_level TEXT;

            CREATE INDEX IF NOT EXISTS idx_investments_date_type ON investments(date, type);
        "#,
    },
];

/// Latest schema version this build knows about
pub const SCHEMA_VERSION: i64 = 2;

/// Read `PRAGMA user_version`
pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring the schema up to `SCHEMA_VERSION`
pub(crate) fn migrate(conn: &mut Connection) -> Result<i64> {
    migrate_to(conn, SCHEMA_VERSION)
}

/// Apply pending migrations up to and including `target`
pub(crate) fn migrate_to(conn: &mut Connection, target: i64) -> Result<i64> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(Error::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    let mut version = current;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current && m.version <= target)
    {
        debug!(
            "Applying migration {} ({})",
            migration.version, migration.description
        );

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql).map_err(|e| {
            Error::Migration(format!("migration {} failed: {}", migration.version, e))
        })?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tx.commit()?;

        version = migration.version;
    }

    if version != current {
        info!("Database schema migrated from v{} to v{}", current, version);
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_fields_are_unique_per_table() {
        for (i, a) in INDEXED_FIELDS.iter().enumerate() {
            for b in &INDEXED_FIELDS[i + 1..] {
                assert_ne!(a, b, "duplicate indexed field {:?}", a);
            }
        }
        assert!(IndexedField::EXPENSE_DATE.is_indexed());
        assert!(!IndexedField::new(Table::Expenses, "title").is_indexed());
    }

    #[test]
    fn test_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let expected: Vec<i64> = (1..=SCHEMA_VERSION).collect();
        assert_eq!(versions, expected);
    }

    #[test]
    fn test_migrate_fresh_and_rerun() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);
        // Second run is a no-op
        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(migrate(&mut conn), Err(Error::Migration(_))));
    }

    #[test]
    fn test_upgrade_keeps_existing_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate_to(&mut conn, 1).unwrap();
        conn.execute(
            "INSERT INTO investments (date, type, amount, created_at, updated_at)
             VALUES ('2024-01-05 00:00:00.000', 'gold', 150000, 'x', 'x')",
            [],
        )
        .unwrap();

        migrate(&mut conn).unwrap();

        let (name, amount): (String, i64) = conn
            .query_row("SELECT name, amount FROM investments", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "Investment");
        assert_eq!(amount, 150000);
    }
}
