//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `schema` - Tables, indexed fields, versioned migrations
//! - `store` - Generic get/range/equal/delete/clear over any `Record`
//! - `changes` - Broadcast of write events
//! - `users` - Registration, login, settings, account deletion
//! - `expenses`, `incomes`, `investments`, `lent_money` - Entity repositories
//! - `dashboard` - Monthly dashboard statistics and the insights query

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::broadcast;
use tracing::info;

use crate::error::Result;

mod changes;
mod dashboard;
mod expenses;
mod incomes;
mod investments;
mod lent_money;
pub mod schema;
mod store;
mod users;

pub use changes::{ChangeEvent, ChangeKind};
pub use schema::{IndexedField, Table, INDEXED_FIELDS, SCHEMA_VERSION};
pub use store::{IndexValue, Record};
pub use users::DEMO_USER_EMAIL;

pub(crate) use expenses::insert_expense;
pub(crate) use incomes::insert_income;
pub(crate) use investments::insert_investment;
pub(crate) use lent_money::insert_lent_money;
pub(crate) use store::{clear_table, fetch_all};

use changes::ChangeFeed;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    changes: ChangeFeed,
}

impl Database {
    /// Open (or create) a database file and bring its schema up to date
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                r#"
                -- Synchronous NORMAL: safe with WAL, much faster than FULL
                PRAGMA synchronous = NORMAL;

                -- Store temp tables in memory
                PRAGMA temp_store = MEMORY;
                "#,
            )
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
            changes: ChangeFeed::new(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Open the database at a filesystem path, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::new(&path.to_string_lossy())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a fresh temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any leftovers from an earlier run
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.conn()?;
        schema::schema_version(&conn)
    }

    /// Subscribe to write notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    pub(crate) fn notify(&self, table: Table, kind: ChangeKind, id: Option<i64>) {
        self.changes.publish(table, kind, id);
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn()?;

        // WAL mode: readers don't block writers. Persistent, so set once here.
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;

        let version = schema::migrate(&mut conn)?;
        info!("Database schema initialized (v{})", version);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
