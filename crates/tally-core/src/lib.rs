//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tracker:
//! - Entity models for expenses, incomes, investments and money lent
//! - Local SQLite store with migrations, repositories and change events
//! - Dashboard statistics and the insights engine
//! - JSON backup export and import
//! - Cloud sync with pluggable remote stores

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod insights;
pub mod models;
pub mod period;
pub mod sync;

pub use config::{Config, SyncConfig};
pub use db::{ChangeEvent, ChangeKind, Database, Table};
pub use error::{Error, Result};
pub use export::{ExportDocument, ImportMode, ImportStats};
pub use insights::InsightsReport;
pub use sync::{
    CloudSync, HttpRemoteStore, MemoryRemoteStore, RemoteStore, SyncReport, SyncState, SyncStatus,
};
