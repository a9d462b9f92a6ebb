//! Cloud sync with pluggable remote stores
//!
//! Sync mirrors whole snapshots; there is no merge:
//! 1. `sync_to_cloud` deletes the user's remote rows and uploads every local record
//! 2. `sync_from_cloud` downloads the user's remote rows and replaces the
//!    four local money tables in one transaction
//!
//! # Architecture
//!
//! - `RemoteStore` trait defines the interface for remote backends
//! - `HttpRemoteStore` talks to a JSON gateway over HTTP
//! - `MemoryRemoteStore` keeps rows in process (tests, offline demos)
//!
//! All sync operations on one `CloudSync` run one at a time. A failure half
//! way through an upload leaves the remote partially written; the next
//! successful upload overwrites it.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::export::ImportMode;

mod http;
mod memory;
pub mod wire;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;
pub use wire::{RemoteRow, RemoteTable};

/// Trait for remote sync backends
///
/// Every operation is scoped to one user's rows, identified by email.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable name for this store
    fn name(&self) -> &str;

    /// Create the remote tables if they do not exist yet
    async fn initialize(&self) -> Result<()>;

    /// Delete all of a user's rows in one table, returning how many went
    async fn delete_for_user(&self, table: RemoteTable, email: &str) -> Result<u64>;

    /// Insert one row for a user
    async fn insert(&self, email: &str, row: &RemoteRow) -> Result<()>;

    /// All of a user's rows in one table
    async fn fetch_for_user(&self, table: RemoteTable, email: &str) -> Result<Vec<RemoteRow>>;

    /// Number of a user's rows in one table
    async fn count_for_user(&self, table: RemoteTable, email: &str) -> Result<u64>;
}

/// Where a `CloudSync` is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Disabled,
    Idle,
    SyncingUp,
    SyncingDown,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Disabled => "disabled",
            SyncState::Idle => "idle",
            SyncState::SyncingUp => "syncing_up",
            SyncState::SyncingDown => "syncing_down",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    /// Records uploaded or imported
    pub records: usize,
    pub error: Option<String>,
}

impl SyncReport {
    fn completed(records: usize) -> Self {
        Self {
            success: true,
            records,
            error: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            records: 0,
            error: Some(reason.into()),
        }
    }
}

/// Snapshot of the remote side for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub enabled: bool,
    /// Rows held remotely for the user, across all four tables
    pub cloud_records: Option<u64>,
    /// Last successful sync in either direction during this session
    pub last_sync: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

const DISABLED_REASON: &str = "Cloud sync is disabled";
const NO_EMAIL_REASON: &str = "No user email provided";
const UNREACHABLE_REASON: &str = "Could not connect to cloud database";

/// Cloud sync coordinator for one local database
pub struct CloudSync {
    db: Database,
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    state: Mutex<SyncState>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
    /// Serializes sync runs
    gate: tokio::sync::Mutex<()>,
    initialized: OnceCell<()>,
}

/// Puts the state back to idle when a run ends, however it ends
struct RunGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl<'a> RunGuard<'a> {
    fn enter(state: &'a Mutex<SyncState>, running: SyncState) -> Self {
        *lock(state) = running;
        Self { state }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SyncState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CloudSync {
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        let state = if config.enabled {
            SyncState::Idle
        } else {
            SyncState::Disabled
        };

        Self {
            db,
            remote,
            config,
            state: Mutex::new(state),
            last_sync: Mutex::new(None),
            gate: tokio::sync::Mutex::new(()),
            initialized: OnceCell::new(),
        }
    }

    /// Build a coordinator talking to the configured HTTP gateway.
    ///
    /// An enabled configuration without a gateway URL is an error.
    pub fn from_config(db: Database, config: SyncConfig) -> Result<Self> {
        let remote: Arc<dyn RemoteStore> = if config.has_gateway() {
            Arc::new(HttpRemoteStore::from_config(&config)?)
        } else if config.enabled {
            return Err(Error::Replication(
                "cloud sync is enabled but no gateway URL is configured".to_string(),
            ));
        } else {
            Arc::new(MemoryRemoteStore::new())
        };
        Ok(Self::new(db, remote, config))
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn state(&self) -> SyncState {
        *lock(&self.state)
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_sync)
    }

    pub fn remote_name(&self) -> &str {
        self.remote.name()
    }

    /// Upload the local snapshot, replacing the user's remote rows
    pub async fn sync_to_cloud(&self, email: &str) -> SyncReport {
        let email = email.trim();
        if let Some(reason) = self.skip_reason(email) {
            return SyncReport::failed(reason);
        }

        let _gate = self.gate.lock().await;
        let _run = RunGuard::enter(&self.state, SyncState::SyncingUp);
        info!("Syncing to {} for {}", self.remote.name(), email);

        match self.push(email).await {
            Ok(records) => {
                self.mark_synced();
                info!("Uploaded {} records", records);
                SyncReport::completed(records)
            }
            Err(e) => {
                warn!("Sync to cloud failed: {}", e);
                SyncReport::failed(e.to_string())
            }
        }
    }

    /// Download the user's remote rows, replacing all local money records
    pub async fn sync_from_cloud(&self, email: &str) -> SyncReport {
        let email = email.trim();
        if let Some(reason) = self.skip_reason(email) {
            return SyncReport::failed(reason);
        }

        let _gate = self.gate.lock().await;
        let _run = RunGuard::enter(&self.state, SyncState::SyncingDown);
        info!("Syncing from {} for {}", self.remote.name(), email);

        match self.pull(email).await {
            Ok(records) => {
                self.mark_synced();
                info!("Imported {} records", records);
                SyncReport::completed(records)
            }
            Err(e) => {
                warn!("Sync from cloud failed: {}", e);
                SyncReport::failed(e.to_string())
            }
        }
    }

    /// Remote record count for the user
    pub async fn sync_status(&self, email: &str) -> SyncStatus {
        let email = email.trim();
        let mut status = SyncStatus {
            enabled: self.config.enabled,
            cloud_records: None,
            last_sync: self.last_sync(),
            error: None,
        };

        if let Some(reason) = self.skip_reason(email) {
            status.error = Some(reason.to_string());
            return status;
        }

        match self.remote_count(email).await {
            Ok(count) => status.cloud_records = Some(count),
            Err(e) => {
                warn!("Sync status check failed: {}", e);
                status.error = Some(UNREACHABLE_REASON.to_string());
            }
        }
        status
    }

    fn skip_reason(&self, email: &str) -> Option<&'static str> {
        if !self.config.enabled {
            Some(DISABLED_REASON)
        } else if email.is_empty() {
            Some(NO_EMAIL_REASON)
        } else {
            None
        }
    }

    fn mark_synced(&self) {
        *lock(&self.last_sync) = Some(Utc::now());
    }

    async fn ensure_initialized(&self) -> Result<()> {
        self.initialized
            .get_or_try_init(|| async {
                debug!("Initializing remote tables on {}", self.remote.name());
                self.remote.initialize().await
            })
            .await?;
        Ok(())
    }

    async fn push(&self, email: &str) -> Result<usize> {
        self.ensure_initialized().await?;

        let snapshot = self.db.export_json(email, Utc::now())?;
        let rows = wire::rows_from_document(email, &snapshot);

        for table in RemoteTable::ALL {
            let deleted = self.remote.delete_for_user(table, email).await?;
            debug!("Deleted {} remote {} rows", deleted, table);
        }
        for row in &rows {
            self.remote.insert(email, row).await?;
        }

        Ok(rows.len())
    }

    async fn pull(&self, email: &str) -> Result<usize> {
        self.ensure_initialized().await?;

        let mut rows = Vec::new();
        for table in RemoteTable::ALL {
            let fetched = self.remote.fetch_for_user(table, email).await?;
            debug!("Fetched {} remote {} rows", fetched.len(), table);
            rows.extend(fetched);
        }

        let doc = wire::document_from_rows(email, rows);
        let stats = self.db.import_json(&doc, ImportMode::Replace)?;
        Ok(stats.total())
    }

    async fn remote_count(&self, email: &str) -> Result<u64> {
        self.ensure_initialized().await?;

        let mut total = 0;
        for table in RemoteTable::ALL {
            total += self.remote.count_for_user(table, email).await?;
        }
        Ok(total)
    }
}
