//! In-process remote store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{RemoteRow, RemoteStore, RemoteTable};
use crate::error::{Error, Result};

type Rows = HashMap<RemoteTable, Vec<RemoteRow>>;

/// Remote store backed by a map in memory
///
/// Can be switched offline to exercise failure handling.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    rows: Mutex<Rows>,
    offline: AtomicBool,
    initialized: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Every row held for a user, across all tables
    pub fn rows_for(&self, email: &str) -> Vec<RemoteRow> {
        let guard = self.lock();
        let rows: &Rows = &guard;
        RemoteTable::ALL
            .iter()
            .flat_map(|table| rows.get(table).into_iter().flatten())
            .filter(|row| row.user_email() == email)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Replication("remote store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn initialize(&self) -> Result<()> {
        self.check_online()?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_for_user(&self, table: RemoteTable, email: &str) -> Result<u64> {
        self.check_online()?;
        let mut rows = self.lock();
        let Some(table_rows) = rows.get_mut(&table) else {
            return Ok(0);
        };

        let before = table_rows.len();
        table_rows.retain(|row| row.user_email() != email);
        Ok((before - table_rows.len()) as u64)
    }

    async fn insert(&self, email: &str, row: &RemoteRow) -> Result<()> {
        self.check_online()?;
        if row.user_email() != email {
            return Err(Error::InvalidData(format!(
                "row belongs to {}, not {}",
                row.user_email(),
                email
            )));
        }

        self.lock().entry(row.table()).or_default().push(row.clone());
        Ok(())
    }

    async fn fetch_for_user(&self, table: RemoteTable, email: &str) -> Result<Vec<RemoteRow>> {
        self.check_online()?;
        Ok(self
            .lock()
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.user_email() == email)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_for_user(&self, table: RemoteTable, email: &str) -> Result<u64> {
        Ok(self.fetch_for_user(table, email).await?.len() as u64)
    }
}
