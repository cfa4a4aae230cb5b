//! Shared state holding one import lock per table.
//!
//! `TableLocks` is created once in `main.rs` and injected into the Actix
//! application as `web::Data`. Locks are created lazily the first time a table
//! is imported into and live for the rest of the process, so callers only
//! acquire locks for tables that exist in the catalogue.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// A thread-safe, shareable map from table name to its import lock.
#[derive(Clone, Default)]
pub struct TableLocks {
    /// Readers look up an existing lock concurrently; the write lock is only
    /// taken to insert a lock for a table seen for the first time.
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other import holds `table` and returns the guard. The
    /// lock is released when the guard is dropped.
    pub async fn acquire(&self, table: &str) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(table).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => self
                .locks
                .write()
                .await
                .entry(table.to_string())
                .or_default()
                .clone(),
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) async fn tracked_tables(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Reports whether an import into `table` is running right now.
    pub async fn is_locked(&self, table: &str) -> bool {
        match self.locks.read().await.get(table) {
            Some(lock) => lock.try_lock().is_err(),
            None => false,
        }
    }
}
