// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted key/value store with JSON encoding.
//!
//! [`PersistedStore`] is the only entry point used by the registries. It
//! never returns an error to its caller:
//!
//! - a missing key reads as `None`
//! - a value that is not valid JSON for the requested type is deleted and
//!   reads as `None`
//! - backend write failures are logged and swallowed
//! - a store without a backend is a no-op that reads `None` for every key
//!
//! Backends implement [`KeyValueBackend`]: [`RedbBackend`] for durable
//! storage on disk, [`MemoryBackend`] for tests and ephemeral runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};

use super::keys::{StorageKey, StoragePaths};

/// Single table: storage key → JSON bytes.
const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Backends
// =============================================================================

/// Raw byte-oriented storage behind a [`PersistedStore`].
pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()>;
    fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Durable backend on an embedded redb database.
pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl KeyValueBackend for RedbBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV)?;
        Ok(table.get(key)?.map(|value| value.value().to_vec()))
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// In-process backend, lost when dropped.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes under a key, bypassing JSON decoding.
    pub fn raw(&self, key: StorageKey) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(key.as_str()).cloned()
    }

    /// Store raw bytes under a key, bypassing JSON encoding.
    pub fn put_raw(&self, key: StorageKey, value: impl Into<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.as_str().to_string(), value.into());
        }
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// PersistedStore
// =============================================================================

/// JSON view over a [`KeyValueBackend`] that never fails its caller.
#[derive(Clone)]
pub struct PersistedStore {
    backend: Option<Arc<dyn KeyValueBackend>>,
}

impl std::fmt::Debug for PersistedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

impl PersistedStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Store with no backing: every read is `None`, every write is dropped.
    pub fn detached() -> Self {
        Self { backend: None }
    }

    /// Store backed by a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open the on-disk database under the data directory.
    ///
    /// Falls back to a detached store when the database cannot be opened.
    pub fn open(paths: &StoragePaths) -> Self {
        let path = paths.database();
        match RedbBackend::open(&path) {
            Ok(backend) => {
                tracing::info!(path = %path.display(), "Opened persisted store");
                Self::new(Arc::new(backend))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Persisted store unavailable, running without persistence"
                );
                Self::detached()
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.backend.is_some()
    }

    /// Read and decode the value under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let backend = self.backend.as_ref()?;

        let bytes = match backend.read(key.as_str()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read from store");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupted stored value");
                if let Err(e) = backend.delete(key.as_str()) {
                    tracing::warn!(key = %key, error = %e, "Failed to remove corrupted value");
                }
                None
            }
        }
    }

    /// Encode and write `value` under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        let result = serde_json::to_vec(value)
            .map_err(StorageError::from)
            .and_then(|bytes| backend.write(key.as_str(), &bytes));

        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Failed to write to store");
        }
    }

    pub fn remove(&self, key: StorageKey) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        if let Err(e) = backend.delete(key.as_str()) {
            tracing::warn!(key = %key, error = %e, "Failed to remove from store");
        }
    }
}
