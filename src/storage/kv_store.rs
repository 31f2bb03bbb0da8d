// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Namespaced JSON key-value store with change notification.
//!
//! ## Read / Write Policy
//!
//! - Reads never fail: a missing key, a medium read error and malformed text
//!   all come back as `None` (errors are logged at `warn`).
//! - Writes log failures at `error` and also return them, so callers can
//!   tell a dropped write from a persisted one.
//! - Every successful `set` / `remove` broadcasts a [`StorageEvent`] carrying
//!   the namespaced key. `clear` does not notify per key.
//!
//! ## Consistency
//!
//! The medium is shared, unguarded state. Repositories read a whole
//! collection, modify a copy and write it back; two writers interleaving on
//! the same key lose one update, and across processes the last `set` wins.

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;

use super::keys::Namespace;
use super::medium::{MemoryMedium, StorageMedium};

/// Default buffer size of the change notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

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

    /// The medium refused the write because it is full.
    #[error("quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Change notification fired after a successful write or remove.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    /// Namespaced key that changed.
    pub key: String,
    /// New value, or `None` when the key was removed.
    pub value: Option<serde_json::Value>,
}

/// JSON key-value store over a [`StorageMedium`].
///
/// Cloning is cheap; clones share the medium and the notification channel.
#[derive(Clone)]
pub struct KeyValueStore {
    medium: Arc<dyn StorageMedium>,
    namespace: Namespace,
    events: broadcast::Sender<StorageEvent>,
}

impl fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("namespace", &self.namespace)
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl KeyValueStore {
    /// Create a store over `medium`, namespacing keys with `namespace`.
    pub fn new(
        medium: Arc<dyn StorageMedium>,
        namespace: Namespace,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            medium,
            namespace,
            events,
        }
    }

    /// Store over a fresh [`MemoryMedium`] with the default namespace.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryMedium::new()),
            Namespace::default(),
            DEFAULT_EVENT_CAPACITY,
        )
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Subscribe to change notifications.
    ///
    /// Only events sent after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Read and deserialize the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %self.namespace.key(key), error = %e, "Unreadable stored value, treating as absent");
                None
            }
        }
    }

    /// Like [`get`](Self::get), but a medium failure or a value that does not
    /// decode as `T` is an error instead of `None`.
    ///
    /// Read-modify-write paths use this so an unreadable value is never
    /// overwritten.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let namespaced = self.namespace.key(key);

        match self.medium.get_item(&namespaced)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` and store it under `key`, then notify subscribers.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let namespaced = self.namespace.key(key);

        let json = serde_json::to_value(value)
            .map_err(|e| write_failed(&namespaced, StorageError::from(e)))?;
        self.medium
            .set_item(&namespaced, &json.to_string())
            .map_err(|e| write_failed(&namespaced, e))?;

        self.notify(namespaced, Some(json));
        Ok(())
    }

    /// Delete `key`, then notify subscribers with an absent value.
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        let namespaced = self.namespace.key(key);

        self.medium
            .remove_item(&namespaced)
            .map_err(|e| write_failed(&namespaced, e))?;

        self.notify(namespaced, None);
        Ok(())
    }

    /// Delete every key in this store's namespace. Sends no notifications.
    pub fn clear(&self) -> StorageResult<()> {
        let prefix = self.namespace.prefix();
        let keys = self
            .medium
            .keys_with_prefix(prefix)
            .map_err(|e| write_failed(prefix, e))?;

        for key in &keys {
            self.medium
                .remove_item(key)
                .map_err(|e| write_failed(key, e))?;
        }

        tracing::debug!(prefix = %prefix, removed = keys.len(), "Cleared namespace");
        Ok(())
    }

    fn notify(&self, key: String, value: Option<serde_json::Value>) {
        // No subscribers is fine; notifications are at-most-once
        let _ = self.events.send(StorageEvent { key, value });
    }
}

fn write_failed(key: &str, error: StorageError) -> StorageError {
    tracing::error!(key = %key, error = %error, "Storage write failed");
    error
}
