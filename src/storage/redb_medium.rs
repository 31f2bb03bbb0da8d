// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable storage medium backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `kv`: namespaced key → JSON text
//!
//! Every `set_item` / `remove_item` commits its own write transaction, so a
//! single write is atomic but a repository's read-modify-write is not.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::medium::StorageMedium;
use super::StorageResult;

/// Single table holding every namespaced key.
const ITEMS: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// File-backed key-value medium.
pub struct RedbMedium {
    db: Database,
}

impl RedbMedium {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ITEMS)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened redb storage medium");
        Ok(Self { db })
    }
}

impl StorageMedium for RedbMedium {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;
        Ok(table.get(key)?.map(|value| value.value().to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ITEMS)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;

        let mut keys = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, _) = entry?;
            let key = key.value();
            // Keys are sorted, so the first non-matching key ends the prefix run
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        Ok(keys)
    }
}
