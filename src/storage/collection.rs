// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stored collections decoded one record at a time.
//!
//! A record that fails to decode is skipped by reads (logged at `warn`) but
//! kept as raw JSON, and written back unchanged when the collection is
//! saved. One bad record never hides or destroys its neighbours.
//!
//! If the top-level value itself is unreadable (wrong shape, malformed text,
//! medium failure), [`RecordMap::read`] / [`RecordList::read`] return an
//! empty collection while [`RecordMap::load`] / [`RecordList::load`] return
//! the error, so a write never replaces data it could not read.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{KeyValueStore, StorageResult};

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Slot<T> {
    Record(T),
    Unreadable(Value),
}

impl<T: DeserializeOwned> Slot<T> {
    fn decode(value: Value, entity: &'static str, position: &dyn std::fmt::Display) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(record) => Slot::Record(record),
            Err(e) => {
                tracing::warn!(entity, at = %position, error = %e, "Skipping unreadable stored record");
                Slot::Unreadable(value)
            }
        }
    }

    fn record(&self) -> Option<&T> {
        match self {
            Slot::Record(record) => Some(record),
            Slot::Unreadable(_) => None,
        }
    }
}

fn load_raw<R: DeserializeOwned + Default>(
    store: &KeyValueStore,
    key: &str,
    entity: &'static str,
) -> StorageResult<R> {
    store
        .try_get::<R>(key)
        .map(Option::unwrap_or_default)
        .map_err(|e| {
            tracing::error!(entity, key, error = %e, "Stored collection unreadable, refusing to overwrite");
            e
        })
}

/// A mapping of id → record.
#[derive(Debug, Clone)]
pub struct RecordMap<T> {
    slots: BTreeMap<String, Slot<T>>,
}

impl<T: DeserializeOwned + Serialize> RecordMap<T> {
    /// Read for queries. An unreadable collection reads as empty.
    pub fn read(store: &KeyValueStore, key: &str, entity: &'static str) -> Self {
        Self::decode(store.get(key).unwrap_or_default(), entity)
    }

    /// Read for a later [`save`](Self::save). Fails if the stored value is unreadable.
    pub fn load(store: &KeyValueStore, key: &str, entity: &'static str) -> StorageResult<Self> {
        Ok(Self::decode(load_raw(store, key, entity)?, entity))
    }

    fn decode(raw: BTreeMap<String, Value>, entity: &'static str) -> Self {
        let slots = raw
            .into_iter()
            .map(|(id, value)| {
                let slot = Slot::decode(value, entity, &id);
                (id, slot)
            })
            .collect();
        Self { slots }
    }

    /// Readable record stored under `id`.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.slots.get(id).and_then(Slot::record)
    }

    /// Whether anything, readable or not, is stored under `id`.
    pub fn contains_key(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Store `record` under `id`, replacing whatever was there.
    pub fn insert(&mut self, id: String, record: T) {
        self.slots.insert(id, Slot::Record(record));
    }

    /// Drop the entry under `id`. Returns whether one existed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Readable records only.
    pub fn into_records(self) -> BTreeMap<String, T> {
        self.slots
            .into_iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Record(record) => Some((id, record)),
                Slot::Unreadable(_) => None,
            })
            .collect()
    }

    /// Write every entry back, unreadable ones verbatim.
    pub fn save(&self, store: &KeyValueStore, key: &str) -> StorageResult<()> {
        store.set(key, &self.slots)
    }
}

/// A newest-first list of records.
#[derive(Debug, Clone)]
pub struct RecordList<T> {
    slots: Vec<Slot<T>>,
}

impl<T: DeserializeOwned + Serialize> RecordList<T> {
    /// Read for queries. An unreadable collection reads as empty.
    pub fn read(store: &KeyValueStore, key: &str, entity: &'static str) -> Self {
        Self::decode(store.get(key).unwrap_or_default(), entity)
    }

    /// Read for a later [`save`](Self::save). Fails if the stored value is unreadable.
    pub fn load(store: &KeyValueStore, key: &str, entity: &'static str) -> StorageResult<Self> {
        Ok(Self::decode(load_raw(store, key, entity)?, entity))
    }

    fn decode(raw: Vec<Value>, entity: &'static str) -> Self {
        let slots = raw
            .into_iter()
            .enumerate()
            .map(|(index, value)| Slot::decode(value, entity, &index))
            .collect();
        Self { slots }
    }

    /// Insert `record` at the front.
    pub fn prepend(&mut self, record: T) {
        self.slots.insert(0, Slot::Record(record));
    }

    /// First readable record matching `predicate`.
    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Record(record) if predicate(&*record) => Some(record),
            _ => None,
        })
    }

    /// Readable records only, in stored order.
    pub fn into_records(self) -> Vec<T> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Record(record) => Some(record),
                Slot::Unreadable(_) => None,
            })
            .collect()
    }

    /// Write every entry back, unreadable ones verbatim.
    pub fn save(&self, store: &KeyValueStore, key: &str) -> StorageResult<()> {
        store.set(key, &self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        qty: u32,
    }

    fn item(id: &str, qty: u32) -> Item {
        Item {
            id: id.to_string(),
            qty,
        }
    }

    #[test]
    fn map_skips_bad_record_and_keeps_it_on_save() {
        let store = KeyValueStore::in_memory();
        store
            .set(
                "items",
                &json!({
                    "a": { "id": "a", "qty": 1 },
                    "b": { "id": "b", "qty": "lots" },
                }),
            )
            .unwrap();

        let mut map = RecordMap::<Item>::load(&store, "items", "item").unwrap();
        assert_eq!(map.get("a"), Some(&item("a", 1)));
        assert_eq!(map.get("b"), None);
        assert!(map.contains_key("b"));

        map.insert("c".to_string(), item("c", 3));
        map.save(&store, "items").unwrap();

        let raw: Value = store.get("items").unwrap();
        assert_eq!(
            raw,
            json!({
                "a": { "id": "a", "qty": 1 },
                "b": { "id": "b", "qty": "lots" },
                "c": { "id": "c", "qty": 3 },
            })
        );

        let records = RecordMap::<Item>::read(&store, "items", "item").into_records();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn list_keeps_bad_record_in_place() {
        let store = KeyValueStore::in_memory();
        store
            .set("items", &json!([{ "id": "a", "qty": 1 }, "garbage"]))
            .unwrap();

        let mut list = RecordList::<Item>::load(&store, "items", "item").unwrap();
        list.prepend(item("z", 9));
        list.find_mut(|i| i.id == "a").unwrap().qty = 2;
        list.save(&store, "items").unwrap();

        let raw: Value = store.get("items").unwrap();
        assert_eq!(
            raw,
            json!([{ "id": "z", "qty": 9 }, { "id": "a", "qty": 2 }, "garbage"])
        );
    }

    #[test]
    fn unreadable_collection_refuses_load_but_reads_empty() {
        let store = KeyValueStore::in_memory();
        store.set("items", &json!("not a collection")).unwrap();

        assert!(RecordList::<Item>::read(&store, "items", "item")
            .into_records()
            .is_empty());
        assert!(matches!(
            RecordList::<Item>::load(&store, "items", "item"),
            Err(StorageError::Json(_))
        ));
        assert!(matches!(
            RecordMap::<Item>::load(&store, "items", "item"),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn missing_collection_loads_empty() {
        let store = KeyValueStore::in_memory();
        let map = RecordMap::<Item>::load(&store, "items", "item").unwrap();
        assert!(map.into_records().is_empty());
    }
}
