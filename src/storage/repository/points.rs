// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Point transaction ledger.
//!
//! Transactions are stored as one list under the `points` key, newest first.
//! The ledger is append-only apart from [`PointRepository::clear`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::super::collection::RecordList;
use super::super::keys::POINTS_KEY;
use super::super::schema::{self, EntitySchema};
use super::super::timestamp::Timestamp;
use super::super::{KeyValueStore, StorageResult};
use crate::error::RepositoryResult;

/// Direction of a point adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Add,
    Subtract,
}

/// A single point grant or deduction made by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub worker_id: String,
    pub worker_name: String,
    #[validate(length(min = 1))]
    pub admin_id: String,
    pub admin_name: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub timestamp: Timestamp,
    pub reason: String,
}

impl EntitySchema for PointTransaction {
    const ENTITY: &'static str = "point transaction";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "workerId",
        "workerName",
        "adminId",
        "adminName",
        "amount",
        "type",
        "timestamp",
        "reason",
    ];
}

/// Input for [`PointRepository::add`]. The id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPointTransaction {
    pub worker_id: String,
    pub worker_name: String,
    pub admin_id: String,
    pub admin_name: String,
    pub amount: i64,
    pub kind: TransactionType,
    pub reason: String,
}

/// Repository for the point ledger.
#[derive(Debug, Clone)]
pub struct PointRepository {
    store: KeyValueStore,
}

impl PointRepository {
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    /// Every readable transaction, newest first.
    pub fn get_all(&self) -> Vec<PointTransaction> {
        RecordList::read(&self.store, POINTS_KEY, PointTransaction::ENTITY).into_records()
    }

    /// Record a transaction with a fresh id and the current time.
    ///
    /// Does not touch the worker's balance; callers pair this with
    /// [`super::UserRepository::set_points`].
    pub fn add(&self, new_tx: NewPointTransaction) -> RepositoryResult<PointTransaction> {
        let tx = schema::revalidate(&PointTransaction {
            id: Uuid::new_v4().to_string(),
            worker_id: new_tx.worker_id,
            worker_name: new_tx.worker_name,
            admin_id: new_tx.admin_id,
            admin_name: new_tx.admin_name,
            amount: new_tx.amount,
            kind: new_tx.kind,
            timestamp: Timestamp::now(),
            reason: new_tx.reason,
        })?;

        let mut ledger = RecordList::load(&self.store, POINTS_KEY, PointTransaction::ENTITY)?;
        ledger.prepend(tx.clone());
        ledger.save(&self.store, POINTS_KEY)?;

        tracing::info!(
            tx_id = %tx.id,
            worker_id = %tx.worker_id,
            amount = tx.amount,
            kind = ?tx.kind,
            "Point transaction recorded"
        );
        Ok(tx)
    }

    /// Transactions for one worker, in ledger order.
    pub fn get_by_worker_id(&self, worker_id: &str) -> Vec<PointTransaction> {
        self.get_all()
            .into_iter()
            .filter(|tx| tx.worker_id == worker_id)
            .collect()
    }

    /// Replace the ledger with an empty list.
    pub fn clear(&self) -> StorageResult<()> {
        self.store.set(POINTS_KEY, &Vec::<PointTransaction>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepositoryError, ValidationError};
    use serde_json::json;

    fn repo() -> PointRepository {
        PointRepository::new(KeyValueStore::in_memory())
    }

    fn grant(worker_id: &str, amount: i64) -> NewPointTransaction {
        NewPointTransaction {
            worker_id: worker_id.to_string(),
            worker_name: "kan".to_string(),
            admin_id: "kkkk1111".to_string(),
            admin_name: "管理者".to_string(),
            amount,
            kind: TransactionType::Add,
            reason: "monthly bonus".to_string(),
        }
    }

    #[test]
    fn add_assigns_id_and_prepends() {
        let repo = repo();
        let first = repo.add(grant("kkkk2222", 10)).unwrap();
        let second = repo.add(grant("kkkk2222", 20)).unwrap();

        assert_ne!(first.id, second.id);
        assert!(Uuid::parse_str(&first.id).is_ok());

        let all = repo.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn get_by_worker_id_filters_in_order() {
        let repo = repo();
        repo.add(grant("w-1", 1)).unwrap();
        repo.add(grant("w-2", 2)).unwrap();
        repo.add(grant("w-1", 3)).unwrap();

        let amounts: Vec<i64> = repo
            .get_by_worker_id("w-1")
            .iter()
            .map(|tx| tx.amount)
            .collect();
        assert_eq!(amounts, vec![3, 1]);
        assert!(repo.get_by_worker_id("nobody").is_empty());
    }

    #[test]
    fn add_rejects_empty_worker_id() {
        let repo = repo();
        let result = repo.add(grant("", 5));

        assert!(matches!(
            result,
            Err(RepositoryError::Validation(ValidationError::Constraint { .. }))
        ));
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn wire_format_uses_type_field() {
        let repo = repo();
        let mut deduction = grant("w-1", 5);
        deduction.kind = TransactionType::Subtract;
        repo.add(deduction).unwrap();

        let raw: serde_json::Value = repo.store.get(POINTS_KEY).unwrap();
        assert_eq!(raw[0]["type"], "subtract");
        assert_eq!(raw[0]["workerId"], "w-1");
        assert!(raw[0].get("kind").is_none());
    }

    #[test]
    fn schema_rejects_unknown_type() {
        let candidate = json!({
            "id": "t-1",
            "workerId": "w-1",
            "workerName": "kan",
            "adminId": "a-1",
            "adminName": "admin",
            "amount": 5,
            "type": "gift",
            "timestamp": "2026-01-01T00:00:00Z",
            "reason": "x",
        });
        assert!(matches!(
            schema::validate::<PointTransaction>(candidate),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn add_keeps_unreadable_entries() {
        let repo = repo();
        let kept = repo.add(grant("w-1", 1)).unwrap();
        let mut raw: serde_json::Value = repo.store.get(POINTS_KEY).unwrap();
        let broken = json!({ "id": "t-old", "type": "bonus" });
        raw.as_array_mut().unwrap().push(broken.clone());
        repo.store.set(POINTS_KEY, &raw).unwrap();

        assert_eq!(repo.get_all(), vec![kept.clone()]);

        let newest = repo.add(grant("w-1", 2)).unwrap();
        let raw: serde_json::Value = repo.store.get(POINTS_KEY).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 3);
        assert_eq!(raw[0]["id"], newest.id.as_str());
        assert_eq!(raw[1]["id"], kept.id.as_str());
        assert_eq!(raw[2], broken);
    }

    #[test]
    fn stored_timestamp_text_is_preserved() {
        let repo = repo();
        let stored = json!([{
            "id": "t-1",
            "workerId": "w-1",
            "workerName": "kan",
            "adminId": "a-1",
            "adminName": "admin",
            "amount": 5,
            "type": "add",
            "timestamp": "2026-01-01T00:00:00.000Z",
            "reason": "x",
        }]);
        repo.store.set(POINTS_KEY, &stored).unwrap();

        repo.add(grant("w-2", 1)).unwrap();
        let raw: serde_json::Value = repo.store.get(POINTS_KEY).unwrap();
        assert_eq!(raw[1], stored[0]);
    }

    #[test]
    fn clear_empties_ledger() {
        let repo = repo();
        repo.add(grant("w-1", 1)).unwrap();
        repo.clear().unwrap();

        assert!(repo.get_all().is_empty());
        assert_eq!(repo.store.get::<serde_json::Value>(POINTS_KEY), Some(json!([])));
    }

    #[test]
    fn corrupt_ledger_reads_as_empty() {
        let repo = repo();
        repo.store.set(POINTS_KEY, &json!({ "not": "a list" })).unwrap();
        assert!(repo.get_all().is_empty());
    }
}
