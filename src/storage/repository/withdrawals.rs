// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Withdrawal request repository.
//!
//! Requests are stored as one list under the `withdrawals` key, newest first.
//!
//! ## Status Machine
//!
//! ```text
//! pending ──► processing ──► completed
//!    │             │
//!    ├─────────────┴──────► rejected
//!    └────────────────────► completed
//! ```
//!
//! `completed` and `rejected` are terminal. Setting the current status again
//! is not a transition and is always allowed.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::super::collection::RecordList;
use super::super::keys::WITHDRAWALS_KEY;
use super::super::schema::{self, EntitySchema};
use super::super::timestamp::Timestamp;
use super::super::{KeyValueStore, StorageResult};
use crate::error::{RepositoryError, RepositoryResult};

/// Payout channel requested by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bank,
    Crypto,
    Paypay,
}

/// Withdrawal processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Whether a request in this status may move to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use WithdrawalStatus::*;

        self == next
            || matches!(
                (self, next),
                (Pending, Processing | Completed | Rejected) | (Processing, Completed | Rejected)
            )
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bank destination of a payout. `account_type` is free text here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutBankInfo {
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: String,
    pub account_number: String,
    pub account_holder: String,
}

/// Where the payout goes. Which field is set depends on the payment method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_info: Option<PayoutBankInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_pay_id: Option<String>,
}

/// Admin who last changed a request's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedBy {
    pub id: String,
    pub name: String,
}

/// A worker's request to cash out points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub worker_id: String,
    pub worker_name: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub status: WithdrawalStatus,
    pub timestamp: Timestamp,
    pub payment_details: PaymentDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<ProcessedBy>,
}

impl EntitySchema for WithdrawalRequest {
    const ENTITY: &'static str = "withdrawal request";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "workerId",
        "workerName",
        "amount",
        "paymentMethod",
        "status",
        "timestamp",
        "paymentDetails",
    ];
}

/// Input for [`WithdrawalRepository::add`].
#[derive(Debug, Clone)]
pub struct NewWithdrawalRequest {
    pub worker_id: String,
    pub worker_name: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
}

/// The fields of a request that may change after creation.
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WithdrawalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_comment: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<Option<Timestamp>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<Option<ProcessedBy>>,
}

/// Repository for withdrawal requests.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    store: KeyValueStore,
}

impl WithdrawalRepository {
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    fn load(&self) -> StorageResult<RecordList<WithdrawalRequest>> {
        RecordList::load(&self.store, WITHDRAWALS_KEY, WithdrawalRequest::ENTITY)
    }

    /// Every readable request, newest first.
    pub fn get_all(&self) -> Vec<WithdrawalRequest> {
        RecordList::read(&self.store, WITHDRAWALS_KEY, WithdrawalRequest::ENTITY).into_records()
    }

    pub fn get_by_id(&self, id: &str) -> Option<WithdrawalRequest> {
        self.get_all().into_iter().find(|w| w.id == id)
    }

    /// File a new request in `pending` status.
    pub fn add(&self, new_request: NewWithdrawalRequest) -> RepositoryResult<WithdrawalRequest> {
        let request = schema::revalidate(&WithdrawalRequest {
            id: Uuid::new_v4().to_string(),
            worker_id: new_request.worker_id,
            worker_name: new_request.worker_name,
            amount: new_request.amount,
            payment_method: new_request.payment_method,
            status: WithdrawalStatus::Pending,
            timestamp: Timestamp::now(),
            payment_details: new_request.payment_details,
            admin_comment: None,
            processed_at: None,
            processed_by: None,
        })?;

        let mut requests = self.load()?;
        requests.prepend(request.clone());
        requests.save(&self.store, WITHDRAWALS_KEY)?;

        tracing::info!(
            withdrawal_id = %request.id,
            worker_id = %request.worker_id,
            amount = request.amount,
            "Withdrawal requested"
        );
        Ok(request)
    }

    /// Apply `patch` to an existing request.
    ///
    /// Returns `Ok(None)` without writing if no request has this id, and
    /// [`RepositoryError::IllegalTransition`] if the status change is not allowed.
    pub fn update(
        &self,
        id: &str,
        patch: &WithdrawalPatch,
    ) -> RepositoryResult<Option<WithdrawalRequest>> {
        let mut requests = self.load()?;
        let Some(existing) = requests.find_mut(|w| w.id == id) else {
            tracing::debug!(withdrawal_id = %id, "Update skipped, withdrawal not found");
            return Ok(None);
        };

        let current = existing.status;
        if let Some(next) = patch.status {
            if !current.can_transition_to(next) {
                return Err(RepositoryError::IllegalTransition {
                    id: id.to_string(),
                    from: current,
                    to: next,
                });
            }
        }

        let updated: WithdrawalRequest = schema::validate(schema::merge_patch(&*existing, patch)?)?;
        *existing = updated.clone();
        requests.save(&self.store, WITHDRAWALS_KEY)?;

        if updated.status != current {
            tracing::info!(
                withdrawal_id = %id,
                from = %current,
                to = %updated.status,
                terminal = updated.status.is_terminal(),
                "Withdrawal status changed"
            );
        }
        Ok(Some(updated))
    }

    /// Record an admin decision: new status, comment, who and when.
    ///
    /// A `None` comment clears any earlier comment.
    pub fn update_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
        processed_by: ProcessedBy,
        admin_comment: Option<String>,
    ) -> RepositoryResult<Option<WithdrawalRequest>> {
        self.update(
            id,
            &WithdrawalPatch {
                status: Some(status),
                admin_comment: Some(admin_comment),
                processed_at: Some(Some(Timestamp::now())),
                processed_by: Some(Some(processed_by)),
            },
        )
    }

    /// Requests filed by one worker, newest first.
    pub fn get_by_worker_id(&self, worker_id: &str) -> Vec<WithdrawalRequest> {
        self.get_all()
            .into_iter()
            .filter(|w| w.worker_id == worker_id)
            .collect()
    }

    /// Requests still awaiting a decision.
    pub fn get_pending(&self) -> Vec<WithdrawalRequest> {
        self.get_all()
            .into_iter()
            .filter(|w| w.status == WithdrawalStatus::Pending)
            .collect()
    }

    /// Replace the stored list with an empty one.
    pub fn clear(&self) -> StorageResult<()> {
        self.store
            .set(WITHDRAWALS_KEY, &Vec::<WithdrawalRequest>::new())
    }
}
