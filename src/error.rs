// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types surfaced by the schema and repository layers.
//!
//! Storage-level failures live in [`crate::storage::StorageError`] and are
//! wrapped here when they escape a repository write.

use thiserror::Error;

use crate::storage::password::PasswordError;
use crate::storage::repository::WithdrawalStatus;
use crate::storage::StorageError;

/// A candidate record failed its entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity}: expected a record object, found {found}")]
    Malformed {
        entity: &'static str,
        found: String,
    },

    #[error("{entity}: missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// Wrong type or a value outside an enumerated set.
    #[error("{entity}: invalid value: {reason}")]
    InvalidValue {
        entity: &'static str,
        reason: String,
    },

    #[error("{entity}: constraint violated: {reason}")]
    Constraint {
        entity: &'static str,
        reason: String,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("withdrawal {id}: illegal status transition {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
