// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the key-value store.
//!
//! Each repository owns exactly one top-level key, validates records
//! against their [`EntitySchema`](super::schema::EntitySchema) before every
//! write and persists the whole collection on each change.

pub mod credentials;
pub mod points;
pub mod users;
pub mod withdrawals;

pub use credentials::{CredentialRepository, Credentials, SEED_LOGIN_IDS};
pub use points::{NewPointTransaction, PointRepository, PointTransaction, TransactionType};
pub use users::{
    AccountType, BankInfo, NewUser, User, UserPatch, UserProfile, UserRepository, UserRole,
    UserStatus,
};
pub use withdrawals::{
    NewWithdrawalRequest, PaymentDetails, PaymentMethod, PayoutBankInfo, ProcessedBy,
    WithdrawalPatch, WithdrawalRepository, WithdrawalRequest, WithdrawalStatus,
};
