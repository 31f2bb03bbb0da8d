// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for credentials, users, point transactions and
//! withdrawal requests on top of a string key-value medium.
//!
//! ## Layering
//!
//! ```text
//! repository::*        typed CRUD, one top-level key per entity
//!   └─ schema          validation before every write
//!   └─ collection      per-record decoding, unreadable records kept
//!   └─ KeyValueStore   namespacing, JSON text, change events
//!        └─ StorageMedium   RedbMedium (file) | MemoryMedium (process)
//! ```
//!
//! ## Storage Layout
//!
//! ```text
//! pointmoney_users             { id: User, ... }
//! pointmoney_points            [PointTransaction, ...]   newest first
//! pointmoney_withdrawals       [WithdrawalRequest, ...]  newest first
//! pointmoney_auth_credentials  { loginId: stored password, ... }
//! ```

pub mod collection;
pub mod keys;
pub mod kv_store;
pub mod medium;
pub mod password;
pub mod redb_medium;
pub mod repository;
pub mod schema;
pub mod timestamp;

pub use keys::Namespace;
pub use kv_store::{
    KeyValueStore, StorageError, StorageEvent, StorageResult, DEFAULT_EVENT_CAPACITY,
};
pub use medium::{MemoryMedium, StorageMedium};
pub use password::{Argon2Scheme, PasswordError, PasswordScheme, PlaintextScheme};
pub use redb_medium::RedbMedium;
pub use repository::{
    CredentialRepository, PointRepository, UserRepository, WithdrawalRepository,
};
pub use timestamp::Timestamp;
