// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PointMoney Store - persistence layer for the point management app
//!
//! Stores credentials, worker and admin accounts, the point ledger and
//! withdrawal requests in a namespaced key-value medium, and notifies
//! subscribers of every change.
//!
//! ## Modules
//!
//! - `config` - Environment configuration
//! - `error` - Validation and repository errors
//! - `state` - Repository wiring (one handle per entity)
//! - `storage` - Key-value store, schemas and repositories

pub mod config;
pub mod error;
pub mod state;
pub mod storage;
