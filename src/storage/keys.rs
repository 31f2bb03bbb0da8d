// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key constants and namespacing for the key-value layout.

/// Prefix prepended to every key so the store can share a medium with
/// unrelated data.
pub const DEFAULT_PREFIX: &str = "pointmoney_";

/// Mapping of user id → user record.
pub const USERS_KEY: &str = "users";

/// Newest-first list of point transactions.
pub const POINTS_KEY: &str = "points";

/// Newest-first list of withdrawal requests.
pub const WITHDRAWALS_KEY: &str = "withdrawals";

/// Mapping of login id → stored password value.
pub const CREDENTIALS_KEY: &str = "auth_credentials";

/// Older builds kept credentials as `{ credentials, initialized }` under this
/// key. Read once on open, then removed.
pub const LEGACY_CREDENTIALS_KEY: &str = "auth-credentials";

/// Key namespace for one logical store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Namespace {
    /// Create a namespace with a custom prefix (useful for testing).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Namespaced form of a top-level key.
    pub fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}
