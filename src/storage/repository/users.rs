// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are stored as a single mapping of id → record under the `users` key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::super::collection::RecordMap;
use super::super::keys::USERS_KEY;
use super::super::schema::{self, EntitySchema};
use super::super::timestamp::Timestamp;
use super::super::{KeyValueStore, StorageResult};
use crate::error::{RepositoryError, RepositoryResult};

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Worker,
    Admin,
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// Japanese bank account type, stored under its Japanese label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// 普通 (ordinary deposit)
    #[serde(rename = "普通")]
    Ordinary,
    /// 当座 (current / checking)
    #[serde(rename = "当座")]
    Current,
}

/// Bank account attached to a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    pub bank_name: String,
    pub branch_name: String,
    pub account_type: AccountType,
    pub account_number: String,
    pub account_holder: String,
}

/// Optional profile details. At most one payout destination is usually set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_info: Option<BankInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_pay_id: Option<String>,
}

/// A worker or admin account.
///
/// `points >= 0` and a non-decreasing `total_earned` are business rules kept
/// by [`UserRepository::set_points`], not by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub login_id: String,
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: UserRole,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    pub joined_at: Timestamp,
    pub total_earned: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl EntitySchema for User {
    const ENTITY: &'static str = "user";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "loginId",
        "name",
        "email",
        "role",
        "points",
        "status",
        "joinedAt",
        "totalEarned",
    ];
}

/// Partial update for a user. `None` fields are left untouched.
///
/// Optional fields take `Some(None)` to clear the stored value. `id` and
/// `joinedAt` are fixed at creation and cannot be patched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_earned: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Option<Timestamp>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Option<UserProfile>>,
}

/// Registration input for a new worker account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login_id: String,
    pub name: String,
    pub email: String,
}

/// Built-in accounts present after first start.
fn default_users(now: Timestamp) -> [User; 2] {
    [
        User {
            id: "kkkk1111".to_string(),
            login_id: "kkkk1111".to_string(),
            name: "管理者".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            points: 0,
            avatar_url: None,
            status: UserStatus::Active,
            joined_at: now.clone(),
            total_earned: 0,
            last_login: None,
            profile: None,
        },
        User {
            id: "kkkk2222".to_string(),
            login_id: "kkkk2222".to_string(),
            name: "kan".to_string(),
            email: "kan@example.com".to_string(),
            role: UserRole::Worker,
            points: 0,
            avatar_url: None,
            status: UserStatus::Active,
            joined_at: now,
            total_earned: 0,
            last_login: None,
            profile: None,
        },
    ]
}

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: KeyValueStore,
}

impl UserRepository {
    /// Create a new UserRepository.
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    fn load(&self) -> StorageResult<RecordMap<User>> {
        RecordMap::load(&self.store, USERS_KEY, User::ENTITY)
    }

    /// All readable users keyed by id. Empty if nothing is stored or the
    /// mapping itself is corrupt.
    pub fn get_all(&self) -> BTreeMap<String, User> {
        RecordMap::read(&self.store, USERS_KEY, User::ENTITY).into_records()
    }

    /// Get a user by ID.
    pub fn get_by_id(&self, id: &str) -> Option<User> {
        self.get_all().remove(id)
    }

    /// Insert or replace a user after validating it.
    pub fn save(&self, user: &User) -> RepositoryResult<User> {
        let validated = schema::revalidate(user)?;
        let mut users = self.load()?;
        users.insert(validated.id.clone(), validated.clone());
        users.save(&self.store, USERS_KEY)?;
        Ok(validated)
    }

    /// Merge `patch` over an existing user.
    ///
    /// Returns `Ok(None)` without writing anything if the user does not exist.
    pub fn update(&self, id: &str, patch: &UserPatch) -> RepositoryResult<Option<User>> {
        let mut users = self.load()?;
        let Some(existing) = users.get(id) else {
            tracing::debug!(user_id = %id, "Update skipped, user not found");
            return Ok(None);
        };

        let validated: User = schema::validate(schema::merge_patch(existing, patch)?)?;
        users.insert(id.to_string(), validated.clone());
        users.save(&self.store, USERS_KEY)?;
        Ok(Some(validated))
    }

    /// Delete a user. Returns whether a record was removed.
    pub fn remove(&self, id: &str) -> StorageResult<bool> {
        let mut users = self.load()?;
        if !users.remove(id) {
            return Ok(false);
        }
        users.save(&self.store, USERS_KEY)?;
        Ok(true)
    }

    /// Replace the stored mapping with an empty one.
    pub fn clear(&self) -> StorageResult<()> {
        self.store.set(USERS_KEY, &BTreeMap::<String, User>::new())
    }

    /// Create a worker account keyed by its login id.
    ///
    /// An id already taken by an unreadable record counts as existing.
    pub fn register(&self, new_user: NewUser) -> RepositoryResult<User> {
        let mut users = self.load()?;
        if users.contains_key(&new_user.login_id) {
            return Err(RepositoryError::AlreadyExists(format!(
                "User {}",
                new_user.login_id
            )));
        }

        let user = schema::revalidate(&User {
            id: new_user.login_id.clone(),
            login_id: new_user.login_id,
            name: new_user.name,
            email: new_user.email,
            role: UserRole::Worker,
            points: 0,
            avatar_url: None,
            status: UserStatus::Active,
            joined_at: Timestamp::now(),
            total_earned: 0,
            last_login: None,
            profile: None,
        })?;
        users.insert(user.id.clone(), user.clone());
        users.save(&self.store, USERS_KEY)?;

        tracing::info!(user_id = %user.id, "Registered worker");
        Ok(user)
    }

    /// Stamp `last_login` with the current time.
    pub fn record_login(&self, id: &str) -> RepositoryResult<Option<User>> {
        self.update(
            id,
            &UserPatch {
                last_login: Some(Some(Timestamp::now())),
                ..UserPatch::default()
            },
        )
    }

    /// Set a user's balance, clamped at zero.
    ///
    /// Any increase is also added to `total_earned`; decreases leave it as is.
    pub fn set_points(&self, id: &str, points: i64) -> RepositoryResult<Option<User>> {
        let Some(user) = self.get_by_id(id) else {
            return Ok(None);
        };

        let points = points.max(0);
        let earned = points.saturating_sub(user.points).max(0);
        self.update(
            id,
            &UserPatch {
                points: Some(points),
                total_earned: Some(user.total_earned.saturating_add(earned)),
                ..UserPatch::default()
            },
        )
    }

    /// Insert the built-in admin and worker accounts if they are missing.
    ///
    /// Existing records, readable or not, are never overwritten. Returns how
    /// many were added.
    pub fn seed_defaults(&self) -> RepositoryResult<usize> {
        let mut users = self.load()?;
        let mut added = 0;

        for user in default_users(Timestamp::now()) {
            if users.contains_key(&user.id) {
                continue;
            }
            let validated = schema::revalidate(&user)?;
            users.insert(validated.id.clone(), validated);
            added += 1;
        }

        if added > 0 {
            users.save(&self.store, USERS_KEY)?;
            tracing::info!(added, "Seeded default users");
        }
        Ok(added)
    }
}
