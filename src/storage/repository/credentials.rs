// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login credential repository.
//!
//! Credentials are a single mapping of login id → stored password value
//! under `auth_credentials`. What the stored value looks like is up to the
//! configured [`PasswordScheme`].
//!
//! ## Initialization
//!
//! [`CredentialRepository::open`] merges three sources, later ones winning:
//!
//! 1. the seed accounts (`kkkk1111`, `kkkk2222`, password = login id),
//! 2. the legacy `auth-credentials` record (`{ credentials, initialized }`),
//! 3. whatever is already stored under `auth_credentials`.
//!
//! The legacy key is removed once its entries are persisted under the new
//! key. Opening again changes nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::super::keys::{CREDENTIALS_KEY, LEGACY_CREDENTIALS_KEY};
use super::super::password::PasswordScheme;
use super::super::schema::{self, EntitySchema};
use super::super::KeyValueStore;
use crate::error::RepositoryResult;

/// Accounts that always have a credential after initialization.
pub const SEED_LOGIN_IDS: [&str; 2] = ["kkkk1111", "kkkk2222"];

/// Login id → stored password value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, login_id: &str) -> Option<&str> {
        self.0.get(login_id).map(String::as_str)
    }

    pub fn contains(&self, login_id: &str) -> bool {
        self.0.contains_key(login_id)
    }

    pub fn insert(&mut self, login_id: impl Into<String>, stored: impl Into<String>) {
        self.0.insert(login_id.into(), stored.into());
    }

    pub fn remove(&mut self, login_id: &str) -> Option<String> {
        self.0.remove(login_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        if self.0.keys().any(|login_id| login_id.is_empty()) {
            let mut error = validator::ValidationError::new("empty_login_id");
            error.message = Some("login id must not be empty".into());

            let mut errors = validator::ValidationErrors::new();
            errors.add("loginId", error);
            return Err(errors);
        }
        Ok(())
    }
}

impl EntitySchema for Credentials {
    const ENTITY: &'static str = "credentials";
    const REQUIRED_FIELDS: &'static [&'static str] = &[];
}

/// Layout of the older `auth-credentials` record.
#[derive(Debug, Default, Deserialize)]
struct LegacyAuthState {
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

/// Repository for login credentials.
#[derive(Clone)]
pub struct CredentialRepository {
    store: KeyValueStore,
    scheme: Arc<dyn PasswordScheme>,
}

impl fmt::Debug for CredentialRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRepository")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl CredentialRepository {
    /// Open the repository, seeding and migrating stored credentials.
    pub fn open(store: KeyValueStore, scheme: Arc<dyn PasswordScheme>) -> RepositoryResult<Self> {
        let repo = Self { store, scheme };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> RepositoryResult<()> {
        let current: Option<Credentials> = self.load()?;
        let legacy: Option<LegacyAuthState> = self.store.get(LEGACY_CREDENTIALS_KEY);

        let mut merged = current.clone().unwrap_or_default();

        // Legacy values are raw passwords; seal them with the active scheme
        let mut migrated = 0;
        for (login_id, password) in legacy.iter().flat_map(|l| l.credentials.iter()) {
            if !merged.contains(login_id) {
                merged.insert(login_id.as_str(), self.scheme.seal(password)?);
                migrated += 1;
            }
        }

        for login_id in SEED_LOGIN_IDS {
            if !merged.contains(login_id) {
                merged.insert(login_id, self.scheme.seal(login_id)?);
            }
        }

        if current.as_ref() != Some(&merged) {
            self.set_credentials(&merged)?;
        }

        if legacy.is_some() {
            self.store.remove(LEGACY_CREDENTIALS_KEY)?;
            tracing::info!(migrated, "Migrated legacy credentials");
        }
        Ok(())
    }

    /// Stored credentials for a read-modify-write. An unreadable value is an
    /// error so it is never overwritten.
    fn load(&self) -> RepositoryResult<Option<Credentials>> {
        self.store.try_get(CREDENTIALS_KEY).map_err(|e| {
            tracing::error!(error = %e, "Stored credentials unreadable, refusing to overwrite");
            e.into()
        })
    }

    /// All stored credentials. Empty if nothing is stored or the value is corrupt.
    pub fn get_credentials(&self) -> Credentials {
        self.store.get(CREDENTIALS_KEY).unwrap_or_default()
    }

    /// Replace the stored mapping after validating it.
    pub fn set_credentials(&self, credentials: &Credentials) -> RepositoryResult<()> {
        let validated = schema::revalidate(credentials)?;
        self.store.set(CREDENTIALS_KEY, &validated)?;
        Ok(())
    }

    /// Check a login attempt. Unknown login ids never verify.
    pub fn verify_credentials(&self, login_id: &str, password: &str) -> bool {
        let verified = self
            .get_credentials()
            .get(login_id)
            .is_some_and(|stored| self.scheme.verify(password, stored));

        if !verified {
            tracing::debug!(login_id = %login_id, "Credential verification failed");
        }
        verified
    }

    /// Set or replace the password for `login_id`.
    pub fn add_credentials(&self, login_id: &str, password: &str) -> RepositoryResult<()> {
        let mut credentials = self.load()?.unwrap_or_default();
        credentials.insert(login_id, self.scheme.seal(password)?);
        self.set_credentials(&credentials)
    }

    /// Delete the credential for `login_id`. Returns whether one existed.
    pub fn remove_credentials(&self, login_id: &str) -> RepositoryResult<bool> {
        let mut credentials = self.load()?.unwrap_or_default();
        if credentials.remove(login_id).is_none() {
            return Ok(false);
        }
        self.set_credentials(&credentials)?;
        Ok(true)
    }

    /// Drop every credential except freshly sealed seed accounts.
    ///
    /// Overwrites the stored value even if it is unreadable.
    pub fn reset(&self) -> RepositoryResult<()> {
        let mut credentials = Credentials::new();
        for login_id in SEED_LOGIN_IDS {
            credentials.insert(login_id, self.scheme.seal(login_id)?);
        }
        self.set_credentials(&credentials)?;
        tracing::warn!("Credentials reset to seed accounts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepositoryError, ValidationError};
    use crate::storage::password::{Argon2Scheme, PlaintextScheme};
    use serde_json::json;

    fn open(store: &KeyValueStore) -> CredentialRepository {
        CredentialRepository::open(store.clone(), Arc::new(PlaintextScheme)).unwrap()
    }

    #[test]
    fn open_seeds_empty_store() {
        let store = KeyValueStore::in_memory();
        let repo = open(&store);

        let creds = repo.get_credentials();
        assert_eq!(creds.len(), 2);
        assert!(repo.verify_credentials("kkkk1111", "kkkk1111"));
        assert!(repo.verify_credentials("kkkk2222", "kkkk2222"));
    }

    #[test]
    fn existing_entries_win_over_seeds() {
        let store = KeyValueStore::in_memory();
        store
            .set(CREDENTIALS_KEY, &json!({ "kkkk1111": "changedpw" }))
            .unwrap();

        open(&store);

        let raw: serde_json::Value = store.get(CREDENTIALS_KEY).unwrap();
        assert_eq!(
            raw,
            json!({ "kkkk1111": "changedpw", "kkkk2222": "kkkk2222" })
        );
    }

    #[test]
    fn reopen_writes_nothing() {
        let store = KeyValueStore::in_memory();
        open(&store);

        let mut rx = store.subscribe();
        open(&store);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn legacy_credentials_are_migrated_once() {
        let store = KeyValueStore::in_memory();
        store
            .set(
                LEGACY_CREDENTIALS_KEY,
                &json!({
                    "credentials": { "kkkk1111": "legacy-admin", "worker9": "w9pass" },
                    "initialized": true,
                }),
            )
            .unwrap();
        store
            .set(CREDENTIALS_KEY, &json!({ "worker9": "current" }))
            .unwrap();

        let repo = open(&store);

        // current > legacy > seeds
        assert!(repo.verify_credentials("worker9", "current"));
        assert!(repo.verify_credentials("kkkk1111", "legacy-admin"));
        assert!(repo.verify_credentials("kkkk2222", "kkkk2222"));
        assert_eq!(store.get::<serde_json::Value>(LEGACY_CREDENTIALS_KEY), None);

        let after = repo.get_credentials();
        open(&store);
        assert_eq!(repo.get_credentials(), after);
    }

    #[test]
    fn add_verify_and_remove() {
        let store = KeyValueStore::in_memory();
        let repo = open(&store);

        repo.add_credentials("worker01", "pw").unwrap();
        assert!(repo.verify_credentials("worker01", "pw"));
        assert!(!repo.verify_credentials("worker01", "PW"));
        assert!(!repo.verify_credentials("nobody", "pw"));

        repo.add_credentials("worker01", "pw2").unwrap();
        assert!(repo.verify_credentials("worker01", "pw2"));

        assert!(repo.remove_credentials("worker01").unwrap());
        assert!(!repo.remove_credentials("worker01").unwrap());
        assert!(!repo.verify_credentials("worker01", "pw2"));
    }

    #[test]
    fn empty_login_id_is_rejected() {
        let store = KeyValueStore::in_memory();
        let repo = open(&store);
        let before = repo.get_credentials();

        let result = repo.add_credentials("", "pw");
        assert!(matches!(
            result,
            Err(RepositoryError::Validation(ValidationError::Constraint { .. }))
        ));
        assert_eq!(repo.get_credentials(), before);
    }

    #[test]
    fn unreadable_credentials_are_not_overwritten() {
        let store = KeyValueStore::in_memory();
        let repo = open(&store);
        store
            .set(CREDENTIALS_KEY, &json!({ "kkkk1111": 1234 }))
            .unwrap();

        assert!(!repo.verify_credentials("kkkk1111", "kkkk1111"));
        assert!(matches!(
            repo.add_credentials("worker01", "pw"),
            Err(RepositoryError::Storage(_))
        ));
        assert!(CredentialRepository::open(store.clone(), Arc::new(PlaintextScheme)).is_err());
        assert_eq!(
            store.get::<serde_json::Value>(CREDENTIALS_KEY),
            Some(json!({ "kkkk1111": 1234 }))
        );

        // An explicit reset recovers
        repo.reset().unwrap();
        assert!(repo.verify_credentials("kkkk1111", "kkkk1111"));
    }

    #[test]
    fn reset_restores_seeds() {
        let store = KeyValueStore::in_memory();
        let repo = open(&store);
        repo.add_credentials("worker01", "pw").unwrap();
        repo.add_credentials("kkkk1111", "changed").unwrap();

        repo.reset().unwrap();

        let creds = repo.get_credentials();
        assert_eq!(creds.len(), 2);
        assert!(!creds.contains("worker01"));
        assert!(repo.verify_credentials("kkkk1111", "kkkk1111"));
    }

    #[test]
    fn argon2_scheme_never_stores_plaintext() {
        let store = KeyValueStore::in_memory();
        let repo = CredentialRepository::open(store.clone(), Arc::new(Argon2Scheme)).unwrap();

        repo.add_credentials("worker01", "s3cret").unwrap();
        let creds = repo.get_credentials();
        for (_, stored) in creds.iter() {
            assert!(stored.starts_with("$argon2"));
        }

        assert!(repo.verify_credentials("worker01", "s3cret"));
        assert!(repo.verify_credentials("kkkk2222", "kkkk2222"));
        assert!(!repo.verify_credentials("worker01", "wrong"));
    }
}
