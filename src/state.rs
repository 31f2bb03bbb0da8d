// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::Config;
use crate::error::RepositoryResult;
use crate::storage::{
    CredentialRepository, KeyValueStore, MemoryMedium, Namespace, PointRepository, RedbMedium,
    StorageMedium, UserRepository, WithdrawalRepository,
};

/// One handle per repository, all sharing a single store.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: KeyValueStore,
    pub users: UserRepository,
    pub points: PointRepository,
    pub withdrawals: WithdrawalRepository,
    pub credentials: CredentialRepository,
}

impl AppState {
    /// Open the redb database under `config.data_dir` and initialize repositories.
    pub fn open(config: &Config) -> RepositoryResult<Self> {
        let medium = RedbMedium::open(&config.database_path())?;
        Self::with_medium(Arc::new(medium), config)
    }

    /// Initialize repositories over an arbitrary medium.
    ///
    /// Seeds credentials and default users, and migrates legacy credentials.
    pub fn with_medium(
        medium: Arc<dyn StorageMedium>,
        config: &Config,
    ) -> RepositoryResult<Self> {
        let store = KeyValueStore::new(
            medium,
            Namespace::new(config.key_prefix.clone()),
            config.event_capacity,
        );

        let credentials =
            CredentialRepository::open(store.clone(), config.password_scheme.build())?;
        let users = UserRepository::new(store.clone());
        users.seed_defaults()?;

        Ok(Self {
            points: PointRepository::new(store.clone()),
            withdrawals: WithdrawalRepository::new(store.clone()),
            users,
            credentials,
            store,
        })
    }

    /// In-memory state with default configuration.
    pub fn in_memory() -> RepositoryResult<Self> {
        Self::with_medium(Arc::new(MemoryMedium::new()), &Config::default())
    }
}
