// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Unset variables
//! fall back to their defaults; set but unparseable values are an error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the redb database file | `./data` |
//! | `STORE_PREFIX` | Namespace prefix for every stored key | `pointmoney_` |
//! | `EVENT_CAPACITY` | Change notification buffer size | `64` |
//! | `PASSWORD_SCHEME` | `plaintext` or `argon2` | `plaintext` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::storage::keys::DEFAULT_PREFIX;
use crate::storage::{Argon2Scheme, PasswordScheme, PlaintextScheme, DEFAULT_EVENT_CAPACITY};

/// Environment variable name for the data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the key namespace prefix.
pub const STORE_PREFIX_ENV: &str = "STORE_PREFIX";

/// Environment variable name for the change notification buffer size.
pub const EVENT_CAPACITY_ENV: &str = "EVENT_CAPACITY";

/// Environment variable name for the credential password scheme.
pub const PASSWORD_SCHEME_ENV: &str = "PASSWORD_SCHEME";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "pointmoney.redb";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(()),
        }
    }
}

/// How credentials are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordSchemeKind {
    /// Raw passwords, compatible with existing stores.
    #[default]
    Plaintext,
    Argon2,
}

impl PasswordSchemeKind {
    pub fn build(self) -> Arc<dyn PasswordScheme> {
        match self {
            Self::Plaintext => Arc::new(PlaintextScheme),
            Self::Argon2 => Arc::new(Argon2Scheme),
        }
    }
}

impl FromStr for PasswordSchemeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plaintext" => Ok(Self::Plaintext),
            "argon2" => Ok(Self::Argon2),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub key_prefix: String,
    pub event_capacity: usize,
    pub password_scheme: PasswordSchemeKind,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            key_prefix: DEFAULT_PREFIX.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            password_scheme: PasswordSchemeKind::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            data_dir: lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            key_prefix: lookup(STORE_PREFIX_ENV).unwrap_or(defaults.key_prefix),
            event_capacity: parse_var(&lookup, EVENT_CAPACITY_ENV)?
                .unwrap_or(defaults.event_capacity),
            password_scheme: parse_var(&lookup, PASSWORD_SCHEME_ENV)?
                .unwrap_or(defaults.password_scheme),
            log_format: parse_var(&lookup, LOG_FORMAT_ENV)?.unwrap_or(defaults.log_format),
        })
    }

    /// Path of the redb database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
