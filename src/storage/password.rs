// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password schemes for stored credentials.
//!
//! The credential repository never compares passwords itself; it asks a
//! [`PasswordScheme`] to seal new values and to verify attempts. The default
//! [`PlaintextScheme`] keeps the stored layout readable by older builds.
//! [`Argon2Scheme`] stores PHC-format argon2 hashes instead.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
}

/// How a password is turned into a stored value and checked against it.
pub trait PasswordScheme: Send + Sync + fmt::Debug {
    /// Produce the value to persist for `password`.
    fn seal(&self, password: &str) -> Result<String, PasswordError>;

    /// Check a login attempt against a persisted value.
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Stores passwords as-is.
///
/// Anyone who can read the medium can read every password.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextScheme;

impl PasswordScheme for PlaintextScheme {
    fn seal(&self, password: &str) -> Result<String, PasswordError> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        password == stored
    }
}

/// Salted argon2id hashes in PHC string format.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Scheme;

impl PasswordScheme for Argon2Scheme {
    fn seal(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        // A stored value that is not a PHC hash never verifies
        PasswordHash::new(stored)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}
