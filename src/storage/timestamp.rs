// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RFC 3339 timestamps that keep their stored text.
//!
//! Records written by other clients carry millisecond precision
//! (`2026-01-01T00:00:00.000Z`). A [`Timestamp`] checks the text parses as
//! RFC 3339 and then serializes it back byte for byte, so validating a stored
//! record never rewrites its timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp {
    raw: String,
    at: DateTime<Utc>,
}

impl Timestamp {
    /// The current time, formatted with millisecond precision and a `Z` suffix.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            raw: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            at,
        }
    }

    /// Stored text, exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.at
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let at = DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc);
        Ok(Self {
            raw: s.to_string(),
            at,
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| de::Error::custom(format!("invalid RFC 3339 timestamp {raw:?}: {e}")))
    }
}
