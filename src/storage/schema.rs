// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Entity schemas: the validation boundary in front of every write.
//!
//! A candidate is checked in three passes:
//!
//! 1. it must be a JSON object carrying every required field;
//! 2. it must deserialize into the typed record (types and enum values);
//! 3. the record's `validator` rules must hold (e-mail format, non-empty ids).
//!
//! Optional fields that are absent stay absent and unknown keys are dropped.
//! Stored data is not re-validated on read.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::{ValidationError, ValidationResult};

/// A persisted record type with a structural schema.
pub trait EntitySchema: Serialize + DeserializeOwned + Validate {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Wire names of the fields a candidate must carry.
    const REQUIRED_FIELDS: &'static [&'static str];
}

/// Validate an untyped candidate against `T`'s schema.
pub fn validate<T: EntitySchema>(candidate: Value) -> ValidationResult<T> {
    let Value::Object(fields) = &candidate else {
        return Err(ValidationError::Malformed {
            entity: T::ENTITY,
            found: json_kind(&candidate).to_string(),
        });
    };

    if let Some(field) = T::REQUIRED_FIELDS
        .iter()
        .find(|field| fields.get(**field).map_or(true, Value::is_null))
    {
        return Err(ValidationError::MissingField {
            entity: T::ENTITY,
            field: *field,
        });
    }

    let record: T =
        serde_json::from_value(candidate).map_err(|e| ValidationError::InvalidValue {
            entity: T::ENTITY,
            reason: e.to_string(),
        })?;

    record
        .validate()
        .map_err(|e| ValidationError::Constraint {
            entity: T::ENTITY,
            reason: e.to_string(),
        })?;

    Ok(record)
}

/// Validate an already-typed record by passing it through its schema.
pub fn revalidate<T: EntitySchema>(record: &T) -> ValidationResult<T> {
    validate(to_candidate::<T, _>(record)?)
}

/// Shallow-merge the fields present in `patch` over `existing`.
///
/// Top-level keys in the patch replace the existing values wholesale; nested
/// objects are not merged.
pub fn merge_patch<T: EntitySchema, P: Serialize>(existing: &T, patch: &P) -> ValidationResult<Value> {
    let mut merged = to_object::<T, _>(existing)?;
    merged.extend(to_object::<T, _>(patch)?);
    Ok(Value::Object(merged))
}

fn to_candidate<T: EntitySchema, S: Serialize>(value: &S) -> ValidationResult<Value> {
    serde_json::to_value(value).map_err(|e| ValidationError::InvalidValue {
        entity: T::ENTITY,
        reason: e.to_string(),
    })
}

fn to_object<T: EntitySchema, S: Serialize>(value: &S) -> ValidationResult<Map<String, Value>> {
    match to_candidate::<T, _>(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::Malformed {
            entity: T::ENTITY,
            found: json_kind(&other).to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Contact {
        #[validate(length(min = 1))]
        contact_id: String,
        #[validate(email)]
        email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    impl EntitySchema for Contact {
        const ENTITY: &'static str = "contact";
        const REQUIRED_FIELDS: &'static [&'static str] = &["contactId", "email"];
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ContactPatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn accepts_valid_candidate_and_keeps_optionals_absent() {
        let contact: Contact =
            validate(json!({ "contactId": "c-1", "email": "a@example.com" })).unwrap();
        assert_eq!(contact.contact_id, "c-1");
        assert_eq!(contact.note, None);
    }

    #[test]
    fn rejects_non_object() {
        let err = validate::<Contact>(json!(["c-1"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Malformed {
                entity: "contact",
                found: "array".to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_and_null_required_fields() {
        let err = validate::<Contact>(json!({ "contactId": "c-1" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                entity: "contact",
                field: "email"
            }
        );

        let err = validate::<Contact>(json!({ "contactId": null, "email": "a@example.com" }))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField {
                field: "contactId",
                ..
            }
        ));
    }

    #[test]
    fn rejects_wrong_types() {
        let err = validate::<Contact>(json!({ "contactId": 7, "email": "a@example.com" }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_constraint_violations() {
        let err = validate::<Contact>(json!({ "contactId": "c-1", "email": "not-an-email" }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Constraint { .. }));
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let contact: Contact = validate(json!({
            "contactId": "c-1",
            "email": "a@example.com",
            "shoeSize": 44,
        }))
        .unwrap();
        let back = serde_json::to_value(&contact).unwrap();
        assert_eq!(back, json!({ "contactId": "c-1", "email": "a@example.com" }));
    }

    #[test]
    fn revalidate_is_identity_for_valid_records() {
        let contact = Contact {
            contact_id: "c-1".to_string(),
            email: "a@example.com".to_string(),
            note: Some("hi".to_string()),
        };
        assert_eq!(revalidate(&contact).unwrap(), contact);
    }

    #[test]
    fn merge_patch_overrides_only_present_fields() {
        let contact = Contact {
            contact_id: "c-1".to_string(),
            email: "a@example.com".to_string(),
            note: None,
        };

        let merged = merge_patch(&contact, &ContactPatch {
            note: Some("vip".to_string()),
        })
        .unwrap();
        let updated: Contact = validate(merged).unwrap();
        assert_eq!(updated.note.as_deref(), Some("vip"));
        assert_eq!(updated.email, "a@example.com");

        let merged = merge_patch(&updated, &ContactPatch { note: None }).unwrap();
        assert_eq!(validate::<Contact>(merged).unwrap(), updated);
    }
}
