//! Attribute validation functions.
//!
//! A [`Validator`] receives an attribute value and its name and reports
//! warnings and errors. Validators are pure and attached to schema
//! attributes; [`crate::schema::Block::validate`] runs them.

use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Warnings and errors reported by a validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// No findings.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// A single error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            warnings: Vec::new(),
            errors: vec![message.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validation function attached to a schema attribute.
pub type Validator = Arc<dyn Fn(&Value, &str) -> ValidationOutcome + Send + Sync>;

/// Asserts that every map in a list has a unique value for `key`.
///
/// Reports one error for the first duplicate found. Maps lacking `key`
/// count as having a null value for it.
#[must_use]
pub fn list_of_maps_has_no_duplicate_keys(key: impl Into<String>) -> Validator {
    let key = key.into();
    Arc::new(move |value: &Value, attr: &str| {
        let Some(items) = value.as_array() else {
            return ValidationOutcome::error(format!(
                "expected type of {attr:?} to be a list of maps"
            ));
        };

        let mut seen: Vec<&Value> = Vec::with_capacity(items.len());
        for item in items {
            let Some(map) = item.as_object() else {
                return ValidationOutcome::error(format!(
                    "expected type of {attr:?} to be a list of maps"
                ));
            };
            let value_for_key = map.get(key.as_str()).unwrap_or(&Value::Null);
            if seen.contains(&value_for_key) {
                return ValidationOutcome::error(format!(
                    "Found a duplicate value for key {key:?}"
                ));
            }
            seen.push(value_for_key);
        }
        ValidationOutcome::ok()
    })
}

/// Rejects strings that are empty or only whitespace.
#[must_use]
pub fn no_empty_strings() -> Validator {
    Arc::new(|value: &Value, attr: &str| match value.as_str() {
        Some(s) if s.trim().is_empty() => {
            ValidationOutcome::error(format!("{attr:?} must not be empty"))
        }
        Some(_) => ValidationOutcome::ok(),
        None => ValidationOutcome::error(format!("expected type of {attr:?} to be string")),
    })
}

/// Accepts only strings from `valid`.
#[must_use]
pub fn string_in_slice(valid: &'static [&'static str], ignore_case: bool) -> Validator {
    Arc::new(move |value: &Value, attr: &str| {
        let Some(s) = value.as_str() else {
            return ValidationOutcome::error(format!("expected type of {attr:?} to be string"));
        };
        let matches = valid.iter().any(|candidate| {
            if ignore_case {
                candidate.eq_ignore_ascii_case(s)
            } else {
                *candidate == s
            }
        });
        if matches {
            ValidationOutcome::ok()
        } else {
            ValidationOutcome::error(format!(
                "expected {attr} to be one of {valid:?}, got {s}"
            ))
        }
    })
}

/// Accepts integers greater than or equal to `min`.
#[must_use]
pub fn int_at_least(min: i64) -> Validator {
    Arc::new(move |value: &Value, attr: &str| match value.as_i64() {
        Some(v) if v < min => {
            ValidationOutcome::error(format!("expected {attr} to be at least ({min}), got {v}"))
        }
        Some(_) => ValidationOutcome::ok(),
        None => ValidationOutcome::error(format!("expected type of {attr:?} to be integer")),
    })
}

/// Accepts integers in the inclusive range `min..=max`.
#[must_use]
pub fn int_between(min: i64, max: i64) -> Validator {
    Arc::new(move |value: &Value, attr: &str| match value.as_i64() {
        Some(v) if v < min || v > max => ValidationOutcome::error(format!(
            "expected {attr} to be in the range ({min} - {max}), got {v}"
        )),
        Some(_) => ValidationOutcome::ok(),
        None => ValidationOutcome::error(format!("expected type of {attr:?} to be integer")),
    })
}

/// Accepts strings that parse as a GUID.
#[must_use]
pub fn is_uuid() -> Validator {
    Arc::new(|value: &Value, attr: &str| match value.as_str() {
        Some(s) if Uuid::parse_str(s).is_ok() => ValidationOutcome::ok(),
        Some(s) => ValidationOutcome::error(format!("{attr:?} ({s}) is not a valid UUID")),
        None => ValidationOutcome::error(format!("expected type of {attr:?} to be string")),
    })
}
