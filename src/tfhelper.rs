//! Helpers shared by resource implementations: import identifier parsing and
//! secret memo attributes.
//!
//! Secrets are never returned by the API, so for every sensitive attribute
//! `<key>` the provider stores a SHA-256 digest under `<key>_hash`. A later
//! configuration whose secret hashes to the stored digest is treated as
//! unchanged.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType};

/// Splits an import identifier of the form `projectID/resourceID`.
///
/// Exactly one split is made; both halves must be non-empty.
pub fn parse_import_id(id: &str) -> Result<(&str, &str), ProviderError> {
    match id.split_once('/') {
        Some((project, resource)) if !project.is_empty() && !resource.is_empty() => {
            Ok((project, resource))
        }
        _ => Err(ProviderError::ImportFormat { id: id.to_string() }),
    }
}

/// Hex-encoded SHA-256 digest of a secret.
#[must_use]
pub fn secret_hash(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Name of the memo attribute stored beside `secret_key`.
#[must_use]
pub fn secret_hash_key(secret_key: &str) -> String {
    format!("{secret_key}_hash")
}

/// Schema of the memo attribute for `secret_key`.
#[must_use]
pub fn secret_memo_schema(secret_key: &str) -> (String, Attribute) {
    (
        secret_hash_key(secret_key),
        Attribute::computed(AttributeType::String)
            .sensitive()
            .describe("A hash of the secret value, used to detect changes"),
    )
}

/// Suppresses the diff of a secret whose new value matches the stored hash.
pub fn suppress_secret_changed(
    key: &str,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
) -> bool {
    let Some(memo) = old.get(&secret_hash_key(key)).and_then(Value::as_str) else {
        return false;
    };
    new.get(key)
        .and_then(Value::as_str)
        .is_some_and(|secret| secret_hash(secret) == memo)
}

/// Refreshes the memo of `secret_key` inside a nested block.
///
/// Returns the memo key and the digest written.
pub fn flatten_secret_nested(
    params: &mut Map<String, Value>,
    secret_key: &str) -> (String, String,
) {
    let secret = params
        .get(secret_key)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let hash = secret_hash(secret);
    let key = secret_hash_key(secret_key);
    params.insert(key.clone(), Value::String(hash.clone()));
    (key, hash)
}
