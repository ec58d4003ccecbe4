//! Local resource state.
//!
//! [`ResourceData`] is the local attribute representation a lifecycle
//! function reads from and writes into: an identifier string plus a map of
//! attribute values. Nested blocks are lists of objects, so a single-element
//! block such as `settings` lives at `settings[0]`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier plus attribute values of one resource instance.
///
/// An empty identifier means the instance does not exist remotely (either it
/// was never created or a read found it gone).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl ResourceData {
    /// Empty data with no identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Data built from configured attribute values.
    #[must_use]
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    /// Returns the identifier, empty when absent.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sets the identifier. An empty string marks the resource as gone.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Whether the resource has an identifier.
    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.attributes
    }

    /// Raw value of an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute, or `""` when unset.
    pub fn get_str(&self, key: &str) -> &str {
        block_str(&self.attributes, key)
    }

    /// Boolean attribute, or `default` when unset.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        block_bool(&self.attributes, key, default)
    }

    /// List attribute, or an empty slice when unset.
    pub fn get_list(&self, key: &str) -> &[Value] {
        block_list(&self.attributes, key)
    }

    /// The single element of a one-element block, if present.
    pub fn first_block(&self, key: &str) -> Option<&Map<String, Value>> {
        first_block(&self.attributes, key)
    }

    /// Mutable access to the single element of a one-element block.
    pub fn first_block_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>> {
        self.attributes
            .get_mut(key)
            .and_then(Value::as_array_mut)
            .and_then(|items| items.first_mut())
            .and_then(Value::as_object_mut)
    }

    /// Sets an attribute value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Removes an attribute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

const NO_VALUES: &[Value] = &[];

/// String value of `key` inside a block, `""` when unset.
pub fn block_str<'a>(block: &'a Map<String, Value>, key: &str) -> &'a str {
    block.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Boolean value of `key` inside a block, `default` when unset.
pub fn block_bool(block: &Map<String, Value>, key: &str, default: bool) -> bool {
    block.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Integer value of `key` inside a block.
pub fn block_i64(block: &Map<String, Value>, key: &str) -> Option<i64> {
    block.get(key).and_then(Value::as_i64)
}

/// List value of `key` inside a block, empty when unset.
pub fn block_list<'a>(block: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    block
        .get(key)
        .and_then(Value::as_array)
        .map_or(NO_VALUES, Vec::as_slice)
}

/// First element of a nested block list.
pub fn first_block<'a>(block: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    block_list(block, key).first().and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ResourceData {
        match value {
            Value::Object(map) => ResourceData::from_attributes(map),
            _ => unreachable!("test data must be an object"),
        }
    }

    /// # Zero Values for Unset Attributes
    ///
    /// Tests the accessors on missing and null attributes.
    ///
    /// ## Test Scenario
    /// - Reads unset string, bool and list attributes
    /// - Reads an attribute explicitly set to null
    ///
    /// ## Expected Outcome
    /// - Strings are empty, bools take the default, lists are empty
    #[test]
    fn test_unset_attribute_accessors() {
        let d = data(json!({"description": null}));
        assert_eq!(d.get_str("project_id"), "");
        assert!(d.get_bool("enabled", true));
        assert!(d.get_list("settings").is_empty());
        assert!(d.get("description").is_none());
        assert!(!d.exists());
    }

    /// # Nested Block Access
    ///
    /// Tests reading and writing inside a one-element block.
    ///
    /// ## Test Scenario
    /// - Reads the first settings element and mutates it
    ///
    /// ## Expected Outcome
    /// - The change is visible through the immutable accessor
    #[test]
    fn test_first_block_access() {
        let mut d = data(json!({"settings": [{"reviewer_count": 1}]}));
        d.first_block_mut("settings")
            .unwrap()
            .insert("reviewer_count".into(), json!(3));
        let settings = d.first_block("settings").unwrap();
        assert_eq!(block_i64(settings, "reviewer_count"), Some(3));
        assert!(d.first_block("auth_oauth").is_none());
    }

    /// # State File Shape
    ///
    /// Tests the JSON representation used for state files.
    ///
    /// ## Test Scenario
    /// - Deserializes a state document with id and attributes
    ///
    /// ## Expected Outcome
    /// - Identifier and attributes are restored
    #[test]
    fn test_state_serialization() {
        let d: ResourceData =
            serde_json::from_value(json!({"id": "42", "attributes": {"project_id": "p"}}))
                .unwrap();
        assert_eq!(d.id(), "42");
        assert_eq!(d.get_str("project_id"), "p");
    }
}
