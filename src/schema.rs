//! Declarative resource schemas.
//!
//! A [`Block`] describes the attributes of a resource (or of a nested block):
//! their types, whether they are required, optional or computed, defaults,
//! validators and conflict rules. Besides being printable, a schema can fill
//! in defaults, validate configured values and compute which attributes
//! changed between two states.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::validate::Validator;

/// Decides whether a change of the attribute named `key` between the
/// enclosing blocks `old` and `new` should be ignored.
pub type DiffSuppressFn = fn(key: &str, old: &Map<String, Value>, new: &Map<String, Value>) -> bool;

/// Value type of an attribute.
#[derive(Clone, Serialize)]
pub enum AttributeType {
    String,
    Bool,
    Int,
    /// String-to-string map.
    Map,
    StringList,
    /// List of nested blocks.
    BlockList(Block),
}

impl AttributeType {
    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Map => "map",
            Self::StringList => "list of strings",
            Self::BlockList(_) => "list of blocks",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64(),
            Self::Map => value
                .as_object()
                .is_some_and(|m| m.values().all(Value::is_string)),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::BlockList(_) => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }
}

/// Default applied when an attribute is not configured.
#[derive(Debug, Clone, Serialize)]
pub enum DefaultValue {
    Static(Value),
    /// Read from an environment variable, falling back to a static value.
    Env {
        var: &'static str,
        fallback: Option<Value>,
    },
}

impl DefaultValue {
    fn resolve(&self) -> Option<Value> {
        match self {
            Self::Static(value) => Some(value.clone()),
            Self::Env { var, fallback } => std::env::var(var)
                .ok()
                .map(Value::String)
                .or_else(|| fallback.clone()),
        }
    }
}

/// Description of one attribute.
#[derive(Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<&'static str>,
    #[serde(skip)]
    pub validators: Vec<Validator>,
    #[serde(skip)]
    pub diff_suppress: Option<DiffSuppressFn>,
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            description: None,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            min_items: None,
            max_items: None,
            conflicts_with: Vec::new(),
            validators: Vec::new(),
            diff_suppress: None,
        }
    }

    /// An attribute that must be configured.
    #[must_use]
    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    /// An attribute that may be configured.
    #[must_use]
    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    /// An attribute set only by the provider.
    #[must_use]
    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Defaults to the value of environment variable `var` when set.
    #[must_use]
    pub fn env_default(mut self, var: &'static str) -> Self {
        self.default = Some(DefaultValue::Env {
            var,
            fallback: None,
        });
        self
    }

    /// Changing the attribute requires replacing the resource.
    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn items(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    #[must_use]
    pub fn conflicts_with(mut self, others: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(others);
        self
    }

    #[must_use]
    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn suppress_diff(mut self, f: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(f);
        self
    }

    fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A validation finding tied to an attribute path such as `settings.0.scope.1.match_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.to_string(),
            message: message.into(),
        }
    }

    fn warning(path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// One attribute that differs between prior state and proposed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    /// The attribute is force-new, so the change replaces the resource.
    pub requires_replace: bool,
}

/// A set of named attributes: a resource schema or a nested block.
#[derive(Clone, Default, Serialize)]
pub struct Block {
    pub attributes: BTreeMap<String, Attribute>,
}

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// The nested block schema of a block-list attribute.
    pub fn nested(&self, name: &str) -> Option<&Block> {
        match self.attributes.get(name).map(|a| &a.kind) {
            Some(AttributeType::BlockList(block)) => Some(block),
            _ => None,
        }
    }

    /// Fills unset attributes with their defaults, recursing into nested blocks.
    pub fn apply_defaults(&self, values: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            let unset = values.get(name).is_none_or(Value::is_null);
            if unset
                && let Some(value) = attribute.default.as_ref().and_then(DefaultValue::resolve)
            {
                values.insert(name.clone(), value);
            }

            if let AttributeType::BlockList(nested) = &attribute.kind
                && let Some(items) = values.get_mut(name).and_then(Value::as_array_mut)
            {
                for item in items.iter_mut().filter_map(Value::as_object_mut) {
                    nested.apply_defaults(item);
                }
            }
        }
    }

    /// Validates configured values against the schema.
    ///
    /// Returns every finding; callers treat any [`Severity::Error`] as fatal.
    pub fn validate(&self, values: &Map<String, Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.validate_at("", values, &mut diagnostics);
        diagnostics
    }

    fn validate_at(&self, prefix: &str, values: &Map<String, Value>, out: &mut Vec<Diagnostic>) {
        for name in values.keys() {
            if !self.attributes.contains_key(name) {
                out.push(Diagnostic::error(
                    &join_path(prefix, name),
                    "An argument with this name is not expected here",
                ));
            }
        }

        for (name, attribute) in &self.attributes {
            let path = join_path(prefix, name);
            let value = values.get(name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if attribute.required {
                    out.push(Diagnostic::error(&path, "The argument is required, but was not set"));
                }
                continue;
            };

            if !attribute.kind.accepts(value) {
                out.push(Diagnostic::error(
                    &path,
                    format!("Inappropriate value: {} required", attribute.kind.name()),
                ));
                continue;
            }

            if let Some(items) = value.as_array() {
                if let Some(min) = attribute.min_items
                    && items.len() < min
                {
                    out.push(Diagnostic::error(
                        &path,
                        format!(
                            "Attribute requires {min} item minimum, but config has only {}",
                            items.len()
                        ),
                    ));
                }
                if let Some(max) = attribute.max_items
                    && items.len() > max
                {
                    out.push(Diagnostic::error(
                        &path,
                        format!(
                            "No more than {max} item is allowed, but config has {}",
                            items.len()
                        ),
                    ));
                }
            }

            for other in &attribute.conflicts_with {
                if is_configured(values.get(*other)) && is_configured(Some(value)) {
                    out.push(Diagnostic::error(
                        &path,
                        format!("\"{name}\": conflicts with {other}"),
                    ));
                }
            }

            for validator in &attribute.validators {
                let outcome = validator(value, name);
                out.extend(outcome.warnings.iter().map(|w| Diagnostic::warning(&path, w.as_str())));
                out.extend(outcome.errors.iter().map(|e| Diagnostic::error(&path, e.as_str())));
            }

            if let AttributeType::BlockList(nested) = &attribute.kind
                && let Some(items) = value.as_array()
            {
                for (index, item) in items.iter().enumerate() {
                    if let Some(map) = item.as_object() {
                        nested.validate_at(&join_path(&path, &index.to_string()), map, out);
                    }
                }
            }
        }
    }

    /// Lists top-level attributes that differ between `prior` and `proposed`.
    ///
    /// Computed-only attributes are ignored, as are nested changes suppressed
    /// by a [`DiffSuppressFn`].
    pub fn diff(
        &self,
        prior: &Map<String, Value>,
        proposed: &Map<String, Value>,
    ) -> Vec<AttributeChange> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| !attribute.is_computed_only())
            .filter(|(name, attribute)| {
                attribute_differs(
                    name,
                    attribute,
                    prior,
                    proposed,
                )
            })
            .map(|(name, attribute)| AttributeChange {
                name: name.clone(),
                requires_replace: attribute.force_new,
            })
            .collect()
    }

    fn block_differs(&self, old: &Map<String, Value>, new: &Map<String, Value>) -> bool {
        self.attributes
            .iter()
            .filter(|(_, attribute)| !attribute.is_computed_only())
            .any(|(name, attribute)| attribute_differs(name, attribute, old, new))
    }
}

fn attribute_differs(
    name: &str,
    attribute: &Attribute,
    old_block: &Map<String, Value>,
    new_block: &Map<String, Value>,
) -> bool {
    let old = old_block.get(name).unwrap_or(&Value::Null);
    let new = new_block.get(name).unwrap_or(&Value::Null);
    if old == new {
        return false;
    }
    if let Some(suppress) = attribute.diff_suppress
        && suppress(name, old_block, new_block)
    {
        return false;
    }
    match (&attribute.kind, old.as_array(), new.as_array()) {
        (AttributeType::BlockList(nested), Some(old_items), Some(new_items))
            if old_items.len() == new_items.len() =>
        {
            old_items.iter().zip(new_items).any(|(o, n)| match (o.as_object(), n.as_object()) {
                (Some(o), Some(n)) => nested.block_differs(o, n),
                _ => o != n,
            })
        }
        _ => true,
    }
}

fn is_configured(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test values must be objects"),
        }
    }

    fn sample_schema() -> Block {
        let scope = Block::new()
            .with("repository_ref", Attribute::optional(AttributeType::String))
            .with(
                "match_type",
                Attribute::optional(AttributeType::String)
                    .with_default("Exact")
                    .validate_with(validate::string_in_slice(&["Exact", "Prefix"], true)),
            );
        Block::new()
            .with("project_id", Attribute::required(AttributeType::String).force_new())
            .with("enabled", Attribute::optional(AttributeType::Bool).with_default(true))
            .with("revision", Attribute::computed(AttributeType::Int))
            .with(
                "scope",
                Attribute::required(AttributeType::BlockList(scope)).items(Some(1), Some(2)),
            )
            .with("auth_a", Attribute::optional(AttributeType::Map).conflicts_with(&["auth_b"]))
            .with("auth_b", Attribute::optional(AttributeType::Map).conflicts_with(&["auth_a"]))
    }

    /// # Default Application
    ///
    /// Tests that defaults fill top-level and nested unset attributes.
    ///
    /// ## Test Scenario
    /// - Applies defaults to a config without enabled and without match_type
    ///
    /// ## Expected Outcome
    /// - enabled becomes true and every scope entry gets match_type Exact
    #[test]
    fn test_apply_defaults() {
        let schema = sample_schema();
        let mut values = object(json!({
            "project_id": "p",
            "scope": [{"repository_ref": "refs/heads/main"}, {"match_type": "Prefix"}]
        }));
        schema.apply_defaults(&mut values);
        assert_eq!(values["enabled"], json!(true));
        assert_eq!(values["scope"][0]["match_type"], json!("Exact"));
        assert_eq!(values["scope"][1]["match_type"], json!("Prefix"));
        assert!(!values.contains_key("revision"));
    }

    /// # Validation Findings
    ///
    /// Tests required, type, item count, conflict and validator checks.
    ///
    /// ## Test Scenario
    /// - Validates a config with several problems at once
    ///
    /// ## Expected Outcome
    /// - Each problem is reported with its attribute path
    #[test]
    fn test_validate_reports_paths() {
        let schema = sample_schema();
        let values = object(json!({
            "enabled": "yes",
            "scope": [{"match_type": "Suffix"}, {}, {}],
            "auth_a": {"k": "v"},
            "auth_b": {"k": "v"},
            "bogus": 1
        }));
        let paths: Vec<String> = schema
            .validate(&values)
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.path)
            .collect();

        assert!(paths.contains(&"project_id".to_string()));
        assert!(paths.contains(&"enabled".to_string()));
        assert!(paths.contains(&"scope".to_string()));
        assert!(paths.contains(&"scope.0.match_type".to_string()));
        assert!(paths.contains(&"auth_a".to_string()));
        assert!(paths.contains(&"auth_b".to_string()));
        assert!(paths.contains(&"bogus".to_string()));
    }

    /// # Valid Configuration
    ///
    /// Tests that a well-formed configuration produces no findings.
    ///
    /// ## Test Scenario
    /// - Validates a complete config after applying defaults
    ///
    /// ## Expected Outcome
    /// - No diagnostics
    #[test]
    fn test_validate_accepts_valid_config() {
        let schema = sample_schema();
        let mut values = object(json!({
            "project_id": "p",
            "scope": [{"repository_ref": "refs/heads/main"}]
        }));
        schema.apply_defaults(&mut values);
        assert!(schema.validate(&values).is_empty());
    }

    /// # Diff Classification
    ///
    /// Tests update versus replace detection and computed attribute handling.
    ///
    /// ## Test Scenario
    /// - Diffs states differing in a plain attribute, a force-new attribute
    ///   and a computed attribute
    ///
    /// ## Expected Outcome
    /// - The computed attribute is ignored, project_id requires replacement
    #[test]
    fn test_diff() {
        let schema = sample_schema();
        let prior = object(json!({
            "project_id": "p1",
            "enabled": true,
            "revision": 4,
            "scope": [{"repository_ref": "refs/heads/main", "match_type": "Exact"}]
        }));
        let proposed = object(json!({
            "project_id": "p2",
            "enabled": false,
            "scope": [{"repository_ref": "refs/heads/main", "match_type": "Exact"}]
        }));
        let changes = schema.diff(&prior, &proposed);
        assert_eq!(
            changes,
            vec![
                AttributeChange {
                    name: "enabled".into(),
                    requires_replace: false
                },
                AttributeChange {
                    name: "project_id".into(),
                    requires_replace: true
                },
            ]
        );
    }
}
