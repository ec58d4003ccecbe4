//! Branch policy resources.
//!
//! Every branch policy resource shares the same base schema (project, enabled,
//! blocking and a `settings` block holding the policy scope) and the same
//! lifecycle. A resource type only contributes its policy kind, its extra
//! settings attributes and a flatten/expand pair for them, see
//! [`gen_base_policy_resource`].

pub mod build_validation;
pub mod comment_resolution;
pub mod min_reviewers;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AggregatedClient;
use crate::error::ProviderError;
use crate::models::{MatchType, PolicyConfiguration, PolicyKind, PolicyScope, PolicySettings};
use crate::resource::{Resource, ResourceLifecycle};
use crate::schema::{Attribute, AttributeType, Block};
use crate::state::{ResourceData, block_i64, block_list, block_str};
use crate::tfhelper;
use crate::validate;

pub const SCHEMA_PROJECT_ID: &str = "project_id";
pub const SCHEMA_ENABLED: &str = "enabled";
pub const SCHEMA_BLOCKING: &str = "blocking";
pub const SCHEMA_SETTINGS: &str = "settings";
pub const SCHEMA_SCOPE: &str = "scope";
pub const SCHEMA_REPOSITORY_ID: &str = "repository_id";
pub const SCHEMA_REPOSITORY_REF: &str = "repository_ref";
pub const SCHEMA_MATCH_TYPE: &str = "match_type";

/// Writes a remote configuration into local state.
pub type FlattenFn =
    fn(&mut ResourceData, &PolicyConfiguration, &str) -> Result<(), ProviderError>;

/// Builds a remote configuration and its project ID from local state.
pub type ExpandFn =
    fn(&ResourceData, PolicyKind) -> Result<(PolicyConfiguration, String), ProviderError>;

/// Everything a branch policy resource type contributes to the generator.
pub struct PolicyCrudArgs {
    pub kind: PolicyKind,
    pub flatten: FlattenFn,
    pub expand: ExpandFn,
    /// Attributes added to the `settings` block next to `scope`.
    pub settings_schema: Block,
}

/// Generates a branch policy resource from its type-specific parts.
pub fn gen_base_policy_resource(name: &'static str, args: PolicyCrudArgs) -> Resource {
    let schema = gen_base_schema(args.settings_schema);
    let lifecycle = PolicyLifecycle {
        name,
        kind: args.kind,
        flatten: args.flatten,
        expand: args.expand,
    };
    Resource::new(name, schema, Arc::new(lifecycle))
}

fn gen_base_schema(extra_settings: Block) -> Block {
    let scope = Block::new()
        .with(SCHEMA_REPOSITORY_ID, Attribute::optional(AttributeType::String))
        .with(SCHEMA_REPOSITORY_REF, Attribute::optional(AttributeType::String))
        .with(
            SCHEMA_MATCH_TYPE,
            Attribute::optional(AttributeType::String)
                .with_default(MatchType::Exact.as_str())
                .validate_with(validate::string_in_slice(&MatchType::VALUES, true)),
        );

    let mut settings = Block::new().with(
        SCHEMA_SCOPE,
        Attribute::required(AttributeType::BlockList(scope)).items(Some(1), None),
    );
    for (name, attribute) in extra_settings.attributes {
        settings.insert(name, attribute);
    }

    Block::new()
        .with(
            SCHEMA_PROJECT_ID,
            Attribute::required(AttributeType::String)
                .force_new()
                .validate_with(validate::no_empty_strings()),
        )
        .with(SCHEMA_ENABLED, Attribute::optional(AttributeType::Bool).with_default(true))
        .with(SCHEMA_BLOCKING, Attribute::optional(AttributeType::Bool).with_default(true))
        .with(
            SCHEMA_SETTINGS,
            Attribute::required(AttributeType::BlockList(settings)).items(Some(1), Some(1)),
        )
}

/// Parses a stored policy configuration identifier.
pub fn parse_policy_id(value: &str) -> Result<i32, ProviderError> {
    value.parse().map_err(|_| ProviderError::InvalidId {
        kind: "Policy configuration",
        value: value.to_string(),
        expected: "Int",
    })
}

/// Expands the base attributes shared by every policy type.
///
/// The returned configuration carries default settings of `kind` restricted
/// to the configured scope; type-specific expanders fill in the rest.
pub fn base_expand_func(
    data: &ResourceData,
    kind: PolicyKind,
) -> Result<(PolicyConfiguration, String), ProviderError> {
    let project_id = data.get_str(SCHEMA_PROJECT_ID).to_string();
    let settings = settings_block(data)?;

    let scope = block_list(settings, SCHEMA_SCOPE)
        .iter()
        .filter_map(Value::as_object)
        .map(expand_scope)
        .collect();

    let mut config = PolicyConfiguration::new(PolicySettings::with_scope(kind, scope));
    config.is_enabled = Some(data.get_bool(SCHEMA_ENABLED, true));
    config.is_blocking = Some(data.get_bool(SCHEMA_BLOCKING, true));
    if data.exists() {
        config.id = Some(parse_policy_id(data.id())?);
    }

    Ok((config, project_id))
}

/// The single `settings` block of a policy resource.
pub fn settings_block(data: &ResourceData) -> Result<&Map<String, Value>, ProviderError> {
    data.first_block(SCHEMA_SETTINGS)
        .ok_or_else(|| ProviderError::MissingAttribute(SCHEMA_SETTINGS.to_string()))
}

/// Reads a required integer stored by the API as a 32-bit field.
pub fn settings_i32(settings: &Map<String, Value>, key: &str) -> Result<i32, ProviderError> {
    let value =
        block_i64(settings, key).ok_or_else(|| ProviderError::MissingAttribute(key.to_string()))?;
    i32::try_from(value).map_err(|_| ProviderError::IntegerOutOfRange {
        attribute: key.to_string(),
        value,
    })
}

fn expand_scope(scope: &Map<String, Value>) -> PolicyScope {
    PolicyScope {
        repository_id: non_empty(block_str(scope, SCHEMA_REPOSITORY_ID)),
        ref_name: non_empty(block_str(scope, SCHEMA_REPOSITORY_REF)),
        match_kind: MatchType::parse(block_str(scope, SCHEMA_MATCH_TYPE)).unwrap_or_default(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Flattens the base attributes shared by every policy type.
///
/// Returns `false` when the remote configuration has no ID; the local
/// identifier is then cleared and nothing else is written.
pub fn base_flatten_func(
    data: &mut ResourceData,
    config: &PolicyConfiguration,
    project_id: &str,
) -> Result<bool, ProviderError> {
    let Some(id) = config.id else {
        data.set_id("");
        return Ok(false);
    };

    data.set_id(id.to_string());
    data.set(SCHEMA_PROJECT_ID, project_id);
    data.set(SCHEMA_ENABLED, config.is_enabled.unwrap_or(true));
    data.set(SCHEMA_BLOCKING, config.is_blocking.unwrap_or(true));

    let scope: Vec<Value> = config.settings.scope().iter().map(flatten_scope).collect();
    data.set(SCHEMA_SETTINGS, json!([{ SCHEMA_SCOPE: scope }]));
    Ok(true)
}

fn flatten_scope(scope: &PolicyScope) -> Value {
    json!({
        SCHEMA_REPOSITORY_ID: scope.repository_id.as_deref().unwrap_or_default(),
        SCHEMA_REPOSITORY_REF: scope.ref_name.as_deref().unwrap_or_default(),
        SCHEMA_MATCH_TYPE: scope.match_kind.as_str(),
    })
}

/// Mutable access to the flattened `settings` block.
pub fn flattened_settings(
    data: &mut ResourceData,
) -> Result<&mut Map<String, Value>, ProviderError> {
    data.first_block_mut(SCHEMA_SETTINGS)
        .ok_or_else(|| ProviderError::MissingAttribute(SCHEMA_SETTINGS.to_string()))
}

/// Error for remote settings that belong to another policy kind.
pub fn settings_mismatch(expected: PolicyKind, config: &PolicyConfiguration) -> ProviderError {
    ProviderError::SettingsKindMismatch {
        expected: expected.name(),
        actual: config.kind().name(),
    }
}

/// Lifecycle shared by every branch policy resource.
struct PolicyLifecycle {
    name: &'static str,
    kind: PolicyKind,
    flatten: FlattenFn,
    expand: ExpandFn,
}

impl PolicyLifecycle {
    fn expand_existing(
        &self,
        data: &ResourceData,
    ) -> Result<(PolicyConfiguration, String, i32), ProviderError> {
        let (config, project_id) = (self.expand)(data, self.kind)?;
        let id = config
            .id
            .ok_or_else(|| ProviderError::MissingAttribute("id".to_string()))?;
        Ok((config, project_id, id))
    }
}

#[async_trait]
impl ResourceLifecycle for PolicyLifecycle {
    async fn create(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let (config, project_id) = (self.expand)(data, self.kind)?;
        debug!(resource = self.name, project = %project_id, "Creating policy configuration");

        let created = clients
            .policy()
            .create_policy_configuration(clients.organization(), &project_id, &config)
            .await
            .map_err(|e| ProviderError::api("Error creating policy in Azure DevOps", e))?;

        info!(
            resource = self.name,
            project = %project_id,
            id = ?created.id,
            "Created policy configuration"
        );
        (self.flatten)(data, &created, &project_id)
    }

    async fn read(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let project_id = data.get_str(SCHEMA_PROJECT_ID).to_string();
        let policy_id = parse_policy_id(data.id())?;

        let result = clients
            .policy()
            .get_policy_configuration(clients.organization(), &project_id, policy_id)
            .await;

        match result {
            Ok(config) => (self.flatten)(data, &config, &project_id),
            Err(e) if e.is_not_found() => {
                info!(
                    resource = self.name,
                    project = %project_id,
                    id = policy_id,
                    "Policy configuration no longer exists"
                );
                data.set_id("");
                Ok(())
            }
            Err(e) => Err(ProviderError::api(
                format!(
                    "Error looking up build policy configuration with ID ({policy_id}) \
                     and project ID ({project_id})"
                ),
                e,
            )),
        }
    }

    async fn update(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let (config, project_id, policy_id) = self.expand_existing(data)?;
        debug!(
            resource = self.name,
            project = %project_id,
            id = policy_id,
            "Updating policy configuration"
        );

        let updated = clients
            .policy()
            .update_policy_configuration(clients.organization(), &project_id, policy_id, &config)
            .await
            .map_err(|e| ProviderError::api("Error updating policy in Azure DevOps", e))?;

        (self.flatten)(data, &updated, &project_id)
    }

    async fn delete(
        &self,
        data: &ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let (_, project_id, policy_id) = self.expand_existing(data)?;
        debug!(
            resource = self.name,
            project = %project_id,
            id = policy_id,
            "Deleting policy configuration"
        );

        clients
            .policy()
            .delete_policy_configuration(clients.organization(), &project_id, policy_id)
            .await
            .map_err(|e| ProviderError::api("Error deleting policy in Azure DevOps", e))
    }

    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.id().to_string();
        let (project_id, policy_id) = tfhelper::parse_import_id(&id)?;
        parse_policy_id(policy_id)?;

        data.set(SCHEMA_PROJECT_ID, project_id);
        data.set_id(policy_id);
        Ok(())
    }
}
