//! `azuredevops_branch_policy_build_validation`: require a successful build
//! of a given definition before a pull request can complete.

use serde_json::Value;

use super::{
    PolicyCrudArgs, base_expand_func, base_flatten_func, flattened_settings,
    gen_base_policy_resource, settings_block, settings_i32, settings_mismatch,
};
use crate::error::ProviderError;
use crate::models::{PolicyConfiguration, PolicyKind, PolicySettings};
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Block};
use crate::state::{ResourceData, block_bool, block_i64, block_list, block_str};
use crate::validate;

pub const RESOURCE_NAME: &str = "azuredevops_branch_policy_build_validation";

pub const SCHEMA_BUILD_DEFINITION_ID: &str = "build_definition_id";
pub const SCHEMA_DISPLAY_NAME: &str = "display_name";
pub const SCHEMA_VALID_DURATION: &str = "valid_duration";
pub const SCHEMA_QUEUE_ON_SOURCE_UPDATE_ONLY: &str = "queue_on_source_update_only";
pub const SCHEMA_MANUAL_QUEUE_ONLY: &str = "manual_queue_only";
pub const SCHEMA_FILENAME_PATTERNS: &str = "filename_patterns";

const DEFAULT_DISPLAY_NAME: &str = "Managed by Terraform";
/// Minutes a successful build counts for the policy.
const DEFAULT_VALID_DURATION: i64 = 720;

pub fn resource_branch_policy_build_validation() -> Resource {
    let settings_schema = Block::new()
        .with(
            SCHEMA_BUILD_DEFINITION_ID,
            Attribute::required(AttributeType::Int)
                .validate_with(validate::int_between(1, i32::MAX.into())),
        )
        .with(
            SCHEMA_DISPLAY_NAME,
            Attribute::optional(AttributeType::String).with_default(DEFAULT_DISPLAY_NAME),
        )
        .with(
            SCHEMA_VALID_DURATION,
            Attribute::optional(AttributeType::Int)
                .with_default(DEFAULT_VALID_DURATION)
                .validate_with(validate::int_at_least(0)),
        )
        .with(
            SCHEMA_QUEUE_ON_SOURCE_UPDATE_ONLY,
            Attribute::optional(AttributeType::Bool).with_default(true),
        )
        .with(
            SCHEMA_MANUAL_QUEUE_ONLY,
            Attribute::optional(AttributeType::Bool).with_default(false),
        )
        .with(
            SCHEMA_FILENAME_PATTERNS,
            Attribute::optional(AttributeType::StringList),
        );

    gen_base_policy_resource(
        RESOURCE_NAME,
        PolicyCrudArgs {
            kind: PolicyKind::SuccessfulBuild,
            flatten: flatten_func,
            expand: expand_func,
            settings_schema,
        },
    )
}

fn flatten_func(
    data: &mut ResourceData,
    config: &PolicyConfiguration,
    project_id: &str,
) -> Result<(), ProviderError> {
    let PolicySettings::SuccessfulBuild(policy_settings) = &config.settings else {
        return Err(settings_mismatch(PolicyKind::SuccessfulBuild, config));
    };
    if !base_flatten_func(data, config, project_id)? {
        return Ok(());
    }

    let settings = flattened_settings(data)?;
    settings.insert(
        SCHEMA_BUILD_DEFINITION_ID.to_string(),
        Value::from(policy_settings.build_definition_id),
    );
    settings.insert(
        SCHEMA_DISPLAY_NAME.to_string(),
        Value::from(policy_settings.display_name.clone().unwrap_or_default()),
    );
    settings.insert(
        SCHEMA_VALID_DURATION.to_string(),
        Value::from(policy_settings.valid_duration.round() as i64),
    );
    settings.insert(
        SCHEMA_QUEUE_ON_SOURCE_UPDATE_ONLY.to_string(),
        Value::from(policy_settings.queue_on_source_update_only),
    );
    settings.insert(
        SCHEMA_MANUAL_QUEUE_ONLY.to_string(),
        Value::from(policy_settings.manual_queue_only),
    );
    if !policy_settings.filename_patterns.is_empty() {
        settings.insert(
            SCHEMA_FILENAME_PATTERNS.to_string(),
            Value::from(policy_settings.filename_patterns.clone()),
        );
    }
    Ok(())
}

fn expand_func(
    data: &ResourceData,
    kind: PolicyKind,
) -> Result<(PolicyConfiguration, String), ProviderError> {
    let (mut config, project_id) = base_expand_func(data, kind)?;
    let settings = settings_block(data)?;

    if let PolicySettings::SuccessfulBuild(policy_settings) = &mut config.settings {
        policy_settings.build_definition_id =
            settings_i32(settings, SCHEMA_BUILD_DEFINITION_ID)?;
        let display_name = block_str(settings, SCHEMA_DISPLAY_NAME);
        policy_settings.display_name =
            (!display_name.is_empty()).then(|| display_name.to_string());
        policy_settings.valid_duration =
            block_i64(settings, SCHEMA_VALID_DURATION).unwrap_or(DEFAULT_VALID_DURATION) as f64;
        policy_settings.queue_on_source_update_only =
            block_bool(settings, SCHEMA_QUEUE_ON_SOURCE_UPDATE_ONLY, true);
        policy_settings.manual_queue_only = block_bool(settings, SCHEMA_MANUAL_QUEUE_ONLY, false);
        policy_settings.filename_patterns = block_list(settings, SCHEMA_FILENAME_PATTERNS)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    Ok((config, project_id))
}
