//! `azuredevops_branch_policy_min_reviewers`: require a minimum number of
//! approving reviewers on pull requests.

use serde_json::Value;

use super::{
    PolicyCrudArgs, base_expand_func, base_flatten_func, flattened_settings,
    gen_base_policy_resource, settings_block, settings_i32, settings_mismatch,
};
use crate::error::ProviderError;
use crate::models::{PolicyConfiguration, PolicyKind, PolicySettings};
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Block};
use crate::state::{ResourceData, block_bool};
use crate::validate;

pub const RESOURCE_NAME: &str = "azuredevops_branch_policy_min_reviewers";

pub const SCHEMA_REVIEWER_COUNT: &str = "reviewer_count";
pub const SCHEMA_SUBMITTER_CAN_VOTE: &str = "submitter_can_vote";

pub fn resource_branch_policy_min_reviewers() -> Resource {
    let settings_schema = Block::new()
        .with(
            SCHEMA_REVIEWER_COUNT,
            Attribute::required(AttributeType::Int)
                .validate_with(validate::int_between(1, i32::MAX.into())),
        )
        .with(
            SCHEMA_SUBMITTER_CAN_VOTE,
            Attribute::optional(AttributeType::Bool).with_default(false),
        );

    gen_base_policy_resource(
        RESOURCE_NAME,
        PolicyCrudArgs {
            kind: PolicyKind::MinReviewerCount,
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
    let PolicySettings::MinReviewerCount(policy_settings) = &config.settings else {
        return Err(settings_mismatch(PolicyKind::MinReviewerCount, config));
    };
    if !base_flatten_func(data, config, project_id)? {
        return Ok(());
    }

    let settings = flattened_settings(data)?;
    settings.insert(
        SCHEMA_REVIEWER_COUNT.to_string(),
        Value::from(policy_settings.minimum_approver_count),
    );
    settings.insert(
        SCHEMA_SUBMITTER_CAN_VOTE.to_string(),
        Value::from(policy_settings.creator_vote_counts),
    );
    Ok(())
}

fn expand_func(
    data: &ResourceData,
    kind: PolicyKind,
) -> Result<(PolicyConfiguration, String), ProviderError> {
    let (mut config, project_id) = base_expand_func(data, kind)?;
    let settings = settings_block(data)?;

    if let PolicySettings::MinReviewerCount(policy_settings) = &mut config.settings {
        policy_settings.minimum_approver_count = settings_i32(settings, SCHEMA_REVIEWER_COUNT)?;
        policy_settings.creator_vote_counts =
            block_bool(settings, SCHEMA_SUBMITTER_CAN_VOTE, false);
    }
    Ok((config, project_id))
}
