//! `azuredevops_branch_policy_comment_resolution`: require every pull request
//! comment to be resolved. The policy has no settings beyond its scope.

use super::{
    PolicyCrudArgs, base_expand_func, base_flatten_func, gen_base_policy_resource,
    settings_mismatch,
};
use crate::error::ProviderError;
use crate::models::{PolicyConfiguration, PolicyKind};
use crate::resource::Resource;
use crate::schema::Block;
use crate::state::ResourceData;

pub const RESOURCE_NAME: &str = "azuredevops_branch_policy_comment_resolution";

pub fn resource_branch_policy_comment_resolution() -> Resource {
    gen_base_policy_resource(
        RESOURCE_NAME,
        PolicyCrudArgs {
            kind: PolicyKind::NoActiveComments,
            flatten: flatten_func,
            expand: base_expand_func,
            settings_schema: Block::new(),
        },
    )
}

fn flatten_func(
    data: &mut ResourceData,
    config: &PolicyConfiguration,
    project_id: &str,
) -> Result<(), ProviderError> {
    if config.kind() != PolicyKind::NoActiveComments {
        return Err(settings_mismatch(PolicyKind::NoActiveComments, config));
    }
    base_flatten_func(data, config, project_id).map(|_| ())
}
