//! Resource registry.

use std::collections::BTreeMap;

use crate::branchpolicy::{build_validation, comment_resolution, min_reviewers};
use crate::error::ProviderError;
use crate::resource::Resource;
use crate::serviceendpoint::github;

/// Every resource type the provider serves, keyed by type name.
#[derive(Debug, Clone)]
pub struct Provider {
    resources: BTreeMap<&'static str, Resource>,
}

impl Provider {
    /// Builds the registry, generating each resource type once.
    pub fn new() -> Self {
        let resources = [
            min_reviewers::resource_branch_policy_min_reviewers(),
            build_validation::resource_branch_policy_build_validation(),
            comment_resolution::resource_branch_policy_comment_resolution(),
            github::resource_service_endpoint_github(),
        ]
        .into_iter()
        .map(|resource| (resource.name(), resource))
        .collect();
        Self { resources }
    }

    /// Looks up a resource type by name.
    pub fn resource(&self, name: &str) -> Result<&Resource, ProviderError> {
        self.resources
            .get(name)
            .ok_or_else(|| ProviderError::UnknownResource(name.to_string()))
    }

    /// Registered type names in sorted order.
    pub fn resource_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}
