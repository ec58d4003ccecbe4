//! Example HCL for the provider's resources.
//!
//! Each rendering is self-contained: resources that depend on a project or
//! a repository include those definitions too.

use crate::branchpolicy::{build_validation, comment_resolution, min_reviewers};
use crate::serviceendpoint::github;

/// An `azuredevops_project`; empty when `project_name` is empty.
pub fn project_resource(project_name: &str) -> String {
    if project_name.is_empty() {
        return String::new();
    }
    format!(
        r#"
resource "azuredevops_project" "project" {{
	project_name       = "{project_name}"
	description        = "{project_name}-description"
	visibility         = "private"
	version_control    = "Git"
	work_item_template = "Agile"
}}"#
    )
}

/// A git repository inside a new project.
pub fn git_repo_resource(project_name: &str, repo_name: &str, init_type: &str) -> String {
    let repo = format!(
        r#"
resource "azuredevops_git_repository" "gitrepo" {{
	project_id      = azuredevops_project.project.id
	name            = "{repo_name}"
	initialization {{
		init_type = "{init_type}"
	}}
}}"#
    );
    format!("{}\n{repo}", project_resource(project_name))
}

/// A GitHub service endpoint whose token comes from the environment.
pub fn service_endpoint_github_resource(project_name: &str, endpoint_name: &str) -> String {
    let endpoint = format!(
        r#"
resource "{}" "serviceendpoint" {{
	project_id             = azuredevops_project.project.id
	service_endpoint_name  = "{endpoint_name}"
	auth_personal {{
	}}
}}"#,
        github::RESOURCE_NAME
    );
    format!("{}\n{endpoint}", project_resource(project_name))
}

fn branch_policy_resource(resource_type: &str, label: &str, extra_settings: &str) -> String {
    format!(
        r#"
resource "{resource_type}" "{label}" {{
	project_id = azuredevops_project.project.id
	enabled    = true
	blocking   = true
	settings {{{extra_settings}
		scope {{
			repository_id  = azuredevops_git_repository.gitrepo.id
			repository_ref = azuredevops_git_repository.gitrepo.default_branch
			match_type     = "Exact"
		}}
	}}
}}"#
    )
}

/// A minimum reviewers policy on a new repository.
pub fn branch_policy_min_reviewers_resource(project_name: &str, repo_name: &str) -> String {
    let policy = branch_policy_resource(
        min_reviewers::RESOURCE_NAME,
        "p",
        "
		reviewer_count     = 2
		submitter_can_vote = false",
    );
    format!("{}\n{policy}", git_repo_resource(project_name, repo_name, "Clean"))
}

/// A build validation policy on a new repository.
pub fn branch_policy_build_validation_resource(
    project_name: &str,
    repo_name: &str,
    build_definition_id: i64,
) -> String {
    let extra = format!(
        "
		build_definition_id = {build_definition_id}
		display_name        = \"Managed by Terraform\"
		valid_duration      = 720
		filename_patterns   = [\"/src/*\"]"
    );
    let policy = branch_policy_resource(build_validation::RESOURCE_NAME, "p", &extra);
    format!("{}\n{policy}", git_repo_resource(project_name, repo_name, "Clean"))
}

/// A comment resolution policy on a new repository.
pub fn branch_policy_comment_resolution_resource(project_name: &str, repo_name: &str) -> String {
    let policy = branch_policy_resource(comment_resolution::RESOURCE_NAME, "p", "");
    format!("{}\n{policy}", git_repo_resource(project_name, repo_name, "Clean"))
}

/// Example configuration for a registered resource type.
pub fn example_for(resource_type: &str) -> Option<String> {
    const PROJECT: &str = "example-project";
    const REPO: &str = "example-repo";
    match resource_type {
        min_reviewers::RESOURCE_NAME => Some(branch_policy_min_reviewers_resource(PROJECT, REPO)),
        build_validation::RESOURCE_NAME => {
            Some(branch_policy_build_validation_resource(PROJECT, REPO, 1))
        }
        comment_resolution::RESOURCE_NAME => {
            Some(branch_policy_comment_resolution_resource(PROJECT, REPO))
        }
        github::RESOURCE_NAME => Some(service_endpoint_github_resource(PROJECT, "example-github")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    /// # Project Rendering
    ///
    /// Tests the project snippet and its empty-name behavior.
    ///
    /// ## Test Scenario
    /// - Renders with a name and with an empty name
    ///
    /// ## Expected Outcome
    /// - The name appears in both fields; the empty name renders nothing
    #[test]
    fn test_project_resource() {
        let hcl = project_resource("demo");
        assert!(hcl.contains(r#"project_name       = "demo""#));
        assert!(hcl.contains(r#"description        = "demo-description""#));
        assert!(project_resource("").is_empty());
    }

    /// # Dependent Resources
    ///
    /// Tests that policy examples embed their project and repository.
    ///
    /// ## Test Scenario
    /// - Renders the min reviewers and GitHub endpoint examples
    ///
    /// ## Expected Outcome
    /// - Each output contains every resource it references
    #[test]
    fn test_dependent_resources() {
        let hcl = branch_policy_min_reviewers_resource("demo", "repo");
        assert!(hcl.contains(r#"resource "azuredevops_project" "project""#));
        assert!(hcl.contains(r#"resource "azuredevops_git_repository" "gitrepo""#));
        assert!(hcl.contains(r#"resource "azuredevops_branch_policy_min_reviewers" "p""#));
        assert!(hcl.contains("reviewer_count     = 2"));

        let hcl = service_endpoint_github_resource("demo", "gh");
        assert!(hcl.contains(r#"service_endpoint_name  = "gh""#));
        assert!(hcl.contains("auth_personal {"));
    }

    /// # Example Coverage
    ///
    /// Tests that every registered resource has an example.
    ///
    /// ## Test Scenario
    /// - Looks up an example for each registered name and an unknown one
    ///
    /// ## Expected Outcome
    /// - Registered names render; the unknown name yields None
    #[test]
    fn test_example_for_every_resource() {
        for name in Provider::new().resource_names() {
            let hcl = example_for(name).unwrap();
            assert!(hcl.contains(name));
        }
        assert!(example_for("azuredevops_project").is_none());
    }
}
