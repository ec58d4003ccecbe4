//! # azdo-provider
//!
//! Azure DevOps branch policies and service endpoints as declarative
//! resources. This library provides:
//!
//! - An aggregated Azure DevOps API client behind mockable traits
//! - Resource schemas with defaults, validation and plan diffing
//! - Generic create/read/update/delete/import lifecycles for branch policies
//!   and service endpoints, built from per-type expand and flatten functions
//! - Configuration and logging for the `azdo-provider` command line driver
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use azdo_provider::{AggregatedClient, Provider, ResourceData};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::new();
//! let resource = provider.resource("azuredevops_branch_policy_min_reviewers")?;
//!
//! let mut attributes = json!({
//!     "project_id": "my-project",
//!     "settings": [{
//!         "reviewer_count": 2,
//!         "scope": [{ "repository_id": "repo-guid", "repository_ref": "refs/heads/main" }],
//!     }],
//! })
//! .as_object()
//! .cloned()
//! .unwrap_or_default();
//! resource.prepare(&mut attributes)?;
//!
//! let clients = AggregatedClient::new("my-org".to_string(), "my-pat".to_string());
//! let mut data = ResourceData::from_attributes(attributes);
//! resource.create(&mut data, &clients).await?;
//! println!("Created policy {}", data.id());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod branchpolicy;
pub mod cli;
pub mod config;
pub mod error;
pub mod hcl;
pub mod logging;
pub mod models;
pub mod parsed_property;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod serviceendpoint;
pub mod state;
pub mod tfhelper;
pub mod validate;

// Re-export commonly used types for convenience
pub use api::AggregatedClient;
pub use config::Config;
pub use error::{ApiError, ConfigError, ProviderError};
pub use provider::Provider;
pub use resource::{PlanAction, Resource};
pub use state::ResourceData;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
