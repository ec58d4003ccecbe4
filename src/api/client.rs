//! Aggregated Azure DevOps client.
//!
//! Holds one operations handle per API area the provider talks to, plus the
//! organization every call is made against.

use azure_devops_rust_api::{Credential, policy, service_endpoint};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use super::traits::{
    PolicyOperations, RealPolicyOperations, RealServiceEndpointOperations,
    ServiceEndpointOperations,
};
use crate::config::ProviderConfig;

/// Azure DevOps clients shared by every resource lifecycle.
///
/// # Example
///
/// ```rust,no_run
/// use azdo_provider::api::AggregatedClient;
///
/// let clients = AggregatedClient::new("my-org".to_string(), "my-pat".to_string());
/// assert_eq!(clients.organization(), "my-org");
/// ```
#[derive(Clone)]
pub struct AggregatedClient {
    organization: String,
    policy: Arc<dyn PolicyOperations>,
    service_endpoints: Arc<dyn ServiceEndpointOperations>,
}

impl AggregatedClient {
    /// Creates clients authenticated with a Personal Access Token.
    ///
    /// # Security
    ///
    /// The PAT is wrapped in a SecretString internally and only exposed
    /// when the credential is built.
    pub fn new(organization: String, pat: String) -> Self {
        Self::new_with_secret(organization, SecretString::from(pat))
    }

    /// Creates clients from a PAT already wrapped in a SecretString.
    pub fn new_with_secret(organization: String, pat: SecretString) -> Self {
        let credential = Credential::from_pat(pat.expose_secret().to_string());

        let policy_client = policy::ClientBuilder::new(credential.clone()).build();
        let endpoint_client = service_endpoint::ClientBuilder::new(credential).build();

        Self::with_operations(
            organization,
            Arc::new(RealPolicyOperations::new(policy_client)),
            Arc::new(RealServiceEndpointOperations::new(endpoint_client)),
        )
    }

    /// Creates clients for a resolved provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new_with_secret(
            config.organization.clone(),
            config.personal_access_token.clone(),
        )
    }

    /// Creates clients from explicit operation implementations.
    pub fn with_operations(
        organization: String,
        policy: Arc<dyn PolicyOperations>,
        service_endpoints: Arc<dyn ServiceEndpointOperations>,
    ) -> Self {
        Self {
            organization,
            policy,
            service_endpoints,
        }
    }

    /// Returns the organization name.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Policy configuration operations.
    pub fn policy(&self) -> &dyn PolicyOperations {
        self.policy.as_ref()
    }

    /// Service endpoint operations.
    pub fn service_endpoints(&self) -> &dyn ServiceEndpointOperations {
        self.service_endpoints.as_ref()
    }
}

impl std::fmt::Debug for AggregatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatedClient")
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}
