//! Traits for Azure DevOps API operations.
//!
//! These traits abstract the remote calls the resource lifecycles make to
//! enable:
//! - Mocking for unit tests
//! - Alternative implementations
//! - A typed not-found signal independent of the HTTP client

use async_trait::async_trait;
use uuid::Uuid;

use super::mappers;
use crate::error::ApiError;
use crate::models::{PolicyConfiguration, ServiceEndpoint};

type Result<T> = std::result::Result<T, ApiError>;

/// Trait for policy configuration operations.
#[async_trait]
pub trait PolicyOperations: Send + Sync {
    /// Creates a policy configuration and returns it with its assigned ID.
    async fn create_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration: &PolicyConfiguration,
    ) -> Result<PolicyConfiguration>;

    /// Fetches a policy configuration by ID.
    ///
    /// Returns [`ApiError::NotFound`] when the configuration does not exist.
    async fn get_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
    ) -> Result<PolicyConfiguration>;

    /// Replaces a policy configuration.
    async fn update_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
        configuration: &PolicyConfiguration,
    ) -> Result<PolicyConfiguration>;

    /// Deletes a policy configuration.
    async fn delete_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
    ) -> Result<()>;
}

/// Trait for service endpoint operations.
#[async_trait]
pub trait ServiceEndpointOperations: Send + Sync {
    /// Creates an endpoint; the project comes from its project references.
    async fn create_service_endpoint(
        &self,
        organization: &str,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint>;

    /// Fetches an endpoint by ID.
    async fn get_service_endpoint_details(
        &self,
        organization: &str,
        project: &str,
        endpoint_id: Uuid,
    ) -> Result<ServiceEndpoint>;

    /// Replaces an endpoint.
    async fn update_service_endpoint(
        &self,
        organization: &str,
        endpoint_id: Uuid,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint>;

    /// Deletes an endpoint from a project.
    async fn delete_service_endpoint(
        &self,
        organization: &str,
        project: &str,
        endpoint_id: Uuid,
    ) -> Result<()>;
}

/// Real implementation wrapping azure_devops_rust_api::policy::Client.
#[derive(Clone)]
pub struct RealPolicyOperations {
    client: azure_devops_rust_api::policy::Client,
}

impl RealPolicyOperations {
    /// Creates a new RealPolicyOperations wrapper.
    pub fn new(client: azure_devops_rust_api::policy::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyOperations for RealPolicyOperations {
    async fn create_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration: &PolicyConfiguration,
    ) -> Result<PolicyConfiguration> {
        let body = mappers::to_api_policy(configuration)?;
        let created = self
            .client
            .configurations_client()
            .create(organization, body, project)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("policy configuration in project {project}"),
                )
            })?;
        mappers::from_api_policy(created)
    }

    async fn get_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
    ) -> Result<PolicyConfiguration> {
        let config = self
            .client
            .configurations_client()
            .get(organization, project, configuration_id)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("policy configuration {configuration_id}"),
                )
            })?;
        mappers::from_api_policy(config)
    }

    async fn update_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
        configuration: &PolicyConfiguration,
    ) -> Result<PolicyConfiguration> {
        let body = mappers::to_api_policy(configuration)?;
        let updated = self
            .client
            .configurations_client()
            .update(organization, body, project, configuration_id)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("policy configuration {configuration_id}"),
                )
            })?;
        mappers::from_api_policy(updated)
    }

    async fn delete_policy_configuration(
        &self,
        organization: &str,
        project: &str,
        configuration_id: i32,
    ) -> Result<()> {
        self.client
            .configurations_client()
            .delete(organization, project, configuration_id)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("policy configuration {configuration_id}"),
                )
            })?;
        Ok(())
    }
}

/// Real implementation wrapping azure_devops_rust_api::service_endpoint::Client.
#[derive(Clone)]
pub struct RealServiceEndpointOperations {
    client: azure_devops_rust_api::service_endpoint::Client,
}

impl RealServiceEndpointOperations {
    /// Creates a new RealServiceEndpointOperations wrapper.
    pub fn new(client: azure_devops_rust_api::service_endpoint::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceEndpointOperations for RealServiceEndpointOperations {
    async fn create_service_endpoint(
        &self,
        organization: &str,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint> {
        let body = mappers::to_api_endpoint(endpoint)?;
        let created = self
            .client
            .endpoints_client()
            .create(organization, body)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    "service endpoint",
                )
            })?;
        mappers::from_api_endpoint(created)
    }

    async fn get_service_endpoint_details(
        &self,
        organization: &str,
        project: &str,
        endpoint_id: Uuid,
    ) -> Result<ServiceEndpoint> {
        let resource = format!("service endpoint {endpoint_id}");
        // The raw body is decoded here since a deleted endpoint comes back as
        // `200 OK` with a `null` body.
        let response = self
            .client
            .endpoints_client()
            .get(organization, project, endpoint_id.to_string())
            .send()
            .await
            .map_err(|e| {
                ApiError::classify(e.http_status().map(u16::from), e.to_string(), &resource)
            })?;
        let body = response.into_raw_response().into_body();
        mappers::endpoint_from_body(&body)?.ok_or(ApiError::NotFound { resource })
    }

    async fn update_service_endpoint(
        &self,
        organization: &str,
        endpoint_id: Uuid,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint> {
        let body = mappers::to_api_endpoint(endpoint)?;
        let updated = self
            .client
            .endpoints_client()
            .update_service_endpoint(organization, body, endpoint_id.to_string())
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("service endpoint {endpoint_id}"),
                )
            })?;
        mappers::from_api_endpoint(updated)
    }

    async fn delete_service_endpoint(
        &self,
        organization: &str,
        project: &str,
        endpoint_id: Uuid,
    ) -> Result<()> {
        self.client
            .endpoints_client()
            .delete(organization, endpoint_id.to_string(), project)
            .await
            .map_err(|e| {
                ApiError::classify(
                    e.http_status().map(u16::from),
                    e.to_string(),
                    &format!("service endpoint {endpoint_id}"),
                )
            })?;
        Ok(())
    }
}
