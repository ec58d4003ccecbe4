//! Model mapping between azure_devops_rust_api types and the provider's models.
//!
//! Request bodies are built field by field: the generated models require
//! server-owned fields (policy type URLs, endpoint owners, `createdBy`) that
//! the provider never tracks, so those are filled with empty defaults.
//! Responses go through `serde_json::Value`, which drops fields the provider
//! does not model.

use azure_devops_rust_api::policy::models as policy_models;
use azure_devops_rust_api::service_endpoint::models as endpoint_models;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{PolicyConfiguration, ServiceEndpoint};

fn convert<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, ApiError> {
    let json = serde_json::to_value(value)?;
    Ok(serde_json::from_value(json)?)
}

/// Converts a policy configuration into the generated request body.
pub fn to_api_policy(
    config: &PolicyConfiguration,
) -> Result<policy_models::PolicyConfiguration, ApiError> {
    let kind = config.kind();
    let mut body = policy_models::PolicyConfiguration::default();

    let versioned = &mut body.versioned_policy_configuration_ref;
    versioned.revision = config.revision;
    versioned.policy_configuration_ref.id = config.id;
    versioned.policy_configuration_ref.type_ = Some(policy_models::PolicyTypeRef::new(
        kind.name().to_string(),
        kind.type_id().to_string(),
        String::new(),
    ));

    body.is_enabled = config.is_enabled;
    body.is_blocking = config.is_blocking;
    body.settings = Some(serde_json::to_value(&config.settings)?);
    Ok(body)
}

/// Converts a generated policy configuration into the provider model.
pub fn from_api_policy(
    config: policy_models::PolicyConfiguration,
) -> Result<PolicyConfiguration, ApiError> {
    convert(&config)
}

/// Converts a service endpoint into the generated request body.
///
/// The ID is empty for an endpoint that has not been created yet.
pub fn to_api_endpoint(
    endpoint: &ServiceEndpoint,
) -> Result<endpoint_models::ServiceEndpoint, ApiError> {
    let authorization = match &endpoint.authorization {
        Some(auth) => endpoint_models::EndpointAuthorization {
            parameters: Some(serde_json::to_value(&auth.parameters)?),
            scheme: Some(auth.scheme.as_str().to_string()),
        },
        None => endpoint_models::EndpointAuthorization::new(),
    };

    let mut body = endpoint_models::ServiceEndpoint::new(
        authorization,
        endpoint_models::IdentityRef::new(String::new()),
        json!({}),
        endpoint.id.map(|id| id.to_string()).unwrap_or_default(),
        false,
        false,
        endpoint.name.clone().unwrap_or_default(),
        endpoint.owner.clone().unwrap_or_default(),
        endpoint.endpoint_type.clone().unwrap_or_default(),
        endpoint.url.clone().unwrap_or_default(),
    );
    body.description = endpoint.description.clone();
    body.service_endpoint_project_references = endpoint
        .service_endpoint_project_references
        .iter()
        .map(|reference| {
            let mut project =
                endpoint_models::ProjectReference::new(reference.project_reference.id.clone());
            project.name = reference.project_reference.name.clone();

            let mut api_reference = endpoint_models::ServiceEndpointProjectReference::new(project);
            api_reference.name = Some(reference.name.clone());
            api_reference.description = reference.description.clone();
            api_reference
        })
        .collect();
    Ok(body)
}

/// Converts a generated service endpoint into the provider model.
///
/// An empty ID maps to `None`.
pub fn from_api_endpoint(
    endpoint: endpoint_models::ServiceEndpoint,
) -> Result<ServiceEndpoint, ApiError> {
    let mut value = serde_json::to_value(&endpoint)?;
    if endpoint.id.is_empty()
        && let Some(object) = value.as_object_mut()
    {
        object.remove("id");
    }
    Ok(serde_json::from_value(value)?)
}

/// Decodes the body of a service endpoint lookup.
///
/// Azure DevOps answers a lookup of a deleted endpoint with `200 OK` and a
/// `null` body. That, an empty body and a body without an ID yield `None`.
pub fn endpoint_from_body(body: &[u8]) -> Result<Option<ServiceEndpoint>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)?;
    let has_id = value
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty() && Uuid::parse_str(id).is_ok_and(|id| !id.is_nil()));
    if !has_id {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}
