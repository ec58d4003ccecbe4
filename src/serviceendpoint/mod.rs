//! Service endpoint resources.
//!
//! Service endpoints (service connections) share a base schema and lifecycle.
//! A concrete endpoint type supplies an expand/flatten pair that handles its
//! authorization blocks on top of [`do_base_expansion`] and
//! [`do_base_flattening`].

pub mod github;

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::AggregatedClient;
use crate::error::ProviderError;
use crate::models::{ProjectReference, ServiceEndpoint, ServiceEndpointProjectReference};
use crate::resource::{Resource, ResourceLifecycle};
use crate::schema::{Attribute, AttributeType, Block};
use crate::state::ResourceData;
use crate::tfhelper;
use crate::validate;

pub const SCHEMA_PROJECT_ID: &str = "project_id";
pub const SCHEMA_SERVICE_ENDPOINT_NAME: &str = "service_endpoint_name";
pub const SCHEMA_DESCRIPTION: &str = "description";
pub const SCHEMA_AUTHORIZATION: &str = "authorization";

const DEFAULT_DESCRIPTION: &str = "Managed by Terraform";
/// Owner of endpoints created through the provider.
const ENDPOINT_OWNER: &str = "library";

/// Writes a remote endpoint into local state.
pub type FlattenFn = fn(&mut ResourceData, &ServiceEndpoint, &str) -> Result<(), ProviderError>;

/// Builds a remote endpoint and its project ID from local state.
pub type ExpandFn = fn(&ResourceData) -> Result<(ServiceEndpoint, String), ProviderError>;

/// Generates a service endpoint resource.
///
/// `extra_schema` holds the type-specific attributes, typically the
/// authorization blocks.
pub fn gen_base_service_endpoint_resource(
    name: &'static str,
    flatten: FlattenFn,
    expand: ExpandFn,
    extra_schema: Block,
) -> Resource {
    let mut schema = gen_base_schema();
    for (attribute_name, attribute) in extra_schema.attributes {
        schema.insert(attribute_name, attribute);
    }
    let lifecycle = ServiceEndpointLifecycle { name, flatten, expand };
    Resource::new(name, schema, Arc::new(lifecycle))
}

fn gen_base_schema() -> Block {
    Block::new()
        .with(
            SCHEMA_PROJECT_ID,
            Attribute::required(AttributeType::String)
                .force_new()
                .validate_with(validate::no_empty_strings()),
        )
        .with(
            SCHEMA_SERVICE_ENDPOINT_NAME,
            Attribute::required(AttributeType::String).validate_with(validate::no_empty_strings()),
        )
        .with(
            SCHEMA_DESCRIPTION,
            Attribute::optional(AttributeType::String).with_default(DEFAULT_DESCRIPTION),
        )
        .with(SCHEMA_AUTHORIZATION, Attribute::computed(AttributeType::Map))
}

/// Parses a stored service endpoint identifier.
pub fn parse_endpoint_id(value: &str) -> Result<Uuid, ProviderError> {
    Uuid::parse_str(value).map_err(|_| ProviderError::InvalidId {
        kind: "Service endpoint",
        value: value.to_string(),
        expected: "UUID",
    })
}

/// Expands the attributes shared by every service endpoint type.
pub fn do_base_expansion(data: &ResourceData) -> Result<(ServiceEndpoint, String), ProviderError> {
    let project_id = data.get_str(SCHEMA_PROJECT_ID).to_string();
    let name = data.get_str(SCHEMA_SERVICE_ENDPOINT_NAME).to_string();
    let description = Some(data.get_str(SCHEMA_DESCRIPTION))
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let id = if data.exists() {
        Some(parse_endpoint_id(data.id())?)
    } else {
        None
    };

    let endpoint = ServiceEndpoint {
        id,
        name: Some(name.clone()),
        owner: Some(ENDPOINT_OWNER.to_string()),
        description: description.clone(),
        service_endpoint_project_references: vec![ServiceEndpointProjectReference {
            project_reference: ProjectReference {
                id: project_id.clone(),
                name: None,
            },
            name,
            description,
        }],
        ..Default::default()
    };
    Ok((endpoint, project_id))
}

/// Flattens the attributes shared by every service endpoint type.
///
/// Returns `false` when the remote endpoint has no ID; the local identifier
/// is then cleared and nothing else is written.
pub fn do_base_flattening(
    data: &mut ResourceData,
    endpoint: &ServiceEndpoint,
    project_id: &str,
) -> Result<bool, ProviderError> {
    let Some(id) = endpoint.id else {
        data.set_id("");
        return Ok(false);
    };

    data.set_id(id.to_string());
    data.set(SCHEMA_PROJECT_ID, project_id);
    data.set(
        SCHEMA_SERVICE_ENDPOINT_NAME,
        endpoint.name.clone().unwrap_or_default(),
    );
    data.set(
        SCHEMA_DESCRIPTION,
        endpoint.description.clone().unwrap_or_default(),
    );
    if let Some(authorization) = &endpoint.authorization {
        data.set(
            SCHEMA_AUTHORIZATION,
            json!({ "scheme": authorization.scheme.as_str() }),
        );
    }
    Ok(true)
}

/// Lifecycle shared by every service endpoint resource.
struct ServiceEndpointLifecycle {
    name: &'static str,
    flatten: FlattenFn,
    expand: ExpandFn,
}

impl ServiceEndpointLifecycle {
    fn expand_existing(
        &self,
        data: &ResourceData,
    ) -> Result<(ServiceEndpoint, String, Uuid), ProviderError> {
        let (endpoint, project_id) = (self.expand)(data)?;
        let id = endpoint
            .id
            .ok_or_else(|| ProviderError::MissingAttribute("id".to_string()))?;
        Ok((endpoint, project_id, id))
    }
}

#[async_trait]
impl ResourceLifecycle for ServiceEndpointLifecycle {
    async fn create(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let (endpoint, project_id) = (self.expand)(data)?;
        debug!(resource = self.name, project = %project_id, "Creating service endpoint");

        let created = clients
            .service_endpoints()
            .create_service_endpoint(clients.organization(), &endpoint)
            .await
            .map_err(|e| ProviderError::api("Error creating service endpoint in Azure DevOps", e))?;

        info!(
            resource = self.name,
            project = %project_id,
            id = ?created.id,
            "Created service endpoint"
        );
        (self.flatten)(data, &created, &project_id)
    }

    async fn read(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let project_id = data.get_str(SCHEMA_PROJECT_ID).to_string();
        let endpoint_id = parse_endpoint_id(data.id())?;

        let result = clients
            .service_endpoints()
            .get_service_endpoint_details(clients.organization(), &project_id, endpoint_id)
            .await;

        match result {
            Ok(endpoint) => (self.flatten)(data, &endpoint, &project_id),
            Err(e) if e.is_not_found() => {
                info!(
                    resource = self.name,
                    project = %project_id,
                    id = %endpoint_id,
                    "Service endpoint no longer exists"
                );
                data.set_id("");
                Ok(())
            }
            Err(e) => Err(ProviderError::api(
                format!(
                    "Error looking up service endpoint given ID ({endpoint_id}) \
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
        let (endpoint, project_id, endpoint_id) = self.expand_existing(data)?;
        debug!(
            resource = self.name,
            project = %project_id,
            id = %endpoint_id,
            "Updating service endpoint"
        );

        let updated = clients
            .service_endpoints()
            .update_service_endpoint(clients.organization(), endpoint_id, &endpoint)
            .await
            .map_err(|e| ProviderError::api("Error updating service endpoint in Azure DevOps", e))?;

        (self.flatten)(data, &updated, &project_id)
    }

    async fn delete(
        &self,
        data: &ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        let (_, project_id, endpoint_id) = self.expand_existing(data)?;
        debug!(
            resource = self.name,
            project = %project_id,
            id = %endpoint_id,
            "Deleting service endpoint"
        );

        clients
            .service_endpoints()
            .delete_service_endpoint(clients.organization(), &project_id, endpoint_id)
            .await
            .map_err(|e| ProviderError::api("Error deleting service endpoint in Azure DevOps", e))
    }

    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.id().to_string();
        let (project_id, endpoint_id) = tfhelper::parse_import_id(&id)?;
        parse_endpoint_id(endpoint_id)?;

        data.set(SCHEMA_PROJECT_ID, project_id);
        data.set_id(endpoint_id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn data(value: Value) -> ResourceData {
        let Value::Object(attributes) = value else {
            unreachable!("test values must be objects");
        };
        ResourceData::from_attributes(attributes)
    }

    /// # Base Expansion
    ///
    /// Tests the shared endpoint fields and the project reference.
    ///
    /// ## Test Scenario
    /// - Expands new and existing endpoint data
    ///
    /// ## Expected Outcome
    /// - Owner is library, the project reference points at project_id and
    ///   the identifier is parsed only when present
    #[test]
    fn test_do_base_expansion() {
        let mut d = data(json!({
            "project_id": "proj",
            "service_endpoint_name": "gh",
            "description": ""
        }));
        let (endpoint, project_id) = do_base_expansion(&d).unwrap();
        assert_eq!(project_id, "proj");
        assert_eq!(endpoint.id, None);
        assert_eq!(endpoint.owner.as_deref(), Some("library"));
        assert_eq!(endpoint.description, None);
        assert_eq!(endpoint.service_endpoint_project_references[0].project_reference.id, "proj");
        assert_eq!(endpoint.service_endpoint_project_references[0].name, "gh");

        d.set_id("2d1d3cd0-4c1a-4a4d-8a3f-6a5e3c1f0b11");
        let (endpoint, _) = do_base_expansion(&d).unwrap();
        assert!(endpoint.id.is_some());

        d.set_id("not-a-guid");
        let err = do_base_expansion(&d).unwrap_err();
        assert_eq!(err.to_string(), "Service endpoint ID (not-a-guid) isn't a valid UUID");
    }

    /// # Base Flattening Without ID
    ///
    /// Tests that an endpoint lacking an ID clears local state.
    ///
    /// ## Test Scenario
    /// - Flattens a default endpoint into data holding an identifier
    ///
    /// ## Expected Outcome
    /// - The identifier is cleared and nothing else is written
    #[test]
    fn test_do_base_flattening_without_id() {
        let mut d = data(json!({}));
        d.set_id("2d1d3cd0-4c1a-4a4d-8a3f-6a5e3c1f0b11");
        assert!(!do_base_flattening(&mut d, &ServiceEndpoint::default(), "proj").unwrap());
        assert!(!d.exists());
        assert!(d.attributes().is_empty());
    }
}
