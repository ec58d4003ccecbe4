//! Resource definitions.
//!
//! A [`Resource`] pairs a schema with a [`ResourceLifecycle`]: the
//! create/read/update/delete/import functions a generator produced for one
//! resource type.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::api::AggregatedClient;
use crate::error::ProviderError;
use crate::schema::{Block, Diagnostic, Severity};
use crate::state::ResourceData;

/// Lifecycle operations of one resource type.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Creates the remote object described by `data` and records its identifier.
    async fn create(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError>;

    /// Refreshes `data` from the remote object.
    ///
    /// A remote object that no longer exists clears the identifier and is not an error.
    async fn read(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError>;

    /// Pushes `data` to the existing remote object.
    async fn update(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError>;

    /// Deletes the remote object.
    async fn delete(
        &self,
        data: &ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError>;

    /// Adopts an existing remote object from a `projectID/resourceID` identifier
    /// held in `data`.
    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError>;
}

/// What applying a configuration to a resource instance would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// The instance does not exist yet.
    Create,
    /// Nothing changed.
    NoOp,
    /// The listed attributes change in place.
    Update(Vec<String>),
    /// A force-new attribute changed; the listed attributes differ.
    Replace(Vec<String>),
}

/// A named resource type.
#[derive(Clone)]
pub struct Resource {
    name: &'static str,
    schema: Block,
    lifecycle: Arc<dyn ResourceLifecycle>,
}

impl Resource {
    pub fn new(name: &'static str, schema: Block, lifecycle: Arc<dyn ResourceLifecycle>) -> Self {
        Self {
            name,
            schema,
            lifecycle,
        }
    }

    /// Resource type name, e.g. `azuredevops_serviceendpoint_github`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> &Block {
        &self.schema
    }

    /// Applies defaults to configured attributes and validates them.
    ///
    /// Returns the warnings on success; any error finding fails the whole
    /// configuration.
    pub fn prepare(
        &self,
        attributes: &mut Map<String, Value>,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        self.schema.apply_defaults(attributes);
        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .schema
            .validate(attributes)
            .into_iter()
            .partition(|d| d.severity == Severity::Error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ProviderError::Validation(errors))
        }
    }

    /// Classifies the change from `prior` state to a prepared configuration.
    pub fn plan(&self, prior: Option<&ResourceData>, proposed: &Map<String, Value>) -> PlanAction {
        let Some(prior) = prior.filter(|p| p.exists()) else {
            return PlanAction::Create;
        };
        let changes = self.schema.diff(prior.attributes(), proposed);
        if changes.is_empty() {
            return PlanAction::NoOp;
        }
        let replace = changes.iter().any(|c| c.requires_replace);
        let names = changes.into_iter().map(|c| c.name).collect();
        if replace {
            PlanAction::Replace(names)
        } else {
            PlanAction::Update(names)
        }
    }

    pub async fn create(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        self.lifecycle.create(data, clients).await
    }

    pub async fn read(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        self.lifecycle.read(data, clients).await
    }

    pub async fn update(
        &self,
        data: &mut ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        self.lifecycle.update(data, clients).await
    }

    pub async fn delete(
        &self,
        data: &ResourceData,
        clients: &AggregatedClient,
    ) -> Result<(), ProviderError> {
        self.lifecycle.delete(data, clients).await
    }

    pub fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        self.lifecycle.import(data)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
