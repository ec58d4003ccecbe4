//! Remote object models.
//!
//! These types mirror the JSON bodies of the Azure DevOps policy and service
//! endpoint APIs, restricted to the fields the provider reads or writes.

mod policy;
mod service_endpoint;

pub use policy::{
    BuildValidationSettings, CommentResolutionSettings, MatchType, MinReviewerSettings,
    PolicyConfiguration, PolicyKind, PolicyScope, PolicySettings,
};
pub use service_endpoint::{
    AuthScheme, EndpointAuthorization, ProjectReference, ServiceEndpoint,
    ServiceEndpointProjectReference,
};
