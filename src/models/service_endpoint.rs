//! Service endpoint (service connection) types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Authorization scheme of a service endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    PersonalAccessToken,
    #[serde(rename = "OAuth")]
    OAuth,
    InstallationToken,
    /// Any scheme this provider does not model (UsernamePassword, Token, ...).
    #[serde(other)]
    Other,
}

impl AuthScheme {
    /// The scheme name as spelled by the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalAccessToken => "PersonalAccessToken",
            Self::OAuth => "OAuth",
            Self::InstallationToken => "InstallationToken",
            Self::Other => "Other",
        }
    }
}

/// Scheme plus scheme-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAuthorization {
    pub scheme: AuthScheme,
    /// Secret parameters come back from the API as `null`; those are dropped.
    #[serde(default, deserialize_with = "present_parameters")]
    pub parameters: BTreeMap<String, String>,
}

fn present_parameters<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect())
}

/// Minimal project reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Links an endpoint to a project it is shared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpointProjectReference {
    pub project_reference: ProjectReference,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A stored connection to an external system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    /// Server-assigned GUID; `None` until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<EndpointAuthorization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoint_project_references: Vec<ServiceEndpointProjectReference>,
}
