//! Unified error handling for the provider library.
//!
//! This module provides the error hierarchy using `thiserror` so lifecycle
//! callers can tell a malformed identifier from a remote failure.
//!
//! ## Error Categories
//!
//! - [`ProviderError`]: Errors surfaced by resource lifecycle operations
//! - [`ApiError`]: Errors from Azure DevOps API interactions
//! - [`ConfigError`]: Errors from provider configuration resolution
//!
//! ## Example
//!
//! ```rust
//! use azdo_provider::error::{ApiError, ProviderError};
//!
//! let err = ProviderError::api(
//!     "Error creating policy in Azure DevOps",
//!     ApiError::Unauthorized,
//! );
//! assert!(err.to_string().starts_with("Error creating policy"));
//! ```

use crate::schema::Diagnostic;
use thiserror::Error;

/// Errors produced by resource lifecycle operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// An import identifier did not have the `projectID/resourceID` shape.
    #[error("unexpected format of ID ({id}), expected projectid/resourceId")]
    ImportFormat {
        /// The identifier as supplied by the caller.
        id: String,
    },

    /// A stored or imported identifier could not be parsed.
    #[error("{kind} ID ({value}) isn't a valid {expected}")]
    InvalidId {
        /// What the identifier names ("Policy configuration", "Service endpoint").
        kind: &'static str,
        /// The offending value.
        value: String,
        /// The expected representation ("Int", "UUID").
        expected: &'static str,
    },

    /// A required attribute or block was absent from the resource data.
    #[error("attribute {0} is required but was not set")]
    MissingAttribute(String),

    /// An integer attribute does not fit the 32-bit field the API stores it in.
    #[error("attribute {attribute} is out of range: {value} does not fit a 32-bit integer")]
    IntegerOutOfRange {
        /// Name of the attribute.
        attribute: String,
        /// The configured value.
        value: i64,
    },

    /// Policy settings could not be encoded or decoded.
    #[error("{context}: {source}")]
    Settings {
        /// What was being done when decoding failed.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The remote settings object does not belong to the expected policy kind.
    #[error("policy settings of kind {actual} cannot be flattened into a {expected} resource")]
    SettingsKindMismatch {
        /// Kind the resource manages.
        expected: &'static str,
        /// Kind found in the remote object.
        actual: &'static str,
    },

    /// A remote call failed.
    #[error("{context}: {source}")]
    Api {
        /// Descriptive prefix naming the failed operation.
        context: String,
        /// Underlying API error.
        #[source]
        source: ApiError,
    },

    /// Attribute values failed schema validation.
    #[error("invalid configuration: {}", format_diagnostics(.0))]
    Validation(Vec<Diagnostic>),

    /// No resource is registered under the requested type name.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),
}

impl ProviderError {
    /// Wraps an API error with a descriptive prefix.
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    /// Wraps a JSON error raised while handling policy settings.
    pub fn settings(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Settings {
            context: context.into(),
            source,
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur when interacting with the Azure DevOps API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API request was unauthorized (401).
    #[error("Unauthorized: invalid or expired Personal Access Token")]
    Unauthorized,

    /// The requested resource was not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the resource that was not found.
        resource: String,
    },

    /// The API returned an error response.
    #[error("API request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Failed to convert a request or response body.
    #[error("Failed to parse API response: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Transport {
        /// Error message from the HTTP pipeline.
        message: String,
    },
}

impl ApiError {
    /// Classifies a failed call by its HTTP status, if it carried one.
    #[must_use]
    pub fn classify(status: Option<u16>, message: String, resource: &str) -> Self {
        match status {
            Some(404) => Self::NotFound {
                resource: resource.to_string(),
            },
            Some(401) => Self::Unauthorized,
            Some(status) => Self::RequestFailed { status, message },
            None => Self::Transport { message },
        }
    }

    /// Whether the error means the remote object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("{field} is required (use --{flag}, {env_var} env var, or config file)")]
    MissingRequired {
        /// Name of the missing field.
        field: &'static str,
        /// CLI flag that sets the field.
        flag: &'static str,
        /// Environment variable that can provide the value.
        env_var: &'static str,
    },

    /// The organization service URL could not be parsed.
    #[error("Invalid organization service URL '{url}': {message}")]
    InvalidServiceUrl {
        /// The offending URL.
        url: String,
        /// What is wrong with it.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # API Error Classification
    ///
    /// Tests that HTTP statuses map to the matching `ApiError` variants.
    ///
    /// ## Test Scenario
    /// - Classifies 404, 401, 500 and a status-less failure
    ///
    /// ## Expected Outcome
    /// - 404 is NotFound, 401 Unauthorized, 500 RequestFailed, none Transport
    #[test]
    fn test_api_error_classification() {
        let not_found = ApiError::classify(Some(404), "gone".into(), "policy 7");
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "Resource not found: policy 7");

        assert_eq!(
            ApiError::classify(Some(401), "nope".into(), "policy 7"),
            ApiError::Unauthorized
        );
        assert_eq!(
            ApiError::classify(Some(500), "boom".into(), "policy 7"),
            ApiError::RequestFailed {
                status: 500,
                message: "boom".into()
            }
        );
        assert!(matches!(
            ApiError::classify(None, "reset".into(), "policy 7"),
            ApiError::Transport { .. }
        ));
    }

    /// # Wrapped API Error Messages
    ///
    /// Tests that lifecycle errors keep both the context prefix and the cause.
    ///
    /// ## Test Scenario
    /// - Wraps a RequestFailed error with an operation prefix
    ///
    /// ## Expected Outcome
    /// - Display output contains the prefix and the status
    #[test]
    fn test_provider_error_api_context() {
        let err = ProviderError::api(
            "Error updating policy in Azure DevOps",
            ApiError::RequestFailed {
                status: 409,
                message: "conflict".into(),
            },
        );
        let message = err.to_string();
        assert!(message.starts_with("Error updating policy in Azure DevOps: "));
        assert!(message.contains("409"));
    }

    /// # Import Format Error Message
    ///
    /// Tests the message reported for malformed import identifiers.
    ///
    /// ## Test Scenario
    /// - Builds an ImportFormat error
    ///
    /// ## Expected Outcome
    /// - Message names the identifier and the expected shape
    #[test]
    fn test_import_format_message() {
        let err = ProviderError::ImportFormat { id: "proj1".into() };
        assert_eq!(
            err.to_string(),
            "unexpected format of ID (proj1), expected projectid/resourceId"
        );
    }

    /// # Missing Required Config Message
    ///
    /// Tests that missing configuration names the flag and environment variable.
    ///
    /// ## Test Scenario
    /// - Builds a MissingRequired error for the service URL
    ///
    /// ## Expected Outcome
    /// - Message mentions both sources
    #[test]
    fn test_config_error_message() {
        let err = ConfigError::MissingRequired {
            field: "org_service_url",
            flag: "org-service-url",
            env_var: "AZDO_ORG_SERVICE_URL",
        };
        let message = err.to_string();
        assert!(message.contains("--org-service-url"));
        assert!(message.contains("AZDO_ORG_SERVICE_URL"));
    }
}
