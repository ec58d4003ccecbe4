//! Configuration management for azdo-provider.
//!
//! This module handles loading provider settings from multiple sources:
//! - Command line flags
//! - Environment variables (`AZDO_ORG_SERVICE_URL`, `AZDO_PERSONAL_ACCESS_TOKEN`)
//! - A TOML configuration file following the XDG Base Directory specification
//!
//! ## Example
//!
//! ```rust,no_run
//! use azdo_provider::Config;
//!
//! // Load configuration from file, with fallback to defaults
//! let config = Config::load_from_file().unwrap();
//!
//! // Merge environment variables on top (env takes precedence)
//! let merged = config.merge(Config::load_from_env());
//!
//! let provider_config = merged.resolve().unwrap();
//! println!("Organization: {}", provider_config.organization);
//! ```

use crate::error::ConfigError;
use crate::parsed_property::ParsedProperty;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

pub const ENV_ORG_SERVICE_URL: &str = "AZDO_ORG_SERVICE_URL";
pub const ENV_PERSONAL_ACCESS_TOKEN: &str = "AZDO_PERSONAL_ACCESS_TOKEN";

/// Temporary struct for deserializing TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    pub org_service_url: Option<String>,
    pub personal_access_token: Option<String>,
}

/// Provider settings assembled from CLI flags, environment variables and the config file.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Organization URL, e.g. `https://dev.azure.com/my-org`.
    pub org_service_url: Option<ParsedProperty<String>>,
    /// Personal access token for authenticating with Azure DevOps.
    pub personal_access_token: Option<ParsedProperty<String>>,
}

/// Fully resolved settings needed to build API clients.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Organization name, taken from the service URL.
    pub organization: String,
    pub org_service_url: Url,
    pub personal_access_token: SecretString,
}

impl Config {
    /// Load configuration from XDG config directory
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config_file: ConfigFile = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(Self {
            org_service_url: config_file.org_service_url.map(|v| {
                ParsedProperty::File(v, config_path.clone(), "org_service_url".to_string())
            }),
            personal_access_token: config_file.personal_access_token.map(|v| {
                ParsedProperty::File(v, config_path.clone(), "personal_access_token".to_string())
            }),
        })
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Self {
        let from_env = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| ParsedProperty::Env(v, var.to_string()))
        };
        Self {
            org_service_url: from_env(ENV_ORG_SERVICE_URL),
            personal_access_token: from_env(ENV_PERSONAL_ACCESS_TOKEN),
        }
    }

    /// Build a Config from command line flag values.
    pub fn from_cli(org_service_url: Option<&str>, personal_access_token: Option<&str>) -> Self {
        Self {
            org_service_url: org_service_url
                .map(|v| ParsedProperty::Cli(v.to_string(), "org-service-url".to_string())),
            personal_access_token: personal_access_token
                .map(|v| ParsedProperty::Cli(v.to_string(), "personal-access-token".to_string())),
        }
    }

    /// Get the XDG config directory path for azdo-provider
    fn get_config_path() -> Result<PathBuf> {
        // Use XDG_CONFIG_HOME if set, otherwise ~/.config
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config"),
        };

        Ok(config_dir.join("azdo-provider").join("config.toml"))
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            org_service_url: other.org_service_url.or(self.org_service_url),
            personal_access_token: other.personal_access_token.or(self.personal_access_token),
        }
    }

    /// Validate the merged settings and derive the organization name.
    pub fn resolve(self) -> Result<ProviderConfig, ConfigError> {
        let url = self.org_service_url.ok_or(ConfigError::MissingRequired {
            field: "org_service_url",
            flag: "org-service-url",
            env_var: ENV_ORG_SERVICE_URL,
        })?;
        let pat = self.personal_access_token.ok_or(ConfigError::MissingRequired {
            field: "personal_access_token",
            flag: "personal-access-token",
            env_var: ENV_PERSONAL_ACCESS_TOKEN,
        })?;

        let org_service_url = Url::parse(url.value()).map_err(|e| ConfigError::InvalidServiceUrl {
            url: url.value().clone(),
            message: e.to_string(),
        })?;
        let organization = organization_from_url(&org_service_url).ok_or_else(|| {
            ConfigError::InvalidServiceUrl {
                url: url.value().clone(),
                message: format!("no organization name found (from {})", url.origin()),
            }
        })?;

        Ok(ProviderConfig {
            organization,
            org_service_url,
            personal_access_token: SecretString::from(pat.into_value()),
        })
    }

    /// Create a sample config file for user reference
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Don't overwrite existing config
        if config_path.exists() {
            return Ok(());
        }

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let sample_config = r#"# azdo-provider Configuration File
# This file follows the XDG Base Directory specification
# Location: ~/.config/azdo-provider/config.toml

# Azure DevOps organization URL (required)
# Can also be set with the AZDO_ORG_SERVICE_URL environment variable
# org_service_url = "https://dev.azure.com/your-organization"

# Personal Access Token (required, but consider using AZDO_PERSONAL_ACCESS_TOKEN instead)
# personal_access_token = "your-pat-token"
"#;

        fs::write(&config_path, sample_config).with_context(|| {
            format!(
                "Failed to write sample config to: {}",
                config_path.display()
            )
        })?;

        println!("Sample config created at: {}", config_path.display());
        Ok(())
    }
}

/// Organization name of a service URL.
///
/// Accepts `https://dev.azure.com/{org}` and the legacy
/// `https://{org}.visualstudio.com` form.
fn organization_from_url(url: &Url) -> Option<String> {
    if let Some(first) = url.path_segments().and_then(|mut s| s.next())
        && !first.is_empty()
    {
        return Some(first.to_string());
    }
    url.host_str()
        .and_then(|host| host.strip_suffix(".visualstudio.com"))
        .map(str::to_string)
}
