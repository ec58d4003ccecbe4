//! `azuredevops_serviceendpoint_github`: a GitHub service connection.
//!
//! The connection authenticates with a personal access token
//! (`auth_personal`), an OAuth configuration (`auth_oauth`) or, when neither
//! block is given, the Azure Pipelines GitHub App installation token.

use serde_json::json;
use std::collections::BTreeMap;

use super::{do_base_expansion, do_base_flattening, gen_base_service_endpoint_resource};
use crate::error::ProviderError;
use crate::models::{AuthScheme, EndpointAuthorization, ServiceEndpoint};
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Block};
use crate::state::{ResourceData, block_str};
use crate::tfhelper;
use crate::validate;

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_github";

pub const SCHEMA_AUTH_PERSONAL: &str = "auth_personal";
pub const SCHEMA_AUTH_OAUTH: &str = "auth_oauth";
pub const SCHEMA_PERSONAL_ACCESS_TOKEN: &str = "personal_access_token";
pub const SCHEMA_OAUTH_CONFIGURATION_ID: &str = "oauth_configuration_id";

/// Environment variable supplying `personal_access_token` when unset.
pub const PAT_ENV_VAR: &str = "AZDO_GITHUB_SERVICE_CONNECTION_PAT";

const ENDPOINT_TYPE: &str = "github";
const ENDPOINT_URL: &str = "http://github.com";
const PARAM_ACCESS_TOKEN: &str = "accessToken";
const PARAM_CONFIGURATION_ID: &str = "ConfigurationId";

pub fn resource_service_endpoint_github() -> Resource {
    let (pat_hash_key, pat_hash_schema) =
        tfhelper::secret_memo_schema(SCHEMA_PERSONAL_ACCESS_TOKEN);
    let auth_personal = Block::new()
        .with(
            SCHEMA_PERSONAL_ACCESS_TOKEN,
            Attribute::required(AttributeType::String)
                .env_default(PAT_ENV_VAR)
                .describe("The GitHub personal access token which should be used.")
                .sensitive()
                .validate_with(validate::no_empty_strings())
                .suppress_diff(tfhelper::suppress_secret_changed),
        )
        .with(pat_hash_key, pat_hash_schema);

    let auth_oauth = Block::new().with(
        SCHEMA_OAUTH_CONFIGURATION_ID,
        Attribute::required(AttributeType::String).describe("Configuration ID for OAuth"),
    );

    let schema = Block::new()
        .with(
            SCHEMA_AUTH_PERSONAL,
            Attribute::optional(AttributeType::BlockList(auth_personal))
                .items(Some(1), Some(1))
                .conflicts_with(&[SCHEMA_AUTH_OAUTH]),
        )
        .with(
            SCHEMA_AUTH_OAUTH,
            Attribute::optional(AttributeType::BlockList(auth_oauth))
                .items(Some(1), Some(1))
                .conflicts_with(&[SCHEMA_AUTH_PERSONAL]),
        );

    gen_base_service_endpoint_resource(
        RESOURCE_NAME,
        flatten_service_endpoint_github,
        expand_service_endpoint_github,
        schema,
    )
}

fn expand_service_endpoint_github(
    data: &ResourceData,
) -> Result<(ServiceEndpoint, String), ProviderError> {
    let (mut endpoint, project_id) = do_base_expansion(data)?;

    let mut authorization = EndpointAuthorization {
        scheme: AuthScheme::InstallationToken,
        parameters: BTreeMap::new(),
    };
    if let Some(personal) = data.first_block(SCHEMA_AUTH_PERSONAL) {
        authorization.scheme = AuthScheme::PersonalAccessToken;
        authorization.parameters = BTreeMap::from([(
            PARAM_ACCESS_TOKEN.to_string(),
            block_str(personal, SCHEMA_PERSONAL_ACCESS_TOKEN).to_string(),
        )]);
    }
    if let Some(oauth) = data.first_block(SCHEMA_AUTH_OAUTH) {
        authorization.scheme = AuthScheme::OAuth;
        authorization.parameters = BTreeMap::from([(
            PARAM_CONFIGURATION_ID.to_string(),
            block_str(oauth, SCHEMA_OAUTH_CONFIGURATION_ID).to_string(),
        )]);
    }

    endpoint.authorization = Some(authorization);
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(ENDPOINT_URL.to_string());
    Ok((endpoint, project_id))
}

fn flatten_service_endpoint_github(
    data: &mut ResourceData,
    endpoint: &ServiceEndpoint,
    project_id: &str,
) -> Result<(), ProviderError> {
    if !do_base_flattening(data, endpoint, project_id)? {
        return Ok(());
    }
    let Some(authorization) = &endpoint.authorization else {
        return Ok(());
    };

    match authorization.scheme {
        AuthScheme::OAuth => {
            let configuration_id = authorization
                .parameters
                .get(PARAM_CONFIGURATION_ID)
                .cloned()
                .unwrap_or_default();
            data.set(
                SCHEMA_AUTH_OAUTH,
                json!([{ SCHEMA_OAUTH_CONFIGURATION_ID: configuration_id }]),
            );
        }
        AuthScheme::PersonalAccessToken => {
            // The token is never returned; keep the configured one and refresh its memo.
            if data.get_list(SCHEMA_AUTH_PERSONAL).len() == 1
                && let Some(params) = data.first_block_mut(SCHEMA_AUTH_PERSONAL)
            {
                tfhelper::flatten_secret_nested(params, SCHEMA_PERSONAL_ACCESS_TOKEN);
            }
        }
        AuthScheme::InstallationToken | AuthScheme::Other => {}
    }
    Ok(())
}
