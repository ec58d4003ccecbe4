//! Command line driver.
//!
//! Runs the lifecycle of any registered resource against JSON files: a
//! configuration file holds the attribute values as written by the user, a
//! state file holds the identifier and attributes recorded after the last
//! remote call.
//!
//! ```text
//! azdo-provider create azuredevops_branch_policy_min_reviewers -c policy.json -s policy.state.json
//! azdo-provider plan azuredevops_branch_policy_min_reviewers -c policy.json -s policy.state.json
//! azdo-provider import azuredevops_serviceendpoint_github my-project/8e2b0c1a-... -s endpoint.state.json
//! ```

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::api::AggregatedClient;
use crate::config::Config;
use crate::error::ProviderError;
use crate::hcl;
use crate::provider::Provider;
use crate::resource::{PlanAction, Resource};
use crate::state::ResourceData;

/// Exit codes of the command line driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// The command completed.
    Success = 0,

    /// General error (configuration, network, remote API, files).
    GeneralError = 1,

    /// `plan --detailed-exitcode` found changes to apply.
    ChangesPending = 2,

    /// The resource configuration failed schema validation.
    InvalidConfiguration = 3,

    /// The remote object recorded in the state file no longer exists.
    ResourceGone = 4,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable description of the exit code.
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Command completed successfully",
            ExitCode::GeneralError => "General error occurred",
            ExitCode::ChangesPending => "The plan contains changes",
            ExitCode::InvalidConfiguration => "The resource configuration is invalid",
            ExitCode::ResourceGone => "The remote object no longer exists",
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Azure DevOps connection flags, shared by every command.
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct ConnectionArgs {
    /// Organization URL, e.g. https://dev.azure.com/my-org
    #[arg(long, global = true, help_heading = "Azure DevOps Connection")]
    pub org_service_url: Option<String>,

    /// Personal Access Token for Azure DevOps API authentication
    #[arg(long, global = true, help_heading = "Azure DevOps Connection")]
    pub personal_access_token: Option<String>,
}

/// Logging flags.
///
/// These are read before argument parsing so logging covers start-up; they
/// are declared here for `--help` and validation.
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct LogArgs {
    /// Log level: trace, debug, info, warn, error (or json)
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Log format: text or json
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_format: Option<String>,
}

/// A resource type name.
#[derive(ClapArgs, Clone, Debug)]
pub struct ResourceTypeArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,
}

/// A resource type plus its configuration file.
#[derive(ClapArgs, Clone, Debug)]
pub struct ValidateArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,

    /// JSON file holding the configured attributes
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(ClapArgs, Clone, Debug)]
pub struct PlanArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,

    /// JSON file holding the configured attributes
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file of the existing instance; omit to plan a creation
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Exit with code 2 when the plan contains changes
    #[arg(long)]
    pub detailed_exitcode: bool,
}

/// Arguments of the commands that push a configuration (create, update).
#[derive(ClapArgs, Clone, Debug)]
pub struct ApplyArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,

    /// JSON file holding the configured attributes
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file to write
    #[arg(short, long)]
    pub state: PathBuf,
}

/// Arguments of the commands that only need recorded state (read, delete).
#[derive(ClapArgs, Clone, Debug)]
pub struct StateArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,

    /// State file of the instance
    #[arg(short, long)]
    pub state: PathBuf,
}

#[derive(ClapArgs, Clone, Debug)]
pub struct ImportArgs {
    /// Resource type, e.g. azuredevops_branch_policy_min_reviewers
    pub resource_type: String,

    /// Identifier in the form <project_id>/<resource_id>
    pub id: String,

    /// State file to write
    #[arg(short, long)]
    pub state: PathBuf,
}

/// Available commands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List the registered resource types
    Resources,

    /// Print the attribute schema of a resource type as JSON
    Schema(ResourceTypeArgs),

    /// Print example HCL for a resource type
    Example(ResourceTypeArgs),

    /// Apply defaults to a configuration and validate it
    Validate(ValidateArgs),

    /// Show what applying a configuration would change
    #[command(
        long_about = "Compare a configuration against recorded state.\n\n\
            Prints one of: create, no-op, update (with the changed attributes) or\n\
            replace (a force-new attribute changed)."
    )]
    Plan(PlanArgs),

    /// Create the remote object and record its state
    Create(ApplyArgs),

    /// Refresh recorded state from the remote object
    Read(StateArgs),

    /// Push a changed configuration to the existing remote object
    Update(ApplyArgs),

    /// Delete the remote object and its state file
    Delete(StateArgs),

    /// Adopt an existing remote object
    Import(ImportArgs),
}

#[derive(Parser, Clone, Debug)]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Manage Azure DevOps branch policies and service endpoints as declarative resources",
    long_about = "Manage Azure DevOps branch policies and service endpoints as declarative resources.\n\n\
        Connection settings can be provided via CLI arguments, environment variables\n\
        (AZDO_ORG_SERVICE_URL, AZDO_PERSONAL_ACCESS_TOKEN) or the config file\n\
        (~/.config/azdo-provider/config.toml).",
    after_help = "EXAMPLES:\n    \
        # Validate and create a minimum reviewers policy\n    \
        azdo-provider validate azuredevops_branch_policy_min_reviewers -c policy.json\n    \
        azdo-provider create azuredevops_branch_policy_min_reviewers -c policy.json -s policy.state.json\n\n    \
        # Import an existing policy configuration\n    \
        azdo-provider import azuredevops_branch_policy_build_validation my-project/42 -s build.state.json\n\n    \
        # Create sample config file\n    \
        azdo-provider --create-config"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub logging: LogArgs,

    /// Create a sample configuration file at ~/.config/azdo-provider/config.toml
    #[arg(long)]
    pub create_config: bool,
}

/// Runs parsed arguments to completion.
pub async fn run(args: Args) -> Result<ExitCode> {
    if args.create_config {
        Config::create_sample_config()?;
        return Ok(ExitCode::Success);
    }
    let Some(command) = args.command else {
        bail!("no command given, see --help");
    };
    Session::new(args.connection).execute(command).await
}

/// The registry plus lazily resolved API clients.
pub struct Session {
    provider: Provider,
    connection: ConnectionArgs,
    clients: Option<AggregatedClient>,
}

impl Session {
    pub fn new(connection: ConnectionArgs) -> Self {
        Self {
            provider: Provider::new(),
            connection,
            clients: None,
        }
    }

    /// A session using already-built clients.
    pub fn with_clients(clients: AggregatedClient) -> Self {
        Self {
            provider: Provider::new(),
            connection: ConnectionArgs::default(),
            clients: Some(clients),
        }
    }

    /// Clients for the remote commands, resolving the configuration on first use.
    fn clients(&mut self) -> Result<AggregatedClient> {
        if let Some(clients) = &self.clients {
            return Ok(clients.clone());
        }
        let config = Config::load_from_file()?
            .merge(Config::load_from_env())
            .merge(Config::from_cli(
                self.connection.org_service_url.as_deref(),
                self.connection.personal_access_token.as_deref(),
            ));
        let resolved = config.resolve()?;
        info!(organization = %resolved.organization, "Connecting to Azure DevOps");
        let clients = AggregatedClient::from_config(&resolved);
        self.clients = Some(clients.clone());
        Ok(clients)
    }

    pub async fn execute(&mut self, command: Commands) -> Result<ExitCode> {
        debug!(?command, "Executing command");
        match command {
            Commands::Resources => {
                for name in self.provider.resource_names() {
                    println!("{name}");
                }
                Ok(ExitCode::Success)
            }
            Commands::Schema(args) => {
                let resource = self.provider.resource(&args.resource_type)?;
                println!("{}", serde_json::to_string_pretty(resource.schema())?);
                Ok(ExitCode::Success)
            }
            Commands::Example(args) => {
                let example = hcl::example_for(&args.resource_type)
                    .ok_or_else(|| ProviderError::UnknownResource(args.resource_type.clone()))?;
                println!("{}", example.trim_start());
                Ok(ExitCode::Success)
            }
            Commands::Validate(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                match prepared_config(&resource, &args.config)? {
                    Some(_) => {
                        println!("The configuration is valid.");
                        Ok(ExitCode::Success)
                    }
                    None => Ok(ExitCode::InvalidConfiguration),
                }
            }
            Commands::Plan(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let Some(proposed) = prepared_config(&resource, &args.config)? else {
                    return Ok(ExitCode::InvalidConfiguration);
                };
                let prior = args.state.as_deref().map(read_state).transpose()?;
                let action = resource.plan(prior.as_ref(), &proposed);
                println!("{}", describe_plan(&action));
                if args.detailed_exitcode && action != PlanAction::NoOp {
                    Ok(ExitCode::ChangesPending)
                } else {
                    Ok(ExitCode::Success)
                }
            }
            Commands::Create(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let Some(attributes) = prepared_config(&resource, &args.config)? else {
                    return Ok(ExitCode::InvalidConfiguration);
                };
                let clients = self.clients()?;
                let mut data = ResourceData::from_attributes(attributes);
                resource.create(&mut data, &clients).await?;
                write_state(&args.state, &data)?;
                println!("Created {} {}", resource.name(), data.id());
                Ok(ExitCode::Success)
            }
            Commands::Read(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let mut data = read_state(&args.state)?;
                let clients = self.clients()?;
                resource.read(&mut data, &clients).await?;
                write_state(&args.state, &data)?;
                if data.exists() {
                    Ok(ExitCode::Success)
                } else {
                    warn!(resource = resource.name(), "Remote object is gone");
                    println!("{} no longer exists", resource.name());
                    Ok(ExitCode::ResourceGone)
                }
            }
            Commands::Update(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let Some(attributes) = prepared_config(&resource, &args.config)? else {
                    return Ok(ExitCode::InvalidConfiguration);
                };
                let prior = read_state(&args.state)?;
                if !prior.exists() {
                    bail!(
                        "state file {} has no identifier, create the resource first",
                        args.state.display()
                    );
                }
                let action = resource.plan(Some(&prior), &attributes);
                if let PlanAction::Replace(changed) = &action {
                    bail!(
                        "{} cannot be updated in place, changed: {}",
                        resource.name(),
                        changed.join(", ")
                    );
                }
                let clients = self.clients()?;
                let mut data = ResourceData::from_attributes(attributes);
                data.set_id(prior.id());
                resource.update(&mut data, &clients).await?;
                write_state(&args.state, &data)?;
                println!("{}", describe_plan(&action));
                Ok(ExitCode::Success)
            }
            Commands::Delete(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let data = read_state(&args.state)?;
                let clients = self.clients()?;
                resource.delete(&data, &clients).await?;
                fs::remove_file(&args.state).with_context(|| {
                    format!("Failed to remove state file: {}", args.state.display())
                })?;
                println!("Deleted {} {}", resource.name(), data.id());
                Ok(ExitCode::Success)
            }
            Commands::Import(args) => {
                let resource = self.provider.resource(&args.resource_type)?.clone();
                let mut data = ResourceData::new();
                data.set_id(args.id.as_str());
                resource.import(&mut data)?;
                let clients = self.clients()?;
                resource.read(&mut data, &clients).await?;
                if !data.exists() {
                    bail!("cannot import non-existent remote object ({})", args.id);
                }
                write_state(&args.state, &data)?;
                println!("Imported {} {}", resource.name(), data.id());
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Loads a configuration file and prepares it against the resource schema.
///
/// Returns `None` after reporting the diagnostics when validation fails.
fn prepared_config(resource: &Resource, path: &Path) -> Result<Option<Map<String, Value>>> {
    let mut attributes = read_object(path)?;
    match resource.prepare(&mut attributes) {
        Ok(warnings) => {
            for warning in warnings {
                eprintln!("Warning: {warning}");
            }
            Ok(Some(attributes))
        }
        Err(ProviderError::Validation(errors)) => {
            for error in &errors {
                eprintln!("Error: {error}");
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("configuration file {} must hold a JSON object", path.display()),
    }
}

fn read_state(path: &Path) -> Result<ResourceData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))
}

fn write_state(path: &Path, data: &ResourceData) -> Result<()> {
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write state file: {}", path.display()))
}

fn describe_plan(action: &PlanAction) -> String {
    match action {
        PlanAction::Create => "create".to_string(),
        PlanAction::NoOp => "no-op".to_string(),
        PlanAction::Update(changed) => format!("update: {}", changed.join(", ")),
        PlanAction::Replace(changed) => format!("replace: {}", changed.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branchpolicy::min_reviewers;
    use crate::branchpolicy::test_support::mock_clients;
    use serde_json::json;
    use tempfile::TempDir;

    const MIN_REVIEWERS: &str = min_reviewers::RESOURCE_NAME;

    fn policy_config(reviewer_count: i64) -> Value {
        json!({
            "project_id": "proj",
            "settings": [{
                "reviewer_count": reviewer_count,
                "scope": [{
                    "repository_id": "repo",
                    "repository_ref": "refs/heads/main",
                    "match_type": "Exact",
                }],
            }],
        })
    }

    fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    /// # Exit Code Values
    ///
    /// Verifies that all exit codes have the correct numeric values.
    ///
    /// ## Test Scenario
    /// - Checks each exit code variant against its expected value
    ///
    /// ## Expected Outcome
    /// - All exit codes map to their documented numeric values
    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::GeneralError.code(), 1);
        assert_eq!(ExitCode::ChangesPending.code(), 2);
        assert_eq!(ExitCode::InvalidConfiguration.code(), 3);
        assert_eq!(ExitCode::ResourceGone.code(), 4);
        assert_eq!(ExitCode::ChangesPending.to_string(), "The plan contains changes");
    }

    /// # Argument Parsing
    ///
    /// Verifies that commands and global flags parse.
    ///
    /// ## Test Scenario
    /// - Parses a plan command with connection flags after the subcommand
    ///
    /// ## Expected Outcome
    /// - The subcommand fields and the global flags are populated
    #[test]
    fn test_argument_parsing() {
        let args = Args::try_parse_from([
            "azdo-provider",
            "plan",
            MIN_REVIEWERS,
            "-c",
            "policy.json",
            "--detailed-exitcode",
            "--org-service-url",
            "https://dev.azure.com/org",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(
            args.connection.org_service_url.as_deref(),
            Some("https://dev.azure.com/org")
        );
        assert_eq!(args.logging.log_level.as_deref(), Some("debug"));
        match args.command {
            Some(Commands::Plan(plan)) => {
                assert_eq!(plan.resource_type, MIN_REVIEWERS);
                assert_eq!(plan.config, PathBuf::from("policy.json"));
                assert!(plan.state.is_none());
                assert!(plan.detailed_exitcode);
            }
            other => panic!("expected plan, got {other:?}"),
        }
    }

    /// # Validation Failures
    ///
    /// Verifies that an invalid configuration maps to its exit code.
    ///
    /// ## Test Scenario
    /// - Validates a configuration with reviewer_count 0
    /// - Validates a configuration that is not a JSON object
    ///
    /// ## Expected Outcome
    /// - The first returns InvalidConfiguration; the second is an error
    #[tokio::test]
    async fn test_validate_command() {
        let dir = TempDir::new().unwrap();
        let (clients, _) = mock_clients();
        let mut session = Session::with_clients(clients);

        let config = write_json(&dir, "bad.json", &policy_config(0));
        let code = session
            .execute(Commands::Validate(ValidateArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                config,
            }))
            .await
            .unwrap();
        assert_eq!(code, ExitCode::InvalidConfiguration);

        let config = write_json(&dir, "list.json", &json!([1, 2]));
        let result = session
            .execute(Commands::Validate(ValidateArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                config,
            }))
            .await;
        assert!(result.is_err());
    }

    /// # State File Lifecycle
    ///
    /// Runs create, plan, update, read and delete through the driver.
    ///
    /// ## Test Scenario
    /// - Creates a policy from a configuration file
    /// - Plans and applies a reviewer count change
    /// - Reads and deletes the policy
    ///
    /// ## Expected Outcome
    /// - The state file records the identifier and follows each change;
    ///   delete removes it and the remote store is empty
    #[tokio::test]
    async fn test_state_file_lifecycle() {
        let dir = TempDir::new().unwrap();
        let (clients, policy) = mock_clients();
        let mut session = Session::with_clients(clients);
        let state = dir.path().join("policy.state.json");

        let config = write_json(&dir, "policy.json", &policy_config(2));
        let code = session
            .execute(Commands::Create(ApplyArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                config,
                state: state.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(code, ExitCode::Success);
        let created = read_state(&state).unwrap();
        assert_eq!(created.id(), "1");

        let changed = write_json(&dir, "changed.json", &policy_config(3));
        let code = session
            .execute(Commands::Plan(PlanArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                config: changed.clone(),
                state: Some(state.clone()),
                detailed_exitcode: true,
            }))
            .await
            .unwrap();
        assert_eq!(code, ExitCode::ChangesPending);

        session
            .execute(Commands::Update(ApplyArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                config: changed,
                state: state.clone(),
            }))
            .await
            .unwrap();
        let code = session
            .execute(Commands::Read(StateArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                state: state.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(code, ExitCode::Success);
        let refreshed = read_state(&state).unwrap();
        assert_eq!(refreshed.id(), "1");
        assert_eq!(refreshed.get_list("settings")[0]["reviewer_count"], json!(3));

        session
            .execute(Commands::Delete(StateArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                state: state.clone(),
            }))
            .await
            .unwrap();
        assert!(!state.exists());
        assert!(policy.configurations.lock().await.is_empty());
    }

    /// # Reading a Deleted Object
    ///
    /// Verifies the exit code when the remote object disappeared.
    ///
    /// ## Test Scenario
    /// - Reads a state file whose policy does not exist remotely
    ///
    /// ## Expected Outcome
    /// - ResourceGone is returned and the stored identifier is cleared
    #[tokio::test]
    async fn test_read_gone_object() {
        let dir = TempDir::new().unwrap();
        let (clients, _) = mock_clients();
        let mut session = Session::with_clients(clients);
        let state = write_json(
            &dir,
            "gone.state.json",
            &json!({"id": "7", "attributes": {"project_id": "proj"}}),
        );

        let code = session
            .execute(Commands::Read(StateArgs {
                resource_type: MIN_REVIEWERS.to_string(),
                state: state.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(code, ExitCode::ResourceGone);
        assert!(!read_state(&state).unwrap().exists());
    }

    /// # Import of a Missing Object
    ///
    /// Verifies that importing a non-existent object fails without writing state.
    ///
    /// ## Test Scenario
    /// - Imports `proj/99` against an empty store, then a malformed identifier
    ///
    /// ## Expected Outcome
    /// - Both imports fail and no state file is created
    #[tokio::test]
    async fn test_import_missing_object() {
        let dir = TempDir::new().unwrap();
        let (clients, _) = mock_clients();
        let mut session = Session::with_clients(clients);
        let state = dir.path().join("import.state.json");

        for id in ["proj/99", "proj"] {
            let result = session
                .execute(Commands::Import(ImportArgs {
                    resource_type: MIN_REVIEWERS.to_string(),
                    id: id.to_string(),
                    state: state.clone(),
                }))
                .await;
            assert!(result.is_err(), "import of {id} should fail");
        }
        assert!(!state.exists());
    }

    /// # Unknown Resource Types
    ///
    /// Verifies lookups of unregistered types.
    ///
    /// ## Test Scenario
    /// - Requests the schema and example of an unknown type
    ///
    /// ## Expected Outcome
    /// - Both commands fail with an unknown resource error
    #[tokio::test]
    async fn test_unknown_resource_type() {
        let (clients, _) = mock_clients();
        let mut session = Session::with_clients(clients);
        for command in [
            Commands::Schema(ResourceTypeArgs {
                resource_type: "azuredevops_project".to_string(),
            }),
            Commands::Example(ResourceTypeArgs {
                resource_type: "azuredevops_project".to_string(),
            }),
        ] {
            let err = session.execute(command).await.unwrap_err();
            assert!(err.to_string().contains("unknown resource type"));
        }
    }
}
