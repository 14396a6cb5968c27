//! Sandbox provisioning CLI
//!
//! The `sandboxctl` command drives the deployment server and rehearses sandbox
//! setups against recorded snapshots.
//!
//! ## Commands
//!
//! - `environment`: Create or delete a deployment-server environment
//! - `lifecycle`: Create or delete a single-phase sandbox lifecycle
//! - `channel`: Create or delete a project channel
//! - `release`: Create, look up or deploy releases
//! - `task`: Wait for a deployment task to complete
//! - `rehearse`: Run a full reservation setup against a snapshot file

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deploy_server::model::Channel;
use deploy_server::{
    DeployServerClient, DeployServerConfig, DeploymentPoller, DeploymentTask, PollPolicy,
    ServerReleaseDeployment,
};
use sandbox_core::fakes::{MemorySandbox, SandboxSnapshot};
use sandbox_core::obs::reservation_span;
use sandbox_core::{
    OutcomeStatus, ReleaseDeployment, ReleaseRequest, SetupConfig, SetupReport, SetupSequencer,
};
use tracing::{info, Instrument, Level};

#[derive(Parser)]
#[command(name = "sandboxctl")]
#[command(author = "Stevedores Org")]
#[command(version = sandbox_core::VERSION)]
#[command(about = "Sandbox provisioning and release deployment", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Deployment server base URL
    #[arg(long, global = true, env = "DEPLOY_SERVER_URL")]
    server: Option<String>,

    /// Deployment server API key
    #[arg(long, global = true, env = "DEPLOY_SERVER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage deployment-server environments
    Environment {
        #[command(subcommand)]
        action: EnvironmentAction,
    },

    /// Manage lifecycles
    Lifecycle {
        #[command(subcommand)]
        action: LifecycleAction,
    },

    /// Manage project channels
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },

    /// Manage releases
    Release {
        #[command(subcommand)]
        action: ReleaseAction,
    },

    /// Inspect deployment tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Run a reservation setup against a recorded sandbox snapshot
    Rehearse {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Setup configuration file (JSON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run the release step against the deployment server
        #[arg(long)]
        release: bool,

        /// Print the setup report as JSON
        #[arg(long)]
        report_json: bool,
    },
}

#[derive(Subcommand)]
enum EnvironmentAction {
    /// Create an environment
    Create {
        #[arg(long)]
        name: String,
    },
    /// Delete an environment by name
    Delete {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum LifecycleAction {
    /// Create a lifecycle that deploys automatically to an environment
    Create {
        #[arg(long)]
        name: String,
        /// Environment targeted by the lifecycle's only phase
        #[arg(long)]
        environment: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a lifecycle by name
    Delete {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum ChannelAction {
    /// Create a channel on a project, bound to a lifecycle
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        lifecycle: String,
    },
    /// Delete a channel and every release on it
    Delete {
        #[arg(long)]
        project: String,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum ReleaseAction {
    /// Create the next release on a channel
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        channel: String,
    },
    /// Print the newest release on a channel
    Latest {
        #[arg(long)]
        project: String,
        #[arg(long)]
        channel: String,
    },
    /// Deploy a release version to an environment and wait for every deployment
    Deploy {
        #[arg(long)]
        project: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        version: String,
        #[arg(long)]
        environment: String,
        /// Lifecycle phase the environment is added to
        #[arg(long)]
        phase: String,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Poll a task until it completes; exits non-zero when it does not
    Wait {
        #[arg(long)]
        task_id: String,
        /// Number of status checks (default: DEPLOY_POLL_RETRIES or 20)
        #[arg(long)]
        retries: Option<u32>,
        /// Seconds between status checks (default: DEPLOY_POLL_INTERVAL_SECS or 30)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    sandbox_core::telemetry::init_tracing(cli.json, level);

    let config = server_config(cli.server.as_deref(), cli.api_key.as_deref());

    match cli.command {
        Commands::Environment { action } => {
            let client = connect(&config).await?;
            match action {
                EnvironmentAction::Create { name } => cmd_environment_create(&client, &name).await,
                EnvironmentAction::Delete { name } => cmd_environment_delete(&client, &name).await,
            }
        }
        Commands::Lifecycle { action } => {
            let client = connect(&config).await?;
            match action {
                LifecycleAction::Create {
                    name,
                    environment,
                    description,
                } => cmd_lifecycle_create(&client, &name, &environment, &description).await,
                LifecycleAction::Delete { name } => cmd_lifecycle_delete(&client, &name).await,
            }
        }
        Commands::Channel { action } => {
            let client = connect(&config).await?;
            match action {
                ChannelAction::Create {
                    project,
                    name,
                    lifecycle,
                } => cmd_channel_create(&client, &project, &name, &lifecycle).await,
                ChannelAction::Delete { project, name } => {
                    cmd_channel_delete(&client, &project, &name).await
                }
            }
        }
        Commands::Release { action } => match action {
            ReleaseAction::Create { project, channel } => {
                let client = connect(&config).await?;
                cmd_release_create(&client, &project, &channel).await
            }
            ReleaseAction::Latest { project, channel } => {
                let client = connect(&config).await?;
                cmd_release_latest(&client, &project, &channel).await
            }
            ReleaseAction::Deploy {
                project,
                channel,
                version,
                environment,
                phase,
            } => {
                let request = ReleaseRequest {
                    project_name: project,
                    channel_name: channel,
                    release_version: version,
                    phase_name: phase,
                    environment_name: environment,
                };
                cmd_release_deploy(&config, &request).await
            }
        },
        Commands::Task { action } => match action {
            TaskAction::Wait {
                task_id,
                retries,
                interval,
            } => {
                let policy = poll_policy(config.task_poll, retries, interval);
                cmd_task_wait(&config, &task_id, policy).await
            }
        },
        Commands::Rehearse {
            snapshot,
            config: setup_config,
            release,
            report_json,
        } => {
            let release = if release {
                let client = Arc::new(connect(&config).await?);
                Some(Arc::new(ServerReleaseDeployment::new(client, config.release_poll))
                    as Arc<dyn ReleaseDeployment>)
            } else {
                None
            };
            cmd_rehearse(&snapshot, setup_config.as_deref(), release, report_json).await
        }
    }
}

fn server_config(server: Option<&str>, api_key: Option<&str>) -> DeployServerConfig {
    let mut config = DeployServerConfig::from_env();
    if let Some(url) = server {
        config.server_url = url.to_string();
    }
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }
    config
}

fn poll_policy(base: PollPolicy, retries: Option<u32>, interval: Option<u64>) -> PollPolicy {
    PollPolicy::new(
        retries.unwrap_or(base.max_retries),
        interval.map(Duration::from_secs).unwrap_or(base.interval),
    )
}

async fn connect(config: &DeployServerConfig) -> Result<DeployServerClient> {
    DeployServerClient::connect(config)
        .await
        .with_context(|| format!("failed to connect to {}", config.server_url))
}

async fn cmd_environment_create(client: &DeployServerClient, name: &str) -> Result<()> {
    let environment = client
        .create_environment(name)
        .await
        .context("create environment failed")?;
    println!(
        "Created environment {} ({})",
        environment.name,
        environment.id.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn cmd_environment_delete(client: &DeployServerClient, name: &str) -> Result<()> {
    client
        .delete_environment_by_name(name)
        .await
        .context("delete environment failed")?;
    println!("Deleted environment {name}");
    Ok(())
}

async fn cmd_lifecycle_create(
    client: &DeployServerClient,
    name: &str,
    environment: &str,
    description: &str,
) -> Result<()> {
    let environment = client
        .find_environment_by_name(environment)
        .await
        .context("environment lookup failed")?;
    let environment_id = environment
        .id
        .with_context(|| format!("environment {} has no id", environment.name))?;
    let lifecycle = client
        .create_lifecycle(name, description, &environment_id)
        .await
        .context("create lifecycle failed")?;
    println!(
        "Created lifecycle {} ({})",
        lifecycle.name,
        lifecycle.id.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn cmd_lifecycle_delete(client: &DeployServerClient, name: &str) -> Result<()> {
    let lifecycle = client
        .find_lifecycle_by_name(name)
        .await
        .context("lifecycle lookup failed")?;
    let id = lifecycle
        .id
        .with_context(|| format!("lifecycle {name} has no id"))?;
    client
        .delete_lifecycle(&id)
        .await
        .context("delete lifecycle failed")?;
    println!("Deleted lifecycle {name}");
    Ok(())
}

async fn cmd_channel_create(
    client: &DeployServerClient,
    project: &str,
    name: &str,
    lifecycle: &str,
) -> Result<()> {
    let project = client
        .find_project_by_name(project)
        .await
        .context("project lookup failed")?;
    let lifecycle_id = client
        .find_lifecycle_by_name(lifecycle)
        .await
        .context("lifecycle lookup failed")?
        .id
        .with_context(|| format!("lifecycle {lifecycle} has no id"))?;
    let channel = client
        .create_channel(&Channel::new(name, &project.id, lifecycle_id))
        .await
        .context("create channel failed")?;
    println!("Created channel {} on {}", channel.name, project.name);
    Ok(())
}

async fn cmd_channel_delete(
    client: &DeployServerClient,
    project: &str,
    name: &str,
) -> Result<()> {
    let (_, channel_id) = resolve_channel(client, project, name).await?;
    client
        .delete_channel(&channel_id)
        .await
        .context("delete channel failed")?;
    println!("Deleted channel {name} and its releases");
    Ok(())
}

/// Project id and channel id for a channel named on a project.
async fn resolve_channel(
    client: &DeployServerClient,
    project: &str,
    channel: &str,
) -> Result<(String, String)> {
    let project = client
        .find_project_by_name(project)
        .await
        .context("project lookup failed")?;
    let channel_id = client
        .find_channel_on_project(&project.id, channel)
        .await
        .context("channel lookup failed")?
        .id
        .with_context(|| format!("channel {channel} has no id"))?;
    Ok((project.id, channel_id))
}

async fn cmd_release_create(
    client: &DeployServerClient,
    project: &str,
    channel: &str,
) -> Result<()> {
    let (project_id, channel_id) = resolve_channel(client, project, channel).await?;
    let release = client
        .create_channel_release(&project_id, &channel_id)
        .await
        .context("create release failed")?;
    println!("Created release {} on {channel}", release.version);
    Ok(())
}

async fn cmd_release_latest(
    client: &DeployServerClient,
    project: &str,
    channel: &str,
) -> Result<()> {
    println!("{}", latest_release_version(client, project, channel).await?);
    Ok(())
}

async fn latest_release_version(
    client: &DeployServerClient,
    project: &str,
    channel: &str,
) -> Result<String> {
    let (_, channel_id) = resolve_channel(client, project, channel).await?;
    let release = client
        .latest_channel_release(&channel_id)
        .await
        .context("latest release lookup failed")?;
    Ok(release.version)
}

async fn cmd_release_deploy(config: &DeployServerConfig, request: &ReleaseRequest) -> Result<()> {
    let client = Arc::new(connect(config).await?);
    let deployment = ServerReleaseDeployment::new(client, config.release_poll);
    deployment
        .deploy_release(request)
        .await
        .with_context(|| format!("could not deploy {}", request.project_name))?;
    println!(
        "Deployed {} - {} to {}",
        request.project_name, request.release_version, request.environment_name
    );
    Ok(())
}

async fn cmd_task_wait(config: &DeployServerConfig, task_id: &str, policy: PollPolicy) -> Result<()> {
    let client = connect(config).await?;
    let poller = DeploymentPoller::new(client);
    info!(task_id, retries = policy.max_retries, "waiting for task");
    if !poller
        .wait_for_completion(&DeploymentTask::new(task_id), policy)
        .await
    {
        bail!(
            "task {task_id} did not complete after {} checks",
            policy.max_retries
        );
    }
    println!("Task {task_id} completed");
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<SandboxSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid snapshot {}", path.display()))
}

fn load_setup_config(path: Option<&Path>) -> Result<SetupConfig> {
    let Some(path) = path else {
        return Ok(SetupConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Run a setup against a snapshot and print the transcript.
async fn cmd_rehearse(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    release: Option<Arc<dyn ReleaseDeployment>>,
    report_json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let config = load_setup_config(config_path)?;
    let reservation_id = snapshot.reservation.id.clone();
    let sandbox = Arc::new(MemorySandbox::from_snapshot(snapshot));

    let (result, messages) = rehearse(Arc::clone(&sandbox), &reservation_id, config, release).await;

    for message in &messages {
        println!("{message}");
    }
    let report = result.context("reservation setup failed")?;
    if report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_outcomes(&report);
    }
    Ok(())
}

async fn rehearse(
    sandbox: Arc<MemorySandbox>,
    reservation_id: &str,
    config: SetupConfig,
    release: Option<Arc<dyn ReleaseDeployment>>,
) -> (sandbox_core::Result<SetupReport>, Vec<String>) {
    let mut sequencer =
        SetupSequencer::new(reservation_id, Arc::clone(&sandbox)).with_config(config);
    if let Some(release) = release {
        sequencer = sequencer.with_release(release);
    }
    let result = sequencer
        .run()
        .instrument(reservation_span(reservation_id))
        .await;
    (result, sandbox.messages())
}

fn print_outcomes(report: &SetupReport) {
    println!();
    println!("{:<24} STATUS", "RESOURCE");
    for outcome in &report.outcomes {
        let status = match outcome.status {
            OutcomeStatus::Installed => "installed".to_string(),
            OutcomeStatus::NoInstallStep => "ready (no install step)".to_string(),
            OutcomeStatus::NoDeployRecord => "ready (no deploy record)".to_string(),
            OutcomeStatus::NotApplicable => "skipped (not a deployed app)".to_string(),
            OutcomeStatus::Failed(stage) => format!("failed at {stage}"),
            OutcomeStatus::Aborted => "aborted".to_string(),
        };
        println!("{:<24} {status}", outcome.resource);
    }
    if let Some(environment) = &report.environment_name {
        println!("environment: {environment}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_core::sequencer::SETUP_FINISHED;
    use serde_json::json;
    use tracing_test::traced_test;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SNAPSHOT: &str = r#"{
        "reservation": {
            "id": "res-42",
            "name": "Rehearsal",
            "apps": [{"name": "web"}]
        },
        "reservation_after_deploy": {
            "id": "res-42",
            "name": "Rehearsal",
            "apps": [{"name": "web"}],
            "resources": [{"name": "web-1", "created_in_reservation": "res-42"}]
        },
        "resources": [{"name": "web-1", "vm_details": {"uid": "vm-1"}}],
        "deploy_results": [{
            "success": true,
            "logical_resource_name": "web-1",
            "installation": {"script_name": "install.sh", "script_inputs": []}
        }]
    }"#;

    fn write_snapshot(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_cli_parses_task_wait() {
        let cli = Cli::try_parse_from([
            "sandboxctl",
            "--server",
            "http://octo.local",
            "task",
            "wait",
            "--task-id",
            "ServerTasks-5",
            "--retries",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://octo.local"));
        match cli.command {
            Commands::Task {
                action: TaskAction::Wait {
                    task_id, retries, ..
                },
            } => {
                assert_eq!(task_id, "ServerTasks-5");
                assert_eq!(retries, Some(3));
            }
            _ => panic!("expected task wait"),
        }
    }

    #[test]
    fn test_cli_parses_lifecycle_create_without_description() {
        let cli = Cli::try_parse_from([
            "sandboxctl",
            "lifecycle",
            "create",
            "--name",
            "Sandbox r1",
            "--environment",
            "Lab - r1",
        ])
        .unwrap();
        match cli.command {
            Commands::Lifecycle {
                action:
                    LifecycleAction::Create {
                        name,
                        environment,
                        description,
                    },
            } => {
                assert_eq!(name, "Sandbox r1");
                assert_eq!(environment, "Lab - r1");
                assert!(description.is_empty());
            }
            _ => panic!("expected lifecycle create"),
        }
    }

    #[test]
    fn test_cli_channel_create_requires_lifecycle() {
        let parsed = Cli::try_parse_from([
            "sandboxctl",
            "channel",
            "create",
            "--project",
            "Shop",
            "--name",
            "sandbox",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_parses_release_latest() {
        let cli = Cli::try_parse_from([
            "sandboxctl",
            "release",
            "latest",
            "--project",
            "Shop",
            "--channel",
            "sandbox",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Release {
                action: ReleaseAction::Latest { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_latest_release_version_resolves_channel_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/all"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"Id": "Projects-1", "Name": "Shop"}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects/Projects-1/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [{"Id": "Channels-3", "Name": "sandbox", "ProjectId": "Projects-1"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/channels/Channels-3/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    {"Id": "Releases-9", "Version": "1.4", "ProjectId": "Projects-1"},
                    {"Id": "Releases-8", "Version": "1.3", "ProjectId": "Projects-1"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            DeployServerClient::new(&DeployServerConfig::new(&server.uri(), "API-X")).unwrap();
        let version = latest_release_version(&client, "Shop", "sandbox").await.unwrap();
        assert_eq!(version, "1.4");
    }

    #[tokio::test]
    async fn test_unknown_channel_fails_release_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/all"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"Id": "Projects-1", "Name": "Shop"}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects/Projects-1/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": []})))
            .mount(&server)
            .await;

        let client =
            DeployServerClient::new(&DeployServerConfig::new(&server.uri(), "API-X")).unwrap();
        let err = latest_release_version(&client, "Shop", "nightly")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("channel lookup failed"));
    }

    #[test]
    fn test_poll_policy_overrides() {
        let base = PollPolicy::task_default();
        let policy = poll_policy(base, None, Some(5));
        assert_eq!(policy.max_retries, base.max_retries);
        assert_eq!(policy.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_server_config_flags_win() {
        let config = server_config(Some("http://octo.local"), Some("API-X"));
        assert_eq!(config.server_url, "http://octo.local");
        assert_eq!(config.api_key, "API-X");
    }

    #[tokio::test]
    async fn test_rehearse_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, SNAPSHOT);
        let snapshot = load_snapshot(&path).unwrap();
        let sandbox = Arc::new(MemorySandbox::from_snapshot(snapshot));

        let (result, messages) =
            rehearse(Arc::clone(&sandbox), "res-42", SetupConfig::default(), None).await;

        let report = result.unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Installed);
        assert_eq!(messages.last().map(String::as_str), Some(SETUP_FINISHED));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_rehearse_runs_inside_reservation_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, SNAPSHOT);
        let sandbox = Arc::new(MemorySandbox::from_snapshot(load_snapshot(&path).unwrap()));

        let (result, _) = rehearse(sandbox, "res-42", SetupConfig::default(), None).await;

        assert!(result.is_ok());
        assert!(logs_contain("sandbox.setup{reservation_id=res-42}"));
        assert!(logs_contain("reservation setup started"));
    }

    #[tokio::test]
    async fn test_rehearse_reports_injected_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut snapshot: serde_json::Value = serde_json::from_str(SNAPSHOT).unwrap();
        snapshot["failures"] = serde_json::json!([
            {"resource": "web-1", "action": "install", "message": "exit 1"}
        ]);
        let path = write_snapshot(&dir, &snapshot.to_string());

        let err = cmd_rehearse(&path, None, None, false).await.unwrap_err();

        assert!(format!("{err:#}").contains("exit 1"));
    }

    #[test]
    fn test_invalid_snapshot_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&dir, "{not json");

        let err = load_snapshot(&path).unwrap_err();

        assert!(err.to_string().contains("invalid snapshot"));
    }

    #[test]
    fn test_setup_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");
        std::fs::write(&path, r#"{"release_service_name": "Octo"}"#).unwrap();

        let config = load_setup_config(Some(&path)).unwrap();

        assert_eq!(config.release_service_name, "Octo");
        assert_eq!(config.environment_name_limit, 50);
    }
}
