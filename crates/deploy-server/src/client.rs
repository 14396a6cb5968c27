//! HTTP client for the deployment server.
//!
//! Every request carries the API key as the `ApiKey` query parameter. Any
//! non-2xx answer becomes [`DeployServerError::Status`] with the response text.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DeployServerConfig;
use crate::error::{DeployServerError, Result};
use crate::model::{
    Channel, Collection, DeploymentRequest, DeploymentTask, Environment, Lifecycle, Machine,
    Project, Release, TaskStatus,
};

pub struct DeployServerClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl DeployServerClient {
    pub fn new(config: &DeployServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sandbox-deploy-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    /// Build a client and check that the server answers.
    pub async fn connect(config: &DeployServerConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let reachable = match client.http.get(&client.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "deployment server connection check failed");
                false
            }
        };
        if !reachable {
            return Err(DeployServerError::Unreachable {
                url: client.base_url.clone(),
            });
        }
        info!(url = %client.base_url, "connected to deployment server");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Environments
    // -----------------------------------------------------------------------

    pub async fn create_environment(&self, name: &str) -> Result<Environment> {
        self.send_json(
            Method::POST,
            "/api/environments",
            &Environment::named(name),
            "create environment",
        )
        .await
    }

    pub async fn find_environment_by_name(&self, name: &str) -> Result<Environment> {
        let all: Vec<Environment> = self
            .get("/api/environments/all", "list environments")
            .await?;
        all.into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DeployServerError::not_found("Environment", name))
    }

    pub async fn environment_exists(&self, name: &str) -> Result<bool> {
        match self.find_environment_by_name(name).await {
            Ok(_) => Ok(true),
            Err(DeployServerError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_environment(&self, environment_id: &str) -> Result<()> {
        self.delete(
            &format!("/api/environments/{environment_id}"),
            "delete environment",
        )
        .await
    }

    pub async fn delete_environment_by_name(&self, name: &str) -> Result<()> {
        let environment = self.find_environment_by_name(name).await?;
        let id = environment
            .id
            .ok_or_else(|| DeployServerError::not_found("Environment", name))?;
        self.delete_environment(&id).await
    }

    // -----------------------------------------------------------------------
    // Machines
    // -----------------------------------------------------------------------

    pub async fn create_machine(&self, machine: &Machine) -> Result<Machine> {
        self.send_json(Method::POST, "/api/machines", machine, "create machine")
            .await
    }

    pub async fn find_machine_by_name(&self, name: &str) -> Result<Machine> {
        let all: Vec<Machine> = self.get("/api/machines/all", "list machines").await?;
        all.into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| DeployServerError::not_found("Machine", name))
    }

    pub async fn delete_machine(&self, machine_id: &str) -> Result<()> {
        self.delete(&format!("/api/machines/{machine_id}"), "delete machine")
            .await
    }

    /// Attach an existing machine to an environment, adding `roles`.
    pub async fn add_machine_to_environment(
        &self,
        machine_id: &str,
        environment_id: &str,
        roles: &[String],
    ) -> Result<Machine> {
        let path = format!("/api/machines/{machine_id}");
        let mut machine: Machine = self.get(&path, "get machine").await?;
        if !machine.environment_ids.iter().any(|id| id == environment_id) {
            machine.environment_ids.push(environment_id.to_string());
        }
        for role in roles {
            if !machine.roles.contains(role) {
                machine.roles.push(role.clone());
            }
        }
        self.send_json(Method::PUT, &path, &machine, "add machine to environment")
            .await
    }

    /// Detach a machine from an environment. A machine must stay in at least
    /// one environment.
    pub async fn remove_machine_from_environment(
        &self,
        machine_id: &str,
        environment_id: &str,
    ) -> Result<Machine> {
        let path = format!("/api/machines/{machine_id}");
        let mut machine: Machine = self.get(&path, "get machine").await?;
        if machine.environment_ids == [environment_id] {
            return Err(DeployServerError::Conflict(format!(
                "could not remove {} from {environment_id}, it is the last environment the machine is associated with",
                machine.name
            )));
        }
        machine.environment_ids.retain(|id| id != environment_id);
        self.send_json(Method::PUT, &path, &machine, "remove machine from environment")
            .await
    }

    // -----------------------------------------------------------------------
    // Projects, channels and lifecycles
    // -----------------------------------------------------------------------

    pub async fn find_project_by_name(&self, name: &str) -> Result<Project> {
        let all: Vec<Project> = self.get("/api/projects/all", "list projects").await?;
        all.into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DeployServerError::not_found("Project", name))
    }

    pub async fn find_channel_on_project(&self, project_id: &str, name: &str) -> Result<Channel> {
        let channels: Collection<Channel> = self
            .get(
                &format!("/api/projects/{project_id}/channels"),
                "list project channels",
            )
            .await?;
        channels
            .items
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DeployServerError::not_found("Channel", name))
    }

    pub async fn create_channel(&self, channel: &Channel) -> Result<Channel> {
        self.send_json(Method::POST, "/api/channels", channel, "create channel")
            .await
    }

    /// Delete a channel together with every release it holds.
    pub async fn delete_channel(&self, channel_id: &str) -> Result<()> {
        let releases: Collection<Release> = self
            .get(
                &format!("/api/channels/{channel_id}/releases"),
                "get channel releases",
            )
            .await?;
        for release in releases.items {
            if let Some(id) = release.id {
                self.delete_release(&id).await?;
            }
        }
        self.delete(&format!("/api/channels/{channel_id}"), "delete channel")
            .await
    }

    pub async fn get_lifecycle(&self, lifecycle_id: &str) -> Result<Lifecycle> {
        self.get(&format!("/api/lifecycles/{lifecycle_id}"), "get lifecycle")
            .await
    }

    /// Create a lifecycle whose single phase deploys automatically to
    /// `environment_id`.
    pub async fn create_lifecycle(
        &self,
        name: &str,
        description: &str,
        environment_id: &str,
    ) -> Result<Lifecycle> {
        let lifecycle = Lifecycle::single_phase(name, description, environment_id);
        let created: Lifecycle = self
            .send_json(Method::POST, "/api/lifecycles", &lifecycle, "create lifecycle")
            .await?;
        info!(lifecycle_id = ?created.id, name, "lifecycle created");
        Ok(created)
    }

    pub async fn delete_lifecycle(&self, lifecycle_id: &str) -> Result<()> {
        self.delete(&format!("/api/lifecycles/{lifecycle_id}"), "delete lifecycle")
            .await
    }

    pub async fn find_lifecycle_by_name(&self, name: &str) -> Result<Lifecycle> {
        let all: Vec<Lifecycle> = self.get("/api/lifecycles/all", "list lifecycles").await?;
        all.into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| DeployServerError::not_found("Lifecycle", name))
    }

    /// Make `environment_id` an optional deployment target of `phase_name`.
    /// Fields of the lifecycle this client does not model are written back
    /// unchanged.
    pub async fn add_environment_to_lifecycle_phase(
        &self,
        environment_id: &str,
        lifecycle_id: &str,
        phase_name: &str,
    ) -> Result<Lifecycle> {
        let mut lifecycle = self.get_lifecycle(lifecycle_id).await?;
        let phase = lifecycle
            .phase_mut(phase_name)
            .ok_or_else(|| DeployServerError::not_found("Phase", phase_name))?;
        if phase.targets(environment_id) {
            debug!(phase = %phase_name, environment_id, "environment already targeted by phase");
            return Ok(lifecycle);
        }
        phase
            .optional_deployment_targets
            .push(environment_id.to_string());
        self.send_json(
            Method::PUT,
            &format!("/api/lifecycles/{lifecycle_id}"),
            &lifecycle,
            "update lifecycle",
        )
        .await
    }

    pub async fn remove_environment_from_lifecycle_phase(
        &self,
        environment_id: &str,
        lifecycle_id: &str,
        phase_name: &str,
    ) -> Result<Lifecycle> {
        let mut lifecycle = self.get_lifecycle(lifecycle_id).await?;
        let phase = lifecycle
            .phase_mut(phase_name)
            .ok_or_else(|| DeployServerError::not_found("Phase", phase_name))?;
        phase
            .optional_deployment_targets
            .retain(|id| id != environment_id);
        self.send_json(
            Method::PUT,
            &format!("/api/lifecycles/{lifecycle_id}"),
            &lifecycle,
            "update lifecycle",
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Releases and deployments
    // -----------------------------------------------------------------------

    pub async fn create_release(&self, release: &Release) -> Result<Release> {
        self.send_json(Method::POST, "/api/releases", release, "create release")
            .await
    }

    pub async fn find_release_by_version(&self, project_id: &str, version: &str) -> Result<Release> {
        let response = self
            .request(
                Method::GET,
                &format!("/api/projects/{project_id}/releases/{version}"),
            )
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DeployServerError::not_found("Release", version));
        }
        Ok(check(response, "get release").await?.json().await?)
    }

    /// Create the next release on a channel; the server assigns the version.
    pub async fn create_channel_release(
        &self,
        project_id: &str,
        channel_id: &str,
    ) -> Result<Release> {
        let release = Release::next_on_channel(project_id, channel_id, "Sandbox release");
        self.create_release(&release).await
    }

    /// Newest release on a channel. The server lists channel releases newest
    /// first.
    pub async fn latest_channel_release(&self, channel_id: &str) -> Result<Release> {
        let releases: Collection<Release> = self
            .get(
                &format!("/api/channels/{channel_id}/releases"),
                "get channel releases",
            )
            .await?;
        releases
            .items
            .into_iter()
            .next()
            .ok_or_else(|| DeployServerError::NoReleases {
                channel_id: channel_id.to_string(),
            })
    }

    pub async fn delete_release(&self, release_id: &str) -> Result<()> {
        self.delete(&format!("/api/releases/{release_id}"), "delete release")
            .await
    }

    pub async fn deploy_release(
        &self,
        release_id: &str,
        environment_id: &str,
    ) -> Result<DeploymentTask> {
        let request = DeploymentRequest {
            release_id: release_id.to_string(),
            environment_id: environment_id.to_string(),
        };
        let task: DeploymentTask = self
            .send_json(Method::POST, "/api/deployments", &request, "deploy release")
            .await?;
        info!(task_id = %task.task_id, release_id, environment_id, "release deployment queued");
        Ok(task)
    }

    /// Every deployment under a release link.
    pub async fn list_release_deployments(&self, release_path: &str) -> Result<Vec<DeploymentTask>> {
        let deployments: Collection<DeploymentTask> = self
            .get(
                &format!("{release_path}/deployments"),
                "get release deployments",
            )
            .await?;
        Ok(deployments.items)
    }

    pub async fn get_task_status(&self, task_path: &str) -> Result<TaskStatus> {
        self.get(task_path, "get task status").await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .query(&[("ApiKey", self.api_key.as_str())])
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, action: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(check(response, action).await?.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B, action: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path).json(body).send().await?;
        Ok(check(response, action).await?.json().await?)
    }

    async fn delete(&self, path: &str, action: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        check(response, action).await?;
        Ok(())
    }
}

async fn check(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeployServerError::Status {
        action: action.to_string(),
        status: status.as_u16(),
        body,
    })
}
