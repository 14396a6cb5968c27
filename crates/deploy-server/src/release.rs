//! [`ReleaseDeployment`] backed by the deployment server.

use std::sync::Arc;

use async_trait::async_trait;
use sandbox_core::{ReleaseDeployment, ReleaseRequest};
use tracing::{info, instrument};

use crate::client::DeployServerClient;
use crate::config::PollPolicy;
use crate::error::{DeployServerError, Result};
use crate::poller::DeploymentPoller;

pub struct ServerReleaseDeployment {
    client: Arc<DeployServerClient>,
    release_poll: PollPolicy,
}

impl ServerReleaseDeployment {
    pub fn new(client: Arc<DeployServerClient>, release_poll: PollPolicy) -> Self {
        Self {
            client,
            release_poll,
        }
    }

    #[instrument(skip_all, fields(environment = %environment_name))]
    async fn ensure_environment(&self, environment_name: &str) -> Result<()> {
        if self.client.environment_exists(environment_name).await? {
            info!("environment already exists");
            return Ok(());
        }
        let environment = self.client.create_environment(environment_name).await?;
        info!(environment_id = ?environment.id, "environment created");
        Ok(())
    }

    #[instrument(skip_all, fields(project = %request.project_name, version = %request.release_version))]
    async fn deploy(&self, request: &ReleaseRequest) -> Result<()> {
        let client = &self.client;

        let project = client.find_project_by_name(&request.project_name).await?;
        let channel = client
            .find_channel_on_project(&project.id, &request.channel_name)
            .await?;
        let lifecycle_id = channel
            .lifecycle_id
            .as_deref()
            .ok_or_else(|| DeployServerError::not_found("Lifecycle", &request.channel_name))?;
        let environment = client
            .find_environment_by_name(&request.environment_name)
            .await?;
        let environment_id = environment
            .id
            .ok_or_else(|| DeployServerError::not_found("Environment", &request.environment_name))?;

        client
            .add_environment_to_lifecycle_phase(&environment_id, lifecycle_id, &request.phase_name)
            .await?;

        let release = client
            .find_release_by_version(&project.id, &request.release_version)
            .await?;
        let release_id = release
            .id
            .ok_or_else(|| DeployServerError::not_found("Release", &request.release_version))?;

        let task = client.deploy_release(&release_id, &environment_id).await?;
        DeploymentPoller::new(Arc::clone(client))
            .wait_for_release_deployments(&task, self.release_poll)
            .await?;

        info!(
            environment = %request.environment_name,
            "deployed {} - {} to {}",
            request.project_name, request.release_version, request.environment_name
        );
        Ok(())
    }
}

#[async_trait]
impl ReleaseDeployment for ServerReleaseDeployment {
    async fn prepare_environment(&self, environment_name: &str) -> sandbox_core::Result<()> {
        Ok(self.ensure_environment(environment_name).await?)
    }

    async fn deploy_release(&self, request: &ReleaseRequest) -> sandbox_core::Result<()> {
        Ok(self.deploy(request).await?)
    }
}
