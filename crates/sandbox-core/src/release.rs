//! Release deployment seam used by the setup sequencer.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ReleaseInputNames;
use crate::domain::{Result, SandboxError};

/// What to deploy, and where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub project_name: String,
    pub channel_name: String,
    pub release_version: String,
    pub phase_name: String,
    pub environment_name: String,
}

impl ReleaseRequest {
    /// Build a request from reservation global inputs.
    pub fn from_inputs(
        inputs: &HashMap<String, String>,
        names: &ReleaseInputNames,
        environment_name: impl Into<String>,
    ) -> Result<Self> {
        let read = |name: &str| {
            inputs
                .get(name)
                .cloned()
                .ok_or_else(|| SandboxError::MissingInput(name.to_string()))
        };
        Ok(Self {
            project_name: read(&names.project)?,
            channel_name: read(&names.channel)?,
            release_version: read(&names.version)?,
            phase_name: read(&names.phase)?,
            environment_name: environment_name.into(),
        })
    }
}

#[async_trait]
pub trait ReleaseDeployment: Send + Sync {
    /// Make sure an environment named `environment_name` exists.
    async fn prepare_environment(&self, environment_name: &str) -> Result<()>;

    /// Deploy a release and wait until every resulting deployment completes.
    async fn deploy_release(&self, request: &ReleaseRequest) -> Result<()>;
}
