//! Wire types of the deployment-server REST API.
//!
//! Field names are PascalCase on the wire. Types that the client reads, edits
//! and writes back keep every unknown field in `extra` so a PUT never drops
//! server-side data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paged collection wrapper (`{"Items": [...]}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Environment {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Machine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub environment_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub lifecycle_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        project_id: impl Into<String>,
        lifecycle_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            lifecycle_id: Some(lifecycle_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub automatic_deployment_targets: Vec<String>,
    #[serde(default)]
    pub optional_deployment_targets: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Phase {
    pub fn targets(&self, environment_id: &str) -> bool {
        self.automatic_deployment_targets
            .iter()
            .chain(&self.optional_deployment_targets)
            .any(|id| id == environment_id)
    }
}

/// Name of the only phase of a lifecycle created for a sandbox.
pub const SANDBOX_PHASE: &str = "Sandbox Phase";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Lifecycle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lifecycle {
    /// Lifecycle with a single [`SANDBOX_PHASE`] that deploys automatically to
    /// `environment_id`.
    pub fn single_phase(
        name: impl Into<String>,
        description: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            phases: vec![Phase {
                name: SANDBOX_PHASE.to_string(),
                automatic_deployment_targets: vec![environment_id.into()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.name == name)
    }
}

/// Version pattern that makes the server increment the last release version.
pub const NEXT_VERSION: &str = "1.i";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Release {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub version: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Release {
    /// Next release on a channel, versioned by the server from [`NEXT_VERSION`].
    pub fn next_on_channel(
        project_id: impl Into<String>,
        channel_id: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            version: NEXT_VERSION.to_string(),
            project_id: project_id.into(),
            channel_id: Some(channel_id.into()),
            release_notes: Some(notes.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentRequest {
    pub release_id: String,
    pub environment_id: String,
}

/// Handle returned by the server for an asynchronous deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentTask {
    #[serde(default)]
    pub id: Option<String>,
    pub task_id: String,
    #[serde(default)]
    pub links: HashMap<String, String>,
}

impl DeploymentTask {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.links.insert(rel.to_string(), href.into());
        self
    }

    /// Path of the task status resource. Falls back to the task id when the
    /// server sent no `Task` link.
    pub fn task_path(&self) -> String {
        self.links
            .get("Task")
            .cloned()
            .unwrap_or_else(|| format!("/api/tasks/{}", self.task_id))
    }

    pub fn release_path(&self) -> Option<&str> {
        self.links.get("Release").map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TaskStatus {
    pub is_completed: bool,
    #[serde(default)]
    pub state: Option<String>,
}

impl TaskStatus {
    pub fn completed() -> Self {
        Self {
            is_completed: true,
            state: Some("Success".to_string()),
        }
    }

    pub fn running() -> Self {
        Self {
            is_completed: false,
            state: Some("Executing".to_string()),
        }
    }
}
