//! Deployment-server integration
//!
//! Provides the HTTP client for the external deployment server, the task
//! poller, and the [`sandbox_core::ReleaseDeployment`] implementation used by
//! the setup sequencer.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod release;

pub use client::DeployServerClient;
pub use config::{DeployServerConfig, PollPolicy};
pub use error::{DeployServerError, Result};
pub use model::{DeploymentTask, TaskStatus};
pub use poller::{DeploymentPoller, TaskStatusSource};
pub use release::ServerReleaseDeployment;
