//! Deployment-server error types

use sandbox_core::SandboxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployServerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not reach {url}, please check if the server is accessible")]
    Unreachable { url: String },

    /// The server answered with a non-2xx status.
    #[error("failed to {action}; status {status}: {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },

    #[error("{kind} named {name} was not found on the deployment server")]
    NotFound { kind: &'static str, name: String },

    #[error("channel {channel_id} has no releases")]
    NoReleases { channel_id: String },

    #[error("resource has no {0} link")]
    MissingLink(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("timeout after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl DeployServerError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        DeployServerError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<DeployServerError> for SandboxError {
    fn from(err: DeployServerError) -> Self {
        SandboxError::release(err)
    }
}

pub type Result<T> = std::result::Result<T, DeployServerError>;
