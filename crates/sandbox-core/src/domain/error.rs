//! Error taxonomy for sandbox provisioning.

use std::fmt;

use crate::domain::outcome::Stage;

/// Errors returned by the external collaborators (inventory, actions, install,
/// notifications, reservation API).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The remote system rejected the call. `code` is the remote error code when
    /// the collaborator reports one.
    #[error("remote error{}: {message}", .code.as_deref().map(|c| format!(" {c}")).unwrap_or_default())]
    Remote {
        code: Option<String>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource driver does not implement the requested command.
    #[error("command {command} is not available on the resource driver")]
    MissingCommand { command: String },
}

impl ApiError {
    pub fn remote(message: impl Into<String>) -> Self {
        ApiError::Remote {
            code: None,
            message: message.into(),
        }
    }

    pub fn remote_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Remote {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Remote error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Remote { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Remote { message, .. } => message,
            ApiError::Transport(message) | ApiError::NotFound(message) => message,
            ApiError::MissingCommand { command } => command,
        }
    }

    pub fn missing_command(command: impl Into<String>) -> Self {
        ApiError::MissingCommand {
            command: command.into(),
        }
    }
}

/// Result type for collaborator calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// One resource that did not reach the end of its pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    pub resource: String,
    /// Stage the pipeline halted at; `None` when the pipeline task aborted.
    pub stage: Option<Stage>,
    pub message: String,
}

/// One deploy attempt that reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployFailure {
    pub resource: String,
    pub error: String,
}

/// Wrapper that renders a failure list as a single "; "-joined line.
pub struct FailureList<'a, T>(pub &'a [T]);

impl fmt::Display for FailureList<'_, ResourceFailure> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&failure.message)?;
        }
        Ok(())
    }
}

impl fmt::Display for FailureList<'_, DeployFailure> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", failure.resource, failure.error)?;
        }
        Ok(())
    }
}

/// Sandbox setup errors.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// At least one resource pipeline failed. Raised only after every pipeline
    /// has reached its own terminal state.
    #[error("reservation is active with errors - {}", FailureList(.failures.as_slice()))]
    ProvisioningFailed { failures: Vec<ResourceFailure> },

    /// At least one resource failed to deploy and therefore never entered a
    /// pipeline.
    #[error("reservation is active with errors - {}", FailureList(.failures.as_slice()))]
    DeployFailed { failures: Vec<DeployFailure> },

    #[error("{step} failed: {source}")]
    Collaborator {
        step: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("missing reservation input: {0}")]
    MissingInput(String),

    #[error("release deployment failed: {0}")]
    Release(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SandboxError {
    /// Attach the setup step name to a collaborator error.
    pub fn collaborator(step: &'static str) -> impl FnOnce(ApiError) -> SandboxError {
        move |source| SandboxError::Collaborator { step, source }
    }

    pub fn release(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        SandboxError::Release(source.into())
    }
}

/// Result type for sandbox setup operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
