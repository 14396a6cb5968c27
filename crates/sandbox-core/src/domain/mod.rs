//! Domain models for sandbox provisioning.
//!
//! Canonical definitions for the core entities:
//! - `ResourceDetails`: Read-only inventory snapshot of one resource
//! - `DeployResultSet`: Per-resource outcome of the bulk deploy call
//! - `PipelineOutcome`: Terminal state of one resource pipeline
//! - `ReservationDetails`: The sandbox being set up

pub mod deploy;
pub mod error;
pub mod outcome;
pub mod reservation;
pub mod resource;

// Re-export main types and errors
pub use deploy::{DeployResult, DeployResultSet, InstallationDescriptor, ScriptInput};
pub use error::{ApiError, ApiResult, DeployFailure, ResourceFailure, Result, SandboxError};
pub use outcome::{OutcomeStatus, PipelineOutcome, Stage};
pub use reservation::{
    AppTemplate, Connector, ConnectorState, ReservationDetails, ReservedResource, ServiceInfo,
};
pub use resource::{AppLookup, ResourceDetails, ResourceSettings, VmDetails};
