//! Sandbox provisioning core
//!
//! Re-exports the setup sequencer, the provisioning orchestrator and the
//! collaborator traits they drive.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod pipeline;
pub mod release;
pub mod sequencer;
pub mod status_gate;
pub mod telemetry;

pub use api::{
    ActionApi, InstallApi, InstallOutput, InventoryApi, NotificationApi, ReservationApi,
    SandboxApi,
};

pub use domain::{
    ApiError, ApiResult, AppLookup, DeployFailure, DeployResult, DeployResultSet,
    InstallationDescriptor, OutcomeStatus, PipelineOutcome, ReservationDetails, ReservedResource,
    ResourceDetails, ResourceFailure, ResourceSettings, Result, SandboxError, ScriptInput, Stage,
};

pub use cache::ResourceCache;
pub use config::{ReleaseInputNames, SetupConfig};
pub use orchestrator::ProvisioningOrchestrator;
pub use pipeline::ResourcePipeline;
pub use release::{ReleaseDeployment, ReleaseRequest};
pub use sequencer::{SetupReport, SetupSequencer};
pub use status_gate::StatusGate;

/// Crate version, reported by `sandboxctl --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
