//! Collaborator trait definitions for sandbox setup
//!
//! These traits define the external systems the provisioning core talks to:
//! - `InventoryApi`: Resource attribute and custom parameter lookup
//! - `ActionApi`: Connected resource actions (power on, refresh IP)
//! - `InstallApi`: Installation scripts on deployed applications
//! - `NotificationApi`: Reservation output messages
//! - `ReservationApi`: Reservation-level calls used only by the setup sequencer
//!
//! All traits are async and transport-agnostic. An in-memory fake is provided
//! for testing via the `fakes` module.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{ApiResult, DeployResultSet, ReservationDetails, ResourceDetails, ScriptInput};

/// Connected action that powers a resource on.
pub const POWER_ON_ACTION: &str = "PowerOn";
/// Action domain of [`POWER_ON_ACTION`].
pub const POWER_DOMAIN: &str = "power";
/// Connected action that refreshes a resource's IP address.
pub const REFRESH_IP_ACTION: &str = "remote_refresh_ip";
/// Action domain of [`REFRESH_IP_ACTION`].
pub const REMOTE_CONNECTIVITY_DOMAIN: &str = "remote_connectivity";

// ---------------------------------------------------------------------------
// Per-resource collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Attributes and custom parameters of one resource.
    async fn get_resource_details(&self, name: &str) -> ApiResult<ResourceDetails>;
}

#[async_trait]
pub trait ActionApi: Send + Sync {
    /// Run a connected action against a resource. Blocks until the remote side
    /// reports completion.
    async fn execute_connected_action(
        &self,
        reservation_id: &str,
        resource_name: &str,
        action: &str,
        domain: &str,
    ) -> ApiResult<()>;
}

/// Output of an installation script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutput {
    pub output: String,
}

#[async_trait]
pub trait InstallApi: Send + Sync {
    async fn install(
        &self,
        reservation_id: &str,
        resource_name: &str,
        script_name: &str,
        script_inputs: &[ScriptInput],
    ) -> ApiResult<InstallOutput>;
}

#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Append a progress message to the reservation output.
    async fn write_message(&self, reservation_id: &str, text: &str) -> ApiResult<()>;
}

/// Everything a resource pipeline needs.
pub trait SandboxApi: InventoryApi + ActionApi + InstallApi + NotificationApi {}

impl<T> SandboxApi for T where T: InventoryApi + ActionApi + InstallApi + NotificationApi {}

// ---------------------------------------------------------------------------
// Reservation-level collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReservationApi: SandboxApi {
    async fn prepare_connectivity(&self, reservation_id: &str) -> ApiResult<()>;

    async fn get_reservation_details(&self, reservation_id: &str)
        -> ApiResult<ReservationDetails>;

    /// Deploy every named app to its cloud provider in one call.
    async fn deploy_apps_bulk(
        &self,
        reservation_id: &str,
        app_names: &[String],
    ) -> ApiResult<DeployResultSet>;

    /// Discover the structure of a deployed resource.
    async fn autoload(&self, resource_name: &str) -> ApiResult<()>;

    /// Copy connections from the app template onto the discovered child
    /// resources of a deployed resource.
    async fn remap_child_resources(&self, reservation_id: &str, resource_name: &str)
        -> ApiResult<()>;

    /// Connect routes between the given endpoints, bidirectionally.
    async fn connect_routes(&self, reservation_id: &str, endpoints: &[String]) -> ApiResult<()>;

    /// Global reservation inputs, keyed by parameter name.
    async fn get_reservation_inputs(&self, reservation_id: &str)
        -> ApiResult<HashMap<String, String>>;
}
