//! In-memory fakes for the collaborator traits
//!
//! `MemorySandbox` satisfies every trait in [`crate::api`] without any remote
//! system. It records each remote call and each reservation message in order,
//! can inject failures per resource and action, and can add artificial latency
//! to connected actions and installs.
//!
//! A `MemorySandbox` can also be built from a [`SandboxSnapshot`], a recorded
//! description of a sandbox used to rehearse a setup run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{
    ActionApi, InstallApi, InstallOutput, InventoryApi, NotificationApi, ReservationApi,
};
use crate::domain::{
    ApiError, ApiResult, DeployResultSet, ReservationDetails, ResourceDetails, ScriptInput,
};

/// Failure key used for install calls in [`SandboxSnapshot::failures`].
pub const INSTALL_FAILURE_KEY: &str = "install";
/// Failure key used for autoload calls in [`SandboxSnapshot::failures`].
pub const AUTOLOAD_FAILURE_KEY: &str = "autoload";
/// Failure key used for remap-child-resources calls in
/// [`SandboxSnapshot::failures`].
pub const REMAP_FAILURE_KEY: &str = "remap";

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Action {
        resource: String,
        action: String,
        domain: String,
    },
    Install {
        resource: String,
        script_name: String,
        script_inputs: Vec<ScriptInput>,
    },
    PrepareConnectivity,
    DeployApps {
        app_names: Vec<String>,
    },
    Autoload {
        resource: String,
    },
    RemapChildResources {
        resource: String,
    },
    ConnectRoutes {
        endpoints: Vec<String>,
    },
}

impl RemoteCall {
    pub fn action(resource: &str, action: &str, domain: &str) -> Self {
        RemoteCall::Action {
            resource: resource.to_string(),
            action: action.to_string(),
            domain: domain.to_string(),
        }
    }

    fn resource(&self) -> Option<&str> {
        match self {
            RemoteCall::Action { resource, .. }
            | RemoteCall::Install { resource, .. }
            | RemoteCall::Autoload { resource }
            | RemoteCall::RemapChildResources { resource } => Some(resource),
            _ => None,
        }
    }
}

/// Failure injected into a rehearsal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureSpec {
    pub resource: String,
    /// A connected action name, [`INSTALL_FAILURE_KEY`],
    /// [`AUTOLOAD_FAILURE_KEY`] or [`REMAP_FAILURE_KEY`].
    pub action: String,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Recorded description of a sandbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxSnapshot {
    pub reservation: ReservationDetails,
    /// Reservation as it looks once the bulk deploy has created resources.
    #[serde(default)]
    pub reservation_after_deploy: Option<ReservationDetails>,
    #[serde(default)]
    pub resources: Vec<ResourceDetails>,
    #[serde(default)]
    pub deploy_results: DeployResultSet,
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub failures: Vec<FailureSpec>,
    /// Latency added to every connected action and install, in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct State {
    reservation: ReservationDetails,
    reservation_after_deploy: Option<ReservationDetails>,
    deployed: bool,
    resources: HashMap<String, ResourceDetails>,
    deploy_results: DeployResultSet,
    inputs: HashMap<String, String>,
    failures: HashMap<(String, String), ApiError>,
    message_failure: Option<ApiError>,
    calls: Vec<RemoteCall>,
    messages: Vec<String>,
    detail_lookups: HashMap<String, usize>,
}

/// In-memory sandbox backed by a single mutex-guarded [`State`].
#[derive(Debug, Default)]
pub struct MemorySandbox {
    state: Mutex<State>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemorySandbox {
    pub fn new(reservation_id: impl Into<String>) -> Self {
        let sandbox = Self::default();
        lock(&sandbox.state).reservation.id = reservation_id.into();
        sandbox
    }

    pub fn from_snapshot(snapshot: SandboxSnapshot) -> Self {
        let mut sandbox = Self::new(snapshot.reservation.id.clone())
            .with_reservation(snapshot.reservation)
            .with_deploy_results(snapshot.deploy_results)
            .with_inputs(snapshot.inputs)
            .with_latency(Duration::from_millis(snapshot.latency_ms));
        if let Some(after) = snapshot.reservation_after_deploy {
            sandbox = sandbox.with_reservation_after_deploy(after);
        }
        for details in snapshot.resources {
            sandbox = sandbox.with_resource(details);
        }
        for failure in snapshot.failures {
            let error = ApiError::Remote {
                code: failure.code,
                message: failure.message,
            };
            lock(&sandbox.state)
                .failures
                .insert((failure.resource, failure.action), error);
        }
        sandbox
    }

    pub fn with_reservation(self, reservation: ReservationDetails) -> Self {
        lock(&self.state).reservation = reservation;
        self
    }

    pub fn with_reservation_after_deploy(self, reservation: ReservationDetails) -> Self {
        lock(&self.state).reservation_after_deploy = Some(reservation);
        self
    }

    pub fn with_resource(self, details: ResourceDetails) -> Self {
        lock(&self.state)
            .resources
            .insert(details.name.clone(), details);
        self
    }

    pub fn with_deploy_results(self, results: DeployResultSet) -> Self {
        lock(&self.state).deploy_results = results;
        self
    }

    pub fn with_inputs(self, inputs: HashMap<String, String>) -> Self {
        lock(&self.state).inputs = inputs;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every call of `action` on `resource`.
    pub fn fail_action(self, resource: &str, action: &str, error: ApiError) -> Self {
        lock(&self.state)
            .failures
            .insert((resource.to_string(), action.to_string()), error);
        self
    }

    pub fn fail_install(self, resource: &str, error: ApiError) -> Self {
        self.fail_action(resource, INSTALL_FAILURE_KEY, error)
    }

    pub fn fail_autoload(self, resource: &str, error: ApiError) -> Self {
        self.fail_action(resource, AUTOLOAD_FAILURE_KEY, error)
    }

    pub fn fail_remap(self, resource: &str, error: ApiError) -> Self {
        self.fail_action(resource, REMAP_FAILURE_KEY, error)
    }

    /// Fail every `write_message` call.
    pub fn fail_messages(self, error: ApiError) -> Self {
        lock(&self.state).message_failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.state).calls.clone()
    }

    /// Calls that target `resource`, in call order.
    pub fn calls_for(&self, resource: &str) -> Vec<RemoteCall> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.resource() == Some(resource))
            .cloned()
            .collect()
    }

    pub fn action_count(&self, action: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| matches!(c, RemoteCall::Action { action: a, .. } if a == action))
            .count()
    }

    pub fn install_count(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| matches!(c, RemoteCall::Install { .. }))
            .count()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.state).messages.clone()
    }

    /// How many times `text` was written to the reservation output.
    pub fn message_count(&self, text: &str) -> usize {
        lock(&self.state)
            .messages
            .iter()
            .filter(|m| m.as_str() == text)
            .count()
    }

    pub fn detail_lookups(&self, name: &str) -> usize {
        lock(&self.state)
            .detail_lookups
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of connected actions and installs observed in flight at
    /// the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: RemoteCall) {
        lock(&self.state).calls.push(call);
    }

    fn injected(&self, resource: &str, key: &str) -> ApiResult<()> {
        match lock(&self.state)
            .failures
            .get(&(resource.to_string(), key.to_string()))
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn remote_work(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryApi for MemorySandbox {
    async fn get_resource_details(&self, name: &str) -> ApiResult<ResourceDetails> {
        let mut state = lock(&self.state);
        *state.detail_lookups.entry(name.to_string()).or_default() += 1;
        state
            .resources
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl ActionApi for MemorySandbox {
    async fn execute_connected_action(
        &self,
        _reservation_id: &str,
        resource_name: &str,
        action: &str,
        domain: &str,
    ) -> ApiResult<()> {
        self.record(RemoteCall::action(resource_name, action, domain));
        self.remote_work().await;
        self.injected(resource_name, action)
    }
}

#[async_trait]
impl InstallApi for MemorySandbox {
    async fn install(
        &self,
        _reservation_id: &str,
        resource_name: &str,
        script_name: &str,
        script_inputs: &[ScriptInput],
    ) -> ApiResult<InstallOutput> {
        self.record(RemoteCall::Install {
            resource: resource_name.to_string(),
            script_name: script_name.to_string(),
            script_inputs: script_inputs.to_vec(),
        });
        self.remote_work().await;
        self.injected(resource_name, INSTALL_FAILURE_KEY)?;
        Ok(InstallOutput {
            output: format!("{script_name} completed"),
        })
    }
}

#[async_trait]
impl NotificationApi for MemorySandbox {
    async fn write_message(&self, _reservation_id: &str, text: &str) -> ApiResult<()> {
        let mut state = lock(&self.state);
        if let Some(error) = &state.message_failure {
            return Err(error.clone());
        }
        state.messages.push(text.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReservationApi for MemorySandbox {
    async fn prepare_connectivity(&self, _reservation_id: &str) -> ApiResult<()> {
        self.record(RemoteCall::PrepareConnectivity);
        Ok(())
    }

    async fn get_reservation_details(
        &self,
        _reservation_id: &str,
    ) -> ApiResult<ReservationDetails> {
        let state = lock(&self.state);
        let details = match (&state.reservation_after_deploy, state.deployed) {
            (Some(after), true) => after.clone(),
            _ => state.reservation.clone(),
        };
        Ok(details)
    }

    async fn deploy_apps_bulk(
        &self,
        _reservation_id: &str,
        app_names: &[String],
    ) -> ApiResult<DeployResultSet> {
        self.record(RemoteCall::DeployApps {
            app_names: app_names.to_vec(),
        });
        let mut state = lock(&self.state);
        state.deployed = true;
        Ok(state.deploy_results.clone())
    }

    async fn autoload(&self, resource_name: &str) -> ApiResult<()> {
        self.record(RemoteCall::Autoload {
            resource: resource_name.to_string(),
        });
        self.injected(resource_name, AUTOLOAD_FAILURE_KEY)
    }

    async fn remap_child_resources(
        &self,
        _reservation_id: &str,
        resource_name: &str,
    ) -> ApiResult<()> {
        self.record(RemoteCall::RemapChildResources {
            resource: resource_name.to_string(),
        });
        self.injected(resource_name, REMAP_FAILURE_KEY)
    }

    async fn connect_routes(&self, _reservation_id: &str, endpoints: &[String]) -> ApiResult<()> {
        self.record(RemoteCall::ConnectRoutes {
            endpoints: endpoints.to_vec(),
        });
        Ok(())
    }

    async fn get_reservation_inputs(
        &self,
        _reservation_id: &str,
    ) -> ApiResult<HashMap<String, String>> {
        Ok(lock(&self.state).inputs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeployResult;

    #[tokio::test]
    async fn test_injected_failure_is_returned_after_call_is_recorded() {
        let sandbox =
            MemorySandbox::new("r").fail_action("web", "PowerOn", ApiError::remote("down"));

        let err = sandbox
            .execute_connected_action("r", "web", "PowerOn", "power")
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::remote("down"));
        assert_eq!(sandbox.action_count("PowerOn"), 1);
    }

    #[tokio::test]
    async fn test_reservation_refreshes_after_deploy() {
        let after = ReservationDetails {
            id: "r".to_string(),
            name: "after".to_string(),
            ..Default::default()
        };
        let sandbox = MemorySandbox::new("r").with_reservation_after_deploy(after);

        assert_eq!(sandbox.get_reservation_details("r").await.unwrap().name, "");
        sandbox.deploy_apps_bulk("r", &[]).await.unwrap();
        assert_eq!(
            sandbox.get_reservation_details("r").await.unwrap().name,
            "after"
        );
    }

    #[test]
    fn test_from_snapshot_json() {
        let json = serde_json::json!({
            "reservation": {"id": "r-9", "name": "Lab"},
            "resources": [{"name": "web", "vm_details": {"uid": "vm-1"}}],
            "deploy_results": [{"success": true, "logical_resource_name": "web"}],
            "failures": [{"resource": "web", "action": "install", "message": "boom"}]
        });
        let snapshot: SandboxSnapshot = serde_json::from_value(json).unwrap();
        let sandbox = MemorySandbox::from_snapshot(snapshot);

        let state = lock(&sandbox.state);
        assert_eq!(state.reservation.id, "r-9");
        assert!(state.resources["web"].is_deployed_app());
        assert_eq!(
            state.deploy_results.items,
            vec![DeployResult::deployed("web")]
        );
        assert!(state
            .failures
            .contains_key(&("web".to_string(), "install".to_string())));
    }
}
