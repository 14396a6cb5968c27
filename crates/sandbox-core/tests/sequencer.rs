//! Setup sequencer with a release step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sandbox_core::domain::{AppTemplate, ServiceInfo};
use sandbox_core::fakes::MemorySandbox;
use sandbox_core::sequencer::{DEPLOY_STARTED, RELEASE_FINISHED, SETUP_FINISHED};
use sandbox_core::{
    ApiError, DeployResult, DeployResultSet, ReleaseDeployment, ReleaseRequest,
    ReservationDetails, ReservedResource, ResourceDetails, SandboxError, SetupConfig,
    SetupSequencer,
};

#[derive(Default)]
struct RecordingRelease {
    environments: Mutex<Vec<String>>,
    requests: Mutex<Vec<ReleaseRequest>>,
}

#[async_trait]
impl ReleaseDeployment for RecordingRelease {
    async fn prepare_environment(&self, environment_name: &str) -> sandbox_core::Result<()> {
        self.environments
            .lock()
            .unwrap()
            .push(environment_name.to_string());
        Ok(())
    }

    async fn deploy_release(&self, request: &ReleaseRequest) -> sandbox_core::Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn reservation() -> ReservationDetails {
    ReservationDetails {
        id: "0d2c7a3e-res".to_string(),
        name: "Checkout team sandbox".to_string(),
        apps: vec![AppTemplate {
            name: "api".to_string(),
        }],
        services: vec![ServiceInfo {
            name: "Deployment Orchestrator".to_string(),
            alias: "Octo".to_string(),
        }],
        ..Default::default()
    }
}

fn inputs() -> HashMap<String, String> {
    [
        ("Project Name", "checkout"),
        ("Channel Name", "default"),
        ("Release Version", "2.1.0"),
        ("Phase Name", "Dev"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn sandbox() -> MemorySandbox {
    let after = ReservationDetails {
        resources: vec![ReservedResource::new("api-1").created_in("0d2c7a3e-res")],
        ..reservation()
    };
    MemorySandbox::new("0d2c7a3e-res")
        .with_reservation(reservation())
        .with_reservation_after_deploy(after)
        .with_resource(ResourceDetails::deployed_app("api-1", "vm-7"))
        .with_deploy_results(DeployResultSet::new(vec![DeployResult::deployed("api-1")]))
        .with_inputs(inputs())
}

#[tokio::test]
async fn release_step_runs_after_setup_finishes() {
    let sandbox = Arc::new(sandbox());
    let release = Arc::new(RecordingRelease::default());

    let report = SetupSequencer::new("0d2c7a3e-res", Arc::clone(&sandbox))
        .with_release(Arc::clone(&release) as Arc<dyn ReleaseDeployment>)
        .run()
        .await
        .unwrap();

    let env = "Checkout team sandbox - 0d2c7a3e-res".to_string();
    assert_eq!(report.environment_name.as_deref(), Some(env.as_str()));
    assert_eq!(*release.environments.lock().unwrap(), vec![env.clone()]);

    let requests = release.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].project_name, "checkout");
    assert_eq!(requests[0].phase_name, "Dev");
    assert_eq!(requests[0].environment_name, env);

    let messages = sandbox.messages();
    let finished = messages.iter().position(|m| m == SETUP_FINISHED).unwrap();
    let released = messages.iter().position(|m| m == RELEASE_FINISHED).unwrap();
    assert!(finished < released);
}

#[tokio::test]
async fn environment_name_keeps_trailing_characters() {
    let sandbox = Arc::new(sandbox());
    let release = Arc::new(RecordingRelease::default());

    let report = SetupSequencer::new("0d2c7a3e-res", Arc::clone(&sandbox))
        .with_config(SetupConfig::default().with_environment_name_limit(16))
        .with_release(Arc::clone(&release) as Arc<dyn ReleaseDeployment>)
        .run()
        .await
        .unwrap();

    assert_eq!(report.environment_name.as_deref(), Some("x - 0d2c7a3e-res"));
}

#[tokio::test]
async fn missing_release_input_fails_after_provisioning() {
    let mut inputs = inputs();
    inputs.remove("Release Version");
    let sandbox = Arc::new(sandbox().with_inputs(inputs));
    let release = Arc::new(RecordingRelease::default());

    let err = SetupSequencer::new("0d2c7a3e-res", Arc::clone(&sandbox))
        .with_release(Arc::clone(&release) as Arc<dyn ReleaseDeployment>)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SandboxError::MissingInput(ref n) if n == "Release Version"));
    assert_eq!(sandbox.message_count(SETUP_FINISHED), 1);
    assert!(release.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provisioning_failure_stops_before_release() {
    let sandbox = Arc::new(sandbox().fail_action(
        "api-1",
        "PowerOn",
        ApiError::remote("host in maintenance"),
    ));
    let release = Arc::new(RecordingRelease::default());

    let err = SetupSequencer::new("0d2c7a3e-res", Arc::clone(&sandbox))
        .with_release(Arc::clone(&release) as Arc<dyn ReleaseDeployment>)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("host in maintenance"));
    assert_eq!(sandbox.message_count(DEPLOY_STARTED), 1);
    assert_eq!(sandbox.message_count(SETUP_FINISHED), 0);
    assert!(release.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deploy_failure_surfaces_after_pipelines() {
    let sandbox = Arc::new(sandbox().with_deploy_results(DeployResultSet::new(vec![
        DeployResult::deployed("api-1"),
        DeployResult::failed("worker", "image not found"),
    ])));

    let err = SetupSequencer::new("0d2c7a3e-res", Arc::clone(&sandbox))
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "reservation is active with errors - worker: image not found"
    );
    assert_eq!(sandbox.action_count("PowerOn"), 1);
}
