//! Concurrent fan-out of resource pipelines with all-outcomes aggregation.
//!
//! One task is spawned per resource, gated by a run-scoped semaphore sized to
//! the resource count. Every task is awaited before any outcome is evaluated:
//! a failing resource never cancels its siblings. Failures are collected as a
//! structured list and surface together in one [`SandboxError`].

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::api::SandboxApi;
use crate::cache::ResourceCache;
use crate::domain::{
    DeployResultSet, PipelineOutcome, ReservedResource, ResourceFailure, Result, SandboxError,
};
use crate::obs::{emit_provisioning_finished, emit_provisioning_started};
use crate::pipeline::ResourcePipeline;
use crate::status_gate::StatusGate;

/// Written when a run has no resources to provision.
pub const NOTHING_TO_PROVISION: &str = "No resources to power on or install";

pub struct ProvisioningOrchestrator {
    reservation_id: Arc<str>,
    api: Arc<dyn SandboxApi>,
    cache: Arc<ResourceCache>,
}

impl ProvisioningOrchestrator {
    pub fn new(
        reservation_id: impl Into<Arc<str>>,
        api: Arc<dyn SandboxApi>,
        cache: Arc<ResourceCache>,
    ) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            api,
            cache,
        }
    }

    /// Provision `resources` with a fresh [`StatusGate`].
    pub async fn run(
        &self,
        resources: &[ReservedResource],
        deploy_results: Option<&DeployResultSet>,
    ) -> Result<Vec<PipelineOutcome>> {
        self.run_with_gate(resources, deploy_results, Arc::new(StatusGate::new()))
            .await
    }

    /// Provision `resources`, announcing stage progress through `gate`.
    ///
    /// Returns every outcome, in resource order, when all pipelines succeed and
    /// no deploy result reports a failure.
    #[instrument(skip_all, fields(reservation_id = %self.reservation_id, resources = resources.len()))]
    pub async fn run_with_gate(
        &self,
        resources: &[ReservedResource],
        deploy_results: Option<&DeployResultSet>,
        gate: Arc<StatusGate>,
    ) -> Result<Vec<PipelineOutcome>> {
        if resources.is_empty() {
            info!("no resources to power on or install");
            self.api
                .write_message(&self.reservation_id, NOTHING_TO_PROVISION)
                .await
                .map_err(SandboxError::collaborator("write reservation message"))?;
            validate_deploy_results(deploy_results)?;
            return Ok(Vec::new());
        }

        emit_provisioning_started(&self.reservation_id, resources.len());

        let pipeline = ResourcePipeline::new(
            Arc::clone(&self.reservation_id),
            Arc::clone(&self.api),
            Arc::clone(&self.cache),
            gate,
        );
        let sem = Arc::new(Semaphore::new(resources.len()));

        let mut tasks = Vec::with_capacity(resources.len());
        for resource in resources {
            let pipeline = pipeline.clone();
            let sem = Arc::clone(&sem);
            let name = resource.name.clone();
            let record = deploy_results
                .and_then(|results| results.record_for(&name))
                .cloned();

            let task = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                pipeline.run(&name, record.as_ref()).await
            });
            tasks.push((resource.name.clone(), task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(resource = %name, error = %e, "pipeline task aborted");
                    outcomes.push(PipelineOutcome::aborted(
                        name.as_str(),
                        format!("provisioning of deployed app {name} aborted: {e}"),
                    ));
                }
            }
        }

        let failures = collect_failures(&outcomes);
        emit_provisioning_finished(
            &self.reservation_id,
            outcomes.len() - failures.len(),
            failures.len(),
        );
        if !failures.is_empty() {
            return Err(SandboxError::ProvisioningFailed { failures });
        }

        validate_deploy_results(deploy_results)?;
        Ok(outcomes)
    }
}

fn collect_failures(outcomes: &[PipelineOutcome]) -> Vec<ResourceFailure> {
    outcomes
        .iter()
        .filter(|o| !o.success())
        .map(|o| ResourceFailure {
            resource: o.resource.clone(),
            stage: o.failed_stage(),
            message: o.message.clone(),
        })
        .collect()
}

/// Fail if any deploy attempt reported failure. Resources that failed to
/// deploy never enter a pipeline, so this is the only place they surface.
pub fn validate_deploy_results(deploy_results: Option<&DeployResultSet>) -> Result<()> {
    let Some(results) = deploy_results else {
        return Ok(());
    };
    let failures = results.failures();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SandboxError::DeployFailed { failures })
    }
}
