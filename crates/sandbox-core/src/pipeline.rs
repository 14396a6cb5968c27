//! Per-resource readiness pipeline: Power-On → Wait-For-IP → Install.
//!
//! Stages run strictly in order. Power-On and Wait-For-IP can be switched off
//! per resource through custom parameters; Install runs only when this run's
//! deploy record carries an installation descriptor. A stage error halts the
//! pipeline at that stage and is returned as a failed [`PipelineOutcome`]; it
//! never propagates past [`ResourcePipeline::run`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument};

use crate::api::{
    SandboxApi, POWER_DOMAIN, POWER_ON_ACTION, REFRESH_IP_ACTION, REMOTE_CONNECTIVITY_DOMAIN,
};
use crate::cache::ResourceCache;
use crate::domain::{ApiError, AppLookup, DeployResult, OutcomeStatus, PipelineOutcome, Stage};
use crate::metrics::METRICS;
use crate::obs::{emit_pipeline_finished, emit_stage_skipped};
use crate::status_gate::StatusGate;

/// Shared, cheaply clonable handle that runs pipelines for one orchestration
/// run. Every clone shares the same [`StatusGate`].
#[derive(Clone)]
pub struct ResourcePipeline {
    reservation_id: Arc<str>,
    api: Arc<dyn SandboxApi>,
    cache: Arc<ResourceCache>,
    gate: Arc<StatusGate>,
}

impl ResourcePipeline {
    pub fn new(
        reservation_id: impl Into<Arc<str>>,
        api: Arc<dyn SandboxApi>,
        cache: Arc<ResourceCache>,
        gate: Arc<StatusGate>,
    ) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            api,
            cache,
            gate,
        }
    }

    pub fn gate(&self) -> &StatusGate {
        &self.gate
    }

    /// Drive `resource` through every stage and report its terminal state.
    #[instrument(skip(self, deploy_record), fields(reservation_id = %self.reservation_id))]
    pub async fn run(&self, resource: &str, deploy_record: Option<&DeployResult>) -> PipelineOutcome {
        let started = Instant::now();
        let outcome = self.run_stages(resource, deploy_record).await;
        METRICS.record_pipeline(outcome.success());
        emit_pipeline_finished(
            &self.reservation_id,
            &outcome,
            started.elapsed().as_millis() as u64,
        );
        outcome
    }

    async fn run_stages(
        &self,
        resource: &str,
        deploy_record: Option<&DeployResult>,
    ) -> PipelineOutcome {
        let lookup = self.lookup(resource).await;
        match &lookup {
            AppLookup::NotApplicable => {
                debug!(resource = %resource, "not a deployed app, nothing to do with it");
                return PipelineOutcome::succeeded(resource, OutcomeStatus::NotApplicable);
            }
            AppLookup::Pending { reason } => {
                error!(
                    resource = %resource,
                    error = %reason,
                    "error getting resource details, will use default settings"
                );
            }
            AppLookup::Ready(_) => {}
        }
        let settings = lookup.settings();

        if let Err(e) = self.power_on(resource, settings.auto_power_on).await {
            error!(resource = %resource, error = %e, "error powering on deployed app");
            return PipelineOutcome::failed(
                resource,
                Stage::PowerOn,
                format!("error powering on deployed app {resource}: {e}"),
            );
        }

        if let Err(e) = self.wait_for_ip(resource, settings.wait_for_ip).await {
            error!(resource = %resource, error = %e, "error refreshing IP on deployed app");
            return PipelineOutcome::failed(
                resource,
                Stage::WaitForIp,
                format!("error refreshing IP on deployed app {resource}: {e}"),
            );
        }

        match self.install(resource, deploy_record).await {
            Ok(status) => PipelineOutcome::succeeded(resource, status),
            Err(e) => {
                error!(resource = %resource, error = %e, "error installing deployed app");
                PipelineOutcome::failed(
                    resource,
                    Stage::Install,
                    format!("error installing deployed app {resource}: {e}"),
                )
            }
        }
    }

    async fn lookup(&self, resource: &str) -> AppLookup {
        debug!(resource = %resource, "getting resource details");
        match self.cache.get_or_fetch(self.api.as_ref(), resource).await {
            Ok(details) => AppLookup::classify(details),
            Err(e) => AppLookup::Pending {
                reason: e.to_string(),
            },
        }
    }

    async fn announce(&self, stage: Stage) -> Result<(), ApiError> {
        self.gate
            .announce_once(stage, || {
                self.api
                    .write_message(&self.reservation_id, stage.announcement())
            })
            .await
            .map(|_| ())
    }

    async fn power_on(&self, resource: &str, enabled: bool) -> Result<(), ApiError> {
        if !enabled {
            info!(resource = %resource, "auto power on is off for deployed app");
            emit_stage_skipped(&self.reservation_id, resource, Stage::PowerOn);
            return Ok(());
        }

        info!(resource = %resource, "executing 'Power On' on deployed app");
        self.announce(Stage::PowerOn).await?;
        self.api
            .execute_connected_action(&self.reservation_id, resource, POWER_ON_ACTION, POWER_DOMAIN)
            .await
    }

    async fn wait_for_ip(&self, resource: &str, enabled: bool) -> Result<(), ApiError> {
        if !enabled {
            info!(resource = %resource, "wait for IP is off for deployed app");
            emit_stage_skipped(&self.reservation_id, resource, Stage::WaitForIp);
            return Ok(());
        }

        self.announce(Stage::WaitForIp).await?;
        info!(resource = %resource, "executing 'Refresh IP' on deployed app");
        self.api
            .execute_connected_action(
                &self.reservation_id,
                resource,
                REFRESH_IP_ACTION,
                REMOTE_CONNECTIVITY_DOMAIN,
            )
            .await
    }

    async fn install(
        &self,
        resource: &str,
        deploy_record: Option<&DeployResult>,
    ) -> Result<OutcomeStatus, ApiError> {
        let Some(record) = deploy_record.filter(|r| r.success) else {
            info!(
                resource = %resource,
                "cannot execute installation script for deployed app - no deployment data"
            );
            return Ok(OutcomeStatus::NoDeployRecord);
        };

        let Some(installation) = record
            .installation
            .as_ref()
            .filter(|i| !i.script_name.is_empty())
        else {
            debug!(resource = %resource, "deployed app has no installation script");
            return Ok(OutcomeStatus::NoInstallStep);
        };

        info!(
            resource = %resource,
            script = %installation.script_name,
            "executing installation script on deployed app"
        );
        self.announce(Stage::Install).await?;

        let result = self
            .api
            .install(
                &self.reservation_id,
                resource,
                &installation.script_name,
                &installation.script_inputs,
            )
            .await?;
        debug!(resource = %resource, output = %result.output, "installation result");
        Ok(OutcomeStatus::Installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResourceDetails, ScriptInput};
    use crate::fakes::{MemorySandbox, RemoteCall};

    fn pipeline(sandbox: &Arc<MemorySandbox>) -> ResourcePipeline {
        ResourcePipeline::new(
            "res-1",
            Arc::clone(sandbox) as Arc<dyn SandboxApi>,
            Arc::new(ResourceCache::new()),
            Arc::new(StatusGate::new()),
        )
    }

    fn app(name: &str) -> ResourceDetails {
        ResourceDetails::deployed_app(name, format!("uid-{name}"))
    }

    #[tokio::test]
    async fn test_full_pipeline_installs() {
        let sandbox = Arc::new(MemorySandbox::new("res-1").with_resource(app("web")));
        let record = DeployResult::deployed("web")
            .with_installation("setup.sh", vec![ScriptInput::new("port", "8080")]);

        let outcome = pipeline(&sandbox).run("web", Some(&record)).await;

        assert!(outcome.success());
        assert_eq!(outcome.status, OutcomeStatus::Installed);
        assert_eq!(
            sandbox.calls_for("web"),
            vec![
                RemoteCall::action("web", POWER_ON_ACTION, POWER_DOMAIN),
                RemoteCall::action("web", REFRESH_IP_ACTION, REMOTE_CONNECTIVITY_DOMAIN),
                RemoteCall::Install {
                    resource: "web".to_string(),
                    script_name: "setup.sh".to_string(),
                    script_inputs: vec![ScriptInput::new("port", "8080")],
                },
            ]
        );
        assert_eq!(
            sandbox.messages(),
            vec![
                Stage::PowerOn.announcement().to_string(),
                Stage::WaitForIp.announcement().to_string(),
                Stage::Install.announcement().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_not_a_deployed_app_short_circuits() {
        let sandbox =
            Arc::new(MemorySandbox::new("res-1").with_resource(ResourceDetails::new("switch")));

        let outcome = pipeline(&sandbox).run("switch", None).await;

        assert_eq!(outcome.status, OutcomeStatus::NotApplicable);
        assert!(sandbox.calls_for("switch").is_empty());
        assert!(sandbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_power_on_disabled_still_reaches_install() {
        let sandbox = Arc::new(
            MemorySandbox::new("res-1")
                .with_resource(app("web").with_custom_param("auto_power_on", "false")),
        );
        let record = DeployResult::deployed("web").with_installation("setup.sh", vec![]);

        let outcome = pipeline(&sandbox).run("web", Some(&record)).await;

        assert_eq!(outcome.status, OutcomeStatus::Installed);
        assert_eq!(sandbox.action_count(POWER_ON_ACTION), 0);
        assert_eq!(sandbox.install_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_ip_disabled_skips_refresh() {
        let sandbox = Arc::new(
            MemorySandbox::new("res-1")
                .with_resource(app("web").with_custom_param("wait_for_ip", "FALSE")),
        );

        let outcome = pipeline(&sandbox).run("web", None).await;

        assert_eq!(outcome.status, OutcomeStatus::NoDeployRecord);
        assert_eq!(sandbox.action_count(POWER_ON_ACTION), 1);
        assert_eq!(sandbox.action_count(REFRESH_IP_ACTION), 0);
    }

    #[tokio::test]
    async fn test_power_on_failure_halts_pipeline() {
        let sandbox = Arc::new(
            MemorySandbox::new("res-1")
                .with_resource(app("web"))
                .fail_action("web", POWER_ON_ACTION, ApiError::remote("hypervisor offline")),
        );
        let record = DeployResult::deployed("web").with_installation("setup.sh", vec![]);

        let outcome = pipeline(&sandbox).run("web", Some(&record)).await;

        assert_eq!(outcome.failed_stage(), Some(Stage::PowerOn));
        assert!(outcome.message.contains("web"));
        assert!(outcome.message.contains("powering on"));
        assert_eq!(sandbox.action_count(REFRESH_IP_ACTION), 0);
        assert_eq!(sandbox.install_count(), 0);
    }

    #[tokio::test]
    async fn test_install_failure_reports_resource_and_cause() {
        let sandbox = Arc::new(
            MemorySandbox::new("res-1")
                .with_resource(app("web"))
                .fail_install("web", ApiError::remote("script exited 2")),
        );
        let record = DeployResult::deployed("web").with_installation("setup.sh", vec![]);

        let outcome = pipeline(&sandbox).run("web", Some(&record)).await;

        assert_eq!(outcome.failed_stage(), Some(Stage::Install));
        assert!(outcome.message.contains("installing deployed app web"));
        assert!(outcome.message.contains("script exited 2"));
    }

    #[tokio::test]
    async fn test_record_without_installation_is_distinct_from_missing_record() {
        let sandbox = Arc::new(MemorySandbox::new("res-1").with_resource(app("web")));
        let record = DeployResult::deployed("web");

        let with_record = pipeline(&sandbox).run("web", Some(&record)).await;
        let without_record = pipeline(&sandbox).run("web", None).await;

        assert_eq!(with_record.status, OutcomeStatus::NoInstallStep);
        assert_eq!(without_record.status, OutcomeStatus::NoDeployRecord);
        assert_eq!(sandbox.install_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_default_settings() {
        let sandbox = Arc::new(MemorySandbox::new("res-1"));

        let outcome = pipeline(&sandbox).run("unknown", None).await;

        assert!(outcome.success());
        assert_eq!(sandbox.action_count(POWER_ON_ACTION), 1);
        assert_eq!(sandbox.action_count(REFRESH_IP_ACTION), 1);
    }

    #[tokio::test]
    async fn test_announcement_failure_fails_stage() {
        let sandbox = Arc::new(
            MemorySandbox::new("res-1")
                .with_resource(app("web"))
                .fail_messages(ApiError::Transport("output closed".to_string())),
        );

        let outcome = pipeline(&sandbox).run("web", None).await;

        assert_eq!(outcome.failed_stage(), Some(Stage::PowerOn));
        assert_eq!(sandbox.action_count(POWER_ON_ACTION), 0);
    }
}
