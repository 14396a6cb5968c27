//! Top-level setup driver.
//!
//! Sequences connectivity preparation, the bulk deploy, discovery, route
//! connection, provisioning and the optional release deployment for one
//! reservation. Everything except provisioning is a plain sequential call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ReservationApi, SandboxApi};
use crate::cache::ResourceCache;
use crate::config::SetupConfig;
use crate::domain::{
    ApiError, ApiResult, DeployResultSet, PipelineOutcome, ReservationDetails, Result,
    SandboxError,
};
use crate::domain::resource::AUTOLOAD_PARAM;
use crate::metrics::METRICS;
use crate::orchestrator::ProvisioningOrchestrator;
use crate::release::{ReleaseDeployment, ReleaseRequest};
use crate::status_gate::StatusGate;

pub const SETUP_STARTED: &str = "Beginning reservation setup";
pub const PREPARING_CONNECTIVITY: &str = "Preparing connectivity";
pub const NO_APPS: &str = "No apps to deploy";
pub const DEPLOY_STARTED: &str = "Apps deployment started";
pub const NO_APPS_TO_DISCOVER: &str = "No apps to discover";
pub const DISCOVERY_STARTED: &str = "Apps are being discovered...";
pub const CONNECTING_ROUTES: &str = "Connecting all apps";
pub const SETUP_FINISHED: &str = "Reservation setup finished successfully";
pub const RELEASE_FINISHED: &str = "Release deployment completed";

/// Summary of a successful setup run.
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub run_id: Uuid,
    pub reservation_id: String,
    /// Deployment-server environment prepared for the release step.
    pub environment_name: Option<String>,
    pub deploy_results: DeployResultSet,
    pub outcomes: Vec<PipelineOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct SetupSequencer<A> {
    reservation_id: Arc<str>,
    api: Arc<A>,
    release: Option<Arc<dyn ReleaseDeployment>>,
    config: SetupConfig,
    cache: Arc<ResourceCache>,
}

impl<A> SetupSequencer<A>
where
    A: ReservationApi + 'static,
{
    pub fn new(reservation_id: impl Into<Arc<str>>, api: Arc<A>) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            api,
            release: None,
            config: SetupConfig::default(),
            cache: Arc::new(ResourceCache::new()),
        }
    }

    pub fn with_config(mut self, config: SetupConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable the release step.
    pub fn with_release(mut self, release: Arc<dyn ReleaseDeployment>) -> Self {
        self.release = Some(release);
        self
    }

    /// Run the whole setup for this reservation.
    #[instrument(skip_all, fields(reservation_id = %self.reservation_id))]
    pub async fn run(&self) -> Result<SetupReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "reservation setup started");

        self.write(SETUP_STARTED).await?;

        self.write(PREPARING_CONNECTIVITY).await?;
        self.api
            .prepare_connectivity(&self.reservation_id)
            .await
            .map_err(SandboxError::collaborator("prepare connectivity"))?;

        let mut reservation = self.reservation_details().await?;

        let environment_name = self.prepare_environment(&reservation).await?;

        let deploy_results = self.deploy_apps(&reservation).await?;

        match &deploy_results {
            Some(results) => {
                self.discover(results).await?;
                reservation = self.reservation_details().await?;
            }
            None => {
                info!("no apps to discover");
                self.write(NO_APPS_TO_DISCOVER).await?;
            }
        }

        self.connect_routes(&reservation).await?;

        let orchestrator = ProvisioningOrchestrator::new(
            Arc::clone(&self.reservation_id),
            Arc::clone(&self.api) as Arc<dyn SandboxApi>,
            Arc::clone(&self.cache),
        );
        let outcomes = orchestrator
            .run_with_gate(
                &reservation.created_resources(),
                deploy_results.as_ref(),
                Arc::new(StatusGate::new()),
            )
            .await?;

        self.write(SETUP_FINISHED).await?;

        if let (Some(release), Some(env)) = (&self.release, &environment_name) {
            self.deploy_release(release.as_ref(), env).await?;
        }

        METRICS.flush();
        Ok(SetupReport {
            run_id,
            reservation_id: self.reservation_id.to_string(),
            environment_name,
            deploy_results: deploy_results.unwrap_or_default(),
            outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn write(&self, text: &str) -> Result<()> {
        self.api
            .write_message(&self.reservation_id, text)
            .await
            .map_err(SandboxError::collaborator("write reservation message"))
    }

    async fn reservation_details(&self) -> Result<ReservationDetails> {
        self.api
            .get_reservation_details(&self.reservation_id)
            .await
            .map_err(SandboxError::collaborator("get reservation details"))
    }

    /// Create the release environment when a release step is configured and
    /// the reservation carries the release service.
    async fn prepare_environment(&self, reservation: &ReservationDetails) -> Result<Option<String>> {
        let Some(release) = &self.release else {
            return Ok(None);
        };
        if reservation
            .service(&self.config.release_service_name)
            .is_none()
        {
            debug!(
                service = %self.config.release_service_name,
                "release service not in reservation, skipping release step"
            );
            return Ok(None);
        }

        let name = reservation.environment_name(self.config.environment_name_limit);
        info!(environment = %name, "preparing release environment");
        release.prepare_environment(&name).await?;
        Ok(Some(name))
    }

    async fn deploy_apps(&self, reservation: &ReservationDetails) -> Result<Option<DeployResultSet>> {
        let app_names = reservation.app_names();
        if app_names.is_empty() {
            info!("no apps to deploy");
            self.write(NO_APPS).await?;
            return Ok(None);
        }

        self.write(DEPLOY_STARTED).await?;
        info!(apps = app_names.len(), "deploying apps");
        let results = self
            .api
            .deploy_apps_bulk(&self.reservation_id, &app_names)
            .await
            .map_err(SandboxError::collaborator("deploy apps"))?;
        Ok(Some(results))
    }

    /// Discover every successfully deployed resource. Discovery failures are
    /// reported to the reservation and never abort the setup.
    async fn discover(&self, results: &DeployResultSet) -> Result<()> {
        let mut announced = false;
        for record in results.successful() {
            let name = record.logical_resource_name.as_str();
            let details = match self.cache.get_or_fetch(self.api.as_ref(), name).await {
                Ok(details) => details,
                Err(e) => {
                    self.report_discovery_failure(name, &e).await?;
                    continue;
                }
            };

            if !details.flag(AUTOLOAD_PARAM) {
                info!(resource = %name, "autoload is off for deployed app");
                continue;
            }

            if !announced {
                self.write(DISCOVERY_STARTED).await?;
                announced = true;
            }

            if let Err(e) = self.autoload(name).await {
                self.report_discovery_failure(name, &e).await?;
            }
        }
        Ok(())
    }

    async fn autoload(&self, resource: &str) -> ApiResult<()> {
        debug!(resource = %resource, "running autoload");
        self.api.autoload(resource).await?;
        self.api
            .remap_child_resources(&self.reservation_id, resource)
            .await
    }

    async fn report_discovery_failure(&self, resource: &str, error: &ApiError) -> Result<()> {
        if self.config.is_ignored_discovery_error(error) {
            debug!(resource = %resource, error = %error, "ignoring benign discovery error");
            return Ok(());
        }
        warn!(resource = %resource, error = %error, "discovery failed");
        self.write(&format!(
            "Discovery failed on \"{resource}\": {}",
            error.message()
        ))
        .await
    }

    async fn connect_routes(&self, reservation: &ReservationDetails) -> Result<()> {
        let endpoints = reservation.disconnected_endpoints();
        if endpoints.is_empty() {
            info!("no routes to connect");
            return Ok(());
        }

        self.write(CONNECTING_ROUTES).await?;
        info!(endpoints = endpoints.len(), "connecting routes");
        self.api
            .connect_routes(&self.reservation_id, &endpoints)
            .await
            .map_err(SandboxError::collaborator("connect routes"))
    }

    async fn deploy_release(&self, release: &dyn ReleaseDeployment, environment: &str) -> Result<()> {
        let inputs = self
            .api
            .get_reservation_inputs(&self.reservation_id)
            .await
            .map_err(SandboxError::collaborator("get reservation inputs"))?;
        let request =
            ReleaseRequest::from_inputs(&inputs, &self.config.release_inputs, environment)?;

        info!(
            project = %request.project_name,
            version = %request.release_version,
            environment = %request.environment_name,
            "deploying release"
        );
        release.deploy_release(&request).await?;
        self.write(RELEASE_FINISHED).await
    }
}
