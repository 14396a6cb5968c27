//! Per-resource pipeline stages and outcomes.

use serde::{Deserialize, Serialize};

/// A sequentially ordered unit of per-resource provisioning work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PowerOn,
    WaitForIp,
    Install,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::PowerOn, Stage::WaitForIp, Stage::Install];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::PowerOn => "power_on",
            Stage::WaitForIp => "wait_for_ip",
            Stage::Install => "install",
        }
    }

    /// Progress notification written the first time any resource reaches this
    /// stage in a run.
    pub fn announcement(&self) -> &'static str {
        match self {
            Stage::PowerOn => "Apps are powering on...",
            Stage::WaitForIp => "Waiting for apps IP addresses, this may take a while...",
            Stage::Install => "Apps are installing...",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Stage::PowerOn => 0,
            Stage::WaitForIp => 1,
            Stage::Install => 2,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal state of one resource pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status", content = "stage")]
pub enum OutcomeStatus {
    /// All enabled stages ran, including the installation script.
    Installed,
    /// Power-on and IP stages done; the deploy record carries no installation
    /// descriptor, so there was nothing to install.
    NoInstallStep,
    /// Power-on and IP stages done; the resource has no successful deploy
    /// record in this run (e.g. it existed before the run).
    NoDeployRecord,
    /// The resource is not a deployed application; no stage ran.
    NotApplicable,
    /// The pipeline halted at the given stage.
    Failed(Stage),
    /// The pipeline task ended without producing an outcome (it panicked).
    Aborted,
}

/// Result of one pipeline invocation. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub resource: String,
    pub status: OutcomeStatus,
    /// Human-readable failure detail naming the resource and stage; empty on
    /// success.
    pub message: String,
}

impl PipelineOutcome {
    pub fn succeeded(resource: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            resource: resource.into(),
            status,
            message: String::new(),
        }
    }

    pub fn failed(resource: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: OutcomeStatus::Failed(stage),
            message: message.into(),
        }
    }

    pub fn aborted(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: OutcomeStatus::Aborted,
            message: message.into(),
        }
    }

    pub fn success(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Failed(_) | OutcomeStatus::Aborted)
    }

    /// The stage the pipeline halted at, if it failed.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self.status {
            OutcomeStatus::Failed(stage) => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["power_on", "wait_for_ip", "install"]);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn test_only_failed_status_is_unsuccessful() {
        for status in [
            OutcomeStatus::Installed,
            OutcomeStatus::NoInstallStep,
            OutcomeStatus::NoDeployRecord,
            OutcomeStatus::NotApplicable,
        ] {
            assert!(PipelineOutcome::succeeded("vm", status).success());
        }
        let failed = PipelineOutcome::failed("vm", Stage::Install, "boom");
        assert!(!failed.success());
        assert_eq!(failed.failed_stage(), Some(Stage::Install));

        let aborted = PipelineOutcome::aborted("vm", "task panicked");
        assert!(!aborted.success());
        assert_eq!(aborted.failed_stage(), None);
    }

    #[test]
    fn test_outcome_serializes_stage_of_failure() {
        let failed = PipelineOutcome::failed("vm", Stage::WaitForIp, "no ip");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"]["status"], "failed");
        assert_eq!(json["status"]["stage"], "wait_for_ip");
    }
}
