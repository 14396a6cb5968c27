//! Setup configuration.

use serde::{Deserialize, Serialize};

use crate::domain::ApiError;

/// Global input names read when building a release request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReleaseInputNames {
    pub project: String,
    pub channel: String,
    pub version: String,
    pub phase: String,
}

impl Default for ReleaseInputNames {
    fn default() -> Self {
        Self {
            project: "Project Name".to_string(),
            channel: "Channel Name".to_string(),
            version: "Release Version".to_string(),
            phase: "Phase Name".to_string(),
        }
    }
}

/// Configuration for one setup run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetupConfig {
    /// Reservation service whose presence enables the release step.
    pub release_service_name: String,
    /// Maximum length of a derived environment name.
    pub environment_name_limit: usize,
    /// Remote error codes that discovery treats as benign, on top of a
    /// driver missing the autoload or remap command.
    pub ignored_discovery_codes: Vec<String>,
    pub release_inputs: ReleaseInputNames,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            release_service_name: "Deployment Orchestrator".to_string(),
            environment_name_limit: 50,
            ignored_discovery_codes: vec!["129".to_string(), "151".to_string()],
            release_inputs: ReleaseInputNames::default(),
        }
    }
}

impl SetupConfig {
    pub fn with_release_service_name(mut self, name: impl Into<String>) -> Self {
        self.release_service_name = name.into();
        self
    }

    pub fn with_environment_name_limit(mut self, limit: usize) -> Self {
        self.environment_name_limit = limit;
        self
    }

    pub fn is_ignored_discovery_code(&self, code: Option<&str>) -> bool {
        code.is_some_and(|c| self.ignored_discovery_codes.iter().any(|i| i == c))
    }

    /// Discovery errors that are not reported to the reservation.
    pub fn is_ignored_discovery_error(&self, error: &ApiError) -> bool {
        matches!(error, ApiError::MissingCommand { .. })
            || self.is_ignored_discovery_code(error.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SetupConfig =
            serde_json::from_str(r#"{"environment_name_limit": 20}"#).unwrap();
        assert_eq!(config.environment_name_limit, 20);
        assert_eq!(config.release_service_name, "Deployment Orchestrator");
        assert_eq!(config.release_inputs.phase, "Phase Name");
    }

    #[test]
    fn test_ignored_discovery_codes() {
        let config = SetupConfig::default();
        assert!(config.is_ignored_discovery_code(Some("151")));
        assert!(!config.is_ignored_discovery_code(Some("500")));
        assert!(!config.is_ignored_discovery_code(None));
    }

    #[test]
    fn test_missing_command_is_always_ignored() {
        let config = SetupConfig {
            ignored_discovery_codes: Vec::new(),
            ..SetupConfig::default()
        };
        assert!(config.is_ignored_discovery_error(&ApiError::missing_command("remap")));
        assert!(!config.is_ignored_discovery_error(&ApiError::remote_with_code("151", "x")));
        assert!(SetupConfig::default()
            .is_ignored_discovery_error(&ApiError::remote_with_code("129", "no driver")));
    }
}
