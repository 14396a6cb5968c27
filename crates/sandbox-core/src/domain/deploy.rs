//! Bulk deploy results produced by the cloud-provider deploy call.

use serde::{Deserialize, Serialize};

use crate::domain::error::DeployFailure;

/// One named input passed to an installation script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptInput {
    pub name: String,
    pub value: String,
}

impl ScriptInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Installation script attached to a freshly deployed application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallationDescriptor {
    pub script_name: String,
    #[serde(default)]
    pub script_inputs: Vec<ScriptInput>,
}

/// Outcome of deploying one application template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployResult {
    pub success: bool,
    /// Name of the resource created from the template.
    pub logical_resource_name: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub installation: Option<InstallationDescriptor>,
}

impl DeployResult {
    pub fn deployed(name: impl Into<String>) -> Self {
        Self {
            success: true,
            logical_resource_name: name.into(),
            error: String::new(),
            installation: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            logical_resource_name: name.into(),
            error: error.into(),
            installation: None,
        }
    }

    pub fn with_installation(
        mut self,
        script_name: impl Into<String>,
        script_inputs: Vec<ScriptInput>,
    ) -> Self {
        self.installation = Some(InstallationDescriptor {
            script_name: script_name.into(),
            script_inputs,
        });
        self
    }
}

/// Ordered per-resource deploy attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DeployResultSet {
    pub items: Vec<DeployResult>,
}

impl DeployResultSet {
    pub fn new(items: Vec<DeployResult>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeployResult> {
        self.items.iter()
    }

    pub fn successful(&self) -> impl Iterator<Item = &DeployResult> {
        self.items.iter().filter(|r| r.success)
    }

    /// The successful deploy record for `resource`. When several match, the
    /// last one wins.
    pub fn record_for(&self, resource: &str) -> Option<&DeployResult> {
        self.items
            .iter()
            .rev()
            .find(|r| r.success && r.logical_resource_name == resource)
    }

    /// Every failed deploy attempt, in deploy order.
    pub fn failures(&self) -> Vec<DeployFailure> {
        self.items
            .iter()
            .filter(|r| !r.success)
            .map(|r| DeployFailure {
                resource: r.logical_resource_name.clone(),
                error: r.error.clone(),
            })
            .collect()
    }
}

impl FromIterator<DeployResult> for DeployResultSet {
    fn from_iter<I: IntoIterator<Item = DeployResult>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_for_ignores_failed_attempts() {
        let results: DeployResultSet = vec![
            DeployResult::failed("web", "quota"),
            DeployResult::deployed("db"),
        ]
        .into_iter()
        .collect();

        assert!(results.record_for("web").is_none());
        assert!(results.record_for("db").is_some());
        assert!(results.record_for("cache").is_none());
    }

    #[test]
    fn test_record_for_last_match_wins() {
        let results = DeployResultSet::new(vec![
            DeployResult::deployed("web").with_installation("first", vec![]),
            DeployResult::deployed("web").with_installation("second", vec![]),
        ]);
        let record = results.record_for("web").unwrap();
        assert_eq!(
            record.installation.as_ref().unwrap().script_name,
            "second"
        );
    }

    #[test]
    fn test_failures_preserve_order() {
        let results = DeployResultSet::new(vec![
            DeployResult::failed("a", "e1"),
            DeployResult::deployed("b"),
            DeployResult::failed("c", "e2"),
        ]);
        let failures = results.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].resource, "a");
        assert_eq!(failures[1].error, "e2");
        assert_eq!(results.successful().count(), 1);
    }

    #[test]
    fn test_deploy_results_deserialize_from_array() {
        let json = serde_json::json!([
            {
                "success": true,
                "logical_resource_name": "web",
                "installation": {
                    "script_name": "install.sh",
                    "script_inputs": [{"name": "port", "value": "8080"}]
                }
            },
            {"success": false, "logical_resource_name": "db", "error": "no capacity"}
        ]);
        let results: DeployResultSet = serde_json::from_value(json).unwrap();
        assert_eq!(results.items.len(), 2);
        assert_eq!(results.items[1].error, "no capacity");
    }
}
