//! Resource snapshots as returned by the inventory.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Custom parameter: power on the resource during setup.
pub const AUTO_POWER_ON_PARAM: &str = "auto_power_on";
/// Custom parameter: refresh and wait for the resource's IP address.
pub const WAIT_FOR_IP_PARAM: &str = "wait_for_ip";
/// Custom parameter: run discovery on a freshly deployed resource.
pub const AUTOLOAD_PARAM: &str = "autoload";

/// Virtual machine metadata attached to deployed applications.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmDetails {
    /// Cloud-provider identity. Present only on deployed applications.
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub custom_params: BTreeMap<String, String>,
}

/// Read-only snapshot of one inventory resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDetails {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub vm_details: Option<VmDetails>,
}

impl ResourceDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Snapshot of a deployed application with the given cloud identity.
    pub fn deployed_app(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vm_details: Some(VmDetails {
                uid: Some(uid.into()),
                custom_params: BTreeMap::new(),
            }),
            ..Default::default()
        }
    }

    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vm_details
            .get_or_insert_with(VmDetails::default)
            .custom_params
            .insert(key.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True when the resource carries a cloud identity, i.e. it was created
    /// from an application template.
    pub fn is_deployed_app(&self) -> bool {
        self.vm_details
            .as_ref()
            .and_then(|vm| vm.uid.as_ref())
            .is_some()
    }

    pub fn custom_param(&self, key: &str) -> Option<&str> {
        self.vm_details
            .as_ref()
            .and_then(|vm| vm.custom_params.get(key))
            .map(String::as_str)
    }

    /// Read a boolean custom parameter. Absent means `true`; present means
    /// `value.eq_ignore_ascii_case("true")`.
    pub fn flag(&self, key: &str) -> bool {
        parse_flag(self.custom_param(key))
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

pub(crate) fn parse_flag(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().eq_ignore_ascii_case("true"))
}

/// Per-resource stage toggles resolved from custom parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSettings {
    pub auto_power_on: bool,
    pub wait_for_ip: bool,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            auto_power_on: true,
            wait_for_ip: true,
        }
    }
}

impl ResourceSettings {
    pub fn from_details(details: &ResourceDetails) -> Self {
        Self {
            auto_power_on: details.flag(AUTO_POWER_ON_PARAM),
            wait_for_ip: details.flag(WAIT_FOR_IP_PARAM),
        }
    }
}

/// Result of classifying a resource before its pipeline runs.
#[derive(Debug, Clone)]
pub enum AppLookup {
    /// Not a deployed application (e.g. a pre-existing infrastructure node).
    NotApplicable,
    /// The inventory lookup failed; the pipeline proceeds with default settings.
    Pending { reason: String },
    /// A deployed application with its inventory snapshot.
    Ready(Arc<ResourceDetails>),
}

impl AppLookup {
    pub fn classify(details: Arc<ResourceDetails>) -> Self {
        if details.is_deployed_app() {
            AppLookup::Ready(details)
        } else {
            AppLookup::NotApplicable
        }
    }

    pub fn settings(&self) -> ResourceSettings {
        match self {
            AppLookup::Ready(details) => ResourceSettings::from_details(details),
            AppLookup::Pending { .. } | AppLookup::NotApplicable => ResourceSettings::default(),
        }
    }
}
