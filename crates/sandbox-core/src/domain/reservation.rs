//! Reservation (sandbox) description used by the setup sequencer.

use serde::{Deserialize, Serialize};

/// An application template declared in the reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppTemplate {
    pub name: String,
}

/// A resource participating in the reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservedResource {
    pub name: String,
    /// Reservation that created this resource, if it was created by one.
    #[serde(default)]
    pub created_in_reservation: Option<String>,
}

impl ReservedResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_in_reservation: None,
        }
    }

    pub fn created_in(mut self, reservation_id: impl Into<String>) -> Self {
        self.created_in_reservation = Some(reservation_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectorState {
    Connected,
    Disconnected,
    PartiallyConnected,
    ConnectionFailed,
}

impl ConnectorState {
    /// States that still need a route connection.
    pub fn needs_connection(&self) -> bool {
        !matches!(self, ConnectorState::Connected)
    }
}

/// A visual connector (route) between two reservation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connector {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    pub state: ConnectorState,
}

/// A service in the reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub apps: Vec<AppTemplate>,
    #[serde(default)]
    pub resources: Vec<ReservedResource>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
}

impl ReservationDetails {
    /// Names of the declared apps, ignoring unnamed placeholders.
    pub fn app_names(&self) -> Vec<String> {
        self.apps
            .iter()
            .filter(|a| !a.name.is_empty())
            .map(|a| a.name.clone())
            .collect()
    }

    /// Resources created by this reservation.
    pub fn created_resources(&self) -> Vec<ReservedResource> {
        self.resources
            .iter()
            .filter(|r| r.created_in_reservation.as_deref() == Some(self.id.as_str()))
            .cloned()
            .collect()
    }

    /// Endpoints of every connector that still needs a route, targets before
    /// sources.
    pub fn disconnected_endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::new();
        for connector in &self.connectors {
            if connector.state.needs_connection()
                && !connector.source.is_empty()
                && !connector.target.is_empty()
            {
                endpoints.push(connector.target.clone());
                endpoints.push(connector.source.clone());
            }
        }
        endpoints
    }

    pub fn service(&self, name: &str) -> Option<&ServiceInfo> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Environment name derived from the reservation, keeping only the
    /// trailing `limit` characters.
    pub fn environment_name(&self, limit: usize) -> String {
        let full = format!("{} - {}", self.name, self.id);
        let len = full.chars().count();
        if len <= limit {
            return full;
        }
        full.chars().skip(len - limit).collect()
    }
}
