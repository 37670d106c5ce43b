// `az` output models
//
// Only the fields the provisioning flow reads are modeled. The CLI emits
// camelCase keys and omits fields freely across versions, so most fields
// default when absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Generic ──────────────────────────────────────────────────────────

/// Any listed resource; only the name is compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    #[serde(default)]
    pub name: String,
}

/// Output of the `show-connection-string` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionString {
    #[serde(default, alias = "connectionString")]
    pub cs: Option<String>,
}

// ── IoT hub ──────────────────────────────────────────────────────────

/// `az iot hub show`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HubDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: HubProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubProperties {
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub event_hub_endpoints: HashMap<String, EventHubEndpoint>,
}

/// Built-in event hub compatible endpoint. The hub always exposes one
/// named `events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventHubEndpoint {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub path: String,
}

impl HubDescription {
    pub fn host_name(&self) -> Option<&str> {
        self.properties.host_name.as_deref().filter(|h| !h.is_empty())
    }

    pub fn events_endpoint(&self) -> Option<&EventHubEndpoint> {
        self.properties.event_hub_endpoints.get("events")
    }
}

// ── Device identity ──────────────────────────────────────────────────

/// `az iot hub device-identity show|create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub authentication: DeviceAuthentication,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthentication {
    #[serde(default)]
    pub symmetric_key: SymmetricKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetricKey {
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl DeviceIdentity {
    pub fn primary_key(&self) -> Option<&str> {
        self.authentication
            .symmetric_key
            .primary_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }
}

// ── Container registry ───────────────────────────────────────────────

/// `az acr credential show`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub passwords: Vec<RegistryPassword>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryPassword {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl RegistryCredentials {
    /// The first admin password; the registry issues two.
    pub fn primary_password(&self) -> Option<&str> {
        self.passwords.first().map(|p| p.value.as_str())
    }
}
