// ── Session context ──
//
// Everything the operator supplied plus everything learned from the cloud
// platform during one run. Derived values are write-once: the first value
// recorded for a field wins for the rest of the session.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use starterkit_api::DeviceTarget;

use crate::error::CoreError;

/// Regions offered when a resource group has to be created.
pub const LOCATIONS: [&str; 26] = [
    "eastus",
    "eastus2",
    "centralus",
    "southcentralus",
    "westcentralus",
    "westus",
    "westus2",
    "canadaeast",
    "canadacentral",
    "brazilsouth",
    "northeurope",
    "westeurope",
    "ukwest",
    "uksouth",
    "germanycentral",
    "germanynortheast",
    "southeastasia",
    "eastasia",
    "australiaeast",
    "australiasoutheast",
    "centralindia",
    "southindia",
    "japaneast",
    "japanwest",
    "koreacentral",
    "koreasouth",
];

/// Location used for the function app when no resource group was created
/// in this session.
pub const DEFAULT_FUNCTION_LOCATION: &str = "westus";

// ── Skus ─────────────────────────────────────────────────────────────

/// IoT hub pricing tier.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum HubSku {
    /// Free tier, one per subscription.
    #[default]
    F1,
    S1,
    S2,
    S3,
}

impl HubSku {
    /// Paid tiers offered when the free tier is refused.
    pub fn paid() -> Vec<Self> {
        Self::iter().filter(|s| *s != Self::F1).collect()
    }
}

/// Container registry pricing tier.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum RegistrySku {
    #[default]
    Basic,
    Standard,
    Premium,
    Classic,
}

// ── Context ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: SecretString,
}

/// Values discovered from the platform. Private so every write goes
/// through the set-once setters on [`SessionContext`].
#[derive(Debug, Default)]
struct Derived {
    hostname: Option<String>,
    device_key: Option<SecretString>,
    device_cs: Option<SecretString>,
    hub_cs: Option<SecretString>,
    registry_user: Option<String>,
    registry_password: Option<SecretString>,
}

/// Typed configuration accumulated over one provisioning session.
#[derive(Debug)]
pub struct SessionContext {
    pub wifi: WifiCredentials,
    pub resource_group: Option<String>,
    /// Set when a resource group is created, or from configuration.
    pub location: Option<String>,
    pub hub: Option<String>,
    pub hub_sku: HubSku,
    pub device: Option<String>,
    pub registry: Option<String>,
    /// `None` makes registry creation ask for a tier.
    pub registry_sku: Option<RegistrySku>,
    pub target: DeviceTarget,
    pub function_name: String,
    derived: Derived,
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> bool {
    if slot.is_some() {
        debug!(field, "already known, keeping the first value");
        return false;
    }
    *slot = Some(value);
    true
}

fn known<'a, T>(slot: &'a Option<T>, field: &'static str) -> Result<&'a T, CoreError> {
    slot.as_ref().ok_or(CoreError::MissingSetting { field })
}

impl SessionContext {
    pub fn new(wifi: WifiCredentials, target: DeviceTarget, function_name: impl Into<String>) -> Self {
        Self {
            wifi,
            resource_group: None,
            location: None,
            hub: None,
            hub_sku: HubSku::default(),
            device: None,
            registry: None,
            registry_sku: Some(RegistrySku::default()),
            target,
            function_name: function_name.into(),
            derived: Derived::default(),
        }
    }

    // ── Reconciled names ─────────────────────────────────────────────

    pub fn resource_group_name(&self) -> Result<&str, CoreError> {
        known(&self.resource_group, "resource group").map(String::as_str)
    }

    pub fn hub_name(&self) -> Result<&str, CoreError> {
        known(&self.hub, "IoT hub").map(String::as_str)
    }

    pub fn device_name(&self) -> Result<&str, CoreError> {
        known(&self.device, "device name").map(String::as_str)
    }

    pub fn registry_name(&self) -> Result<&str, CoreError> {
        known(&self.registry, "container registry").map(String::as_str)
    }

    // ── Derived values ───────────────────────────────────────────────

    pub fn has_hostname(&self) -> bool {
        self.derived.hostname.is_some()
    }

    pub fn hostname(&self) -> Result<&str, CoreError> {
        known(&self.derived.hostname, "hub hostname").map(String::as_str)
    }

    /// Returns `false` when a hostname was already recorded.
    pub fn set_hostname(&mut self, value: impl Into<String>) -> bool {
        set_once(&mut self.derived.hostname, value.into(), "hub hostname")
    }

    pub fn has_device_key(&self) -> bool {
        self.derived.device_key.is_some()
    }

    pub fn device_key(&self) -> Result<&str, CoreError> {
        known(&self.derived.device_key, "device key").map(|s| s.expose_secret())
    }

    pub fn set_device_key(&mut self, value: impl Into<String>) -> bool {
        set_once(
            &mut self.derived.device_key,
            SecretString::from(value.into()),
            "device key",
        )
    }

    pub fn has_device_cs(&self) -> bool {
        self.derived.device_cs.is_some()
    }

    pub fn device_cs(&self) -> Result<&str, CoreError> {
        known(&self.derived.device_cs, "device connection string").map(|s| s.expose_secret())
    }

    pub fn set_device_cs(&mut self, value: impl Into<String>) -> bool {
        set_once(
            &mut self.derived.device_cs,
            SecretString::from(value.into()),
            "device connection string",
        )
    }

    pub fn has_hub_cs(&self) -> bool {
        self.derived.hub_cs.is_some()
    }

    pub fn hub_cs(&self) -> Result<&str, CoreError> {
        known(&self.derived.hub_cs, "hub connection string").map(|s| s.expose_secret())
    }

    pub fn set_hub_cs(&mut self, value: impl Into<String>) -> bool {
        set_once(
            &mut self.derived.hub_cs,
            SecretString::from(value.into()),
            "hub connection string",
        )
    }

    pub fn registry_user(&self) -> Result<&str, CoreError> {
        known(&self.derived.registry_user, "registry user").map(String::as_str)
    }

    pub fn set_registry_user(&mut self, value: impl Into<String>) -> bool {
        set_once(
            &mut self.derived.registry_user,
            value.into(),
            "registry user",
        )
    }

    pub fn registry_password(&self) -> Result<&str, CoreError> {
        known(&self.derived.registry_password, "registry password")
            .map(|s| s.expose_secret())
    }

    pub fn set_registry_password(&mut self, value: impl Into<String>) -> bool {
        set_once(
            &mut self.derived.registry_password,
            SecretString::from(value.into()),
            "registry password",
        )
    }
}
