//! Configuration for the `iot` CLI.
//!
//! A TOML file at the platform config directory supplies defaults for
//! every session flag that is not a secret. `STARTERKIT_SECTION__KEY`
//! environment variables override the file; CLI flags override both.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use starterkit_api::{DEFAULT_BUTTON_URL, TransportConfig};
use starterkit_core::{
    ACCESS_POINT_ADDRESS, BringupPlan, HubSku, LOCATIONS, RegistrySku, SCRIPTS_URL,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub provisioning: Provisioning,

    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub button: ButtonSettings,
}

/// Behavior of the CLI itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Cloud CLI binary.
    #[serde(default = "default_az_program")]
    pub az_program: String,

    /// Creation attempts per resource before giving up. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            az_program: default_az_program(),
            max_attempts: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_az_program() -> String {
    "az".into()
}

/// Cloud resource defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Provisioning {
    /// Region for new resource groups. Asked for when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default = "default_iothub_sku")]
    pub iothub_sku: String,

    #[serde(default = "default_registry_sku")]
    pub container_registry_sku: String,

    #[serde(default = "default_fn_name")]
    pub fn_name: String,
}

impl Default for Provisioning {
    fn default() -> Self {
        Self {
            location: None,
            iothub_sku: default_iothub_sku(),
            container_registry_sku: default_registry_sku(),
            fn_name: default_fn_name(),
        }
    }
}

fn default_iothub_sku() -> String {
    HubSku::default().to_string()
}
fn default_registry_sku() -> String {
    RegistrySku::default().to_string()
}
fn default_fn_name() -> String {
    "sampleiotfunction".into()
}

/// Device bring-up settings. The device password is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSettings {
    #[serde(default = "default_device_ip")]
    pub ip: String,

    #[serde(default = "default_device_user")]
    pub user: String,

    #[serde(default = "default_scripts_url")]
    pub scripts_url: String,

    #[serde(default = "default_probe_host")]
    pub network_probe_host: String,

    /// Seconds between reachability polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds to wait after the device first answers.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,

    /// SSH connect timeout in seconds.
    #[serde(default = "default_ssh_timeout")]
    pub ssh_timeout: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            ip: default_device_ip(),
            user: default_device_user(),
            scripts_url: default_scripts_url(),
            network_probe_host: default_probe_host(),
            poll_interval: default_poll_interval(),
            settle_delay: default_settle_delay(),
            ssh_timeout: default_ssh_timeout(),
        }
    }
}

fn default_device_ip() -> String {
    ACCESS_POINT_ADDRESS.into()
}
fn default_device_user() -> String {
    "pi".into()
}
fn default_scripts_url() -> String {
    SCRIPTS_URL.into()
}
fn default_probe_host() -> String {
    "8.8.8.8".into()
}
fn default_poll_interval() -> u64 {
    2
}
fn default_settle_delay() -> u64 {
    5
}
fn default_ssh_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ButtonSettings {
    #[serde(default = "default_button_url")]
    pub url: String,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            url: default_button_url(),
        }
    }
}

fn default_button_url() -> String {
    DEFAULT_BUTTON_URL.into()
}

// ── Translation to session types ────────────────────────────────────

impl Config {
    pub fn hub_sku(&self) -> Result<HubSku, ConfigError> {
        HubSku::from_str(&self.provisioning.iothub_sku)
            .map_err(|_| invalid("provisioning.iothub_sku", "expected one of F1, S1, S2, S3"))
    }

    pub fn registry_sku(&self) -> Result<RegistrySku, ConfigError> {
        RegistrySku::from_str(&self.provisioning.container_registry_sku).map_err(|_| {
            invalid(
                "provisioning.container_registry_sku",
                "expected one of Basic, Standard, Premium, Classic",
            )
        })
    }

    /// Preset region for new resource groups, if one is configured.
    pub fn location(&self) -> Result<Option<String>, ConfigError> {
        match self.provisioning.location.as_deref() {
            Some(location) => Ok(Some(check_location("provisioning.location", location)?)),
            None => Ok(None),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(Duration::from_secs(self.defaults.timeout))
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.device.ssh_timeout)
    }

    /// Polling and download settings for device bring-up.
    pub fn bringup_plan(&self, interactive: bool) -> Result<BringupPlan, ConfigError> {
        let archive_url = Url::parse(&self.device.scripts_url)
            .map_err(|e| invalid("device.scripts_url", e.to_string()))?;
        if self.device.poll_interval == 0 {
            return Err(invalid("device.poll_interval", "must be at least 1 second"));
        }

        Ok(BringupPlan {
            network_probe_host: self.device.network_probe_host.clone(),
            poll_interval: Duration::from_secs(self.device.poll_interval),
            settle_delay: Duration::from_secs(self.device.settle_delay),
            interactive,
            ..BringupPlan::new(archive_url)
        })
    }

    /// Update one `section.key` entry, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let seconds = |field: &str| {
            value
                .parse::<u64>()
                .map_err(|_| invalid(field, "must be a number (seconds)"))
        };

        match key {
            "defaults.output" => match value {
                "table" | "json" | "yaml" => self.defaults.output = value.into(),
                _ => return Err(invalid(key, "must be 'table', 'json' or 'yaml'")),
            },
            "defaults.timeout" => self.defaults.timeout = seconds(key)?,
            "defaults.az_program" => self.defaults.az_program = value.into(),
            "defaults.max_attempts" => {
                let attempts = value
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid(key, "must be a positive number"))?;
                self.defaults.max_attempts = Some(attempts);
            }
            "provisioning.location" => {
                self.provisioning.location = Some(check_location(key, value)?);
            }
            "provisioning.iothub_sku" => {
                HubSku::from_str(value)
                    .map_err(|_| invalid(key, "expected one of F1, S1, S2, S3"))?;
                self.provisioning.iothub_sku = value.into();
            }
            "provisioning.container_registry_sku" => {
                RegistrySku::from_str(value).map_err(|_| {
                    invalid(key, "expected one of Basic, Standard, Premium, Classic")
                })?;
                self.provisioning.container_registry_sku = value.into();
            }
            "provisioning.fn_name" => self.provisioning.fn_name = value.into(),
            "device.ip" => self.device.ip = value.into(),
            "device.user" => self.device.user = value.into(),
            "device.scripts_url" => {
                Url::parse(value).map_err(|e| invalid(key, e.to_string()))?;
                self.device.scripts_url = value.into();
            }
            "device.network_probe_host" => self.device.network_probe_host = value.into(),
            "device.poll_interval" => self.device.poll_interval = seconds(key)?,
            "device.settle_delay" => self.device.settle_delay = seconds(key)?,
            "device.ssh_timeout" => self.device.ssh_timeout = seconds(key)?,
            "button.url" => {
                Url::parse(value).map_err(|e| invalid(key, e.to_string()))?;
                self.button.url = value.into();
            }
            other => {
                return Err(invalid(
                    other,
                    format!("unknown config key. Valid keys: {}", KEYS.join(", ")),
                ));
            }
        }
        Ok(())
    }
}

fn check_location(field: &str, value: &str) -> Result<String, ConfigError> {
    if LOCATIONS.contains(&value) {
        Ok(value.to_owned())
    } else {
        Err(invalid(field, format!("unknown location '{value}'")))
    }
}

/// Keys accepted by [`Config::set`].
pub const KEYS: &[&str] = &[
    "defaults.output",
    "defaults.timeout",
    "defaults.az_program",
    "defaults.max_attempts",
    "provisioning.location",
    "provisioning.iothub_sku",
    "provisioning.container_registry_sku",
    "provisioning.fn_name",
    "device.ip",
    "device.user",
    "device.scripts_url",
    "device.network_probe_host",
    "device.poll_interval",
    "device.settle_delay",
    "device.ssh_timeout",
    "button.url",
];

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "starterkit", "starterkit").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("starterkit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    // Flat STARTERKIT_* variables belong to CLI flags; only nested keys
    // address the file's sections.
    let env = Env::prefixed("STARTERKIT_")
        .filter(|key| key.as_str().contains("__"))
        .split("__");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env);

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
