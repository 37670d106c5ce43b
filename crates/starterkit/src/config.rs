//! Resolve session settings: CLI flag, then config file, then default.

use std::time::Duration;

use secrecy::SecretString;

use starterkit_api::{Az, CommandExecutor, DeviceTarget, TransportConfig};
use starterkit_config::Config;
use starterkit_core::{
    HubSku, LOCATIONS, PromptProvider, Provisioner, RegistrySku, SessionContext,
    WifiCredentials,
};

use crate::cli::{GlobalOpts, HubSkuArg, OutputFormat, RegistrySkuArg};
use crate::error::CliError;
use crate::prompt::TerminalPrompter;

pub use starterkit_config::{config_path, load_config, save_config};

const SSID_PROMPT: &str = "Please enter the SSID of a WiFi Network with internet access. \
    Your device will be configured to connect to this WiFi network";
const WIFI_PASSWORD_PROMPT: &str =
    "Please enter the password for the WiFi Network with internet access";

impl From<HubSkuArg> for HubSku {
    fn from(arg: HubSkuArg) -> Self {
        match arg {
            HubSkuArg::F1 => HubSku::F1,
            HubSkuArg::S1 => HubSku::S1,
            HubSkuArg::S2 => HubSku::S2,
            HubSkuArg::S3 => HubSku::S3,
        }
    }
}

impl From<RegistrySkuArg> for RegistrySku {
    fn from(arg: RegistrySkuArg) -> Self {
        match arg {
            RegistrySkuArg::Basic => RegistrySku::Basic,
            RegistrySkuArg::Standard => RegistrySku::Standard,
            RegistrySkuArg::Premium => RegistrySku::Premium,
            RegistrySkuArg::Classic => RegistrySku::Classic,
        }
    }
}

pub fn output_format(global: &GlobalOpts, cfg: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    <OutputFormat as clap::ValueEnum>::from_str(&cfg.defaults.output, true).map_err(|_| {
        CliError::Validation {
            field: "defaults.output".into(),
            reason: format!("'{}' is not one of table, json, yaml", cfg.defaults.output),
        }
    })
}

/// HTTP transport with `--timeout` layered over `defaults.timeout`.
pub fn transport(global: &GlobalOpts, cfg: &Config) -> TransportConfig {
    match global.timeout {
        Some(secs) => cfg.transport().with_timeout(Duration::from_secs(secs)),
        None => cfg.transport(),
    }
}

/// WiFi credentials from flags, asking for whatever is missing.
pub fn wifi_credentials(
    global: &GlobalOpts,
    prompt: &TerminalPrompter,
) -> Result<WifiCredentials, CliError> {
    let ssid = match &global.wifi_ssid {
        Some(ssid) if !ssid.trim().is_empty() => ssid.clone(),
        Some(_) => {
            return Err(CliError::Validation {
                field: "wifi-ssid".into(),
                reason: "cannot be empty".into(),
            });
        }
        None => prompt.input(SSID_PROMPT)?,
    };

    let password = match &global.wifi_password {
        Some(password) => SecretString::from(password.clone()),
        None => prompt.secret_with_confirmation(WIFI_PASSWORD_PROMPT)?,
    };

    Ok(WifiCredentials { ssid, password })
}

/// Build the session context from flags layered over the config file.
pub fn session_context(
    global: &GlobalOpts,
    cfg: &Config,
    wifi: WifiCredentials,
) -> Result<SessionContext, CliError> {
    let hub_sku = match global.iothub_sku {
        Some(arg) => arg.into(),
        None => cfg.hub_sku()?,
    };
    let registry_sku = match global.container_registry_sku {
        Some(arg) => arg.into(),
        None => cfg.registry_sku()?,
    };

    let target = DeviceTarget::new(
        global.device_ip.clone().unwrap_or_else(|| cfg.device.ip.clone()),
        global
            .device_user
            .clone()
            .unwrap_or_else(|| cfg.device.user.clone()),
        SecretString::from(global.device_password.clone()),
    );
    let function_name = global
        .fn_name
        .clone()
        .unwrap_or_else(|| cfg.provisioning.fn_name.clone());

    let location = match non_empty(global.location.as_deref()) {
        Some(location) if LOCATIONS.contains(&location.as_str()) => Some(location),
        Some(location) => {
            return Err(CliError::Validation {
                field: "location".into(),
                reason: format!("unknown location '{location}'"),
            });
        }
        None => cfg.location()?,
    };

    let mut ctx = SessionContext::new(wifi, target, function_name);
    ctx.resource_group = non_empty(global.resource_group.as_deref());
    ctx.location = location;
    ctx.hub = non_empty(global.iothub.as_deref());
    ctx.hub_sku = hub_sku;
    ctx.device = non_empty(global.device.as_deref());
    ctx.registry = non_empty(global.container_registry.as_deref());
    ctx.registry_sku = Some(registry_sku);
    Ok(ctx)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Provisioner with the configured `az` binary and attempt bound.
pub fn provisioner<'a, E: CommandExecutor, P: PromptProvider>(
    executor: &'a E,
    prompt: &'a P,
    global: &GlobalOpts,
    cfg: &Config,
) -> Provisioner<'a, E, P> {
    let provisioner =
        Provisioner::new(executor, prompt).with_az(Az::new(cfg.defaults.az_program.clone()));
    match global.max_attempts.or(cfg.defaults.max_attempts) {
        Some(attempts) => provisioner.with_max_attempts(attempts),
        None => provisioner,
    }
}
