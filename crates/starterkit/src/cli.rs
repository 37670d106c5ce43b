//! Clap derive structures for the `iot` CLI.
//!
//! Only depends on clap and clap_complete so `build.rs` can include it
//! for man page generation.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// iot -- provision IoT starter kits against Azure
#[derive(Debug, Parser)]
#[command(
    name = "iot",
    version,
    about = "Configure IoT starter kit devices and buttons for Azure IoT Hub",
    long_about = "Finds or creates the Azure resources an IoT starter kit needs \
        (resource group, IoT hub, device identity, container registry), then \
        configures the hardware: a Raspberry Pi based edge device over SSH, or \
        an IoT button over its setup access point.\n\n\
        Requires an authenticated Azure CLI ('az login') on PATH.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// SSID of the WiFi network the device will join (asked for if omitted)
    #[arg(long, env = "STARTERKIT_WIFI_SSID", global = true)]
    pub wifi_ssid: Option<String>,

    /// Password of that WiFi network (asked for if omitted)
    #[arg(long, env = "STARTERKIT_WIFI_PASSWORD", global = true, hide_env_values = true)]
    pub wifi_password: Option<String>,

    /// Resource group for the kit's Azure resources
    #[arg(long, short = 'g', env = "STARTERKIT_RESOURCE_GROUP", global = true)]
    pub resource_group: Option<String>,

    /// Region for a new resource group (asked for if omitted)
    #[arg(long, short = 'l', env = "STARTERKIT_LOCATION", global = true)]
    pub location: Option<String>,

    /// IoT hub name
    #[arg(long, env = "STARTERKIT_IOTHUB", global = true)]
    pub iothub: Option<String>,

    /// Pricing tier for a new IoT hub [default: F1]
    #[arg(long, value_enum, env = "STARTERKIT_IOTHUB_SKU", ignore_case = true, global = true)]
    pub iothub_sku: Option<HubSkuArg>,

    /// Device identity name in the IoT hub
    #[arg(long, env = "STARTERKIT_DEVICE_NAME", global = true)]
    pub device: Option<String>,

    /// Container registry for device module images
    #[arg(long, env = "STARTERKIT_CONTAINER_REGISTRY", global = true)]
    pub container_registry: Option<String>,

    /// Pricing tier for a new container registry [default: Basic]
    #[arg(
        long,
        value_enum,
        env = "STARTERKIT_CONTAINER_REGISTRY_SKU",
        ignore_case = true,
        global = true
    )]
    pub container_registry_sku: Option<RegistrySkuArg>,

    /// IP address of the device [default: 192.168.4.1]
    #[arg(long, env = "STARTERKIT_DEVICE_IP", global = true)]
    pub device_ip: Option<String>,

    /// Login user on the device [default: pi]
    #[arg(long, env = "STARTERKIT_DEVICE_USER", global = true)]
    pub device_user: Option<String>,

    /// Login password on the device
    #[arg(
        long,
        env = "STARTERKIT_DEVICE_PASSWORD",
        default_value = "raspberry",
        hide_env_values = true,
        global = true
    )]
    pub device_password: String,

    /// Name of the sample function app [default: sampleiotfunction]
    #[arg(long, env = "STARTERKIT_FN_NAME", global = true)]
    pub fn_name: Option<String>,

    /// Give up on a resource after this many failed creation attempts
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Do not pause for the operator while waiting on networks
    #[arg(long, global = true)]
    pub unattended: bool,

    /// Output format for the final summary
    #[arg(long, short = 'o', env = "STARTERKIT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// HTTP timeout in seconds
    #[arg(long, env = "STARTERKIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HubSkuArg {
    #[value(name = "F1")]
    F1,
    #[value(name = "S1")]
    S1,
    #[value(name = "S2")]
    S2,
    #[value(name = "S3")]
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegistrySkuArg {
    #[value(name = "Basic")]
    Basic,
    #[value(name = "Standard")]
    Standard,
    #[value(name = "Premium")]
    Premium,
    #[value(name = "Classic")]
    Classic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a Raspberry Pi based IoT Edge starter kit
    ///
    /// Finds or creates the Azure resources, tags the device twin, then
    /// connects to the device over SSH and launches its setup scripts.
    ConfigureDevice,

    /// Configure an IoT button and optionally deploy a sample function
    ConfigureButton(ConfigureButtonArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ConfigureButtonArgs {
    /// Deploy the sample function app without asking
    #[arg(long, conflicts_with = "no_function")]
    pub deploy_function: bool,

    /// Skip the sample function app without asking
    #[arg(long)]
    pub no_function: bool,

    /// Base URL of the button's setup access point [default: http://192.168.4.1]
    #[arg(long, env = "STARTERKIT_BUTTON_URL")]
    pub button_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Set a configuration value (e.g. device.ip 10.0.0.5)
    Set {
        /// Dotted key such as provisioning.iothub_sku
        key: String,
        value: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
