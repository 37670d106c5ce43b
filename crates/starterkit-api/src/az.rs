// Azure CLI command builders
//
// One constructor per platform operation. Subcommand names and flags match
// what the `az` CLI (with the azure-iot extension) expects; values are
// passed as separate arguments.

use crate::exec::CloudCommand;

/// Default name of the platform CLI binary.
pub const DEFAULT_PROGRAM: &str = "az";

/// Builds `az` invocations.
#[derive(Debug, Clone)]
pub struct Az {
    program: String,
}

impl Default for Az {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Az {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn cmd<const N: usize>(&self, words: [&str; N]) -> CloudCommand {
        CloudCommand::new(&self.program).args(words)
    }

    // ── Resource groups ──────────────────────────────────────────────

    /// Prints `true` or `false` on stdout.
    pub fn group_exists(&self, name: &str) -> CloudCommand {
        self.cmd(["group", "exists", "-n", name])
    }

    pub fn group_create(&self, name: &str, location: &str) -> CloudCommand {
        self.cmd(["group", "create", "-n", name, "-l", location])
    }

    // ── IoT hubs ─────────────────────────────────────────────────────

    pub fn hub_show(&self, resource_group: &str, name: &str) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "show",
            "--resource-group",
            resource_group,
            "--name",
            name,
        ])
    }

    /// Hub lookup by name only, used for the event hub endpoint.
    pub fn hub_show_by_name(&self, name: &str) -> CloudCommand {
        self.cmd(["iot", "hub", "show", "-n", name])
    }

    pub fn hub_create(&self, resource_group: &str, name: &str, sku: &str) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "create",
            "--resource-group",
            resource_group,
            "--name",
            name,
            "--sku",
            sku,
        ])
    }

    pub fn hub_connection_string(&self, resource_group: &str, hub: &str) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "show-connection-string",
            "--resource-group",
            resource_group,
            "--hub-name",
            hub,
        ])
    }

    // ── Device identities ────────────────────────────────────────────

    pub fn device_list(&self, resource_group: &str, hub: &str) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "device-identity",
            "list",
            "-g",
            resource_group,
            "--hub-name",
            hub,
        ])
    }

    pub fn device_show(&self, resource_group: &str, hub: &str, device: &str) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "device-identity",
            "show",
            "--resource-group",
            resource_group,
            "--hub-name",
            hub,
            "--device-id",
            device,
        ])
    }

    /// `edge` adds `--edge-enabled` for IoT Edge runtimes.
    pub fn device_create(
        &self,
        resource_group: &str,
        hub: &str,
        device: &str,
        edge: bool,
    ) -> CloudCommand {
        let mut cmd = self.cmd(["iot", "hub", "device-identity", "create"]);
        if edge {
            cmd = cmd.arg("--edge-enabled");
        }
        cmd.args([
            "--resource-group",
            resource_group,
            "--hub-name",
            hub,
            "--device-id",
            device,
        ])
    }

    pub fn device_connection_string(
        &self,
        resource_group: &str,
        hub: &str,
        device: &str,
    ) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "device-identity",
            "show-connection-string",
            "--resource-group",
            resource_group,
            "--hub-name",
            hub,
            "--device-id",
            device,
        ])
    }

    /// `tags_json` is embedded as `tags=<json>`; it carries device
    /// credentials and is masked in logs.
    pub fn device_twin_update(
        &self,
        resource_group: &str,
        hub: &str,
        device: &str,
        tags_json: &str,
    ) -> CloudCommand {
        self.cmd([
            "iot",
            "hub",
            "device-twin",
            "update",
            "--resource-group",
            resource_group,
            "--hub-name",
            hub,
            "--device-id",
            device,
            "--set",
        ])
        .secret_arg(format!("tags={tags_json}"))
    }

    // ── Container registries ─────────────────────────────────────────

    pub fn registry_list(&self, resource_group: &str) -> CloudCommand {
        self.cmd(["acr", "list", "-g", resource_group])
    }

    pub fn registry_create(&self, name: &str, resource_group: &str, sku: &str) -> CloudCommand {
        self.cmd([
            "acr",
            "create",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--sku",
            sku,
            "--admin-enabled",
            "true",
        ])
    }

    pub fn registry_credentials(&self, name: &str, resource_group: &str) -> CloudCommand {
        self.cmd([
            "acr",
            "credential",
            "show",
            "--name",
            name,
            "--resource-group",
            resource_group,
        ])
    }

    // ── Storage accounts ─────────────────────────────────────────────

    pub fn storage_list(&self, resource_group: &str) -> CloudCommand {
        self.cmd(["storage", "account", "list", "-g", resource_group])
    }

    pub fn storage_create(&self, name: &str, resource_group: &str) -> CloudCommand {
        self.cmd([
            "storage",
            "account",
            "create",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--sku",
            "Standard_LRS",
        ])
    }

    // ── Function apps ────────────────────────────────────────────────

    pub fn functionapp_create(
        &self,
        resource_group: &str,
        name: &str,
        storage_account: &str,
        location: &str,
    ) -> CloudCommand {
        self.cmd([
            "functionapp",
            "create",
            "-g",
            resource_group,
            "-n",
            name,
            "-s",
            storage_account,
            "-c",
            location,
        ])
    }

    /// Each setting is a `KEY=VALUE` pair; values carry connection
    /// strings and are masked in logs.
    pub fn functionapp_settings(
        &self,
        name: &str,
        resource_group: &str,
        settings: &[(&str, &str)],
    ) -> CloudCommand {
        let mut cmd = self.cmd([
            "functionapp",
            "config",
            "appsettings",
            "set",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--settings",
        ]);
        for (key, value) in settings {
            cmd = cmd.secret_arg(format!("{key}={value}"));
        }
        cmd
    }

    pub fn functionapp_deploy_zip(
        &self,
        resource_group: &str,
        name: &str,
        archive: &str,
    ) -> CloudCommand {
        self.cmd([
            "functionapp",
            "deployment",
            "source",
            "config-zip",
            "-g",
            resource_group,
            "--name",
            name,
            "--src",
            archive,
        ])
    }
}
