//! `iot configure-device`: provision an IoT Edge device and bring it up.

use tracing::info;

use starterkit_api::{ArchiveDownloader, PingProbe, ProcessExecutor, SshConnector};
use starterkit_config::Config;
use starterkit_core::DeviceBringup;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output::{self, DeviceSummary};
use crate::prompt::TerminalPrompter;

pub async fn handle(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let format = config::output_format(global, cfg)?;
    let plan = cfg.bringup_plan(!global.unattended)?;
    let prompt = TerminalPrompter::new();
    let wifi = config::wifi_credentials(global, &prompt)?;
    let mut ctx = config::session_context(global, cfg, wifi)?;

    super::ask_to_connect(
        &prompt,
        global,
        "Please ensure you are connected to a network with internet access now.",
    )?;

    let executor = ProcessExecutor;
    let provisioner = config::provisioner(&executor, &prompt, global, cfg);
    super::provision_identity(&provisioner, &mut ctx, true).await?;
    provisioner.reconcile_registry(&mut ctx).await?;
    let twin_tagged = provisioner.tag_device_twin(&ctx).await?;

    let probe = PingProbe::new(ProcessExecutor);
    let connector = SshConnector::new(cfg.ssh_timeout());
    let fetcher = ArchiveDownloader::new(&config::transport(global, cfg))?;
    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan);
    let report = bringup.run(&ctx).await?;
    info!(device = %ctx.target.host, "device bring-up finished");

    let summary = DeviceSummary {
        resource_group: ctx.resource_group_name()?.to_owned(),
        iothub: ctx.hub_name()?.to_owned(),
        hostname: ctx.hostname()?.to_owned(),
        device: ctx.device_name()?.to_owned(),
        container_registry: ctx.registry_name()?.to_owned(),
        twin_tagged,
        device_ip: ctx.target.host.clone(),
        states: report.states,
    };
    output::print_output(&output::render_device(format, &summary)?);
    Ok(())
}
