//! `iot configure-button`: register an IoT button and hand it its settings.

use tracing::info;

use starterkit_api::{ButtonClient, ProcessExecutor};
use starterkit_config::Config;
use starterkit_core::{ButtonConfigurator, PromptProvider};

use crate::cli::{ConfigureButtonArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::{self, ButtonSummary};
use crate::prompt::TerminalPrompter;

const FUNCTION_QUESTION: &str = "Would you like to set up a Sample Azure Function Application \
    for the Button? (This may result in charges)";

pub async fn handle(
    args: &ConfigureButtonArgs,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let format = config::output_format(global, cfg)?;
    let button_url = args.button_url.as_deref().unwrap_or(&cfg.button.url);
    let client = ButtonClient::new(button_url, &config::transport(global, cfg)).map_err(|e| {
        CliError::Validation {
            field: "button-url".into(),
            reason: e.to_string(),
        }
    })?;
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
    super::provision_identity(&provisioner, &mut ctx, false).await?;

    super::ask_to_connect(
        &prompt,
        global,
        "Please connect to the SSID of your IoT Button now.",
    )?;
    let button = ButtonConfigurator::new(&client).configure(&ctx).await?;
    prompt.notify("Your Button is now connected to Azure!");
    info!(device = ctx.device_name()?, "button configured");

    let deploy = if args.deploy_function {
        true
    } else if args.no_function || global.unattended {
        false
    } else {
        prompt.confirm(FUNCTION_QUESTION)?
    };
    let function_app = if deploy {
        Some(provisioner.deploy_function_app(&mut ctx).await?)
    } else {
        None
    };

    let summary = ButtonSummary {
        resource_group: ctx.resource_group_name()?.to_owned(),
        iothub: ctx.hub_name()?.to_owned(),
        hostname: ctx.hostname()?.to_owned(),
        device: ctx.device_name()?.to_owned(),
        button,
        function_app,
    };
    output::print_output(&output::render_button(format, &summary)?);
    Ok(())
}
