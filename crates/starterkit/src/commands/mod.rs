//! Command handlers.

pub mod config_cmd;
pub mod configure_button;
pub mod configure_device;

use starterkit_core::PromptProvider;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::prompt::TerminalPrompter;

/// Ask the operator to join a network before anything talks to it.
pub(crate) fn ask_to_connect(
    prompt: &TerminalPrompter,
    global: &GlobalOpts,
    message: &str,
) -> Result<(), CliError> {
    if global.unattended {
        prompt.notify(message);
        return Ok(());
    }
    prompt.pause(message)?;
    Ok(())
}

/// Resource group, hub and device identity, then their derived settings.
pub(crate) async fn provision_identity<E, P>(
    provisioner: &starterkit_core::Provisioner<'_, E, P>,
    ctx: &mut starterkit_core::SessionContext,
    edge: bool,
) -> Result<(), CliError>
where
    E: starterkit_api::CommandExecutor,
    P: PromptProvider,
{
    provisioner.reconcile_resource_group(ctx).await?;
    provisioner.reconcile_hub(ctx).await?;
    provisioner.reconcile_device(ctx, edge).await?;
    provisioner.complete_parameters(ctx).await?;
    Ok(())
}
