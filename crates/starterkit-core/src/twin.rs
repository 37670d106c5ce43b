// Device twin tagging
//
// Records a description and the device login on the device twin so the
// kit can be identified from the portal. Failures are shown and skipped.

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{info, instrument};

use starterkit_api::CommandExecutor;

use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Description written to the twin for starter kit devices.
pub const DEVICE_DESCRIPTION: &str = "Raspberry Pi 3";

/// Tags document for `device`.
pub fn device_tags(device: &str, user: &str, password: &str) -> serde_json::Value {
    json!({
        "id": device,
        "description": DEVICE_DESCRIPTION,
        "credentials": {
            "user": user,
            "password": password,
        }
    })
}

impl<E: CommandExecutor, P: PromptProvider> Provisioner<'_, E, P> {
    /// Returns `false` when the platform reported an error.
    #[instrument(skip_all)]
    pub async fn tag_device_twin(&self, ctx: &SessionContext) -> Result<bool, CoreError> {
        let device = ctx.device_name()?;
        let tags = device_tags(
            device,
            &ctx.target.user,
            ctx.target.password.expose_secret(),
        );
        let cmd = self.az.device_twin_update(
            ctx.resource_group_name()?,
            ctx.hub_name()?,
            device,
            &tags.to_string(),
        );

        let out = self.run(&cmd).await?;
        let clean = self.report_stderr("device-twin update", &out.stderr);
        if clean {
            info!(device, "device twin tagged");
        }
        Ok(clean)
    }
}
