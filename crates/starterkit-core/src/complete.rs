// Parameter completion
//
// Once the hub and device exist, fill the derived values the configurators
// need. Each missing value costs exactly one query and any failure ends the
// session; values already known are left alone.

use tracing::{debug, instrument};

use starterkit_api::CommandExecutor;
use starterkit_api::models::{ConnectionString, DeviceIdentity, HubDescription};

use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

impl<E: CommandExecutor, P: PromptProvider> Provisioner<'_, E, P> {
    /// Fill hub hostname, device key, device connection string and hub
    /// connection string, in that order, skipping any already known.
    #[instrument(skip_all)]
    pub async fn complete_parameters(&self, ctx: &mut SessionContext) -> Result<(), CoreError> {
        let group = ctx.resource_group_name()?.to_owned();
        let hub = ctx.hub_name()?.to_owned();
        let device = ctx.device_name()?.to_owned();

        if !ctx.has_hostname() {
            const FIELD: &str = "hub hostname";
            let out = self.run_json(&self.az.hub_show(&group, &hub)).await?;
            fail_on_stderr(FIELD, out.error_text())?;
            let described = out.decode::<HubDescription>()?;
            let host = described
                .as_ref()
                .and_then(HubDescription::host_name)
                .ok_or_else(|| absent(FIELD))?;
            ctx.set_hostname(host);
        }

        if !ctx.has_device_key() {
            const FIELD: &str = "device key";
            let cmd = self.az.device_show(&group, &hub, &device);
            let out = self.run_json(&cmd).await?;
            fail_on_stderr(FIELD, out.error_text())?;
            let identity = out.decode::<DeviceIdentity>()?;
            let key = identity
                .as_ref()
                .and_then(DeviceIdentity::primary_key)
                .ok_or_else(|| absent(FIELD))?;
            ctx.set_device_key(key);
        }

        if !ctx.has_device_cs() {
            const FIELD: &str = "device connection string";
            let cmd = self.az.device_connection_string(&group, &hub, &device);
            let out = self.run_json(&cmd).await?;
            fail_on_stderr(FIELD, out.error_text())?;
            let cs = out
                .decode::<ConnectionString>()?
                .and_then(|c| c.cs)
                .ok_or_else(|| absent(FIELD))?;
            ctx.set_device_cs(cs);
        }

        if !ctx.has_hub_cs() {
            // This query writes to stderr even when it succeeds, so the
            // returned value decides and stderr is only shown without one.
            let out = self
                .run_json(&self.az.hub_connection_string(&group, &hub))
                .await?;
            let cs = out
                .decode::<ConnectionString>()
                .ok()
                .flatten()
                .and_then(|c| c.cs);
            match cs {
                Some(cs) => {
                    if !out.is_clean() {
                        debug!(stderr = out.error_text(), "ignoring stderr alongside hub connection string");
                    }
                    ctx.set_hub_cs(cs);
                }
                None => {
                    return Err(CoreError::Completion {
                        field: "hub connection string",
                        message: out.error_text().to_owned(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn fail_on_stderr(field: &'static str, stderr: &str) -> Result<(), CoreError> {
    if stderr.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Completion {
            field,
            message: stderr.to_owned(),
        })
    }
}

fn absent(field: &'static str) -> CoreError {
    CoreError::Completion {
        field,
        message: "not present in the platform's answer".into(),
    }
}
