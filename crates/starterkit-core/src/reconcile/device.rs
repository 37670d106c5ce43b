use starterkit_api::CommandExecutor;
use starterkit_api::models::DeviceIdentity;

use super::{Outcome, Resource, listed, rejection};
use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Device identities within the session's hub.
pub(crate) struct DeviceKind {
    pub(crate) edge: bool,
}

impl<E: CommandExecutor, P: PromptProvider> Resource<E, P> for DeviceKind {
    type Found = DeviceIdentity;

    const LABEL: &'static str = "IoT Hub Device";
    const NAME_PROMPT: &'static str = "Enter an IoT Hub Device name";

    fn preset(&self, ctx: &SessionContext) -> Option<String> {
        ctx.device.clone()
    }

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<DeviceIdentity>, CoreError> {
        let cmd = pv.az.device_list(ctx.resource_group_name()?, ctx.hub_name()?);
        let out = pv.run_json(&cmd).await?;
        let devices: Vec<DeviceIdentity> = listed(&out, "device identities")?;
        Ok(devices.into_iter().find(|d| d.device_id == name))
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<DeviceIdentity>, CoreError> {
        let cmd = pv.az.device_create(
            ctx.resource_group_name()?,
            ctx.hub_name()?,
            name,
            self.edge,
        );
        let out = pv.run_json(&cmd).await?;
        match out.decode::<DeviceIdentity>()? {
            Some(device) => {
                pv.report_stderr("device-identity create", &out.stderr);
                Ok(Outcome::Ready(device))
            }
            None => Ok(Outcome::Rejected(rejection(&out))),
        }
    }

    async fn adopt(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
        name: &str,
        found: DeviceIdentity,
    ) -> Result<(), CoreError> {
        ctx.device = Some(name.to_owned());
        if let Some(key) = found.primary_key() {
            ctx.set_device_key(key);
        }
        Ok(())
    }
}
