use std::str::FromStr;

use tracing::info;

use starterkit_api::CommandExecutor;
use starterkit_api::models::HubDescription;

use super::{Outcome, Recovery, Resource, rejection};
use crate::context::{HubSku, SessionContext};
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// IoT hubs. A free-tier creation refused with a 400 Bad Request is retried
/// with a paid tier chosen by the operator.
pub(crate) struct HubKind {
    sku: HubSku,
}

impl HubKind {
    pub(crate) fn new(ctx: &SessionContext) -> Self {
        Self { sku: ctx.hub_sku }
    }
}

/// The platform's wording when a subscription already holds its one free hub.
fn is_free_tier_refusal(sku: HubSku, message: &str) -> bool {
    sku == HubSku::F1 && message.contains("Bad Request") && message.contains("400 Client Error")
}

impl<E: CommandExecutor, P: PromptProvider> Resource<E, P> for HubKind {
    type Found = HubDescription;

    const LABEL: &'static str = "IoT Hub";
    const NAME_PROMPT: &'static str = "Enter an IoT Hub name";

    fn preset(&self, ctx: &SessionContext) -> Option<String> {
        ctx.hub.clone()
    }

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<HubDescription>, CoreError> {
        let group = ctx.resource_group_name()?;
        let out = pv.run_json(&pv.az.hub_show(group, name)).await?;
        // Empty stdout means not found; stderr then only explains why.
        Ok(out.decode::<HubDescription>()?)
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<HubDescription>, CoreError> {
        let group = ctx.resource_group_name()?;
        let out = pv
            .run_json(&pv.az.hub_create(group, name, self.sku.as_ref()))
            .await?;
        match out.decode::<HubDescription>()? {
            Some(hub) if hub.host_name().is_some() => Ok(Outcome::Ready(hub)),
            _ => Ok(Outcome::Rejected(rejection(&out))),
        }
    }

    fn recover(&mut self, pv: &Provisioner<'_, E, P>, message: &str) -> Result<Recovery, CoreError> {
        if !is_free_tier_refusal(self.sku, message) {
            return Ok(Recovery::Reprompt);
        }

        let paid = HubSku::paid();
        let choices: Vec<&str> = paid.iter().map(AsRef::<str>::as_ref).collect();
        let answer = pv.prompt.select(
            "Unable to use the Free Tier (F1) IoT Hub SKU. Please choose a different SKU",
            &choices,
        )?;
        self.sku = HubSku::from_str(&answer).map_err(|_| CoreError::Prompt {
            message: format!("'{answer}' is not an IoT Hub SKU"),
        })?;
        info!(sku = %self.sku, "retrying hub creation with paid tier");
        Ok(Recovery::RetryCreate)
    }

    async fn adopt(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
        name: &str,
        found: HubDescription,
    ) -> Result<(), CoreError> {
        ctx.hub = Some(name.to_owned());
        ctx.hub_sku = self.sku;
        if let Some(host) = found.host_name() {
            ctx.set_hostname(host);
        }
        Ok(())
    }
}
