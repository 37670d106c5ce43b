use tracing::debug;

use starterkit_api::CommandExecutor;

use super::{Outcome, Recovery, Resource};
use crate::context::{LOCATIONS, SessionContext};
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Resource groups. Existence is a tri-state `true`/`false`/other answer.
pub(crate) struct ResourceGroupKind {
    /// Location configured before the session started.
    configured: Option<String>,
    chosen: Option<String>,
}

impl ResourceGroupKind {
    pub(crate) fn new(ctx: &SessionContext) -> Self {
        Self {
            configured: ctx.location.clone(),
            chosen: None,
        }
    }
}

impl<E: CommandExecutor, P: PromptProvider> Resource<E, P> for ResourceGroupKind {
    type Found = ();

    const LABEL: &'static str = "Resource Group";
    const NAME_PROMPT: &'static str = "Enter a Resource Group name";

    fn preset(&self, ctx: &SessionContext) -> Option<String> {
        ctx.resource_group.clone()
    }

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        _ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<()>, CoreError> {
        let out = pv.run(&pv.az.group_exists(name)).await?;
        match out.stdout.trim() {
            "true" => Ok(Some(())),
            "false" => Ok(None),
            other => Err(CoreError::ResourceGroupQuery {
                name: name.to_owned(),
                output: if other.is_empty() {
                    out.stderr.trim().to_owned()
                } else {
                    other.to_owned()
                },
            }),
        }
    }

    async fn prepare(
        &mut self,
        pv: &Provisioner<'_, E, P>,
        _ctx: &mut SessionContext,
    ) -> Result<(), CoreError> {
        let location = match &self.configured {
            Some(location) => location.clone(),
            None => pv.prompt.select(
                "Specify the location where the Resource Group should be created",
                &LOCATIONS,
            )?,
        };
        debug!(%location, "resource group location");
        self.chosen = Some(location);
        Ok(())
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        _ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<()>, CoreError> {
        let location = self
            .chosen
            .as_deref()
            .ok_or(CoreError::MissingSetting { field: "location" })?;
        let out = pv.run(&pv.az.group_create(name, location)).await?;
        if out.is_clean() {
            Ok(Outcome::Ready(()))
        } else {
            Ok(Outcome::Rejected(out.stderr.trim().to_owned()))
        }
    }

    /// A refused creation may be the region's fault, so the next attempt
    /// offers the location list even when one was configured.
    fn recover(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        _message: &str,
    ) -> Result<Recovery, CoreError> {
        self.configured = None;
        self.chosen = None;
        Ok(Recovery::Reprompt)
    }

    async fn adopt(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
        name: &str,
        _found: (),
    ) -> Result<(), CoreError> {
        ctx.resource_group = Some(name.to_owned());
        if let Some(location) = self.chosen.take() {
            ctx.location = Some(location);
        }
        Ok(())
    }
}
