use starterkit_api::CommandExecutor;
use starterkit_api::models::NamedResource;

use super::{Outcome, Resource, listed, rejection};
use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Storage accounts backing the sample function app.
pub(crate) struct StorageKind;

impl<E: CommandExecutor, P: PromptProvider> Resource<E, P> for StorageKind {
    type Found = NamedResource;

    const LABEL: &'static str = "Storage Account";
    const NAME_PROMPT: &'static str = "Enter a Storage Account for the Sample Function";

    fn preset(&self, _ctx: &SessionContext) -> Option<String> {
        None
    }

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<NamedResource>, CoreError> {
        let out = pv
            .run_json(&pv.az.storage_list(ctx.resource_group_name()?))
            .await?;
        let accounts: Vec<NamedResource> = listed(&out, "storage accounts")?;
        Ok(accounts.into_iter().find(|a| a.name == name))
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<NamedResource>, CoreError> {
        let cmd = pv.az.storage_create(name, ctx.resource_group_name()?);
        let out = pv.run_json(&cmd).await?;
        match out.decode::<NamedResource>()? {
            Some(account) => {
                pv.report_stderr("storage account create", &out.stderr);
                Ok(Outcome::Ready(account))
            }
            None => Ok(Outcome::Rejected(rejection(&out))),
        }
    }

    async fn adopt(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        _ctx: &mut SessionContext,
        _name: &str,
        _found: NamedResource,
    ) -> Result<(), CoreError> {
        Ok(())
    }
}
