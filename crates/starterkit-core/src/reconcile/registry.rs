use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::debug;

use starterkit_api::CommandExecutor;
use starterkit_api::models::{NamedResource, RegistryCredentials};

use super::{Outcome, Resource, listed, rejection};
use crate::context::{RegistrySku, SessionContext};
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Container registries. Names compare case-insensitively, matching the
/// platform's own uniqueness rule.
pub(crate) struct RegistryKind;

impl<E: CommandExecutor, P: PromptProvider> Resource<E, P> for RegistryKind {
    type Found = NamedResource;

    const LABEL: &'static str = "Container Registry";
    const NAME_PROMPT: &'static str = "Enter a Container Registry name";

    fn preset(&self, ctx: &SessionContext) -> Option<String> {
        ctx.registry.clone()
    }

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<NamedResource>, CoreError> {
        let out = pv
            .run_json(&pv.az.registry_list(ctx.resource_group_name()?))
            .await?;
        let registries: Vec<NamedResource> = listed(&out, "container registries")?;
        Ok(registries
            .into_iter()
            .find(|r| r.name.eq_ignore_ascii_case(name)))
    }

    async fn prepare(
        &mut self,
        pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
    ) -> Result<(), CoreError> {
        if ctx.registry_sku.is_some() {
            return Ok(());
        }
        let skus: Vec<RegistrySku> = RegistrySku::iter().collect();
        let choices: Vec<&str> = skus.iter().map(AsRef::<str>::as_ref).collect();
        let answer = pv
            .prompt
            .select("Specify the sku of the container registry", &choices)?;
        let sku = RegistrySku::from_str(&answer).map_err(|_| CoreError::Prompt {
            message: format!("'{answer}' is not a container registry SKU"),
        })?;
        ctx.registry_sku = Some(sku);
        Ok(())
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<NamedResource>, CoreError> {
        let sku = ctx.registry_sku.unwrap_or_default();
        let cmd = pv
            .az
            .registry_create(name, ctx.resource_group_name()?, sku.as_ref());
        let out = pv.run_json(&cmd).await?;
        match out.decode::<NamedResource>()? {
            Some(registry) => {
                pv.report_stderr("acr create", &out.stderr);
                Ok(Outcome::Ready(registry))
            }
            None => Ok(Outcome::Rejected(rejection(&out))),
        }
    }

    async fn adopt(
        &mut self,
        pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
        name: &str,
        _found: NamedResource,
    ) -> Result<(), CoreError> {
        let cmd = pv
            .az
            .registry_credentials(name, ctx.resource_group_name()?);
        let out = pv.run_json(&cmd).await?;
        if !out.is_clean() {
            return Err(CoreError::Completion {
                field: "container registry credentials",
                message: out.error_text().to_owned(),
            });
        }

        let creds = out
            .decode::<RegistryCredentials>()?
            .ok_or_else(|| CoreError::Completion {
                field: "container registry credentials",
                message: "no credentials returned".into(),
            })?;
        let password = creds
            .primary_password()
            .ok_or_else(|| CoreError::Completion {
                field: "container registry password",
                message: "admin user has no passwords".into(),
            })?;

        debug!(user = %creds.username, "fetched registry credentials");
        ctx.registry = Some(name.to_owned());
        ctx.set_registry_user(creds.username.clone());
        ctx.set_registry_password(password);
        Ok(())
    }
}
