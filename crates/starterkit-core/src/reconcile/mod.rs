// ── Find-or-create reconciliation ──
//
// One loop drives every resource kind: take the supplied name or ask for
// one, look it up, create it when absent, and on a rejected creation either
// retry with adjusted parameters or start over with a fresh name. Each kind
// describes its commands and rules by implementing `Resource`.

mod device;
mod group;
mod hub;
mod registry;
mod storage;

use tracing::{debug, info, instrument};

use starterkit_api::{CommandExecutor, JsonOutput};

use crate::context::SessionContext;
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

pub(crate) use device::DeviceKind;
pub(crate) use group::ResourceGroupKind;
pub(crate) use hub::HubKind;
pub(crate) use registry::RegistryKind;
pub(crate) use storage::StorageKind;

/// Result of one creation attempt.
pub(crate) enum Outcome<T> {
    Ready(T),
    /// The platform refused; carries its error text.
    Rejected(String),
}

/// What to do after a rejected creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// Parameters were adjusted; create again under the same name.
    RetryCreate,
    /// Report the error and ask for a different name.
    Reprompt,
}

/// Per-kind behavior for the reconciliation loop.
pub(crate) trait Resource<E: CommandExecutor, P: PromptProvider> {
    /// Whatever the lookup or creation returns that later steps need.
    type Found;

    /// Human label, e.g. "IoT Hub".
    const LABEL: &'static str;
    const NAME_PROMPT: &'static str;

    /// Name supplied up front, if any.
    fn preset(&self, ctx: &SessionContext) -> Option<String>;

    async fn lookup(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Option<Self::Found>, CoreError>;

    /// Collect creation parameters (location, sku) before the first attempt.
    async fn prepare(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        _ctx: &mut SessionContext,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn create(
        &self,
        pv: &Provisioner<'_, E, P>,
        ctx: &SessionContext,
        name: &str,
    ) -> Result<Outcome<Self::Found>, CoreError>;

    fn recover(
        &mut self,
        _pv: &Provisioner<'_, E, P>,
        _message: &str,
    ) -> Result<Recovery, CoreError> {
        Ok(Recovery::Reprompt)
    }

    /// Record the resolved name and extracted fields in the context.
    async fn adopt(
        &mut self,
        pv: &Provisioner<'_, E, P>,
        ctx: &mut SessionContext,
        name: &str,
        found: Self::Found,
    ) -> Result<(), CoreError>;
}

impl<E: CommandExecutor, P: PromptProvider> Provisioner<'_, E, P> {
    /// Resolve the resource group, creating it in a chosen location if absent.
    pub async fn reconcile_resource_group(
        &self,
        ctx: &mut SessionContext,
    ) -> Result<String, CoreError> {
        let kind = ResourceGroupKind::new(ctx);
        self.reconcile(ctx, kind).await
    }

    /// Resolve the IoT hub and record its hostname.
    pub async fn reconcile_hub(&self, ctx: &mut SessionContext) -> Result<String, CoreError> {
        let kind = HubKind::new(ctx);
        self.reconcile(ctx, kind).await
    }

    /// Resolve the device identity. `edge` creates it as an IoT Edge device.
    pub async fn reconcile_device(
        &self,
        ctx: &mut SessionContext,
        edge: bool,
    ) -> Result<String, CoreError> {
        self.reconcile(ctx, DeviceKind { edge }).await
    }

    /// Resolve the container registry and fetch its admin credentials.
    pub async fn reconcile_registry(&self, ctx: &mut SessionContext) -> Result<String, CoreError> {
        self.reconcile(ctx, RegistryKind).await
    }

    /// Resolve a storage account for the sample function. Always asks for
    /// the name.
    pub async fn reconcile_storage_account(
        &self,
        ctx: &mut SessionContext,
    ) -> Result<String, CoreError> {
        self.reconcile(ctx, StorageKind).await
    }

    #[instrument(skip_all, fields(kind = R::LABEL))]
    pub(crate) async fn reconcile<R: Resource<E, P>>(
        &self,
        ctx: &mut SessionContext,
        mut kind: R,
    ) -> Result<String, CoreError> {
        let mut supplied = kind.preset(ctx);
        let mut attempts = 0u32;

        loop {
            let name = match supplied.take() {
                Some(name) => name,
                None => self.prompt.input(R::NAME_PROMPT)?,
            };

            if let Some(found) = kind.lookup(self, ctx, &name).await? {
                info!(%name, "using existing resource");
                self.prompt.notify(&format!(
                    "Using existing {} with name '{name}'",
                    R::LABEL
                ));
                kind.adopt(self, ctx, &name, found).await?;
                return Ok(name);
            }

            self.prompt.notify(&format!(
                "{label} with name '{name}' does not exist. Creating a new {label}...",
                label = R::LABEL
            ));
            kind.prepare(self, ctx).await?;

            loop {
                if self.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(CoreError::AttemptsExhausted {
                        kind: R::LABEL,
                        attempts,
                    });
                }
                attempts += 1;

                match kind.create(self, ctx, &name).await? {
                    Outcome::Ready(found) => {
                        info!(%name, "created resource");
                        self.prompt
                            .notify(&format!("Created a new {} '{name}'", R::LABEL));
                        kind.adopt(self, ctx, &name, found).await?;
                        return Ok(name);
                    }
                    Outcome::Rejected(message) => match kind.recover(self, &message)? {
                        Recovery::RetryCreate => {
                            debug!(%name, "retrying creation with adjusted parameters");
                        }
                        Recovery::Reprompt => {
                            self.prompt.warn(&message);
                            break;
                        }
                    },
                }
            }
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────────

/// Decode a list query. Missing output with an error is fatal; missing
/// output without one is an empty list.
pub(crate) fn listed<T: serde::de::DeserializeOwned>(
    out: &JsonOutput,
    kind: &'static str,
) -> Result<Vec<T>, CoreError> {
    if out.data.is_none() && !out.is_clean() {
        return Err(CoreError::Query {
            kind,
            message: out.error_text().to_owned(),
        });
    }
    Ok(out.decode::<Vec<T>>()?.unwrap_or_default())
}

/// Error text for a creation that returned nothing usable.
pub(crate) fn rejection(out: &JsonOutput) -> String {
    match out.error_text() {
        "" => "the platform returned no resource description".to_owned(),
        text => text.to_owned(),
    }
}
