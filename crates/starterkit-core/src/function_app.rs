// Sample function app deployment
//
// Creates a function app wired to the hub's built-in event endpoint and
// deploys a two-file JavaScript function that logs every message. Nothing
// checks that the deployment actually started; platform errors are shown
// and the session carries on.

use std::io::{Cursor, Write};

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use starterkit_api::CommandExecutor;
use starterkit_api::models::HubDescription;

use crate::context::{DEFAULT_FUNCTION_LOCATION, SessionContext};
use crate::error::CoreError;
use crate::prompt::PromptProvider;
use crate::provision::Provisioner;

/// Folder inside the archive; also the function's name in the app.
pub const FUNCTION_FOLDER: &str = "iotbuttonmyfunction";

/// App setting read by the trigger binding.
pub const EVENT_HUB_SETTING: &str = "AzureIoTHubEventHubConnectionString";
pub const HUB_SETTING: &str = "AzureIoTHubConnectionString";

const INDEX_JS: &str = r"module.exports = function (context, IoTHubMessages) {
    context.log(`JavaScript eventhub trigger function called for message array ${IoTHubMessages}`);

    IoTHubMessages.forEach(message => {
        context.log(`Processed message ${message}`);
    });

    context.done();
};
";

/// What was deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionAppReport {
    pub name: String,
    pub resource_group: String,
    pub storage_account: String,
    pub location: String,
}

/// `function.json` with an event hub trigger on `path`.
pub fn function_manifest(path: &str) -> serde_json::Value {
    json!({
        "disabled": false,
        "bindings": [{
            "authLevel": "anonymous",
            "type": "eventHubTrigger",
            "direction": "in",
            "name": "IoTHubMessages",
            "path": path,
            "connection": EVENT_HUB_SETTING,
            "cardinality": "many",
            "consumerGroup": "$Default"
        }]
    })
}

/// Zip holding `index.js` and `function.json` under [`FUNCTION_FOLDER`].
pub fn package_function(event_hub_path: &str) -> Result<Vec<u8>, CoreError> {
    let manifest = serde_json::to_string_pretty(&function_manifest(event_hub_path))
        .map_err(|e| CoreError::Archive(e.to_string()))?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file(format!("{FUNCTION_FOLDER}/index.js"), options)?;
    zip.write_all(INDEX_JS.as_bytes())?;
    zip.start_file(format!("{FUNCTION_FOLDER}/function.json"), options)?;
    zip.write_all(manifest.as_bytes())?;
    Ok(zip.finish()?.into_inner())
}

/// Event hub compatible connection string: the endpoint followed by the
/// hub connection string's shared access part.
pub fn event_hub_connection_string(endpoint: &str, hub_cs: &str) -> Result<String, CoreError> {
    let (_, access) = hub_cs.split_once(';').ok_or_else(|| CoreError::Completion {
        field: "hub connection string",
        message: "expected 'HostName=...;SharedAccessKeyName=...;SharedAccessKey=...'".into(),
    })?;
    Ok(format!("Endpoint={endpoint};{access}"))
}

impl<E: CommandExecutor, P: PromptProvider> Provisioner<'_, E, P> {
    #[instrument(skip_all, fields(function = %ctx.function_name))]
    pub async fn deploy_function_app(
        &self,
        ctx: &mut SessionContext,
    ) -> Result<FunctionAppReport, CoreError> {
        let storage = self.reconcile_storage_account(ctx).await?;
        let group = ctx.resource_group_name()?.to_owned();
        let hub = ctx.hub_name()?.to_owned();
        let name = ctx.function_name.clone();
        let location = ctx
            .location
            .clone()
            .unwrap_or_else(|| DEFAULT_FUNCTION_LOCATION.to_owned());

        self.prompt
            .notify("Creating a new Sample Azure Function Application...");
        let out = self
            .run(&self.az.functionapp_create(&group, &name, &storage, &location))
            .await?;
        self.report_stderr("functionapp create", &out.stderr);

        let described = self.run_json(&self.az.hub_show_by_name(&hub)).await?;
        let hub_info = described
            .decode::<HubDescription>()?
            .ok_or_else(|| CoreError::Completion {
                field: "event hub endpoint",
                message: described.error_text().to_owned(),
            })?;
        let events = hub_info
            .events_endpoint()
            .ok_or_else(|| CoreError::Completion {
                field: "event hub endpoint",
                message: format!("hub '{hub}' has no 'events' endpoint"),
            })?;

        let hub_cs = ctx.hub_cs()?;
        let event_cs = event_hub_connection_string(&events.endpoint, hub_cs)?;
        let settings = self.az.functionapp_settings(
            &name,
            &group,
            &[(HUB_SETTING, hub_cs), (EVENT_HUB_SETTING, &event_cs)],
        );
        let out = self.run(&settings).await?;
        self.report_stderr("functionapp appsettings", &out.stderr);

        let archive = package_function(&events.path)?;
        let scratch = tempfile::tempdir()?;
        let archive_path = scratch.path().join(format!("{FUNCTION_FOLDER}.zip"));
        tokio::fs::write(&archive_path, &archive).await?;

        let deploy = self.az.functionapp_deploy_zip(
            &group,
            &name,
            &archive_path.to_string_lossy(),
        );
        let out = self.run(&deploy).await?;
        self.report_stderr("functionapp deployment", &out.stderr);

        info!(%name, %group, "function app deployed");
        self.prompt.notify(&format!(
            "Deployed a Sample Azure Function Application: '{name}' in Resource Group: '{group}'"
        ));

        Ok(FunctionAppReport {
            name,
            resource_group: group,
            storage_account: storage,
            location,
        })
    }
}
