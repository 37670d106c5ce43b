//! Output formatting: table, JSON, YAML.
//!
//! Each command ends with one summary. Tables list it as field/value rows;
//! structured formats serialize the summary itself. Secrets never appear
//! in either.

use std::io::{self, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use starterkit_core::{BringupState, ButtonReport, FunctionAppReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Summaries ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DeviceSummary {
    pub resource_group: String,
    pub iothub: String,
    pub hostname: String,
    pub device: String,
    pub container_registry: String,
    pub twin_tagged: bool,
    pub device_ip: String,
    pub states: Vec<BringupState>,
}

#[derive(Debug, Serialize)]
pub struct ButtonSummary {
    pub resource_group: String,
    pub iothub: String,
    pub hostname: String,
    pub device: String,
    pub button: ButtonReport,
    pub function_app: Option<FunctionAppReport>,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(field: &'static str, value: impl ToString) -> Row {
    Row {
        field,
        value: value.to_string(),
    }
}

impl DeviceSummary {
    fn rows(&self) -> Vec<Row> {
        let states: Vec<String> = self.states.iter().map(ToString::to_string).collect();
        vec![
            row("Resource group", &self.resource_group),
            row("IoT hub", &self.iothub),
            row("Hostname", &self.hostname),
            row("Device", &self.device),
            row("Container registry", &self.container_registry),
            row("Twin tagged", if self.twin_tagged { "yes" } else { "no" }),
            row("Device IP", &self.device_ip),
            row("Bring-up", states.join(" -> ")),
        ]
    }
}

impl ButtonSummary {
    fn rows(&self) -> Vec<Row> {
        let client_mode = self
            .button
            .client_mode_status
            .map_or_else(|| "no answer".to_owned(), |s| s.to_string());
        let mut rows = vec![
            row("Resource group", &self.resource_group),
            row("IoT hub", &self.iothub),
            row("Hostname", &self.hostname),
            row("Device", &self.device),
            row("WiFi settings", self.button.wifi_status),
            row("Hub settings", self.button.hub_status),
            row("Client mode", client_mode),
        ];
        if let Some(app) = &self.function_app {
            rows.push(row("Function app", &app.name));
            rows.push(row("Storage account", &app.storage_account));
            rows.push(row("Function location", &app.location));
        }
        rows
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

pub fn render_device(format: OutputFormat, summary: &DeviceSummary) -> Result<String, CliError> {
    render(format, summary, summary.rows())
}

pub fn render_button(format: OutputFormat, summary: &ButtonSummary) -> Result<String, CliError> {
    render(format, summary, summary.rows())
}

fn render<T: Serialize>(format: OutputFormat, data: &T, rows: Vec<Row>) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(Table::new(rows).with(Style::rounded()).to_string()),
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => render_yaml(data),
    }
}

pub fn render_json<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(data).map_err(|e| CliError::Internal(e.to_string()))
}

pub fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal(e.to_string()))
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn button_summary() -> ButtonSummary {
        ButtonSummary {
            resource_group: "kit-rg".into(),
            iothub: "kit-hub".into(),
            hostname: "kit-hub.azure-devices.net".into(),
            device: "button1".into(),
            button: ButtonReport {
                wifi_status: 200,
                hub_status: 200,
                client_mode_status: None,
            },
            function_app: None,
        }
    }

    #[test]
    fn table_lists_fields() {
        let out = render_button(OutputFormat::Table, &button_summary()).unwrap();
        assert!(out.contains("kit-hub.azure-devices.net"));
        assert!(out.contains("no answer"));
        assert!(!out.contains("Function app"));
    }

    #[test]
    fn json_serializes_the_summary() {
        let out = render_button(OutputFormat::Json, &button_summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["device"], "button1");
        assert_eq!(value["button"]["client_mode_status"], serde_json::Value::Null);
        assert_eq!(value["function_app"], serde_json::Value::Null);
    }

    #[test]
    fn device_table_shows_bring_up_path() {
        let summary = DeviceSummary {
            resource_group: "kit-rg".into(),
            iothub: "kit-hub".into(),
            hostname: "kit-hub.azure-devices.net".into(),
            device: "pi".into(),
            container_registry: "kitacr".into(),
            twin_tagged: true,
            device_ip: "192.168.4.1".into(),
            states: vec![BringupState::Executing, BringupState::Done],
        };
        let out = render_device(OutputFormat::Table, &summary).unwrap();
        assert!(out.contains("running setup scripts -> done"));

        let yaml = render_device(OutputFormat::Yaml, &summary).unwrap();
        assert!(yaml.contains("twin_tagged: true"));
        assert!(yaml.contains("- Done"));
    }
}
