//! Integration tests for the `iot` CLI binary.
//!
//! Argument parsing, help output, completions, the config file commands
//! and early failure paths. Nothing here reaches Azure or a device.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const ENV_VARS: &[&str] = &[
    "STARTERKIT_WIFI_SSID",
    "STARTERKIT_WIFI_PASSWORD",
    "STARTERKIT_RESOURCE_GROUP",
    "STARTERKIT_LOCATION",
    "STARTERKIT_IOTHUB",
    "STARTERKIT_IOTHUB_SKU",
    "STARTERKIT_DEVICE_NAME",
    "STARTERKIT_CONTAINER_REGISTRY",
    "STARTERKIT_CONTAINER_REGISTRY_SKU",
    "STARTERKIT_DEVICE_IP",
    "STARTERKIT_DEVICE_USER",
    "STARTERKIT_DEVICE_PASSWORD",
    "STARTERKIT_FN_NAME",
    "STARTERKIT_OUTPUT",
    "STARTERKIT_TIMEOUT",
    "STARTERKIT_BUTTON_URL",
];

/// Build a command for the `iot` binary with its config directory inside
/// `home`, so tests never touch the user's real configuration.
fn iot_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("iot");
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = iot_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands_and_session_flags() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("configure-device")
            .and(predicate::str::contains("configure-button"))
            .and(predicate::str::contains("--wifi-ssid"))
            .and(predicate::str::contains("--iothub-sku"))
            .and(predicate::str::contains("--container-registry-sku"))
            .and(predicate::str::contains("--fn-name")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("iot"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configure-device"));
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_hub_sku_is_rejected_by_parser() {
    let home = tempfile::tempdir().unwrap();
    let output = iot_cmd(home.path())
        .args(["--iothub-sku", "B1", "configure-device"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("possible values") || text.contains("invalid value"), "{text}");
}

#[test]
fn test_function_flags_conflict() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["configure-button", "--deploy-function", "--no-function"])
        .assert()
        .code(2);
}

#[test]
fn test_empty_ssid_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["--wifi-ssid", " ", "--wifi-password", "", "configure-device"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("wifi-ssid"));
}

// ── Config file ─────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file_prints_defaults() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.4.1")
                .and(predicate::str::contains("sampleiotfunction")),
        );
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["config", "set", "device.ip", "10.0.0.5"])
        .assert()
        .success();

    iot_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.5"));

    iot_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(home.path().to_string_lossy().as_ref()));
}

#[test]
fn test_config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args(["config", "set", "device.password", "raspberry"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

// ── Provisioning failure paths ──────────────────────────────────────

#[test]
fn test_missing_cloud_cli_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .env("STARTERKIT_DEFAULTS__AZ_PROGRAM", "/nonexistent/az")
        .args([
            "--wifi-ssid",
            "home-wifi",
            "--wifi-password",
            "wifi-pass",
            "--resource-group",
            "kit-rg",
            "--unattended",
            "configure-device",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/nonexistent/az"));
}

#[test]
fn test_unknown_location_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    iot_cmd(home.path())
        .args([
            "--wifi-ssid",
            "home-wifi",
            "--wifi-password",
            "wifi-pass",
            "--location",
            "westus9",
            "configure-device",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown location 'westus9'"));
}
