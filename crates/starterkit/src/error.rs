//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use starterkit_config::ConfigError;
use starterkit_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Cloud platform ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(iot::cloud),
        help("Check that the Azure CLI is installed and signed in: az login")
    )]
    Cloud { message: String },

    #[error("Stopped after {attempts} attempts to create the {kind}")]
    #[diagnostic(
        code(iot::attempts_exhausted),
        help("Pass an existing name with the matching flag, or raise --max-attempts.")
    )]
    AttemptsExhausted { kind: String, attempts: u32 },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Failed to SSH to the device as {user}@{host}")]
    #[diagnostic(
        code(iot::device_auth),
        help("Check --device-user and --device-password and try again.")
    )]
    DeviceAuth { user: String, host: String },

    #[error("{message}")]
    #[diagnostic(code(iot::device))]
    Device { message: String },

    #[error("Could not reach {target}")]
    #[diagnostic(code(iot::unreachable), help("{message}"))]
    Unreachable { target: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(iot::validation))]
    Validation { field: String, reason: String },

    #[error("Prompt failed: {message}")]
    #[diagnostic(
        code(iot::prompt),
        help("Run from an interactive terminal, or pass every value as a flag.")
    )]
    Prompt { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{source}")]
    #[diagnostic(code(iot::config), help("Config file: {path}"))]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(iot::internal))]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config { source, .. } if matches!(source, ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            path: starterkit_config::config_path().display().to_string(),
        }
    }
}

impl From<starterkit_api::Error> for CliError {
    fn from(err: starterkit_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ (CoreError::CommandFailed { .. }
            | CoreError::ResourceGroupQuery { .. }
            | CoreError::Query { .. }
            | CoreError::Completion { .. }
            | CoreError::Parse { .. }) => CliError::Cloud {
                message: e.to_string(),
            },

            CoreError::AttemptsExhausted { kind, attempts } => CliError::AttemptsExhausted {
                kind: kind.into(),
                attempts,
            },

            CoreError::MissingSetting { field } => {
                CliError::Internal(format!("the {field} was needed before it was known"))
            }

            CoreError::Prompt { message } => CliError::Prompt { message },

            CoreError::AuthenticationFailed { user, host } => CliError::DeviceAuth { user, host },

            e @ (CoreError::Bringup { .. } | CoreError::Device { .. }) => CliError::Device {
                message: e.to_string(),
            },

            CoreError::Transport { target, message } => CliError::Unreachable { target, message },

            CoreError::Io(e) => CliError::Io(e),

            e @ (CoreError::Archive(_) | CoreError::Internal(_)) => {
                CliError::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_a_usage_error() {
        let err = CliError::Validation {
            field: "wifi-ssid".into(),
            reason: "cannot be empty".into(),
        };
        assert_eq!(err.exit_code(), exit_code::USAGE);

        let err: CliError = ConfigError::Validation {
            field: "device.ip".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn platform_failures_are_general_errors() {
        let err: CliError = CoreError::Query {
            kind: "devices",
            message: "ERROR: hub not found".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(err.to_string().contains("ERROR: hub not found"));
    }

    #[test]
    fn ssh_rejection_names_the_login() {
        let err: CliError = CoreError::AuthenticationFailed {
            user: "pi".into(),
            host: "192.168.4.1".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Failed to SSH to the device as pi@192.168.4.1");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
