// ── Core error types ──
//
// Provisioning errors as the operator sees them. Process spawn failures,
// JSON decoding and transport details from starterkit-api are translated
// by the `From<starterkit_api::Error>` impl below.

use thiserror::Error;

use crate::bringup::BringupState;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Cloud platform ───────────────────────────────────────────────
    #[error("Failed to run '{command}': {message}")]
    CommandFailed { command: String, message: String },

    #[error("Error checking for existence of resource group '{name}': {output}")]
    ResourceGroupQuery { name: String, output: String },

    #[error("Listing {kind} failed: {message}")]
    Query { kind: &'static str, message: String },

    #[error("Could not determine the {field}: {message}")]
    Completion { field: &'static str, message: String },

    #[error("Unexpected platform output: {message}")]
    Parse { message: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("The {field} is not known yet")]
    MissingSetting { field: &'static str },

    #[error("Gave up on {kind} after {attempts} creation attempts")]
    AttemptsExhausted { kind: &'static str, attempts: u32 },

    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Authentication failed for {user}@{host}")]
    AuthenticationFailed { user: String, host: String },

    #[error("Device bring-up failed while {state}: {message}")]
    Bringup {
        state: BringupState,
        message: String,
    },

    #[error("Device session error: {message}")]
    Device { message: String },

    #[error("Could not reach {target}: {message}")]
    Transport { target: String, message: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Could not build function archive: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap any error as a failure of bring-up step `state`, keeping
    /// authentication failures distinct.
    pub(crate) fn during(state: BringupState, err: impl Into<CoreError>) -> Self {
        match err.into() {
            e @ (Self::AuthenticationFailed { .. } | Self::Bringup { .. }) => e,
            other => Self::Bringup {
                state,
                message: other.to_string(),
            },
        }
    }
}

// ── Conversion from plumbing errors ──────────────────────────────────

impl From<starterkit_api::Error> for CoreError {
    fn from(err: starterkit_api::Error) -> Self {
        use starterkit_api::Error as Api;

        match err {
            Api::Spawn { program, source } => CoreError::CommandFailed {
                command: program,
                message: source.to_string(),
            },
            Api::Parse { command, source } => CoreError::Parse {
                message: format!("{command}: {source}"),
            },
            Api::Shape { command, message } => CoreError::Parse {
                message: format!("{command}: {message}"),
            },
            Api::Transport(e) => CoreError::Transport {
                target: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                message: e.to_string(),
            },
            Api::InvalidUrl(e) => CoreError::Internal(format!("invalid URL: {e}")),
            Api::ClientSetup(message) => CoreError::Internal(message),
            Api::SshAuthentication { user, host } => {
                CoreError::AuthenticationFailed { user, host }
            }
            Api::Ssh(e) => CoreError::Device {
                message: e.to_string(),
            },
            Api::SshWorker(message) => CoreError::Device { message },
            Api::Io(e) => CoreError::Io(e),
        }
    }
}

impl From<zip::result::ZipError> for CoreError {
    fn from(err: zip::result::ZipError) -> Self {
        CoreError::Archive(err.to_string())
    }
}
