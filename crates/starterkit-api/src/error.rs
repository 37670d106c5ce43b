use thiserror::Error;

/// Top-level error type for the `starterkit-api` crate.
///
/// Covers every failure mode of the outward-facing plumbing: spawning the
/// platform CLI, decoding its output, HTTP transport, and SSH sessions.
/// `starterkit-core` maps these into provisioning diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Process ─────────────────────────────────────────────────────
    /// The child process could not be started at all (binary missing,
    /// permission denied). A nonzero exit is NOT an error.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Stdout was non-empty but not valid JSON.
    #[error("Could not parse output of '{command}' as JSON: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stdout was valid JSON but not the expected shape.
    #[error("Unexpected output shape from '{command}': {message}")]
    Shape { command: String, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    // ── Device access ───────────────────────────────────────────────
    /// The device rejected the configured login.
    #[error("SSH authentication failed for {user}@{host}")]
    SshAuthentication { user: String, host: String },

    /// Any other libssh2 failure.
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    /// The blocking SSH worker was cancelled or panicked.
    #[error("SSH worker failed: {0}")]
    SshWorker(String),

    // ── Local IO ────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error happened below the HTTP layer
    /// (no status code was ever received).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(e) => e.status().is_none(),
            _ => false,
        }
    }
}
