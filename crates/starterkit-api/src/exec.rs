// External command execution
//
// Every cloud operation is a child process of the platform CLI. Commands
// are built as argument vectors and never pass through a shell, so values
// such as connection strings need no quoting.

use std::fmt;
use std::future::Future;
use std::process::Stdio;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::Error;

// ── CloudCommand ─────────────────────────────────────────────────────

/// A program plus its arguments.
///
/// Arguments marked with [`secret_arg`](Self::secret_arg) are masked in the
/// `Display` output so commands can be logged safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudCommand {
    program: String,
    args: Vec<String>,
    secret: Vec<usize>,
}

impl CloudCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an argument that must never appear in logs.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Unmasked arguments joined by single spaces, without the program.
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Display for CloudCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if self.secret.contains(&idx) {
                f.write_str(" ***")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

// ── Outputs ──────────────────────────────────────────────────────────

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// `true` when nothing was written to stderr. The platform CLI signals
    /// most failures this way, independent of its exit code.
    pub fn is_clean(&self) -> bool {
        self.stderr.trim().is_empty()
    }
}

/// Stdout decoded as JSON, alongside the raw stderr text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonOutput {
    /// `None` when stdout was empty.
    pub data: Option<serde_json::Value>,
    pub stderr: String,
    command: String,
}

impl JsonOutput {
    /// Parse captured output. Empty stdout yields `data: None`; anything
    /// else must be valid JSON.
    pub fn from_output(command: &CloudCommand, output: CommandOutput) -> Result<Self, Error> {
        let command = command.to_string();
        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            return Ok(Self {
                data: None,
                stderr: output.stderr,
                command,
            });
        }

        let data = serde_json::from_str(stdout).map_err(|source| Error::Parse {
            command: command.clone(),
            source,
        })?;
        Ok(Self {
            data: Some(data),
            stderr: output.stderr,
            command,
        })
    }

    /// Decode `data` into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        self.data
            .as_ref()
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| Error::Shape {
                    command: self.command.clone(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn is_clean(&self) -> bool {
        self.stderr.trim().is_empty()
    }

    /// Stderr trimmed for display.
    pub fn error_text(&self) -> &str {
        self.stderr.trim()
    }
}

// ── Executor ─────────────────────────────────────────────────────────

/// Runs external commands.
///
/// The production implementation is [`ProcessExecutor`]; tests inject
/// scripted implementations.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion and capture both streams.
    fn run(
        &self,
        command: &CloudCommand,
    ) -> impl Future<Output = Result<CommandOutput, Error>> + Send;

    /// Run `command` and decode its stdout as JSON.
    fn run_json(
        &self,
        command: &CloudCommand,
    ) -> impl Future<Output = Result<JsonOutput, Error>> + Send {
        async move {
            let output = self.run(command).await?;
            JsonOutput::from_output(command, output)
        }
    }
}

/// Spawns real child processes through `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    async fn run(&self, command: &CloudCommand) -> Result<CommandOutput, Error> {
        debug!(%command, "running command");

        let output = tokio::process::Command::new(command.program())
            .args(command.get_args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: command.program().to_owned(),
                source,
            })?;

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };
        trace!(status = ?captured.status, stderr = %captured.stderr.trim(), "command finished");
        Ok(captured)
    }
}
