// Provisioner
//
// Holds the command executor and prompt provider for one session. The
// operations live in sibling modules as further `impl` blocks:
// `reconcile` (find-or-create), `complete` (derived parameters), `twin`
// (device twin tags) and `function_app` (sample function deployment).

use tracing::warn;

use starterkit_api::{Az, CloudCommand, CommandExecutor, CommandOutput, JsonOutput};

use crate::error::CoreError;
use crate::prompt::PromptProvider;

/// Runs provisioning steps against the cloud platform CLI.
pub struct Provisioner<'a, E, P> {
    pub(crate) executor: &'a E,
    pub(crate) prompt: &'a P,
    pub(crate) az: Az,
    pub(crate) max_attempts: Option<u32>,
}

impl<'a, E: CommandExecutor, P: PromptProvider> Provisioner<'a, E, P> {
    pub fn new(executor: &'a E, prompt: &'a P) -> Self {
        Self {
            executor,
            prompt,
            az: Az::default(),
            max_attempts: None,
        }
    }

    /// Use a different platform CLI binary.
    pub fn with_az(mut self, az: Az) -> Self {
        self.az = az;
        self
    }

    /// Bound each reconciliation to `attempts` creation calls. Unbounded
    /// by default.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub(crate) async fn run(&self, command: &CloudCommand) -> Result<CommandOutput, CoreError> {
        Ok(self.executor.run(command).await?)
    }

    pub(crate) async fn run_json(&self, command: &CloudCommand) -> Result<JsonOutput, CoreError> {
        Ok(self.executor.run_json(command).await?)
    }

    /// Surface stderr of a step whose failure does not stop the session.
    /// Returns `true` when stderr was empty.
    pub(crate) fn report_stderr(&self, step: &str, stderr: &str) -> bool {
        let text = stderr.trim();
        if text.is_empty() {
            return true;
        }
        warn!(step, "platform reported an error");
        self.prompt.warn(text);
        false
    }
}
